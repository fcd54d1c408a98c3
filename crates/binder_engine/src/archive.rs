use std::io::{self, Cursor, Seek, Write};

use binder_core::{Compression, EpubArchive};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Serialize `archive` as a zip, entries in archive order.
pub fn write_epub<W: Write + Seek>(archive: &EpubArchive, writer: W) -> Result<W, ArchiveError> {
    let mut zip = ZipWriter::new(writer);

    for entry in archive.entries() {
        zip.start_file(entry.path.as_str(), file_options(entry.compression))?;
        zip.write_all(&entry.bytes)?;
    }

    Ok(zip.finish()?)
}

fn file_options(compression: Compression) -> SimpleFileOptions {
    let method = match compression {
        Compression::Stored => CompressionMethod::Stored,
        Compression::Deflated => CompressionMethod::Deflated,
    };
    SimpleFileOptions::default().compression_method(method)
}

pub fn epub_bytes(archive: &EpubArchive) -> Result<Vec<u8>, ArchiveError> {
    Ok(write_epub(archive, Cursor::new(Vec::new()))?.into_inner())
}
