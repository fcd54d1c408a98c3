use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0} exists and is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot write into {dir}: {source}")]
    Unwritable {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("writing {path} failed: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Create `dir` if needed and probe that a file can be created in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unwritable = |source| PersistError::Unwritable {
        dir: dir.to_path_buf(),
        source,
    };
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => return Err(PersistError::NotADirectory(dir.to_path_buf())),
        Ok(_) => {}
        Err(_) => fs::create_dir_all(dir).map_err(unwritable)?,
    }
    NamedTempFile::new_in(dir).map_err(unwritable)?;
    Ok(())
}

/// Places finished books in the output directory. A book appears under its
/// final name only once it is complete; an older book of the same name is
/// replaced.
#[derive(Debug, Clone)]
pub struct BookWriter {
    dir: PathBuf,
}

impl BookWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, file_name: &str, book: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let path = self.dir.join(file_name);
        let failed = |source| PersistError::Write {
            path: path.clone(),
            source,
        };
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(failed)?;
        staged.write_all(book).map_err(failed)?;
        staged.as_file().sync_all().map_err(failed)?;
        staged.persist(&path).map_err(|err| failed(err.error))?;
        Ok(path)
    }
}
