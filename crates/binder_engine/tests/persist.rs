use std::fs;

use binder_engine::{ensure_output_dir, BookWriter, PersistError};
use tempfile::TempDir;

#[test]
fn nested_output_dir_is_created() {
    let temp = TempDir::new().unwrap();
    let books = temp.path().join("books").join("tamil");

    ensure_output_dir(&books).unwrap();
    assert!(books.is_dir());
}

#[test]
fn a_file_in_place_of_the_output_dir_is_refused() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("books");
    fs::write(&blocker, "x").unwrap();

    let err = ensure_output_dir(&blocker).unwrap_err();
    assert!(matches!(err, PersistError::NotADirectory(ref p) if p == &blocker));

    let err = BookWriter::new(blocker.clone())
        .write("nila.epub", b"data")
        .unwrap_err();
    assert!(matches!(err, PersistError::NotADirectory(_)));
    assert!(!temp.path().join("nila.epub").exists());
}

#[test]
fn binding_the_same_series_again_replaces_the_book() {
    let temp = TempDir::new().unwrap();
    let writer = BookWriter::new(temp.path().to_path_buf());

    let first = writer.write("nila.epub", b"first edition").unwrap();
    let second = writer.write("nila.epub", b"second edition").unwrap();

    assert_eq!(first, temp.path().join("nila.epub"));
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"second edition");

    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["nila.epub"]);
}
