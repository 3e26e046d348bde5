use std::fs;

use fastmusic_engine::{ensure_output_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("downloads").join("music");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn save_writes_bytes_under_requested_name() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let path = writer.save("Artist - Song.mp3", b"ID3data").unwrap();
    assert_eq!(path.file_name().unwrap(), "Artist - Song.mp3");
    assert_eq!(fs::read(&path).unwrap(), b"ID3data");
}

#[test]
fn save_never_overwrites_existing_files() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.save("song.mp3", b"one").unwrap();
    let second = writer.save("song.mp3", b"two").unwrap();
    let third = writer.save("song.mp3", b"three").unwrap();

    assert_eq!(first.file_name().unwrap(), "song.mp3");
    assert_eq!(second.file_name().unwrap(), "song (1).mp3");
    assert_eq!(third.file_name().unwrap(), "song (2).mp3");
    assert_eq!(fs::read(&first).unwrap(), b"one");
    assert_eq!(fs::read(&third).unwrap(), b"three");
}

#[test]
fn no_stray_temp_files_after_save() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());
    writer.save("a.mp3", b"a").unwrap();
    writer.save("a.mp3", b"b").unwrap();

    let mut names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a (1).mp3".to_string(), "a.mp3".to_string()]);
}

#[test]
fn output_path_that_is_a_file_fails_cleanly() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.save("song.mp3", b"data").is_err());
    assert!(!file_path.with_file_name("song.mp3").exists());
}
