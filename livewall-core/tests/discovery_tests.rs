// livewall-core/tests/discovery_tests.rs

use livewall_core::discovery::{collect_inputs, find_processable_files};
use livewall_core::error::CoreError;
use std::fs::{self, File};
use std::path::PathBuf;
use tempfile::tempdir;

fn write_file(path: &std::path::Path) -> std::io::Result<()> {
    fs::write(path, b"not really a video")
}

#[test]
fn test_find_processable_files_top_level() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input_dir = dir.path();

    write_file(&input_dir.join("b_clip.mp4"))?;
    write_file(&input_dir.join("a_clip.MOV"))?; // case insensitive
    write_file(&input_dir.join("document.txt"))?;
    File::create(input_dir.join("empty.mp4"))?; // zero bytes, left for ffprobe to reject
    fs::create_dir(input_dir.join("subdir"))?;
    write_file(&input_dir.join("subdir").join("nested.mkv"))?;

    let files = find_processable_files(input_dir, false)?;
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a_clip.MOV", "b_clip.mp4", "empty.mp4"]);

    dir.close()?;
    Ok(())
}

#[test]
fn test_find_processable_files_recursive() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input_dir = dir.path();

    write_file(&input_dir.join("top.mp4"))?;
    fs::create_dir_all(input_dir.join("deep").join("er"))?;
    write_file(&input_dir.join("deep").join("er").join("nested.webm"))?;

    let files = find_processable_files(input_dir, true)?;
    assert_eq!(files.len(), 2);
    assert!(files.iter().any(|p| p.ends_with("deep/er/nested.webm")));

    dir.close()?;
    Ok(())
}

#[test]
fn test_find_processable_files_empty() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_file(&dir.path().join("document.txt"))?;

    match find_processable_files(dir.path(), false) {
        Err(CoreError::NoFilesFound) => {}
        other => panic!("Unexpected result: {other:?}"),
    }
    Ok(())
}

#[test]
fn test_find_processable_files_nonexistent_dir() {
    let missing = PathBuf::from("surely_this_does_not_exist_42_integration");
    match find_processable_files(&missing, false) {
        Err(CoreError::Walkdir(_)) => {}
        other => panic!("Unexpected result: {other:?}"),
    }
}

#[test]
fn test_collect_inputs_preserves_order_and_dedups() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let folder = dir.path().join("folder");
    fs::create_dir(&folder)?;
    write_file(&folder.join("x.mp4"))?;
    write_file(&folder.join("y.mp4"))?;
    let single = dir.path().join("single.mkv");
    write_file(&single)?;

    let inputs = vec![single.clone(), folder.clone(), folder.join("x.mp4")];
    let files = collect_inputs(&inputs, false)?;
    assert_eq!(files, vec![single, folder.join("x.mp4"), folder.join("y.mp4")]);
    Ok(())
}

#[test]
fn test_collect_inputs_missing_path() {
    let inputs = vec![PathBuf::from("/definitely/not/here.mp4")];
    assert!(matches!(
        collect_inputs(&inputs, false),
        Err(CoreError::PathError(_))
    ));
}
