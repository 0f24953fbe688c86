use std::path::Path;

use tempfile::TempDir;
use tonearm::application::ports::{ScratchError, ScratchStorage};
use tonearm::domain::JobId;
use tonearm::infrastructure::storage::LocalScratchStorage;

fn storage() -> (TempDir, LocalScratchStorage) {
    let dir = TempDir::new().unwrap();
    let storage = LocalScratchStorage::new(dir.path().join("jobs")).unwrap();
    (dir, storage)
}

#[tokio::test]
async fn given_job_id_when_allocating_then_directory_is_created_under_root() {
    let (_dir, storage) = storage();
    let job_id = JobId::new();

    let allocated = storage.allocate(job_id).await.unwrap();

    assert!(allocated.is_dir());
    assert!(allocated.starts_with(storage.root()));
    assert!(allocated.ends_with(job_id.to_string()));
}

#[tokio::test]
async fn given_expected_file_when_locating_then_it_is_preferred() {
    let (_dir, storage) = storage();
    let dir = storage.allocate(JobId::new()).await.unwrap();
    std::fs::write(dir.join("a.mp3"), b"a").unwrap();
    std::fs::write(dir.join("audio.mp3"), b"b").unwrap();

    let found = storage
        .locate_output(&dir, &dir.join("audio.mp3"), "mp3")
        .await
        .unwrap();

    assert_eq!(found, Some(dir.join("audio.mp3")));
}

#[tokio::test]
async fn given_renamed_output_when_locating_then_extension_match_is_returned() {
    let (_dir, storage) = storage();
    let dir = storage.allocate(JobId::new()).await.unwrap();
    std::fs::write(dir.join("cover.jpg"), b"jpg").unwrap();
    std::fs::write(dir.join("Song Title.MP3"), b"mp3").unwrap();

    let found = storage
        .locate_output(&dir, &dir.join("audio.mp3"), "mp3")
        .await
        .unwrap();

    assert_eq!(found, Some(dir.join("Song Title.MP3")));
}

#[tokio::test]
async fn given_no_matching_file_when_locating_then_none() {
    let (_dir, storage) = storage();
    let dir = storage.allocate(JobId::new()).await.unwrap();
    std::fs::write(dir.join("audio.webm.part"), b"partial").unwrap();

    let found = storage
        .locate_output(&dir, &dir.join("audio.mp3"), "mp3")
        .await
        .unwrap();
    assert_eq!(found, None);

    let missing = storage.root().join("missing");
    let found = storage
        .locate_output(&missing, &missing.join("audio.mp3"), "mp3")
        .await
        .unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn given_allocated_directory_when_released_twice_then_second_is_noop() {
    let (_dir, storage) = storage();
    let dir = storage.allocate(JobId::new()).await.unwrap();
    std::fs::write(dir.join("audio.mp3"), b"data").unwrap();

    assert!(storage.release(&dir).unwrap());
    assert!(!dir.exists());
    assert!(!storage.release(&dir).unwrap());
}

#[test]
fn given_path_outside_root_when_releasing_then_refused() {
    let (dir, storage) = storage();
    let outside = dir.path().join("elsewhere");
    std::fs::create_dir_all(&outside).unwrap();

    let result = storage.release(&outside);

    assert!(matches!(result, Err(ScratchError::OutsideRoot(_))));
    assert!(outside.exists());
}

#[test]
fn given_root_or_parent_traversal_when_releasing_then_refused() {
    let (_dir, storage) = storage();
    let root = storage.root().to_path_buf();

    assert!(storage.release(&root).is_err());
    assert!(storage.release(&root.join("..").join("jobs")).is_err());
    assert!(root.exists());
}

#[tokio::test]
async fn given_written_file_when_sizing_then_length_is_reported() {
    let (_dir, storage) = storage();
    let dir = storage.allocate(JobId::new()).await.unwrap();
    let path = dir.join("audio.mp3");
    std::fs::write(&path, vec![0u8; 1234]).unwrap();

    assert_eq!(storage.file_size(Path::new(&path)).await.unwrap(), 1234);
}
