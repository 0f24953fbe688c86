use std::sync::Arc;

use tonearm::application::ports::{JobStore, JobStoreError, job_update};
use tonearm::domain::{AudioQuality, ConversionRequest, JobFailure, JobId, JobStatus, SourceUrl};
use tonearm::infrastructure::persistence::InMemoryJobStore;

fn request() -> ConversionRequest {
    ConversionRequest::new(
        SourceUrl::parse("https://youtu.be/abc123").unwrap(),
        AudioQuality::default(),
    )
}

#[tokio::test]
async fn given_created_job_when_fetched_then_pending_snapshot_is_returned() {
    let store = InMemoryJobStore::new();

    let created = store.create(request()).await.unwrap();
    let fetched = store.get(created.id).await.unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.status(), JobStatus::Pending);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn given_unknown_id_when_fetched_then_not_found() {
    let store = InMemoryJobStore::new();

    let result = store.get(JobId::new()).await;

    assert!(matches!(result, Err(JobStoreError::NotFound(_))));
}

#[tokio::test]
async fn given_snapshot_when_store_changes_then_snapshot_is_unaffected() {
    let store = InMemoryJobStore::new();
    let snapshot = store.create(request()).await.unwrap();

    store
        .mutate(snapshot.id, job_update(|job| job.start_processing()))
        .await
        .unwrap();

    assert_eq!(snapshot.status(), JobStatus::Pending);
    assert_eq!(
        store.get(snapshot.id).await.unwrap().status(),
        JobStatus::Processing
    );
}

#[tokio::test]
async fn given_rejected_transition_when_mutating_then_record_is_unchanged() {
    let store = InMemoryJobStore::new();
    let job = store.create(request()).await.unwrap();

    let result = store
        .mutate(
            job.id,
            job_update(|job| {
                job.progress = "half written".to_string();
                job.fail(JobFailure::NoOutputProduced)
            }),
        )
        .await;

    assert!(matches!(result, Err(JobStoreError::Transition(_))));
    let stored = store.get(job.id).await.unwrap();
    assert_eq!(stored.status(), JobStatus::Pending);
    assert_eq!(stored.progress, "Queued");
}

#[tokio::test]
async fn given_existing_job_when_deleted_twice_then_only_first_caller_gets_it() {
    let store = InMemoryJobStore::new();
    let job = store.create(request()).await.unwrap();

    assert!(store.delete(job.id).await.is_some());
    assert!(store.delete(job.id).await.is_none());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn given_concurrent_deletes_when_racing_then_exactly_one_wins() {
    let store = Arc::new(InMemoryJobStore::new());
    let job = store.create(request()).await.unwrap();

    let attempts = (0..8).map(|_| {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.delete(job.id).await.is_some() })
    });
    let winners = futures::future::join_all(attempts)
        .await
        .into_iter()
        .filter(|won| *won.as_ref().unwrap())
        .count();

    assert_eq!(winners, 1);
}

#[tokio::test]
async fn given_concurrent_updates_to_one_job_when_applied_then_none_are_lost() {
    let store = Arc::new(InMemoryJobStore::new());
    let job = store.create(request()).await.unwrap();

    let updates = (0..20).map(|i| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .mutate(
                    job.id,
                    job_update(move |job| {
                        job.progress.push_str(&format!(" {}", i));
                        Ok(())
                    }),
                )
                .await
                .unwrap();
        })
    });
    futures::future::join_all(updates).await;

    let progress = store.get(job.id).await.unwrap().progress;
    assert_eq!(progress.split_whitespace().count(), 21);
}

#[tokio::test]
async fn given_several_jobs_when_listed_then_all_are_returned() {
    let store = InMemoryJobStore::new();
    for _ in 0..3 {
        store.create(request()).await.unwrap();
    }

    assert_eq!(store.list().await.len(), 3);
}
