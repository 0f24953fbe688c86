use std::time::Duration;

use tonearm::application::ports::JobStore;
use tonearm::domain::{JobFailure, JobStatus};

use crate::helpers::{FakeBehavior, FakeProcessRunner, PAYLOAD, TestService, VALID_URL};

#[tokio::test]
async fn given_successful_tool_when_job_runs_then_completed_with_metadata() {
    let service = TestService::new(FakeProcessRunner::converting());

    let job = service.completed_job().await;

    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.progress, "Ready for download");
    let output = job.output().unwrap();
    assert_eq!(output.metadata.title, "Test Track");
    assert_eq!(output.metadata.artist, "Test Artist");
    assert_eq!(output.metadata.duration_secs, 212);
    assert_eq!(output.file_size, PAYLOAD.len() as u64);
    assert!(!output.metadata_placeholder);
    assert!(output.file_path.starts_with(job.output_dir().unwrap()));
    assert!(output.file_path.is_file());
}

#[tokio::test]
async fn given_tool_without_metadata_line_when_job_runs_then_placeholders_are_flagged() {
    let service = TestService::new(FakeProcessRunner::new(FakeBehavior::Convert {
        info_line: None,
    }));

    let job = service.completed_job().await;

    let output = job.output().unwrap();
    assert_eq!(output.metadata.title, "Unknown");
    assert_eq!(output.metadata.artist, "Unknown");
    assert_eq!(output.metadata.duration_secs, 0);
    assert!(output.metadata_placeholder);
}

#[tokio::test]
async fn given_unparseable_metadata_line_when_job_runs_then_still_completed() {
    let service = TestService::new(FakeProcessRunner::new(FakeBehavior::Convert {
        info_line: Some("{not json".to_string()),
    }));

    let job = service.completed_job().await;

    assert_eq!(job.status(), JobStatus::Completed);
    assert!(job.output().unwrap().metadata_placeholder);
}

#[tokio::test]
async fn given_tool_exits_nonzero_when_job_runs_then_failed_with_truncated_diagnostic() {
    let stderr = format!("{}ERROR: Video unavailable", "noise ".repeat(200));
    let service = TestService::new(FakeProcessRunner::new(FakeBehavior::Fail {
        exit_code: 1,
        stderr,
    }));

    let job = service.completed_job().await;

    assert_eq!(job.status(), JobStatus::Failed);
    assert!(job.output().is_none());
    match job.failure().unwrap() {
        JobFailure::ToolFailure {
            exit_code,
            diagnostic,
        } => {
            assert_eq!(*exit_code, Some(1));
            assert!(diagnostic.chars().count() <= 500);
            assert!(diagnostic.ends_with("ERROR: Video unavailable"));
        }
        other => panic!("unexpected failure {:?}", other),
    }
}

#[tokio::test]
async fn given_tool_exceeds_timeout_when_job_runs_then_failed_as_timed_out() {
    let service = TestService::with_settings(
        FakeProcessRunner::converting().with_delay(Duration::from_secs(3600)),
        |jobs| jobs.conversion_timeout_secs = 1,
    );

    let job = service.completed_job().await;

    assert_eq!(job.status(), JobStatus::Failed);
    assert_eq!(
        job.failure(),
        Some(&JobFailure::TimedOut {
            after: Duration::from_secs(1)
        })
    );
}

#[tokio::test]
async fn given_tool_writes_nothing_when_job_runs_then_failed_without_output() {
    let service = TestService::new(FakeProcessRunner::new(FakeBehavior::NoOutput));

    let job = service.completed_job().await;

    assert_eq!(job.failure(), Some(&JobFailure::NoOutputProduced));
    assert_eq!(
        job.failure().unwrap().to_string(),
        "conversion failed - no output file"
    );
}

#[tokio::test]
async fn given_tool_renames_output_when_job_runs_then_matching_file_is_found() {
    let service = TestService::new(FakeProcessRunner::new(FakeBehavior::ConvertRenamed {
        file_name: "Test Track.MP3".to_string(),
    }));

    let job = service.completed_job().await;

    assert_eq!(job.status(), JobStatus::Completed);
    let output = job.output().unwrap();
    assert!(output.file_path.ends_with("Test Track.MP3"));
    assert_eq!(output.file_size, PAYLOAD.len() as u64);
}

#[tokio::test]
async fn given_more_jobs_than_slots_when_submitted_then_conversions_never_overlap() {
    let service = TestService::new(
        FakeProcessRunner::converting().with_delay(Duration::from_millis(40)),
    );

    let mut handles = Vec::new();
    for _ in 0..4 {
        let submission = service
            .state
            .conversion_service
            .submit(VALID_URL, None)
            .await
            .unwrap();
        handles.push(submission.handle);
    }
    for handle in handles {
        assert_eq!(handle.wait().await, JobStatus::Completed);
    }

    assert_eq!(service.runner.calls(), 4);
    assert_eq!(service.runner.max_running(), 1);
}

#[tokio::test]
async fn given_two_conversion_slots_when_jobs_queue_then_at_most_two_overlap() {
    let service = TestService::with_settings(
        FakeProcessRunner::converting().with_delay(Duration::from_millis(40)),
        |jobs| jobs.conversion_slots = 2,
    );

    let mut handles = Vec::new();
    for _ in 0..5 {
        let submission = service
            .state
            .conversion_service
            .submit(VALID_URL, None)
            .await
            .unwrap();
        handles.push(submission.handle);
    }
    for handle in handles {
        handle.wait().await;
    }

    assert!(service.runner.max_running() <= 2);
}

#[tokio::test]
async fn given_failed_job_when_next_job_runs_then_slot_was_released() {
    let service = TestService::with_settings(
        FakeProcessRunner::new(FakeBehavior::NoOutput),
        |_| {},
    );

    let first = service.completed_job().await;
    let second = tokio::time::timeout(Duration::from_secs(2), service.completed_job())
        .await
        .expect("second job must not wait on a leaked slot");

    assert_eq!(first.status(), JobStatus::Failed);
    assert_eq!(second.status(), JobStatus::Failed);
}

#[tokio::test]
async fn given_streaming_tool_when_job_waits_then_progress_is_forwarded() {
    let service = TestService::new(
        FakeProcessRunner::converting().with_delay(Duration::from_millis(300)),
    );
    let submission = service
        .state
        .conversion_service
        .submit(VALID_URL, None)
        .await
        .unwrap();
    let id = submission.job.id;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    let mut seen = String::new();
    while tokio::time::Instant::now() < deadline {
        seen = service.store.get(id).await.unwrap().progress;
        if seen.starts_with("[download]") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(seen.contains("50.0%"), "progress was {:?}", seen);

    assert_eq!(submission.handle.wait().await, JobStatus::Completed);
    let job = service.store.get(id).await.unwrap();
    assert_eq!(job.progress, "Ready for download");
}

fn is_converting(progress: &str) -> bool {
    progress == "Converting" || progress.starts_with("[download]")
}

async fn running_job_dir(service: &TestService, id: tonearm::domain::JobId) -> std::path::PathBuf {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let job = service.store.get(id).await.unwrap();
        if let Some(dir) = job.output_dir()
            && is_converting(&job.progress)
        {
            return dir.to_path_buf();
        }
        assert!(tokio::time::Instant::now() < deadline, "job never started converting");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn given_job_expired_mid_conversion_when_tool_recreates_output_then_runner_removes_it() {
    let service = TestService::new(
        FakeProcessRunner::converting().with_delay(Duration::from_millis(300)),
    );
    let submission = service
        .state
        .conversion_service
        .submit(VALID_URL, None)
        .await
        .unwrap();
    let id = submission.job.id;
    let dir = running_job_dir(&service, id).await;

    let reclaimed = service
        .sweeper
        .sweep_at(chrono::Utc::now() + chrono::Duration::hours(2))
        .await;
    assert_eq!(reclaimed, 1);
    assert!(!dir.exists());

    let status = submission.handle.wait().await;

    assert_eq!(status, JobStatus::Failed);
    assert!(service.store.get(id).await.is_err());
    assert!(!dir.exists(), "{} was recreated and left behind", dir.display());
}

#[tokio::test]
async fn given_job_expired_mid_conversion_when_tool_fails_then_nothing_is_left_behind() {
    let service = TestService::new(
        FakeProcessRunner::new(FakeBehavior::Fail {
            exit_code: 1,
            stderr: "ERROR: interrupted".to_string(),
        })
        .with_delay(Duration::from_millis(300)),
    );
    let submission = service
        .state
        .conversion_service
        .submit(VALID_URL, None)
        .await
        .unwrap();
    let id = submission.job.id;
    let dir = running_job_dir(&service, id).await;

    service
        .sweeper
        .sweep_at(chrono::Utc::now() + chrono::Duration::hours(2))
        .await;
    let status = submission.handle.wait().await;

    assert_eq!(status, JobStatus::Failed);
    assert!(!dir.exists());
    let leftovers = std::fs::read_dir(service.scratch_root()).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn given_job_queued_behind_busy_slot_when_polled_then_it_reports_waiting() {
    let service = TestService::new(
        FakeProcessRunner::converting().with_delay(Duration::from_millis(300)),
    );
    let first = service
        .state
        .conversion_service
        .submit(VALID_URL, None)
        .await
        .unwrap();
    running_job_dir(&service, first.job.id).await;

    let second = service
        .state
        .conversion_service
        .submit(VALID_URL, None)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let queued = service.store.get(second.job.id).await.unwrap();
    assert_eq!(queued.status(), JobStatus::Processing);
    assert_eq!(queued.progress, "Waiting for conversion slot");
    let converting = service
        .store
        .list()
        .await
        .into_iter()
        .filter(|job| is_converting(&job.progress))
        .count();
    assert_eq!(converting, 1);

    assert_eq!(first.handle.wait().await, JobStatus::Completed);
    assert_eq!(second.handle.wait().await, JobStatus::Completed);
}
