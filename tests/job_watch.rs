//! Job watching over the polling transport, with the metrics reader attached.

mod common;

use std::rc::Rc;

use common::{FakeBackend, job};
use labeldesk::config::JobsConfig;
use labeldesk::error::MonitorError;
use labeldesk::job::{JobEvent, JobStatus, JobWatcher, MetricsReader, MetricsState, SourceKind};
use labeldesk_api::Session;
use labeldesk_api::types::LiveCsv;
use tokio_util::sync::CancellationToken;

fn polling() -> JobsConfig {
    JobsConfig {
        prefer_push: false,
        ..JobsConfig::default()
    }
}

fn session() -> Session {
    Session::new("http://localhost:8000", "alice")
}

fn results(epoch: u32) -> LiveCsv {
    LiveCsv {
        columns: vec!["epoch".into(), "metrics/mAP50(B)".into()],
        rows: vec![vec![epoch.to_string(), "0.42".into()]],
        job_rel_path: Some("runs/train".into()),
        updated_at: None,
    }
}

#[tokio::test(start_paused = true)]
async fn training_job_runs_to_success_with_metrics() {
    let backend = Rc::new(FakeBackend::default());
    backend.jobs.borrow_mut().extend([
        Ok(job(8, "queued", 0.0)),
        Ok(job(8, "running", 0.25)),
        Ok(job(8, "running", 0.5)),
        Ok(job(8, "running", 0.75)),
        Ok(job(8, "success", 1.0)),
        // Never read: the watch stops at the terminal status
        Ok(job(8, "failed", 1.0)),
    ]);
    backend
        .metrics
        .borrow_mut()
        .extend([Err(404), Ok(results(1)), Ok(results(2))]);

    let mut watcher = JobWatcher::new(Rc::clone(&backend), session(), 8, &polling());
    let mut reader = MetricsReader::new(Rc::clone(&backend), 8, 15);
    let status = watcher.subscribe();
    let cancel = CancellationToken::new();

    let mut events = Vec::new();
    let mut tables = Vec::new();
    let watch = async {
        let result = watcher.run(cancel.clone(), |e| events.push(e)).await;
        cancel.cancel();
        result
    };
    let follow = reader.follow(
        JobsConfig::default().metrics_interval(),
        status,
        cancel.clone(),
        |state| tables.push(state.clone()),
    );
    let (result, ()) = tokio::join!(watch, follow);

    let job = result.expect("job finished");
    assert_eq!(job.status, JobStatus::Success);
    assert_eq!(job.progress, 1.0);
    assert_eq!(backend.job_polls.get(), 5);
    assert_eq!(backend.jobs.borrow().len(), 1);

    assert_eq!(events[0], JobEvent::SourceChanged(SourceKind::Poll));
    let finished: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, JobEvent::Finished(_)))
        .collect();
    assert_eq!(finished.len(), 1);
    assert!(matches!(events.last(), Some(JobEvent::Finished(_))));

    assert_eq!(tables.first(), Some(&MetricsState::Pending));
    assert!(tables.contains(&MetricsState::Ready(results(1))));
    assert_eq!(reader.state(), tables.last().expect("metrics polled"));
}

#[tokio::test(start_paused = true)]
async fn transient_poll_failures_are_reported_and_survived() {
    let backend = Rc::new(FakeBackend::default());
    backend.jobs.borrow_mut().extend([
        Ok(job(4, "running", 0.1)),
        Err(503),
        Err(502),
        Ok(job(4, "failed", 0.3)),
    ]);

    let mut watcher = JobWatcher::new(Rc::clone(&backend), session(), 4, &polling());
    let mut errors = 0;
    let job = watcher
        .run(CancellationToken::new(), |e| {
            if let JobEvent::Error(reason) = e {
                assert!(reason.contains("job error"));
                errors += 1;
            }
        })
        .await
        .expect("failed is still a terminal status");

    assert_eq!(errors, 2);
    assert_eq!(job.status, JobStatus::Failed);
    assert!(watcher.monitor().is_finished());
    assert!(watcher.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn unknown_status_strings_are_skipped() {
    let backend = Rc::new(FakeBackend::default());
    backend.jobs.borrow_mut().extend([
        Ok(job(2, "paused", 0.1)),
        Ok(job(2, "running", 1.4)),
        Ok(job(2, "done", 1.0)),
    ]);

    let mut watcher = JobWatcher::new(Rc::clone(&backend), session(), 2, &polling());
    let mut progress = Vec::new();
    let job = watcher
        .run(CancellationToken::new(), |e| {
            if let JobEvent::Updated(job) = e {
                progress.push(job.progress);
            }
        })
        .await
        .expect("job finished");

    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(progress, vec![1.0]);
}

#[tokio::test(start_paused = true)]
async fn missing_job_is_an_error() {
    let backend = Rc::new(FakeBackend::default());
    backend.jobs.borrow_mut().push_back(Err(404));
    let mut watcher = JobWatcher::new(Rc::clone(&backend), session(), 12, &polling());
    let result = watcher.run(CancellationToken::new(), |_| {}).await;
    assert!(matches!(result, Err(MonitorError::NotFound(12))));
}
