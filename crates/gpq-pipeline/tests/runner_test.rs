//! Spawned jobs and download queues

use gpq_core::models::{
    AcquisitionJob, AreaOfInterest, BoundingBox, Column, JobId, OutputTarget, SourceProfile,
};
use gpq_core::presets::PresetCatalog;
use gpq_engine::{MemoryDataset, MemoryEngine};
use gpq_pipeline::{
    drain, AcquisitionOutcome, AcquisitionWorker, DownloadQueue, EventKind, JobContext, JobRunner,
    ProgressSink, QueueEntry, QueueStatus, WorkerSettings,
};
use std::path::PathBuf;
use std::sync::Arc;

const BBOX_STRUCT: &str = "STRUCT(xmin DOUBLE, ymin DOUBLE, xmax DOUBLE, ymax DOUBLE)";

fn aoi() -> AreaOfInterest {
    AreaOfInterest::canonical(BoundingBox::new(-122.5, 37.7, -122.4, 37.8).unwrap())
}

fn dataset(points: &[(f64, f64)]) -> MemoryDataset {
    MemoryDataset::new(vec![Column::new("geometry", "GEOMETRY"), Column::new("bbox", BBOX_STRUCT)])
        .with_points(points)
}

fn runner(engine: MemoryEngine, settings: WorkerSettings) -> JobRunner<MemoryEngine> {
    JobRunner::new(engine, Arc::new(PresetCatalog::empty()), settings, 16)
}

fn entry(url: &str, output: &str) -> QueueEntry {
    QueueEntry::new(url, OutputTarget::new(output), SourceProfile::fallback())
}

#[tokio::test]
async fn test_spawned_inspection_reports_profile() {
    let engine = MemoryEngine::new().with_dataset("https://x/a.parquet", dataset(&[]));
    let handle = runner(engine, WorkerSettings::default()).spawn_inspection("https://x/a.parquet");
    let id = handle.id();

    let (inspection, events) = handle.collect().await.unwrap();

    let inspection = inspection.unwrap();
    assert!(inspection.profile.has_bbox());
    assert!(events.iter().all(|e| e.job_id == id));
    assert!(matches!(events.last().map(|e| &e.kind), Some(EventKind::Validated { success: true, .. })));
}

#[tokio::test]
async fn test_spawned_acquisition_streams_events() {
    let engine = MemoryEngine::new().with_dataset("https://x/a.parquet", dataset(&[(-122.45, 37.75)]));
    let job = AcquisitionJob::new(
        "https://x/a.parquet",
        Some(aoi()),
        OutputTarget::new("a.fgb"),
        SourceProfile::fallback(),
    );
    let mut handle = runner(engine, WorkerSettings::default()).spawn_acquisition(job);

    let mut last = None;
    while let Some(event) = handle.next_event().await {
        last = Some(event.kind);
    }
    assert_eq!(last, Some(EventKind::Finished));
    assert!(matches!(handle.join().await.unwrap(), AcquisitionOutcome::Completed { .. }));
}

#[tokio::test]
async fn test_concurrent_jobs_use_separate_connections() {
    let engine = MemoryEngine::new()
        .with_dataset("https://x/a.parquet", dataset(&[(-122.45, 37.75)]))
        .with_dataset("https://x/b.parquet", dataset(&[(5.0, 5.0)]));
    let runner = runner(engine.clone(), WorkerSettings::default());

    let a = runner.spawn_acquisition(AcquisitionJob::new(
        "https://x/a.parquet",
        Some(aoi()),
        OutputTarget::new("a.parquet"),
        SourceProfile::fallback(),
    ));
    let b = runner.spawn_acquisition(AcquisitionJob::new(
        "https://x/b.parquet",
        Some(aoi()),
        OutputTarget::new("b.parquet"),
        SourceProfile::fallback(),
    ));

    let (a, _) = a.collect().await.unwrap();
    let (b, _) = b.collect().await.unwrap();
    assert!(matches!(a, AcquisitionOutcome::Completed { .. }));
    assert_eq!(b, AcquisitionOutcome::NoData);
    assert_eq!(engine.log().connections.len(), 2);
}

#[tokio::test]
async fn test_queue_skips_empty_sources() {
    let engine = MemoryEngine::new()
        .with_dataset("https://x/empty.parquet", dataset(&[(5.0, 5.0)]))
        .with_dataset("https://x/full.parquet", dataset(&[(-122.45, 37.75)]));
    let mut queue = DownloadQueue::new(Some(aoi()));
    queue.push(entry("https://x/empty.parquet", "empty.parquet"));
    queue.push(entry("https://x/full.parquet", "full.parquet"));

    let (report, _) = runner(engine, WorkerSettings::default())
        .spawn_queue(queue)
        .collect()
        .await
        .unwrap();

    assert_eq!(report.status, QueueStatus::Drained);
    assert_eq!(report.skipped, vec!["https://x/empty.parquet".to_string()]);
    assert_eq!(report.completed, vec![PathBuf::from("full.parquet")]);
}

#[tokio::test]
async fn test_queue_pauses_on_size_warning_and_resumes() {
    let engine = MemoryEngine::new()
        .with_dataset("https://x/big.parquet", dataset(&[(-122.45, 37.75); 20]).with_feature_bytes(100_000.0))
        .with_dataset("https://x/next.parquet", dataset(&[(-122.45, 37.75)]));
    let settings = WorkerSettings { size_threshold_mb: 1.0, sample_rows: 100 };
    let runner = runner(engine.clone(), settings);

    let mut queue = DownloadQueue::new(Some(aoi()));
    queue.push(entry("https://x/big.parquet", "big.geojson"));
    queue.push(entry("https://x/next.parquet", "next.geojson"));

    let (report, _) = runner.spawn_queue(queue).collect().await.unwrap();
    let QueueStatus::Paused { estimated_mb, remaining } = report.status else {
        panic!("Expected pause, got {:?}", report.status);
    };
    assert!(estimated_mb > 1.0);
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0].url, "https://x/big.parquet");
    assert!(engine.log().exports.is_empty());

    let (report, _) = runner
        .spawn_queue(DownloadQueue::resume(remaining, Some(aoi())))
        .collect()
        .await
        .unwrap();
    assert_eq!(report.status, QueueStatus::Drained);
    assert_eq!(report.completed, vec![PathBuf::from("big.geojson"), PathBuf::from("next.geojson")]);
}

#[tokio::test]
async fn test_queue_stops_on_failure() {
    let engine = MemoryEngine::new()
        .with_dataset("https://x/ok.parquet", dataset(&[(-122.45, 37.75)]))
        .with_dataset("https://x/bad.parquet", MemoryDataset::new(vec![]).failing("HTTP Error: 500"));
    let mut queue = DownloadQueue::new(Some(aoi()));
    queue.push(entry("https://x/ok.parquet", "ok.parquet"));
    queue.push(entry("https://x/bad.parquet", "bad.parquet"));
    queue.push(entry("https://x/ok.parquet", "never.parquet"));

    let (report, _) = runner(engine, WorkerSettings::default())
        .spawn_queue(queue)
        .collect()
        .await
        .unwrap();

    assert_eq!(report.completed, vec![PathBuf::from("ok.parquet")]);
    assert_eq!(
        report.status,
        QueueStatus::Stopped { url: "https://x/bad.parquet".to_string(), message: "HTTP Error: 500".to_string() }
    );
}

#[test]
fn test_killed_queue_stops() {
    let engine = MemoryEngine::new().with_dataset("https://x/a.parquet", dataset(&[(-122.45, 37.75)]));
    let worker = AcquisitionWorker::new(engine.clone(), WorkerSettings::default());
    let mut queue = DownloadQueue::new(Some(aoi()));
    queue.push(entry("https://x/a.parquet", "a.parquet"));

    let (sink, mut rx) = ProgressSink::channel(8);
    let ctx = JobContext::new(JobId::new(), sink);
    ctx.kill();
    let report = queue.run(&worker, &ctx);

    assert_eq!(report.status, QueueStatus::Killed);
    assert!(report.completed.is_empty());
    assert!(drain(&mut rx).is_empty());
    assert!(engine.log().connections.is_empty());
}
