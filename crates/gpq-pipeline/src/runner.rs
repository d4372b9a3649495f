//! Runs jobs off the caller's event loop

use gpq_core::error::{GpqError, Result};
use gpq_core::models::{AcquisitionJob, JobId};
use gpq_core::ports::QueryEngine;
use gpq_core::presets::PresetCatalog;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::{JobContext, JobEvent, ProgressSink};
use crate::inspector::{Inspection, SourceInspector};
use crate::queue::{DownloadQueue, QueueReport};
use crate::worker::{AcquisitionOutcome, AcquisitionWorker, WorkerSettings};

/// A running job: its events, its kill switch and its result
pub struct JobHandle<T> {
    id: JobId,
    cancel: CancellationToken,
    events: mpsc::Receiver<JobEvent>,
    task: JoinHandle<T>,
}

impl<T> JobHandle<T> {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Request cooperative cancellation
    pub fn kill(&self) {
        self.cancel.cancel();
    }

    /// Next event, or `None` once the job has dropped its sink
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Wait for the result, discarding unread events
    pub async fn join(self) -> Result<T> {
        drop(self.events);
        self.task
            .await
            .map_err(|e| GpqError::engine(format!("Job task failed: {}", e)))
    }

    /// Read every event, then wait for the result
    pub async fn collect(mut self) -> Result<(T, Vec<JobEvent>)> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        let result = self.join().await?;
        Ok((result, events))
    }
}

/// Spawns inspections, acquisitions and queues on blocking threads.
///
/// Each job gets its own engine connection and event channel.
pub struct JobRunner<E> {
    engine: E,
    catalog: Arc<PresetCatalog>,
    settings: WorkerSettings,
    event_buffer: usize,
}

impl<E> JobRunner<E>
where
    E: QueryEngine + Clone + 'static,
{
    pub fn new(engine: E, catalog: Arc<PresetCatalog>, settings: WorkerSettings, event_buffer: usize) -> Self {
        Self { engine, catalog, settings, event_buffer }
    }

    /// Inspect a source; the result is `None` when killed
    pub fn spawn_inspection(&self, url: impl Into<String>) -> JobHandle<Option<Inspection>> {
        let url = url.into();
        let inspector = SourceInspector::new(self.engine.clone(), Arc::clone(&self.catalog));
        self.spawn(JobId::new(), move |ctx| inspector.inspect(&url, &ctx))
    }

    /// Run one acquisition job
    pub fn spawn_acquisition(&self, job: AcquisitionJob) -> JobHandle<AcquisitionOutcome> {
        let worker = AcquisitionWorker::new(self.engine.clone(), self.settings);
        self.spawn(job.id, move |ctx| worker.run(&job, &ctx))
    }

    /// Run a download queue; each entry's events carry its own job id
    pub fn spawn_queue(&self, queue: DownloadQueue) -> JobHandle<QueueReport> {
        let worker = AcquisitionWorker::new(self.engine.clone(), self.settings);
        self.spawn(JobId::new(), move |ctx| queue.run(&worker, &ctx))
    }

    fn spawn<T, F>(&self, id: JobId, work: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(JobContext) -> T + Send + 'static,
    {
        let (sink, events) = ProgressSink::channel(self.event_buffer);
        let ctx = JobContext::new(id, sink);
        let cancel = ctx.cancellation().clone();

        let task = tokio::task::spawn_blocking(move || work(ctx));
        JobHandle { id, cancel, events, task }
    }
}
