//! Sequential download of several sources into one area of interest

use gpq_core::models::{AcquisitionJob, AreaOfInterest, OutputTarget, SourceProfile};
use gpq_core::ports::QueryEngine;
use std::collections::VecDeque;
use std::path::PathBuf;

use crate::events::JobContext;
use crate::worker::{AcquisitionOutcome, AcquisitionWorker};

/// One source waiting in the queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub url: String,
    pub output: OutputTarget,
    pub profile: SourceProfile,
    pub label: Option<String>,
}

impl QueueEntry {
    pub fn new(url: impl Into<String>, output: OutputTarget, profile: SourceProfile) -> Self {
        Self { url: url.into(), output, profile, label: None }
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }
}

/// Where the queue stopped
#[derive(Debug, Clone, PartialEq)]
pub enum QueueStatus {
    /// Every entry was processed
    Drained,
    /// A size warning needs acknowledgment; `remaining[0]` raised it
    Paused { estimated_mb: f64, remaining: Vec<QueueEntry> },
    /// An entry failed; later entries were not started
    Stopped { url: String, message: String },
    Killed,
}

/// Summary of one queue run
#[derive(Debug, Clone, PartialEq)]
pub struct QueueReport {
    pub completed: Vec<PathBuf>,
    /// Sources with no rows in the area of interest
    pub skipped: Vec<String>,
    pub status: QueueStatus,
}

/// Ordered set of downloads sharing one area of interest
#[derive(Debug, Clone, Default)]
pub struct DownloadQueue {
    entries: VecDeque<QueueEntry>,
    area_of_interest: Option<AreaOfInterest>,
    acknowledge_first: bool,
}

impl DownloadQueue {
    pub fn new(area_of_interest: Option<AreaOfInterest>) -> Self {
        Self { entries: VecDeque::new(), area_of_interest, acknowledge_first: false }
    }

    /// Continue a paused queue with its size warning accepted
    pub fn resume(remaining: Vec<QueueEntry>, area_of_interest: Option<AreaOfInterest>) -> Self {
        Self { entries: remaining.into(), area_of_interest, acknowledge_first: true }
    }

    pub fn push(&mut self, entry: QueueEntry) {
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Process entries in order until drained, paused, stopped or killed
    pub fn run<E: QueryEngine>(mut self, worker: &AcquisitionWorker<E>, ctx: &JobContext) -> QueueReport {
        let mut completed = Vec::new();
        let mut skipped = Vec::new();
        let mut acknowledge = self.acknowledge_first;

        while let Some(entry) = self.entries.pop_front() {
            if ctx.is_killed() {
                return QueueReport { completed, skipped, status: QueueStatus::Killed };
            }

            let mut job = AcquisitionJob::new(
                entry.url.clone(),
                self.area_of_interest.clone(),
                entry.output.clone(),
                entry.profile.clone(),
            );
            if let Some(label) = &entry.label {
                job = job.with_label(label.clone());
            }
            if std::mem::take(&mut acknowledge) {
                job = job.acknowledge_size_warning();
            }

            tracing::info!("Queue: {} ({} remaining)", entry.url, self.entries.len());
            let status = match worker.run(&job, &ctx.child(job.id)) {
                AcquisitionOutcome::Completed { path, .. } => {
                    completed.push(path);
                    continue;
                }
                AcquisitionOutcome::NoData => {
                    skipped.push(entry.url);
                    continue;
                }
                AcquisitionOutcome::SizeWarning { estimated_mb } => {
                    let mut remaining = vec![entry];
                    remaining.extend(self.entries.drain(..));
                    QueueStatus::Paused { estimated_mb, remaining }
                }
                AcquisitionOutcome::Failed { message } => QueueStatus::Stopped { url: entry.url, message },
                AcquisitionOutcome::Killed => QueueStatus::Killed,
            };
            return QueueReport { completed, skipped, status };
        }

        QueueReport { completed, skipped, status: QueueStatus::Drained }
    }
}
