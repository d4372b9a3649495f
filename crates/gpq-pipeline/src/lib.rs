//! Acquisition pipeline: inspection, query planning and download jobs

pub mod detect;
pub mod estimate;
pub mod events;
pub mod inspector;
pub mod query;
pub mod queue;
pub mod runner;
pub mod worker;

pub use events::{drain, EventKind, JobContext, JobEvent, ProgressSink};
pub use inspector::{Inspection, SourceInspector};
pub use query::{QueryBuilder, INTERMEDIATE_TABLE};
pub use queue::{DownloadQueue, QueueEntry, QueueReport, QueueStatus};
pub use runner::{JobHandle, JobRunner};
pub use worker::{AcquisitionOutcome, AcquisitionWorker, WorkerSettings};
