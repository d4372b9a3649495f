//! Per-job progress channel and cancellation context

use gpq_core::error::GpqError;
use gpq_core::models::{JobId, SourceProfile};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// What a job reports to its caller
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Human-readable stage text
    Progress(String),
    /// Non-fatal notice, e.g. no rows in the requested area
    Info(String),
    /// The source has no bbox column; filtering uses full geometry intersection
    NeedsBboxWarning,
    /// Inspection result
    Validated {
        success: bool,
        message: String,
        profile: SourceProfile,
    },
    /// Output file is ready to be opened
    LoadLayer(PathBuf),
    /// Estimated output size in MB exceeds the threshold
    SizeWarning(f64),
    /// Raw failure text
    Error(String),
    Finished,
}

/// One event tagged with the job that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct JobEvent {
    pub job_id: JobId,
    pub kind: EventKind,
}

/// Sending half of a job's bounded event channel
#[derive(Debug, Clone)]
pub struct ProgressSink {
    sender: Option<mpsc::Sender<JobEvent>>,
}

impl ProgressSink {
    /// Create a bounded channel; the receiver stays with the caller
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<JobEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender: Some(sender) }, receiver)
    }

    /// Sink that drops every event
    pub fn discard() -> Self {
        Self { sender: None }
    }

    /// Blocks while the channel is full. Must not be called from async code.
    fn send(&self, event: JobEvent) {
        if let Some(sender) = &self.sender {
            if sender.blocking_send(event).is_err() {
                tracing::debug!("Event receiver dropped");
            }
        }
    }
}

/// Handle passed into a running job: identity, kill flag and event sink
#[derive(Debug, Clone)]
pub struct JobContext {
    id: JobId,
    cancel: CancellationToken,
    sink: ProgressSink,
}

impl JobContext {
    pub fn new(id: JobId, sink: ProgressSink) -> Self {
        Self { id, cancel: CancellationToken::new(), sink }
    }

    /// Share an existing token, e.g. a child token of a queue
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Context for a sub-job: same sink, new id, child cancellation token
    pub fn child(&self, id: JobId) -> Self {
        Self { id, cancel: self.cancel.child_token(), sink: self.sink.clone() }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Request cooperative cancellation
    pub fn kill(&self) {
        self.cancel.cancel();
    }

    pub fn is_killed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Send an event unless the job has been killed
    pub fn emit(&self, kind: EventKind) {
        if self.is_killed() {
            tracing::debug!("Job {} killed, suppressing {:?}", self.id, kind);
            return;
        }
        self.sink.send(JobEvent { job_id: self.id, kind });
    }

    pub fn progress(&self, message: impl Into<String>) {
        self.emit(EventKind::Progress(message.into()));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(EventKind::Info(message.into()));
    }
}

/// Why a stage stopped early
#[derive(Debug)]
pub(crate) enum Interrupt {
    Killed,
    Error(GpqError),
}

impl From<GpqError> for Interrupt {
    fn from(err: GpqError) -> Self {
        Interrupt::Error(err)
    }
}

impl JobContext {
    /// Stage boundary: stop here if the job was killed
    pub(crate) fn checkpoint(&self) -> Result<(), Interrupt> {
        if self.is_killed() {
            Err(Interrupt::Killed)
        } else {
            Ok(())
        }
    }
}

/// Drain everything currently buffered on a receiver
pub fn drain(receiver: &mut mpsc::Receiver<JobEvent>) -> Vec<JobEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
