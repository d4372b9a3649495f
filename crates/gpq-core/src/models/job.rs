//! Acquisition jobs and their lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::geometry::AreaOfInterest;
use super::output::OutputTarget;
use super::profile::SourceProfile;

/// Identifier tagging every event a job emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One download of one source into one target.
///
/// Consumed exactly once by the acquisition worker. A size warning is
/// answered by re-submitting a job with the warning acknowledged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionJob {
    pub id: JobId,
    pub source_url: String,
    /// `None` means no spatial filter
    pub area_of_interest: Option<AreaOfInterest>,
    pub output: OutputTarget,
    pub profile: SourceProfile,
    /// Human label appended to progress text, e.g. "Overture Buildings"
    pub label: Option<String>,
    pub size_warning_accepted: bool,
}

impl AcquisitionJob {
    pub fn new(
        source_url: impl Into<String>,
        area_of_interest: Option<AreaOfInterest>,
        output: OutputTarget,
        profile: SourceProfile,
    ) -> Self {
        Self {
            id: JobId::new(),
            source_url: source_url.into(),
            area_of_interest,
            output,
            profile,
            label: None,
            size_warning_accepted: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Record that the caller accepted the large-file estimate for this job
    pub fn acknowledge_size_warning(mut self) -> Self {
        self.size_warning_accepted = true;
        self
    }

    /// Suffix for progress text, e.g. " for Overture Places"
    pub fn label_suffix(&self) -> String {
        self.label.as_ref().map(|l| format!(" for {}", l)).unwrap_or_default()
    }
}

/// Acquisition worker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Connecting,
    SchemaCheck,
    QueryBuild,
    Materializing,
    SizeCheck,
    Exporting,
    Finished,
    Killed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Killed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Connecting => "connecting",
            JobState::SchemaCheck => "schema-check",
            JobState::QueryBuild => "query-build",
            JobState::Materializing => "materializing",
            JobState::SizeCheck => "size-check",
            JobState::Exporting => "exporting",
            JobState::Finished => "finished",
            JobState::Killed => "killed",
            JobState::Failed => "failed",
        };
        f.write_str(name)
    }
}
