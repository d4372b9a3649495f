pub mod geometry;
pub mod job;
pub mod locator;
pub mod output;
pub mod profile;
pub mod query;

pub use geometry::{AreaOfInterest, BoundingBox, Crs, CANONICAL_EPSG};
pub use job::{AcquisitionJob, JobId, JobState};
pub use locator::{dataset_name, validate_locator};
pub use output::{OutputFormat, OutputTarget, WriterOptions};
pub use profile::{Column, KeyValue, SourceProfile, DEFAULT_BBOX_COLUMN, DEFAULT_GEOMETRY_COLUMN};
pub use query::{ExportPlan, MaterializePlan, Predicate, QuerySpec, SamplePlan};
