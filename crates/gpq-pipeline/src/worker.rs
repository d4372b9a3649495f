//! Acquisition worker: one job from connection to finished output

use gpq_core::config::{LayeredConfig, DEFAULT_SAMPLE_ROWS, DEFAULT_SIZE_THRESHOLD_MB};
use gpq_core::models::{AcquisitionJob, JobState, OutputFormat, QuerySpec, SourceProfile};
use gpq_core::ports::{EngineConnection, Extension, QueryEngine, REQUIRED_EXTENSIONS};
use std::path::PathBuf;

use crate::detect;
use crate::estimate::estimate_megabytes;
use crate::events::{EventKind, Interrupt, JobContext};
use crate::query::QueryBuilder;

/// Terminal result of one acquisition
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionOutcome {
    /// Output written; `loadable` is false for database output
    Completed { path: PathBuf, loadable: bool },
    /// Nothing intersected the area of interest
    NoData,
    /// Estimated output exceeds the threshold; re-run acknowledged to continue
    SizeWarning { estimated_mb: f64 },
    Killed,
    Failed { message: String },
}

impl AcquisitionOutcome {
    /// Worker state the job ended in
    pub fn state(&self) -> JobState {
        match self {
            AcquisitionOutcome::Completed { .. } | AcquisitionOutcome::NoData => JobState::Finished,
            AcquisitionOutcome::SizeWarning { .. } => JobState::SizeCheck,
            AcquisitionOutcome::Killed => JobState::Killed,
            AcquisitionOutcome::Failed { .. } => JobState::Failed,
        }
    }
}

/// Limits the worker applies to every job
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerSettings {
    pub size_threshold_mb: f64,
    pub sample_rows: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self { size_threshold_mb: DEFAULT_SIZE_THRESHOLD_MB, sample_rows: DEFAULT_SAMPLE_ROWS }
    }
}

impl From<&LayeredConfig> for WorkerSettings {
    fn from(config: &LayeredConfig) -> Self {
        Self {
            size_threshold_mb: config.size_threshold_mb.value,
            sample_rows: config.sample_rows.value,
        }
    }
}

/// How the staged run ended before reporting
enum Step {
    Written,
    Empty,
    TooLarge(f64),
}

/// Runs acquisition jobs against a query engine
pub struct AcquisitionWorker<E: QueryEngine> {
    engine: E,
    settings: WorkerSettings,
}

impl<E: QueryEngine> AcquisitionWorker<E> {
    pub fn new(engine: E, settings: WorkerSettings) -> Self {
        Self { engine, settings }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Run a job to a terminal outcome.
    ///
    /// The intermediate table is dropped on every path unless the output is
    /// itself a database.
    pub fn run(&self, job: &AcquisitionJob, ctx: &JobContext) -> AcquisitionOutcome {
        let suffix = job.label_suffix();
        let database_output = matches!(job.output.format(), Ok(OutputFormat::DuckDb));

        tracing::info!("Job {} entering {}", ctx.id(), JobState::Connecting);
        ctx.progress(format!("Connecting to database{}...", suffix));
        let database = database_output.then(|| job.output.path());
        let mut conn = match self.engine.connect(database) {
            Ok(conn) => conn,
            Err(e) => return self.report(job, ctx, Err(Interrupt::Error(e))),
        };

        let result = self.stages(&mut conn, job, ctx);

        if !database_output {
            let table = crate::query::INTERMEDIATE_TABLE;
            if let Err(e) = conn.drop_table(table) {
                tracing::warn!("Failed to drop {} for job {}: {}", table, ctx.id(), e);
            }
        }
        drop(conn);

        self.report(job, ctx, result)
    }

    fn stages<C: EngineConnection>(
        &self,
        conn: &mut C,
        job: &AcquisitionJob,
        ctx: &JobContext,
    ) -> Result<Step, Interrupt> {
        let suffix = job.label_suffix();

        ctx.progress(format!("Loading spatial extension{}...", suffix));
        let mut extensions = REQUIRED_EXTENSIONS.to_vec();
        if job.output.format().map(|f| f.is_verbose_text()).unwrap_or(false) {
            extensions.push(Extension::Json);
        }
        conn.load_extensions(&extensions)?;

        self.enter(ctx, JobState::SchemaCheck)?;
        let profile = self.schema_check(conn, job)?;

        self.enter(ctx, JobState::QueryBuild)?;
        ctx.progress(format!("Preparing query{}...", suffix));
        let spec = QueryBuilder::new(self.settings.sample_rows).build(
            &job.source_url,
            &profile,
            job.area_of_interest.as_ref(),
            &job.output,
        )?;

        self.enter(ctx, JobState::Materializing)?;
        ctx.progress(format!("Downloading{} data...", suffix));
        conn.materialize(&spec.materialize)?;
        let rows = conn.count_rows(spec.table())?;
        tracing::info!("Job {} materialized {} rows", ctx.id(), rows);
        if rows == 0 {
            return Ok(Step::Empty);
        }

        ctx.checkpoint()?;
        ctx.progress(format!("Processing{} data to requested format...", suffix));

        if spec.sample.is_some() {
            self.enter(ctx, JobState::SizeCheck)?;
            let estimated_mb = self.estimate(conn, &spec, rows);
            if estimated_mb > self.settings.size_threshold_mb && !job.size_warning_accepted {
                return Ok(Step::TooLarge(estimated_mb));
            }
        }

        self.enter(ctx, JobState::Exporting)?;
        match &spec.export {
            Some(plan) => {
                tracing::debug!("Export SQL: {}", plan.sql);
                conn.export(plan)?;
            }
            None => conn.commit()?,
        }

        ctx.checkpoint()?;
        Ok(Step::Written)
    }

    fn enter(&self, ctx: &JobContext, state: JobState) -> Result<(), Interrupt> {
        ctx.checkpoint()?;
        tracing::info!("Job {} entering {}", ctx.id(), state);
        Ok(())
    }

    /// Re-read the live schema; the job's profile is only a hint
    fn schema_check<C: EngineConnection>(
        &self,
        conn: &mut C,
        job: &AcquisitionJob,
    ) -> Result<SourceProfile, Interrupt> {
        let schema = conn.describe(&job.source_url)?;
        let metadata = if detect::bbox_struct_column(&schema).is_some() {
            Vec::new()
        } else {
            conn.key_value_metadata(&job.source_url).unwrap_or_else(|e| {
                tracing::warn!("Could not read metadata of {}: {}", job.source_url, e);
                Vec::new()
            })
        };
        Ok(detect::reconcile(&job.profile, schema, &metadata))
    }

    /// Estimated output size in MB. Failures count as 0.
    fn estimate<C: EngineConnection>(&self, conn: &mut C, spec: &QuerySpec, rows: u64) -> f64 {
        let Some(sample) = &spec.sample else {
            return 0.0;
        };
        match conn.average_feature_bytes(sample) {
            Ok(Some(average)) => {
                let mb = estimate_megabytes(rows, average);
                tracing::info!("Estimated output size: {:.2} MB ({} rows, {:.1} bytes/feature)", mb, rows, average);
                mb
            }
            Ok(None) => 0.0,
            Err(e) => {
                tracing::warn!("Error estimating file size: {}", e);
                0.0
            }
        }
    }

    fn report(
        &self,
        job: &AcquisitionJob,
        ctx: &JobContext,
        result: Result<Step, Interrupt>,
    ) -> AcquisitionOutcome {
        if ctx.is_killed() {
            tracing::info!("Job {} killed", ctx.id());
            return AcquisitionOutcome::Killed;
        }

        let suffix = job.label_suffix();
        match result {
            Ok(Step::Written) => {
                let path = job.output.path().to_path_buf();
                let loadable = !matches!(job.output.format(), Ok(OutputFormat::DuckDb));
                if loadable {
                    ctx.emit(EventKind::LoadLayer(path.clone()));
                } else {
                    ctx.info("Data has been successfully saved to DuckDB database.");
                }
                ctx.emit(EventKind::Finished);
                tracing::info!("Job {} finished: {}", ctx.id(), path.display());
                AcquisitionOutcome::Completed { path, loadable }
            }
            Ok(Step::Empty) => self.no_data(ctx, &suffix),
            Ok(Step::TooLarge(estimated_mb)) => {
                tracing::info!("Job {} paused on size warning ({:.2} MB)", ctx.id(), estimated_mb);
                ctx.emit(EventKind::SizeWarning(estimated_mb));
                AcquisitionOutcome::SizeWarning { estimated_mb }
            }
            Err(Interrupt::Killed) => AcquisitionOutcome::Killed,
            Err(Interrupt::Error(e)) if e.is_no_data() => self.no_data(ctx, &suffix),
            Err(Interrupt::Error(e)) => {
                let message = e.to_string();
                tracing::error!("Job {} failed: {}", ctx.id(), message);
                ctx.emit(EventKind::Error(message.clone()));
                AcquisitionOutcome::Failed { message }
            }
        }
    }

    fn no_data(&self, ctx: &JobContext, suffix: &str) -> AcquisitionOutcome {
        ctx.info(format!(
            "No data found{} in the requested area. Check that your map extent overlaps with the data \
             and/or expand your map extent. Skipping to next dataset if available.",
            suffix
        ));
        ctx.emit(EventKind::Finished);
        AcquisitionOutcome::NoData
    }
}
