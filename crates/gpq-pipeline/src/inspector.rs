//! Source inspection: how a dataset exposes geometry and bbox pruning

use gpq_core::models::{validate_locator, Column, SourceProfile};
use gpq_core::ports::{EngineConnection, QueryEngine, REQUIRED_EXTENSIONS};
use gpq_core::presets::PresetCatalog;
use std::sync::Arc;

use crate::detect;
use crate::events::{EventKind, Interrupt, JobContext};

/// Result of one inspection run
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub success: bool,
    pub message: String,
    pub profile: SourceProfile,
}

/// Inspects candidate sources before download
pub struct SourceInspector<E: QueryEngine> {
    engine: E,
    catalog: Arc<PresetCatalog>,
}

impl<E: QueryEngine> SourceInspector<E> {
    pub fn new(engine: E, catalog: Arc<PresetCatalog>) -> Self {
        Self { engine, catalog }
    }

    /// Inspect a source.
    ///
    /// Emits `NeedsBboxWarning` once when no bbox column was found, then
    /// `Validated`. Failures degrade to a best-effort profile. Returns `None`
    /// when the job was killed.
    pub fn inspect(&self, url: &str, ctx: &JobContext) -> Option<Inspection> {
        if let Some(profile) = self.trusted_profile(url) {
            tracing::info!("Skipping inspection of trusted preset {}", url);
            return self.report(ctx, true, "Validation successful", profile);
        }

        let mut schema: Option<Vec<Column>> = None;
        match self.read_profile(url, ctx, &mut schema) {
            Ok(profile) => {
                let message = if profile.has_bbox() {
                    "Validation successful"
                } else {
                    ctx.emit(EventKind::NeedsBboxWarning);
                    "Validation with no bbox column"
                };
                self.report(ctx, true, message, profile)
            }
            Err(Interrupt::Killed) => {
                tracing::info!("Inspection of {} killed", url);
                None
            }
            Err(Interrupt::Error(e)) => {
                tracing::warn!("Error validating {}: {}", url, e);
                let profile = match schema {
                    Some(columns) => {
                        let geometry = detect::detect_geometry_column(&columns);
                        SourceProfile::new(columns, geometry, None)
                    }
                    None => SourceProfile::fallback(),
                };
                ctx.emit(EventKind::NeedsBboxWarning);
                self.report(ctx, false, &format!("Error validating source: {}", e), profile)
            }
        }
    }

    fn trusted_profile(&self, url: &str) -> Option<SourceProfile> {
        if self.catalog.needs_validation(url) {
            return None;
        }
        let profile = SourceProfile::trusted_preset();
        Some(match self.catalog.find(url).and_then(|d| d.geometry_column.clone()) {
            Some(geometry) => profile.with_geometry_column(geometry),
            None => profile,
        })
    }

    fn read_profile(
        &self,
        url: &str,
        ctx: &JobContext,
        schema: &mut Option<Vec<Column>>,
    ) -> Result<SourceProfile, Interrupt> {
        validate_locator(url)?;

        ctx.progress("Connecting to data source...");
        let mut conn = self.engine.connect(None)?;
        conn.load_extensions(&REQUIRED_EXTENSIONS)?;
        ctx.checkpoint()?;

        ctx.progress("Checking data format...");
        let columns = conn.describe(url)?;
        *schema = Some(columns.clone());
        ctx.checkpoint()?;

        if detect::bbox_struct_column(&columns).is_some() {
            return Ok(detect::profile_from_schema(columns, &[]));
        }

        ctx.progress("Checking for bbox metadata...");
        let metadata = conn.key_value_metadata(url)?;
        ctx.checkpoint()?;

        Ok(detect::profile_from_schema(columns, &metadata))
    }

    fn report(&self, ctx: &JobContext, success: bool, message: &str, profile: SourceProfile) -> Option<Inspection> {
        if ctx.is_killed() {
            return None;
        }
        ctx.emit(EventKind::Validated {
            success,
            message: message.to_string(),
            profile: profile.clone(),
        });
        Some(Inspection { success, message: message.to_string(), profile })
    }
}
