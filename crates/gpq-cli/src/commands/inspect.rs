//! Inspect command implementation

use crate::cli::InspectArgs;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::InspectOutput;
use crate::progress::{create_spinner, finish_error, finish_success, follow, hidden_spinner};
use anyhow::{Context, Result};
use gpq_core::config::LayeredConfig;
use gpq_core::models::validate_locator;
use gpq_pipeline::EventKind;
use tabled::Tabled;

pub async fn execute(args: InspectArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let url = args.url.trim().to_string();
    validate_locator(&url).map_err(errors::from_gpq)?;

    let runner = super::runner(config)?;
    let spinner = if output.is_json() {
        hidden_spinner()
    } else {
        create_spinner("Inspecting source...")
    };

    let handle = runner.spawn_inspection(url.clone());
    let (inspection, events) = follow(handle, &spinner, output).await?;
    let inspection = inspection.context("Inspection was cancelled")?;

    if inspection.success {
        finish_success(&spinner, &inspection.message);
    } else {
        finish_error(&spinner, &inspection.message);
    }

    let profile = &inspection.profile;
    if output.is_json() {
        return output.result(InspectOutput {
            url,
            success: inspection.success,
            message: inspection.message.clone(),
            has_bbox: profile.has_bbox(),
            bbox_column: profile.bbox_column().map(str::to_string),
            geometry_column: profile.geometry_column().to_string(),
            schema: profile.schema().to_vec(),
        });
    }

    if events.contains(&EventKind::NeedsBboxWarning) {
        output.warning(
            "No bbox column found. Downloads will filter on full geometry intersection, which is slower.",
        );
    }

    output.section("Source Profile");
    output.kv("URL", &url);
    output.kv("Geometry column", profile.geometry_column());
    output.kv("Bbox column", profile.bbox_column().unwrap_or("(none)"));

    if !profile.schema().is_empty() {
        output.section("Schema");

        #[derive(Tabled)]
        struct ColumnRow {
            #[tabled(rename = "Column")]
            name: String,
            #[tabled(rename = "Type")]
            data_type: String,
        }

        let rows: Vec<ColumnRow> = profile
            .schema()
            .iter()
            .map(|c| ColumnRow { name: c.name.clone(), data_type: c.data_type.clone() })
            .collect();
        output.table(rows);
    }

    Ok(())
}
