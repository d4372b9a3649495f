//! Presets command implementation

use crate::cli::PresetsArgs;
use crate::config_loader;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::PresetInfo;
use anyhow::Result;
use gpq_core::config::LayeredConfig;
use tabled::Tabled;

pub fn execute(args: PresetsArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let catalog = config_loader::load_catalog(config)?;

    if let Some(source) = &args.source {
        if catalog.datasets(source).is_none() {
            return Err(errors::preset_not_found(source).into());
        }
    }

    let presets: Vec<PresetInfo> = catalog
        .iter()
        .filter(|(source, _, _)| args.source.as_deref().map_or(true, |s| s == *source))
        .map(|(source, key, dataset)| PresetInfo {
            source: source.to_string(),
            key: key.to_string(),
            display_name: dataset.display_name.clone(),
            locator: dataset
                .url
                .clone()
                .or_else(|| dataset.url_template.clone())
                .unwrap_or_default(),
            needs_validation: dataset.needs_validation,
            subtypes: dataset.subtypes.clone(),
        })
        .collect();

    if output.is_json() {
        return output.result(presets);
    }

    #[derive(Tabled)]
    struct PresetRow {
        #[tabled(rename = "Preset")]
        preset: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Validated")]
        validated: String,
        #[tabled(rename = "Locator")]
        locator: String,
    }

    let rows: Vec<PresetRow> = presets
        .into_iter()
        .map(|p| PresetRow {
            preset: format!("{}/{}", p.source, p.key),
            name: p.display_name,
            validated: if p.needs_validation { "yes" } else { "trusted" }.to_string(),
            locator: p.locator,
        })
        .collect();

    output.section("Preset Datasets");
    output.table(rows);
    Ok(())
}
