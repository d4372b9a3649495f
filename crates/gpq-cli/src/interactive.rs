use anyhow::Result;
use dialoguer::{Confirm, Select};
use gpq_core::models::OutputFormat;

/// Ask whether to continue with a source that has no bbox column
pub fn confirm_bbox_fallback(url: &str) -> Result<bool> {
    println!(
        "\n{} has no bbox column. Filtering will intersect full geometries, which is slower.",
        url
    );
    let proceed = Confirm::new()
        .with_prompt("Continue with this source?")
        .default(true)
        .interact()?;
    Ok(proceed)
}

/// Answer to the large-output prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LargeOutputChoice {
    Write,
    Convert(OutputFormat),
    Skip,
}

/// Formats offered in place of an oversized output
const ALTERNATIVE_FORMATS: [OutputFormat; 3] =
    [OutputFormat::FlatGeobuf, OutputFormat::GeoPackage, OutputFormat::GeoParquet];

fn large_output_items() -> Vec<String> {
    let mut items = vec!["Write it anyway".to_string()];
    items.extend(
        ALTERNATIVE_FORMATS
            .iter()
            .map(|format| format!("Write {} instead", format.display_name())),
    );
    items.push("Skip this source".to_string());
    items
}

fn large_output_choice(index: usize) -> LargeOutputChoice {
    match index {
        0 => LargeOutputChoice::Write,
        i if i <= ALTERNATIVE_FORMATS.len() => LargeOutputChoice::Convert(ALTERNATIVE_FORMATS[i - 1]),
        _ => LargeOutputChoice::Skip,
    }
}

/// Ask what to do with an output larger than the warning threshold
pub fn choose_large_output(url: &str, estimated_mb: f64) -> Result<LargeOutputChoice> {
    println!(
        "\nThe output for {} is estimated at {:.0} MB ({:.1} GB).",
        url,
        estimated_mb,
        estimated_mb / 1024.0
    );
    let items = large_output_items();
    let index = Select::new()
        .with_prompt("How should it be written?")
        .items(&items)
        .default(1)
        .interact()?;
    Ok(large_output_choice(index))
}
