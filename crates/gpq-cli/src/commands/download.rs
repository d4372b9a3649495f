//! Download command implementation

use crate::cli::DownloadArgs;
use crate::errors::{self, CliError};
use crate::interactive::{self, LargeOutputChoice};
use crate::output::OutputWriter;
use crate::output_types::{DownloadOutput, PlannedDownload};
use crate::progress::{create_spinner, finish_error, follow, hidden_spinner};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use gpq_core::config::LayeredConfig;
use gpq_core::models::{
    validate_locator, AreaOfInterest, BoundingBox, Crs, OutputFormat, OutputTarget, SourceProfile,
};
use gpq_core::presets::{default_filename, layer_label, DownloadKind, PresetCatalog, OVERTURE_SOURCE};
use gpq_pipeline::{DownloadQueue, EventKind, QueryBuilder, QueueEntry, QueueStatus};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One source with the file it will be written to
struct Source {
    url: String,
    output: OutputTarget,
}

pub async fn execute(
    args: DownloadArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
    dry_run: bool,
) -> Result<()> {
    let catalog = crate::config_loader::load_catalog(config)?;
    let sources = resolve_sources(&args, config, &catalog, Local::now().naive_local())?;
    let aoi = parse_area_of_interest(&args)?;

    if aoi.is_none() {
        output.warning("No --bbox given; the full dataset will be downloaded.");
    }

    if dry_run {
        return plan(&sources, aoi.as_ref(), config, &catalog, output);
    }

    prepare_output_dirs(&sources)?;
    let mut taken: HashSet<PathBuf> = sources.iter().map(|s| s.output.path().to_path_buf()).collect();
    let runner = super::runner(config)?;

    let mut queue = DownloadQueue::new(aoi.clone());
    for source in sources {
        let spinner = spinner_for(output, &format!("Validating {}...", source.url));
        let (inspection, events) =
            follow(runner.spawn_inspection(source.url.clone()), &spinner, output).await?;
        let Some(inspection) = inspection else {
            finish_error(&spinner, "Cancelled");
            return print_result(output, DownloadOutput::with_status("killed"));
        };

        if !inspection.success {
            finish_error(&spinner, &inspection.message);
            return Err(CliError::new(inspection.message)
                .with_context(format!("Source: {}", source.url))
                .with_suggestion(format!("Check the source with: gpq inspect {}", source.url))
                .into());
        }
        spinner.finish_and_clear();

        if events.contains(&EventKind::NeedsBboxWarning) && !args.yes {
            if output.is_json() {
                return Err(errors::confirmation_required("Downloading a source without a bbox column").into());
            }
            if !interactive::confirm_bbox_fallback(&source.url)? {
                output.info(format!("Skipping {}", source.url));
                continue;
            }
        }

        let label = layer_label(&source.url);
        queue.push(QueueEntry::new(source.url, source.output, inspection.profile).with_label(label));
    }

    if queue.is_empty() {
        output.info("Nothing to download.");
        return print_result(output, DownloadOutput::with_status("drained"));
    }

    let mut result = DownloadOutput::with_status("drained");
    loop {
        let spinner = spinner_for(output, "Downloading...");
        let (report, _events) = follow(runner.spawn_queue(queue), &spinner, output).await?;
        spinner.finish_and_clear();

        if !output.is_json() {
            for path in &report.completed {
                output.success(format!("Saved {}", path.display()));
            }
        }
        for url in &report.skipped {
            output.info(format!("No data in the area of interest for {}", url));
        }
        result.completed.extend(report.completed);
        result.skipped.extend(report.skipped);

        match report.status {
            QueueStatus::Drained => break,
            QueueStatus::Killed => {
                result.status = "killed".to_string();
                output.warning("Download cancelled.");
                break;
            }
            QueueStatus::Stopped { url, message } => {
                if output.is_json() {
                    result.status = "stopped".to_string();
                    result.error = Some(message.clone());
                    print_result(output, result)?;
                }
                return Err(CliError::new(message)
                    .with_context(format!("Source: {}", url))
                    .with_suggestion(format!("Check the source with: gpq inspect {}", url))
                    .into());
            }
            QueueStatus::Paused { estimated_mb, mut remaining } => {
                let Some(first) = remaining.first() else { break };
                let url = first.url.clone();

                let choice = if args.yes {
                    LargeOutputChoice::Write
                } else if output.is_json() {
                    result.status = "paused".to_string();
                    result.estimated_mb = Some(estimated_mb);
                    break;
                } else {
                    interactive::choose_large_output(&url, estimated_mb)?
                };

                queue = match choice {
                    LargeOutputChoice::Write => DownloadQueue::resume(remaining, aoi.clone()),
                    LargeOutputChoice::Convert(format) => {
                        let entry = &mut remaining[0];
                        entry.output = retarget(&entry.output, format, &mut taken);
                        output.info(format!("Writing {} as {}", url, entry.output.path().display()));
                        DownloadQueue::resume(remaining, aoi.clone())
                    }
                    LargeOutputChoice::Skip => {
                        output.info(format!("Skipping {}", url));
                        remaining.remove(0);
                        let mut rest = DownloadQueue::new(aoi.clone());
                        for entry in remaining {
                            rest.push(entry);
                        }
                        rest
                    }
                };
                if queue.is_empty() {
                    break;
                }
            }
        }
    }

    print_result(output, result)
}

impl DownloadOutput {
    fn with_status(status: &str) -> Self {
        Self {
            completed: Vec::new(),
            skipped: Vec::new(),
            status: status.to_string(),
            estimated_mb: None,
            error: None,
        }
    }
}

fn print_result(output: &OutputWriter, result: DownloadOutput) -> Result<()> {
    if output.is_json() {
        return output.result(result);
    }
    if result.completed.is_empty() && result.status == "drained" {
        output.info("No files were written.");
    }
    Ok(())
}

fn spinner_for(output: &OutputWriter, message: &str) -> ProgressBar {
    if output.is_json() {
        hidden_spinner()
    } else {
        create_spinner(message)
    }
}

fn parse_area_of_interest(args: &DownloadArgs) -> Result<Option<AreaOfInterest>> {
    let Some(value) = &args.bbox else {
        return Ok(None);
    };
    let bbox = BoundingBox::from_str(value).map_err(|e| errors::invalid_bbox(value, &e.to_string()))?;
    Ok(Some(AreaOfInterest::new(bbox, Crs::from_epsg(args.crs))))
}

/// Expand arguments into sources and output files, checking every locator
/// and output format before anything runs
fn resolve_sources(
    args: &DownloadArgs,
    config: &LayeredConfig,
    catalog: &PresetCatalog,
    time: NaiveDateTime,
) -> Result<Vec<Source>> {
    let extension = match &args.format {
        Some(format) => OutputFormat::from_extension(format).map_err(errors::from_gpq)?.extension(),
        None => config.default_format.value.extension(),
    };
    let directory = config.download_dir.value.clone();

    let named: Vec<(String, String)> = match &args.preset {
        Some(preset) => preset_sources(preset, &args.subtype, catalog, time, extension)?,
        None => args
            .urls
            .iter()
            .map(|url| (url.trim().to_string(), default_filename(&DownloadKind::Custom, time, extension)))
            .collect(),
    };

    if args.output.is_some() && named.len() > 1 {
        return Err(CliError::new("--output names a single file but several sources were given")
            .with_suggestion("Use --output-dir to write one generated file per source")
            .into());
    }

    let mut taken = HashSet::new();
    let mut sources = Vec::with_capacity(named.len());
    for (url, filename) in named {
        validate_locator(&url).map_err(errors::from_gpq)?;

        let path = match &args.output {
            Some(path) => path.clone(),
            None => unique_path(directory.join(filename), &mut taken),
        };
        let target = OutputTarget::new(path);
        target.format().map_err(errors::from_gpq)?;
        sources.push(Source { url, output: target });
    }
    Ok(sources)
}

fn preset_sources(
    preset: &str,
    subtypes: &[String],
    catalog: &PresetCatalog,
    time: NaiveDateTime,
    extension: &str,
) -> Result<Vec<(String, String)>> {
    let (source, key) = preset
        .split_once('/')
        .ok_or_else(|| errors::preset_not_found(preset))?;
    let dataset = catalog.get(source, key).map_err(errors::from_gpq)?;

    if source == OVERTURE_SOURCE {
        if key == "base" {
            if subtypes.is_empty() {
                return Err(CliError::new("overture/base needs at least one --subtype")
                    .with_suggestion(format!("Available subtypes: {}", dataset.subtypes.join(", ")))
                    .into());
            }
            let urls = catalog.overture_urls(key, subtypes).map_err(errors::from_gpq)?;
            return Ok(urls
                .into_iter()
                .zip(subtypes)
                .map(|(url, subtype)| {
                    let kind = DownloadKind::OvertureBase { subtype: subtype.as_str() };
                    (url, default_filename(&kind, time, extension))
                })
                .collect());
        }
        let urls = catalog.overture_urls(key, subtypes).map_err(errors::from_gpq)?;
        let kind = DownloadKind::Overture { theme: key };
        return Ok(urls
            .into_iter()
            .map(|url| (url, default_filename(&kind, time, extension)))
            .collect());
    }

    let url = dataset
        .resolve(subtypes.first().map(String::as_str))
        .map_err(errors::from_gpq)?;
    let kind = DownloadKind::for_catalog(source, &dataset.display_name);
    Ok(vec![(url, default_filename(&kind, time, extension))])
}

/// Suffix `_2`, `_3`, ... onto file names already handed out this run or
/// already present on disk
fn unique_path(path: PathBuf, taken: &mut HashSet<PathBuf>) -> PathBuf {
    let free = |candidate: &Path, taken: &HashSet<PathBuf>| !taken.contains(candidate) && !candidate.exists();
    if free(&path, taken) {
        taken.insert(path.clone());
        return path;
    }
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default();
    let mut n = 2;
    loop {
        let candidate = path.with_file_name(format!("{}_{}.{}", stem, n, extension));
        if free(&candidate, taken) {
            taken.insert(candidate.clone());
            return candidate;
        }
        n += 1;
    }
}

/// Same file name with another format's extension
fn retarget(target: &OutputTarget, format: OutputFormat, taken: &mut HashSet<PathBuf>) -> OutputTarget {
    let path = target.path().with_extension(format.extension());
    OutputTarget::new(unique_path(path, taken))
}

/// Create the parent directory of every output file
fn prepare_output_dirs(sources: &[Source]) -> Result<()> {
    for source in sources {
        let Some(parent) = source.output.path().parent() else { continue };
        if parent.as_os_str().is_empty() {
            continue;
        }
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    Ok(())
}

/// Print the queries each source would run, without touching any engine
fn plan(
    sources: &[Source],
    aoi: Option<&AreaOfInterest>,
    config: &LayeredConfig,
    catalog: &PresetCatalog,
    output: &OutputWriter,
) -> Result<()> {
    let builder = QueryBuilder::new(config.sample_rows.value);
    let mut planned = Vec::with_capacity(sources.len());

    for source in sources {
        let profile = match catalog.find(&source.url) {
            Some(preset) if !preset.needs_validation => {
                let profile = SourceProfile::trusted_preset();
                match &preset.geometry_column {
                    Some(column) => profile.with_geometry_column(column.clone()),
                    None => profile,
                }
            }
            _ => SourceProfile::fallback(),
        };
        let spec = builder
            .build(&source.url, &profile, aoi, &source.output)
            .map_err(errors::from_gpq)?;

        planned.push(PlannedDownload {
            url: source.url.clone(),
            output: source.output.path().to_path_buf(),
            format: spec.format.display_name().to_string(),
            materialize_sql: spec.materialize.sql,
            sample_sql: spec.sample.map(|s| s.sql),
            export_sql: spec.export.map(|e| e.sql),
        });
    }

    if output.is_json() {
        return output.result(planned);
    }

    for download in planned {
        output.section(&download.url);
        output.kv("Output", download.output.display());
        output.kv("Format", &download.format);
        println!("\n{}", download.materialize_sql);
        if let Some(sql) = &download.sample_sql {
            println!("\n{}", sql);
        }
        match &download.export_sql {
            Some(sql) => println!("\n{}", sql),
            None => println!("\nCHECKPOINT"),
        }
    }
    output.success("Dry run complete; nothing was downloaded.");
    Ok(())
}
