//! Catalog of well-known dataset locations.
//!
//! The catalog ships with the crate and can be replaced from a JSON file of
//! the same shape. The pipeline only asks it whether a locator is trusted
//! enough to skip inspection; the CLI also uses it to expand templates and
//! name output files.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{GpqError, Result};

const BUNDLED_PRESETS: &str = include_str!("../data/presets.json");

/// Catalog group holding the templated Overture themes
pub const OVERTURE_SOURCE: &str = "overture";

/// Catalog group for Source Cooperative datasets
pub const SOURCE_COOPERATIVE_SOURCE: &str = "source_cooperative";

/// A single catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDataset {
    pub display_name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_template: Option<String>,
    #[serde(default)]
    pub info_url: Option<String>,
    #[serde(default = "default_needs_validation")]
    pub needs_validation: bool,
    #[serde(default)]
    pub subtypes: Vec<String>,
    /// Geometry column to assume instead of `geometry`
    #[serde(default)]
    pub geometry_column: Option<String>,
}

fn default_needs_validation() -> bool {
    true
}

impl PresetDataset {
    /// Concrete locator; templates need a subtype
    pub fn resolve(&self, subtype: Option<&str>) -> Result<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }
        match (&self.url_template, subtype) {
            (Some(template), Some(subtype)) => Ok(template.replace("{subtype}", subtype)),
            (Some(_), None) => Err(GpqError::ConfigMissing {
                key: format!("subtype for {}", self.display_name),
            }),
            (None, _) => Err(GpqError::ConfigInvalid {
                key: self.display_name.clone(),
                reason: "preset has neither url nor url_template".to_string(),
            }),
        }
    }

    /// Does this entry describe the given locator
    pub fn matches(&self, url: &str) -> bool {
        if let Some(own) = &self.url {
            if url.contains(own.as_str()) {
                return true;
            }
        }
        if let Some(template) = &self.url_template {
            let prefix = template.split('{').next().unwrap_or(template);
            if !prefix.is_empty() && url.contains(prefix) {
                return true;
            }
        }
        false
    }
}

/// Preset datasets grouped by source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetCatalog {
    sources: BTreeMap<String, BTreeMap<String, PresetDataset>>,
}

impl PresetCatalog {
    /// The catalog compiled into the crate
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_PRESETS)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GpqError::ConfigInvalid {
            key: "presets".to_string(),
            reason: format!("Failed to parse preset catalog: {}", e),
        })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Catalog with no entries; every locator needs validation
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Entries of one source, keyed by preset name
    pub fn datasets(&self, source: &str) -> Option<&BTreeMap<String, PresetDataset>> {
        self.sources.get(source)
    }

    /// All entries as `(source, key, dataset)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &PresetDataset)> {
        self.sources.iter().flat_map(|(source, datasets)| {
            datasets.iter().map(move |(key, dataset)| (source.as_str(), key.as_str(), dataset))
        })
    }

    pub fn get(&self, source: &str, key: &str) -> Result<&PresetDataset> {
        self.sources
            .get(source)
            .and_then(|datasets| datasets.get(key))
            .ok_or_else(|| GpqError::PresetNotFound { name: format!("{}/{}", source, key) })
    }

    /// First entry describing this locator
    pub fn find(&self, url: &str) -> Option<&PresetDataset> {
        self.iter().map(|(_, _, dataset)| dataset).find(|dataset| dataset.matches(url))
    }

    /// Whether a locator must be inspected before download. Unknown locators always do.
    pub fn needs_validation(&self, url: &str) -> bool {
        self.find(url).map(|dataset| dataset.needs_validation).unwrap_or(true)
    }

    /// Locators for an Overture theme; `base` expands to the given subtypes
    pub fn overture_urls(&self, theme: &str, base_subtypes: &[String]) -> Result<Vec<String>> {
        let dataset = self.get(OVERTURE_SOURCE, theme)?;
        if theme == "base" {
            return base_subtypes.iter().map(|s| dataset.resolve(Some(s))).collect();
        }
        Ok(vec![dataset.resolve(Some(&overture_type(theme)))?])
    }
}

/// Overture `type=` partition for a theme
pub fn overture_type(theme: &str) -> String {
    match theme {
        "transportation" => "segment".to_string(),
        "divisions" => "division_area".to_string(),
        "addresses" => "*".to_string(),
        other => other.strip_suffix('s').unwrap_or(other).to_string(),
    }
}

fn title_case(word: &str) -> String {
    word.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn partition_value<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let rest = url.split(key).nth(1)?;
    rest.split('/').next()
}

/// Human label for an Overture locator, e.g. "Overture Base - Land Use"
pub fn layer_label(url: &str) -> Option<String> {
    if !url.contains("overture") {
        return None;
    }
    let theme = partition_value(url, "theme=")?;
    if theme == "base" {
        let subtype = partition_value(url, "type=")?;
        Some(format!("Overture {} - {}", title_case(theme), title_case(subtype)))
    } else {
        Some(format!("Overture {}", title_case(theme)))
    }
}

/// What a download came from, for default file naming
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadKind<'a> {
    Overture { theme: &'a str },
    OvertureBase { subtype: &'a str },
    SourceCooperative { display_name: &'a str },
    /// Catalog entries outside the Overture and Source Cooperative groups
    Other { display_name: &'a str },
    Custom,
}

impl<'a> DownloadKind<'a> {
    /// Kind for a non-Overture catalog entry of the given source group
    pub fn for_catalog(source: &str, display_name: &'a str) -> Self {
        if source == SOURCE_COOPERATIVE_SOURCE {
            DownloadKind::SourceCooperative { display_name }
        } else {
            DownloadKind::Other { display_name }
        }
    }
}

fn safe_name(display_name: &str) -> String {
    display_name.to_lowercase().replace([' ', '/'], "_")
}

/// Default output file name, e.g. `overture_places_20250101_093000.parquet`
pub fn default_filename(kind: &DownloadKind<'_>, time: NaiveDateTime, extension: &str) -> String {
    let stamp = time.format("%Y%m%d_%H%M%S");
    let extension = extension.trim_start_matches('.');
    match kind {
        DownloadKind::Overture { theme } => format!("overture_{}_{}.{}", theme, stamp, extension),
        DownloadKind::OvertureBase { subtype } => {
            format!("overture_base_{}_{}.{}", subtype, stamp, extension)
        }
        DownloadKind::SourceCooperative { display_name } => {
            format!("sourcecoop_{}_{}.{}", safe_name(display_name), stamp, extension)
        }
        DownloadKind::Other { display_name } => {
            format!("other_{}_{}.{}", safe_name(display_name), stamp, extension)
        }
        DownloadKind::Custom => format!("custom_download_{}.{}", stamp, extension),
    }
}
