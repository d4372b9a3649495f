use console::style;
use gpq_core::GpqError;
use std::fmt;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Locator with an unrecognized scheme
pub fn invalid_locator(url: &str) -> CliError {
    CliError::new("Unrecognized dataset locator")
        .with_context(format!("'{}' does not start with a supported scheme.", url))
        .with_suggestion("Use http://, https://, s3://, hf:// or file://")
        .with_suggestion("Or pick a catalog entry: gpq presets")
        .with_help("Run: gpq download --help")
}

/// Output extension no writer handles
pub fn unsupported_format(extension: &str) -> CliError {
    CliError::new(format!("Unsupported output format '{}'", extension))
        .with_context("The output file extension selects the writer.")
        .with_suggestion("Use one of: .parquet, .duckdb, .gpkg, .fgb, .geojson")
        .with_help("Run: gpq download --help")
}

/// Bbox argument that does not parse
pub fn invalid_bbox(value: &str, reason: &str) -> CliError {
    CliError::new("Invalid bounding box")
        .with_context(format!("Could not read '{}': {}", value, reason))
        .with_suggestion("Pass four numbers: --bbox xmin,ymin,xmax,ymax")
        .with_suggestion("Use --crs for coordinates outside EPSG:4326")
}

/// Catalog entry that does not exist
pub fn preset_not_found(name: &str) -> CliError {
    CliError::new(format!("Preset '{}' not found", name))
        .with_suggestion("List available presets: gpq presets")
        .with_help("Run: gpq presets --help")
}

/// A warning that needs an answer while running non-interactively
pub fn confirmation_required(what: &str) -> CliError {
    CliError::new(format!("{} requires confirmation", what))
        .with_suggestion("Re-run with --yes to accept")
}

/// Map a library error to a CLI error with suggestions where one fits
pub fn from_gpq(err: GpqError) -> CliError {
    match &err {
        GpqError::InvalidLocator { url } => invalid_locator(url),
        GpqError::UnsupportedFormat { extension } => unsupported_format(extension),
        GpqError::MissingExtension { .. } => unsupported_format(""),
        GpqError::PresetNotFound { name } => preset_not_found(name),
        GpqError::InvalidBoundingBox { reason } => invalid_bbox("--bbox", reason),
        _ => CliError::new(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_suggestions() {
        let err = CliError::new("Boom")
            .with_context("ctx")
            .with_suggestion("one")
            .with_suggestion("two")
            .with_help("gpq --help");
        assert_eq!(err.to_string(), "Boom");
        assert_eq!(err.suggestions.len(), 2);
        assert_eq!(err.help_command.as_deref(), Some("gpq --help"));
    }

    #[test]
    fn test_library_errors_map_to_guidance() {
        let err = from_gpq(GpqError::UnsupportedFormat { extension: "shp".to_string() });
        assert!(err.message.contains("shp"));
        assert!(!err.suggestions.is_empty());

        let err = from_gpq(GpqError::Engine("HTTP Error: 403".to_string()));
        assert_eq!(err.message, "HTTP Error: 403");
    }
}
