//! Export Module
//!
//! Serializes a feature vector as a two-row CSV table (a header row of
//! attribute names and one data row of values, in insertion order) or as a
//! JSON object, and derives the sibling output path for a capture's stats
//! file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::dataset::STATS_FILE_SUFFIX;
use crate::error::Result;
use crate::features::FeatureVector;

/// Output format for feature vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    /// File suffix replacing the stats suffix of the input file.
    pub fn output_suffix(&self) -> &'static str {
        match self {
            Self::Csv => "_window_attributes.csv",
            Self::Json => "_window_attributes.json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Derives the output path for a stats file by swapping its suffix.
///
/// A path that does not carry the stats suffix keeps its full file name and
/// gets the output suffix appended instead.
pub fn derive_output_path(stats_path: &Path, format: OutputFormat) -> PathBuf {
    let file_name = stats_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name
        .strip_suffix(STATS_FILE_SUFFIX)
        .unwrap_or(&file_name);
    stats_path.with_file_name(format!("{}{}", stem, format.output_suffix()))
}

/// Renders a feature vector in the requested format.
pub fn render(features: &FeatureVector, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Csv => to_csv_string(features),
        OutputFormat::Json => to_json_string(features),
    }
}

/// Writes a feature vector to a file in the requested format.
pub fn write_features(path: &Path, features: &FeatureVector, format: OutputFormat) -> Result<()> {
    let content = render(features, format)?;
    fs::write(path, content)
        .with_context(|| format!("failed to write attribute file '{}'", path.display()))
}

/// Renders the two-row CSV table.
fn to_csv_string(features: &FeatureVector) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(features.names())?;
    writer.write_record(features.values().map(format_value))?;
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .context("failed to finalize CSV output")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Renders a single JSON object, attributes in insertion order.
fn to_json_string(features: &FeatureVector) -> Result<String> {
    let mut object = serde_json::Map::new();
    for (name, value) in features.iter() {
        object.insert(name.to_string(), serde_json::json!(value));
    }
    Ok(serde_json::to_string_pretty(&serde_json::Value::Object(
        object,
    ))?)
}

/// Integral values print without a trailing `.0`, matching the reference
/// attribute tables.
fn format_value(value: f64) -> String {
    format!("{}", value)
}
