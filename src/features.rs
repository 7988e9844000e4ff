//! Feature vector assembly.
//!
//! Orchestrates flow location, window aggregation and per-window statistics
//! into the flat named feature map handed to the serialization layer. Per
//! window, in increasing index order, 17 attributes are emitted: the packet
//! count `ct_sum_<i>`, the eight payload-size statistics `sz_*_<i>` and the
//! eight inter-arrival statistics `it_*_<i>`.

use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::dataset::{self, PacketDataset};
use crate::error::{ExtractError, Result};
use crate::locator::FlowLocator;
use crate::stats::{self, SampleSummary};
use crate::window::{self, WindowedSamples};

/// Attributes emitted per window: one count, eight payload-size statistics,
/// eight inter-arrival statistics.
pub const ATTRIBUTES_PER_WINDOW: usize = 17;

/// A flat, named feature map.
///
/// Insertion order is preserved: it becomes positional output in the
/// serialization layer, so downstream tables stay comparable across
/// captures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(String, f64)>,
}

impl FeatureVector {
    pub fn push(&mut self, name: String, value: f64) {
        self.entries.push((name, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)] // Available alongside len for library-style callers
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attribute names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Attribute values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Looks an attribute up by name. Linear scan; meant for inspection and
    /// tests, not hot paths.
    #[allow(dead_code)] // Available for ad-hoc inspection
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, value)| *value)
    }
}

/// Checks that the horizon divides evenly into windows.
///
/// The check is the floating-point remainder of the division, so a horizon
/// of 1.0 with a window of 0.3 is rejected. Raised before any data access.
pub fn validate_windowing(window_size: f64, first_n_seconds: f64) -> Result<(), ExtractError> {
    if first_n_seconds % window_size != 0.0 {
        return Err(ExtractError::InvalidWindowing {
            window_size,
            first_n_seconds,
        });
    }
    Ok(())
}

/// Builds the feature vector for one already-loaded dataset.
pub fn build(
    dataset: &PacketDataset,
    locator: &FlowLocator,
    window_size: f64,
    first_n_seconds: f64,
) -> Result<FeatureVector, ExtractError> {
    validate_windowing(window_size, first_n_seconds)?;
    let flow = locator.locate(dataset)?;
    let samples = window::aggregate(flow, window_size, first_n_seconds)?;
    Ok(assemble(&samples))
}

/// Generates the window attribute vector for one capture source.
///
/// `source` is a packet stats file or a capture directory containing one.
/// The windowing parameters are validated before any file access.
pub fn generate_window_attributes(
    source: &Path,
    locator: &FlowLocator,
    window_size: f64,
    first_n_seconds: f64,
) -> Result<FeatureVector> {
    validate_windowing(window_size, first_n_seconds)?;

    let dataset = dataset::load_dataset(source)
        .with_context(|| format!("failed to load capture '{}'", source.display()))?;
    let features = build(&dataset, locator, window_size, first_n_seconds)?;

    info!(
        "extracted {} attributes from {}",
        features.len(),
        source.display()
    );
    Ok(features)
}

/// Flattens windowed samples into named attributes, window by window.
fn assemble(samples: &WindowedSamples) -> FeatureVector {
    let mut features = FeatureVector::default();
    for idx in 0..samples.num_windows() {
        let payload_sizes = &samples.payload_sizes[idx];
        let inter_arrivals = &samples.inter_arrivals[idx];

        features.push(format!("ct_sum_{}", idx), payload_sizes.len() as f64);
        push_summary(&mut features, "sz", idx, stats::summarize(payload_sizes));
        push_summary(&mut features, "it", idx, stats::summarize(inter_arrivals));
    }
    debug_assert_eq!(
        features.len(),
        samples.num_windows() * ATTRIBUTES_PER_WINDOW
    );
    features
}

fn push_summary(features: &mut FeatureVector, prefix: &str, idx: usize, summary: SampleSummary) {
    features.push(format!("{}_sum_{}", prefix, idx), summary.sum);
    features.push(format!("{}_mean_{}", prefix, idx), summary.mean);
    features.push(format!("{}_med_{}", prefix, idx), summary.median);
    features.push(format!("{}_min_{}", prefix, idx), summary.min);
    features.push(format!("{}_max_{}", prefix, idx), summary.max);
    features.push(format!("{}_std_{}", prefix, idx), summary.std_dev);
    features.push(format!("{}_kurtosis_{}", prefix, idx), summary.kurtosis);
    features.push(format!("{}_skew_{}", prefix, idx), summary.skew);
}
