//! Temporal bucketing of a flow's downstream packets.
//!
//! Splits the first N seconds of a flow into fixed-width windows and
//! collects the raw per-window samples (payload sizes and inter-arrival
//! gaps) that the statistics pass later reduces.

use tracing::debug;

use crate::dataset::FlowRecord;
use crate::error::ExtractError;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Raw per-window samples for one flow.
///
/// Inter-arrival gaps are measured against the most recent accepted
/// downstream packet globally, not per window: a packet joining an already
/// populated window records its gap from that previous packet wherever it
/// landed. Only the packet that opens a still-empty window records no gap,
/// so each window holds one fewer gap than payload entries (or none).
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedSamples {
    pub payload_sizes: Vec<Vec<f64>>,
    pub inter_arrivals: Vec<Vec<f64>>,
}

impl WindowedSamples {
    fn with_windows(num_windows: usize) -> Self {
        Self {
            payload_sizes: vec![Vec::new(); num_windows],
            inter_arrivals: vec![Vec::new(); num_windows],
        }
    }

    /// Number of allocated windows, including the trailing boundary window.
    pub fn num_windows(&self) -> usize {
        self.payload_sizes.len()
    }
}

/// Number of windows covering `first_n_seconds`.
///
/// One window beyond the nominal horizon is allocated: a packet whose
/// elapsed time is exactly `first_n_seconds` lands in it.
pub fn window_count(window_size: f64, first_n_seconds: f64) -> usize {
    (first_n_seconds / window_size).floor() as usize + 1
}

/// Buckets the flow's downstream packets into fixed-width time windows.
///
/// Elapsed time is anchored to the flow's very first recorded packet,
/// regardless of direction. The scan stops at the first packet beyond the
/// horizon; packets are assumed to arrive in non-decreasing timestamp
/// order, so nothing after that point is examined.
pub fn aggregate(
    flow: &FlowRecord,
    window_size: f64,
    first_n_seconds: f64,
) -> Result<WindowedSamples, ExtractError> {
    let base_timestamp = flow
        .packets
        .first()
        .map(|packet| packet.timestamp)
        .ok_or_else(|| ExtractError::MalformedFlow("flow has no packets".into()))?;

    let mut samples = WindowedSamples::with_windows(window_count(window_size, first_n_seconds));
    let mut previous_elapsed: Option<f64> = None;
    let mut accepted = 0usize;

    for packet in &flow.packets {
        if packet.upstream {
            continue;
        }

        let elapsed = (packet.timestamp - base_timestamp) as f64 / MICROS_PER_SECOND;
        if elapsed > first_n_seconds {
            break;
        }

        let window_idx = (elapsed / window_size).floor() as usize;
        // The packet that opens a still-empty window records no gap.
        if !samples.payload_sizes[window_idx].is_empty() {
            if let Some(previous) = previous_elapsed {
                samples.inter_arrivals[window_idx].push(elapsed - previous);
            }
        }
        samples.payload_sizes[window_idx].push(packet.payload_size as f64);
        previous_elapsed = Some(elapsed);
        accepted += 1;
    }

    debug!(
        "bucketed {} downstream packets into {} windows of {}s",
        accepted,
        samples.num_windows(),
        window_size
    );
    Ok(samples)
}
