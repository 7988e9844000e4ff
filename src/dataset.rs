//! Packet dataset model and loading.
//!
//! Mirrors the JSON layout produced by the capture preprocessor: one object
//! per session, mapping opaque flow keys to flows, each flow carrying its
//! ordered packet metadata. The dataset is read once per invocation and is
//! immutable thereafter.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::DatasetError;

/// File name suffix of per-session packet dumps produced by the preprocessor.
pub const STATS_FILE_SUFFIX: &str = "_packetStats.json";

/// Metadata for a single observed packet. Immutable once read.
#[derive(Debug, Clone, Deserialize)]
pub struct PacketRecord {
    /// Absolute UNIX timestamp in microseconds, non-decreasing within a flow.
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,

    /// Direction relative to the observed client. Upstream packets carry no
    /// video payload and are ignored by the aggregation pass.
    #[serde(rename = "Upstream")]
    pub upstream: bool,

    #[serde(rename = "PayloadSize")]
    pub payload_size: u64,
}

/// Transport layer protocol, decoded from the IP protocol number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum Protocol {
    Tcp,
    Udp,
    Other(u8),
}

impl From<u8> for Protocol {
    fn from(number: u8) -> Self {
        match number {
            6 => Protocol::Tcp,
            17 => Protocol::Udp,
            other => Protocol::Other(other),
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
            Protocol::Other(n) => write!(f, "PROTO:{}", n),
        }
    }
}

/// One candidate flow of a capture session.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowRecord {
    #[serde(rename = "LocalIP", default)]
    pub local_ip: String,

    #[serde(rename = "RemoteIP", default)]
    pub remote_ip: String,

    #[serde(rename = "LocalPort")]
    pub local_port: u16,

    #[serde(rename = "RemotePort")]
    pub remote_port: u16,

    #[serde(rename = "Protocol")]
    pub protocol: Protocol,

    /// DNS name the remote endpoint resolved from, when the preprocessor
    /// could map it. Empty or absent for flows without a DNS record.
    #[serde(rename = "DNSName", default)]
    pub dns_name: Option<String>,

    #[serde(rename = "Packets", default)]
    pub packets: Vec<PacketRecord>,
}

impl FlowRecord {
    /// Display-friendly endpoint summary for logging.
    pub fn endpoints(&self) -> String {
        format!(
            "{}:{} -> {}:{} ({})",
            self.local_ip, self.local_port, self.remote_ip, self.remote_port, self.protocol
        )
    }
}

/// All candidate flows of one capture session, keyed by the preprocessor's
/// opaque flow key.
///
/// The source JSON object carries no meaningful order, so the dataset imposes
/// one: `BTreeMap` iteration is lexicographic by flow key, which makes the
/// first-match flow scan reproducible regardless of how the object happened
/// to be written.
pub type PacketDataset = BTreeMap<String, FlowRecord>;

/// Resolves a capture source to its packet stats file.
///
/// A directory resolves to the `<dirname>_packetStats.json` file inside it;
/// anything else is taken as the stats file itself.
pub fn resolve_stats_path(source: &Path) -> Result<PathBuf, DatasetError> {
    if !source.is_dir() {
        return Ok(source.to_path_buf());
    }

    let dir_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let candidate = source.join(format!("{}{}", dir_name, STATS_FILE_SUFFIX));
    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(DatasetError::StatsFileMissing { path: candidate })
    }
}

/// Loads a packet dataset from a stats file or capture directory.
pub fn load_dataset(source: &Path) -> Result<PacketDataset, DatasetError> {
    let path = resolve_stats_path(source)?;
    debug!("loading packet dataset from {}", path.display());

    let content = fs::read_to_string(&path).map_err(|source| DatasetError::Read {
        path: path.clone(),
        source,
    })?;
    let dataset: PacketDataset =
        serde_json::from_str(&content).map_err(|source| DatasetError::Parse {
            path: path.clone(),
            source,
        })?;

    debug!("loaded {} candidate flows", dataset.len());
    Ok(dataset)
}
