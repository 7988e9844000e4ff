//! Video flow identification.
//!
//! A capture session holds many candidate flows with no ground-truth label,
//! so the video-bearing flow has to be picked heuristically. Two signals are
//! combined, in priority order:
//!
//! - the fixed local port the native streaming client binds for video, a
//!   strong structural signal that accepts immediately, and
//! - a CDN-shaped DNS name paired with a strict packet-volume floor, a
//!   lower-confidence fallback for deployments without the fixed port.
//!
//! Flows are scanned in the dataset's key order, so the first match is
//! reproducible across runs.

use anyhow::Context;
use regex::Regex;
use tracing::{debug, info};

use crate::config::LocatorConfig;
use crate::dataset::{FlowRecord, PacketDataset, Protocol};
use crate::error::ExtractError;

/// Selects the single flow believed to carry the video stream.
pub struct FlowLocator {
    config: LocatorConfig,
    dns_pattern: Regex,
}

impl FlowLocator {
    /// Builds a locator, compiling the configured DNS name pattern.
    pub fn new(config: LocatorConfig) -> crate::error::Result<Self> {
        let dns_pattern = Regex::new(&config.dns_pattern)
            .with_context(|| format!("invalid DNS name pattern '{}'", config.dns_pattern))?;
        Ok(Self {
            config,
            dns_pattern,
        })
    }

    /// Scans the dataset for the video flow.
    ///
    /// TCP flows and flows outside the remote port band are never
    /// candidates. Fails with `NoFlowFound` after a full scan with no
    /// acceptance.
    pub fn locate<'a>(&self, dataset: &'a PacketDataset) -> Result<&'a FlowRecord, ExtractError> {
        for (key, flow) in dataset {
            if flow.protocol == Protocol::Tcp {
                continue;
            }
            if flow.remote_port < self.config.remote_port_min
                || flow.remote_port > self.config.remote_port_max
            {
                continue;
            }
            if flow.local_port == self.config.native_client_port {
                info!(
                    "selected video flow {} via fixed client port {}",
                    flow.endpoints(),
                    flow.local_port
                );
                return Ok(flow);
            }
            if self.matches_dns_fallback(flow) {
                info!(
                    "selected video flow {} via DNS pattern ({} packets)",
                    flow.endpoints(),
                    flow.packets.len()
                );
                return Ok(flow);
            }
            debug!("rejected candidate flow {} ({})", key, flow.protocol);
        }
        Err(ExtractError::NoFlowFound)
    }

    /// The volume floor is a strict greater-than: a flow at exactly the
    /// floor is still rejected as a likely incidental match.
    fn matches_dns_fallback(&self, flow: &FlowRecord) -> bool {
        let Some(dns_name) = flow.dns_name.as_deref() else {
            return false;
        };
        self.dns_pattern.is_match(dns_name) && flow.packets.len() > self.config.min_fallback_packets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::PacketRecord;

    fn locator() -> FlowLocator {
        FlowLocator::new(LocatorConfig::default()).unwrap()
    }

    fn downstream_packets(count: usize) -> Vec<PacketRecord> {
        (0..count)
            .map(|i| PacketRecord {
                timestamp: 1_700_000_000_000_000 + (i as i64) * 1_000,
                upstream: false,
                payload_size: 1350,
            })
            .collect()
    }

    fn flow(
        protocol: Protocol,
        local_port: u16,
        remote_port: u16,
        dns_name: Option<&str>,
        packet_count: usize,
    ) -> FlowRecord {
        FlowRecord {
            local_ip: "192.168.1.10".into(),
            remote_ip: "203.0.113.7".into(),
            local_port,
            remote_port,
            protocol,
            dns_name: dns_name.map(String::from),
            packets: downstream_packets(packet_count),
        }
    }

    const CDN_NAME: &str = "203-0-113-7.pnt.geforcenow.nvidiagrid.net";

    #[test]
    fn test_fixed_port_flow_is_selected() {
        let mut dataset = PacketDataset::new();
        dataset.insert("a".into(), flow(Protocol::Udp, 49005, 15000, None, 3));

        let selected = locator().locate(&dataset).unwrap();
        assert_eq!(selected.local_port, 49005);
    }

    #[test]
    fn test_fixed_port_wins_over_later_dns_match() {
        let mut dataset = PacketDataset::new();
        dataset.insert("a".into(), flow(Protocol::Udp, 49005, 15000, None, 3));
        dataset.insert(
            "b".into(),
            flow(Protocol::Udp, 50000, 15000, Some(CDN_NAME), 20_000),
        );

        let selected = locator().locate(&dataset).unwrap();
        assert_eq!(selected.local_port, 49005);
    }

    #[test]
    fn test_dns_fallback_volume_floor_is_strict() {
        let mut dataset = PacketDataset::new();
        dataset.insert(
            "a".into(),
            flow(Protocol::Udp, 50000, 15000, Some(CDN_NAME), 10_000),
        );
        assert!(matches!(
            locator().locate(&dataset),
            Err(ExtractError::NoFlowFound)
        ));

        dataset.insert(
            "b".into(),
            flow(Protocol::Udp, 50000, 15000, Some(CDN_NAME), 10_001),
        );
        let selected = locator().locate(&dataset).unwrap();
        assert_eq!(selected.packets.len(), 10_001);
    }

    #[test]
    fn test_tcp_flows_are_never_candidates() {
        let mut dataset = PacketDataset::new();
        dataset.insert("a".into(), flow(Protocol::Tcp, 49005, 15000, None, 3));
        dataset.insert(
            "b".into(),
            flow(Protocol::Tcp, 50000, 15000, Some(CDN_NAME), 20_000),
        );

        assert!(matches!(
            locator().locate(&dataset),
            Err(ExtractError::NoFlowFound)
        ));
    }

    #[test]
    fn test_port_band_is_enforced() {
        let mut dataset = PacketDataset::new();
        dataset.insert("a".into(), flow(Protocol::Udp, 49005, 9999, None, 3));
        dataset.insert("b".into(), flow(Protocol::Udp, 49005, 20001, None, 3));

        assert!(matches!(
            locator().locate(&dataset),
            Err(ExtractError::NoFlowFound)
        ));

        dataset.insert("c".into(), flow(Protocol::Udp, 49005, 10000, None, 3));
        let selected = locator().locate(&dataset).unwrap();
        assert_eq!(selected.remote_port, 10000);
    }

    #[test]
    fn test_non_udp_non_tcp_protocols_are_candidates() {
        let mut dataset = PacketDataset::new();
        dataset.insert("a".into(), flow(Protocol::Other(132), 49005, 15000, None, 3));

        assert!(locator().locate(&dataset).is_ok());
    }

    #[test]
    fn test_dns_pattern_shape() {
        let locator = locator();
        let accepted = [
            "203-0-113-7.pnt.geforcenow.nvidiagrid.net",
            "8.pnt.geforcenow.nvidiagrid.net",
        ];
        let rejected = [
            "video.pnt.geforcenow.nvidiagrid.net",
            "203-0-113-7.pnt.geforcenow.nvidiagrid.net.evil.example",
            "prefix.203-0-113-7.pnt.geforcenow.nvidiagrid.net",
            "",
        ];

        for name in accepted {
            let flow = flow(Protocol::Udp, 50000, 15000, Some(name), 10_001);
            assert!(locator.matches_dns_fallback(&flow), "should accept {name}");
        }
        for name in rejected {
            let flow = flow(Protocol::Udp, 50000, 15000, Some(name), 10_001);
            assert!(!locator.matches_dns_fallback(&flow), "should reject {name}");
        }
    }

    #[test]
    fn test_missing_dns_name_never_matches_fallback() {
        let flow = flow(Protocol::Udp, 50000, 15000, None, 20_000);
        assert!(!locator().matches_dns_fallback(&flow));
    }

    #[test]
    fn test_scan_order_is_deterministic_by_key() {
        // Two acceptable fallback flows; the lexicographically smaller key
        // wins no matter the insertion order.
        let mut dataset = PacketDataset::new();
        dataset.insert(
            "z-flow".into(),
            flow(Protocol::Udp, 50001, 15000, Some(CDN_NAME), 10_001),
        );
        dataset.insert(
            "a-flow".into(),
            flow(Protocol::Udp, 50002, 15000, Some(CDN_NAME), 10_001),
        );

        let selected = locator().locate(&dataset).unwrap();
        assert_eq!(selected.local_port, 50002);
    }
}
