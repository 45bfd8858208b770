//! Duplicate detection for proposed devices.

use netcanvas_abstraction::{normalize_name, Device, TopologySnapshot};

use crate::tools::ProposedDevice;
use crate::validation::normalize_mac;

/// Which identifying field matched an existing device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    Name,
    Ip,
    Mac,
}

impl MatchReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Ip => "ip",
            Self::Mac => "mac",
        }
    }
}

/// Finds an existing device equivalent to `proposed`.
///
/// Precedence is name (trimmed, case-insensitive), then exact IP, then MAC
/// ignoring separators and case. Only exact matches count.
pub fn find_existing<'a>(proposed: &ProposedDevice, snapshot: &'a TopologySnapshot) -> Option<(&'a Device, MatchReason)> {
    let name = normalize_name(&proposed.name);
    if !name.is_empty() {
        if let Some(d) = snapshot.devices.iter().find(|d| normalize_name(&d.name) == name) {
            return Some((d, MatchReason::Name));
        }
    }

    if let Some(ip) = proposed.ip.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        if let Some(d) = snapshot.devices.iter().find(|d| d.ip.as_deref().map(str::trim) == Some(ip)) {
            return Some((d, MatchReason::Ip));
        }
    }

    if let Some(mac) = proposed.mac.as_deref().map(normalize_mac).filter(|s| !s.is_empty()) {
        if let Some(d) = snapshot.devices.iter().find(|d| d.mac.as_deref().map(normalize_mac).as_deref() == Some(mac.as_str())) {
            return Some((d, MatchReason::Mac));
        }
    }

    None
}
