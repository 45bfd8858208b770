//! Field format checks shared by tool payloads and change proposals.

use once_cell::sync::Lazy;
use regex::Regex;

// Built-in format regexes compiled lazily
static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").expect("IPv4 regex should be valid")
});

static MAC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}([:-])[0-9A-Fa-f]{2}(?:[:-][0-9A-Fa-f]{2}){4}$")
        .expect("MAC regex should be valid")
});

/// Lowest usable 802.1Q VLAN id.
pub const VLAN_MIN: u16 = 1;
/// Highest usable 802.1Q VLAN id.
pub const VLAN_MAX: u16 = 4094;

/// Checks a dotted-quad IPv4 address with every octet in 0..=255.
pub fn is_valid_ipv4(ip: &str) -> bool {
    IPV4_REGEX.captures(ip.trim()).is_some_and(|caps| {
        caps.iter().skip(1).flatten().all(|octet| octet.as_str().parse::<u16>().is_ok_and(|n| n <= 255))
    })
}

/// Checks a MAC address written as six hex pairs separated by `:` or `-`.
///
/// Separators must be consistent within one address.
pub fn is_valid_mac(mac: &str) -> bool {
    let mac = mac.trim();
    MAC_REGEX.captures(mac).is_some_and(|caps| {
        let sep = caps.get(1).map_or(":", |m| m.as_str());
        let other = if sep == ":" { '-' } else { ':' };
        !mac.contains(other)
    })
}

/// Canonical comparison form of a MAC: separators stripped, lower-cased.
pub fn normalize_mac(mac: &str) -> String {
    mac.trim().chars().filter(|c| *c != ':' && *c != '-').collect::<String>().to_lowercase()
}

/// Whether `id` is a usable VLAN number.
pub fn is_valid_vlan(id: i64) -> bool {
    (i64::from(VLAN_MIN)..=i64::from(VLAN_MAX)).contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4() {
        assert!(is_valid_ipv4("10.0.0.1"));
        assert!(is_valid_ipv4("255.255.255.0"));
        assert!(is_valid_ipv4(" 192.168.1.20 "));
        assert!(!is_valid_ipv4("256.1.1.1"));
        assert!(!is_valid_ipv4("10.0.0"));
        assert!(!is_valid_ipv4("10.0.0.1.5"));
        assert!(!is_valid_ipv4("a.b.c.d"));
        assert!(!is_valid_ipv4(""));
    }

    #[test]
    fn test_mac() {
        assert!(is_valid_mac("00:1A:2b:3C:4d:5E"));
        assert!(is_valid_mac("00-1a-2b-3c-4d-5e"));
        assert!(!is_valid_mac("00:1a-2b:3c:4d:5e"));
        assert!(!is_valid_mac("001a2b3c4d5e"));
        assert!(!is_valid_mac("00:1a:2b:3c:4d"));
        assert!(!is_valid_mac("00:1a:2b:3c:4d:zz"));
    }

    #[test]
    fn test_normalize_mac() {
        assert_eq!(normalize_mac("00:1A:2B:3C:4D:5E"), "001a2b3c4d5e");
        assert_eq!(normalize_mac("00-1a-2b-3c-4d-5e"), "001a2b3c4d5e");
    }

    #[test]
    fn test_vlan_range() {
        assert!(is_valid_vlan(1));
        assert!(is_valid_vlan(4094));
        assert!(!is_valid_vlan(0));
        assert!(!is_valid_vlan(4095));
        assert!(!is_valid_vlan(-3));
    }
}
