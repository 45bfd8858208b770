// Fallback layout by network tier
//
// Edge devices sit near the top of the canvas, the core below them, access
// switching mid-canvas and endpoints further down.

use netcanvas_abstraction::{DeviceType, Position};

/// Base coordinate for a device type when nothing better is known.
pub fn tier_anchor(device_type: DeviceType) -> Position {
    let (x, y) = match device_type {
        DeviceType::Wan => (400.0, 60.0),
        DeviceType::Firewall => (400.0, 120.0),
        DeviceType::Router => (400.0, 180.0),
        DeviceType::CoreSwitch => (400.0, 280.0),
        DeviceType::Switch => (400.0, 400.0),
        DeviceType::AccessPoint => (240.0, 560.0),
        DeviceType::Server => (640.0, 560.0),
        DeviceType::Workstation
        | DeviceType::Printer
        | DeviceType::Camera
        | DeviceType::Phone
        | DeviceType::Iot => (400.0, 700.0),
        DeviceType::Other => (400.0, 820.0),
    };
    Position::new(x, y)
}
