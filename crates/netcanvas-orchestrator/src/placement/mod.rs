//! Canvas placement for new devices.
//!
//! A strict priority chain picks a candidate point: near the devices the new
//! one connects to, near devices of the same type, inside its building, or
//! at a fixed anchor for its network tier. The candidate is snapped to the
//! grid and moved off any existing device by [`spiral::avoid_overlap`].

pub mod spiral;
pub mod tiers;

use netcanvas_abstraction::{Device, Position, TopologySnapshot};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, warn};

use crate::config::PlacementConfig;
use crate::tools::{ProposedConnection, ProposedDevice};
use spiral::{avoid_overlap, snap_to_grid};
use tiers::tier_anchor;

/// Which rule chose the candidate point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    NearConnected,
    NearSimilarType,
    BuildingLocation,
    TopologyTier,
}

impl PlacementStrategy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NearConnected => "near_connected",
            Self::NearSimilarType => "near_similar_type",
            Self::BuildingLocation => "building_location",
            Self::TopologyTier => "topology_tier",
        }
    }
}

/// Where a new device will go.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub x: f64,
    pub y: f64,
    pub strategy: PlacementStrategy,
}

impl PlacementResult {
    #[must_use]
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Computes positions for new devices.
#[derive(Debug, Clone, Default)]
pub struct PlacementEngine {
    config: PlacementConfig,
}

fn centroid(points: &[Position]) -> Option<Position> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Position::new(sx / n, sy / n))
}

/// Uniform sample in `[0, max)`, or zero when the range is empty.
fn sample<R: Rng + ?Sized>(rng: &mut R, max: f64) -> f64 {
    if max > 0.0 { rng.gen_range(0.0..max) } else { 0.0 }
}

/// Uniform sample in `[-span/2, span/2)`.
fn centered<R: Rng + ?Sized>(rng: &mut R, span: f64) -> f64 {
    sample(rng, span) - span / 2.0
}

impl PlacementEngine {
    #[must_use]
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Places `device` against `snapshot`.
    ///
    /// Never fails: when the spiral search runs out of attempts the snapped
    /// candidate is returned even though it overlaps.
    pub fn place<R: Rng + ?Sized>(
        &self,
        device: &ProposedDevice,
        connections: &[ProposedConnection],
        snapshot: &TopologySnapshot,
        rng: &mut R,
    ) -> PlacementResult {
        let (candidate, strategy) = self.candidate(device, connections, snapshot, rng);
        let candidate = snap_to_grid(candidate, self.config.grid_size);

        let occupied: Vec<Position> = snapshot.occupied_positions().collect();
        let outcome = avoid_overlap(
            candidate,
            &occupied,
            self.config.grid_size,
            self.config.min_spacing,
            self.config.max_attempts,
        );
        if !outcome.resolved {
            warn!(device = %device.name, attempts = outcome.attempts, "No collision-free position found");
        }

        debug!(
            device = %device.name,
            strategy = strategy.as_str(),
            x = outcome.position.x,
            y = outcome.position.y,
            spiral_attempts = outcome.attempts,
            "Placed device"
        );

        PlacementResult { x: outcome.position.x, y: outcome.position.y, strategy }
    }

    /// Places several devices in order, each one treating the previously
    /// placed ones as existing.
    pub fn place_all<'a, R, I>(&self, items: I, snapshot: &TopologySnapshot, rng: &mut R) -> Vec<PlacementResult>
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = (&'a ProposedDevice, &'a [ProposedConnection])>,
    {
        let mut working = snapshot.clone();
        items
            .into_iter()
            .map(|(device, connections)| {
                let placed = self.place(device, connections, &working, rng);
                working.devices.push(staged(device, placed.position()));
                placed
            })
            .collect()
    }

    fn candidate<R: Rng + ?Sized>(
        &self,
        device: &ProposedDevice,
        connections: &[ProposedConnection],
        snapshot: &TopologySnapshot,
        rng: &mut R,
    ) -> (Position, PlacementStrategy) {
        let c = &self.config;

        let targets: Vec<Position> = connections
            .iter()
            .filter_map(|conn| snapshot.device_by_name(&conn.to_device_name)?.position)
            .collect();
        if let Some(center) = centroid(&targets) {
            let radius = c.connected_radius + sample(rng, c.connected_jitter);
            return (offset(center, rng.gen_range(0.0..TAU), radius), PlacementStrategy::NearConnected);
        }

        let similar: Vec<Position> = snapshot
            .devices
            .iter()
            .filter(|d| d.device_type == device.device_type)
            .filter_map(|d| d.position)
            .collect();
        if let Some(center) = centroid(&similar) {
            let radius = c.similar_radius + sample(rng, c.similar_jitter);
            return (offset(center, rng.gen_range(0.0..TAU), radius), PlacementStrategy::NearSimilarType);
        }

        let bounds = device.building_id.as_deref().and_then(|id| snapshot.building(id)?.bounds);
        if let Some(bounds) = bounds {
            let center = bounds.center();
            let point = Position::new(
                center.x + centered(rng, bounds.width * c.building_inset),
                center.y + centered(rng, bounds.height * c.building_inset),
            );
            return (point, PlacementStrategy::BuildingLocation);
        }

        let anchor = tier_anchor(device.device_type);
        let point = Position::new(
            anchor.x + centered(rng, c.tier_jitter_x),
            anchor.y + centered(rng, c.tier_jitter_y),
        );
        (point, PlacementStrategy::TopologyTier)
    }
}

fn offset(center: Position, angle: f64, radius: f64) -> Position {
    Position::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

/// A placeholder for a device placed earlier in the same batch.
fn staged(device: &ProposedDevice, at: Position) -> Device {
    let mut staged = Device::new(String::new(), device.name.clone(), device.device_type).with_position(at.x, at.y);
    staged.building_id.clone_from(&device.building_id);
    staged
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcanvas_abstraction::{Bounds, Building, ConnectionSpec, DeviceType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn link(to: &str) -> ProposedConnection {
        ProposedConnection { to_device_name: to.to_string(), spec: ConnectionSpec::default() }
    }

    fn engine() -> PlacementEngine {
        PlacementEngine::new(PlacementConfig::default())
    }

    #[test]
    fn test_near_connected_uses_target_centroid() {
        let snapshot = TopologySnapshot::with_devices(vec![
            Device::new("a", "SW-A", DeviceType::Switch).with_position(1000.0, 1000.0),
            Device::new("b", "SW-B", DeviceType::Switch).with_position(1400.0, 1000.0),
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        let placed = engine().place(
            &ProposedDevice::new("AP1", DeviceType::AccessPoint),
            &[link("sw-a"), link("SW-B"), link("missing")],
            &snapshot,
            &mut rng,
        );
        assert_eq!(placed.strategy, PlacementStrategy::NearConnected);
        let d = placed.position().distance_to(&Position::new(1200.0, 1000.0));
        // band is [150, 250) plus snapping and any spiral adjustment
        assert!(d < 500.0, "distance {}", d);
        for existing in snapshot.occupied_positions() {
            assert!(placed.position().distance_to(&existing) >= 80.0);
        }
    }

    #[test]
    fn test_near_similar_type_when_no_connection_resolves() {
        let snapshot = TopologySnapshot::with_devices(vec![
            Device::new("s", "SRV-1", DeviceType::Server).with_position(2000.0, 2000.0),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let placed = engine().place(
            &ProposedDevice::new("SRV-2", DeviceType::Server),
            &[link("nowhere")],
            &snapshot,
            &mut rng,
        );
        assert_eq!(placed.strategy, PlacementStrategy::NearSimilarType);
        assert!(placed.position().distance_to(&Position::new(2000.0, 2000.0)) >= 80.0);
    }

    #[test]
    fn test_building_location_stays_inside_inset() {
        let snapshot = TopologySnapshot {
            buildings: vec![Building {
                id: "hq".to_string(),
                name: "HQ".to_string(),
                bounds: Some(Bounds { x: 0.0, y: 0.0, width: 1000.0, height: 500.0 }),
            }],
            ..TopologySnapshot::default()
        };
        let mut device = ProposedDevice::new("CAM-1", DeviceType::Camera);
        device.building_id = Some("hq".to_string());
        for seed in 0..20 {
            let placed = engine().place(&device, &[], &snapshot, &mut StdRng::seed_from_u64(seed));
            assert_eq!(placed.strategy, PlacementStrategy::BuildingLocation);
            assert!((190.0..=810.0).contains(&placed.x), "x {}", placed.x);
            assert!((90.0..=410.0).contains(&placed.y), "y {}", placed.y);
        }
    }

    #[test]
    fn test_tier_fallback_and_grid_snap() {
        let mut rng = StdRng::seed_from_u64(3);
        let placed = engine().place(
            &ProposedDevice::new("FW-1", DeviceType::Firewall),
            &[],
            &TopologySnapshot::default(),
            &mut rng,
        );
        assert_eq!(placed.strategy, PlacementStrategy::TopologyTier);
        assert_eq!(placed.x % 20.0, 0.0);
        assert_eq!(placed.y % 20.0, 0.0);
        assert!((placed.x - 400.0).abs() <= 80.0);
        assert!((placed.y - 120.0).abs() <= 40.0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let device = ProposedDevice::new("R1", DeviceType::Router);
        let a = engine().place(&device, &[], &TopologySnapshot::default(), &mut StdRng::seed_from_u64(42));
        let b = engine().place(&device, &[], &TopologySnapshot::default(), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_place_all_keeps_batch_members_apart() {
        let devices: Vec<ProposedDevice> =
            (0..5).map(|i| ProposedDevice::new(format!("AP{}", i), DeviceType::AccessPoint)).collect();
        let mut rng = StdRng::seed_from_u64(11);
        let placed = engine().place_all(
            devices.iter().map(|d| (d, &[][..])),
            &TopologySnapshot::default(),
            &mut rng,
        );
        assert_eq!(placed.len(), 5);
        // only the first has nothing to go near
        assert_eq!(placed[0].strategy, PlacementStrategy::TopologyTier);
        assert!(placed[1..].iter().all(|p| p.strategy == PlacementStrategy::NearSimilarType));
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(a.position().distance_to(&b.position()) >= 80.0);
            }
        }
    }
}
