//! Placement preview for a hypothetical new device.

use anyhow::{Context, Result};
use colored::*;
use netcanvas_abstraction::{ConnectionSpec, DeviceType};
use netcanvas_orchestrator::tools::{ProposedConnection, ProposedDevice};
use netcanvas_orchestrator::{find_existing, PlacementConfig, PlacementEngine};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::path::PathBuf;

use super::{print_json, read_topology};

/// Options of `ncv place`.
#[derive(Debug, Clone)]
pub struct PlaceOptions {
    pub topology: PathBuf,
    pub name: String,
    pub device_type: String,
    pub building: Option<String>,
    pub connect: Vec<String>,
    pub seed: Option<u64>,
    pub json: bool,
}

pub fn execute(options: PlaceOptions, config: PlacementConfig) -> Result<()> {
    let snapshot = read_topology(&options.topology)?;
    let device_type = DeviceType::parse(&options.device_type).with_context(|| {
        format!(
            "Unknown device type '{}'. Expected one of: {}",
            options.device_type,
            DeviceType::ALL.iter().map(DeviceType::as_str).collect::<Vec<_>>().join(", ")
        )
    })?;

    let mut device = ProposedDevice::new(options.name.clone(), device_type);
    device.building_id = options.building.clone();
    let connections: Vec<ProposedConnection> = options
        .connect
        .iter()
        .map(|name| ProposedConnection { to_device_name: name.clone(), spec: ConnectionSpec::default() })
        .collect();

    let existing = find_existing(&device, &snapshot).map(|(d, reason)| (d.id.clone(), reason));

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let placement = PlacementEngine::new(config).place(&device, &connections, &snapshot, &mut rng);

    if options.json {
        return print_json(&json!({
            "name": device.name,
            "type": device_type,
            "placement": placement,
            "existing": existing.as_ref().map(|(id, reason)| json!({"id": id, "matchedOn": reason.as_str()})),
        }));
    }

    if let Some((id, reason)) = &existing {
        println!(
            "{} {} matches existing device {} by {}",
            "!".yellow().bold(),
            device.name,
            id,
            reason.as_str()
        );
    }
    println!(
        "{} {} at ({}, {}) via {}",
        device.name.bold(),
        format!("[{}]", device_type.as_str()).cyan(),
        placement.x,
        placement.y,
        placement.strategy.as_str().dimmed()
    );
    Ok(())
}
