//! Command implementations for the NetCanvas CLI.

pub mod place;
pub mod propose;
pub mod render;
pub mod replay;
pub mod tools;

use anyhow::{Context, Result};
use netcanvas_abstraction::TopologySnapshot;
use serde::Serialize;
use std::path::Path;

/// Reads a topology snapshot from a JSON file.
pub fn read_topology(path: &Path) -> Result<TopologySnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read topology file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid topology JSON in {}", path.display()))
}

/// Writes a topology snapshot as pretty JSON.
pub fn write_topology(path: &Path, snapshot: &TopologySnapshot) -> Result<()> {
    let content = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write topology file {}", path.display()))
}

/// Prints `value` to stdout as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
