//! Checks a change proposal embedded in assistant text.

use anyhow::{bail, Context, Result};
use colored::*;
use netcanvas_orchestrator::{extract_proposal, ProposalConfig};
use std::path::Path;

use super::{print_json, read_topology, render};

/// Extracts, validates and diffs the proposal in `text_path`.
///
/// A proposal that is present but blocked is reported and fails the command
/// when `strict` is set.
pub fn execute(text_path: &Path, topology_path: &Path, config: &ProposalConfig, strict: bool, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(text_path)
        .with_context(|| format!("Failed to read message file {}", text_path.display()))?;
    let snapshot = read_topology(topology_path)?;

    let proposal = extract_proposal(&text, &snapshot, config);

    if json {
        print_json(&proposal)?;
    } else {
        match &proposal {
            Some(p) => {
                println!("{} {}", "Proposal".bold().cyan(), p.action.dimmed());
                render::render_proposal(p);
            }
            None => println!("{}", "No proposal found".yellow()),
        }
    }

    if strict {
        if let Some(p) = proposal.filter(|p| !p.is_approvable()) {
            bail!("Proposal is blocked: {}", p.blocking_reasons().join("; "));
        }
    }
    Ok(())
}
