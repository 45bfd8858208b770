//! Human-readable rendering of pipeline results.

use colored::*;
use netcanvas_abstraction::CommitReceipt;
use netcanvas_orchestrator::{ChangeProposal, Notice, PendingApproval, PlacedSuggestion, TurnOutcome};

pub fn render_outcome(outcome: &TurnOutcome) {
    if !outcome.text.trim().is_empty() {
        println!("{}", outcome.text.trim());
        println!();
    }

    if outcome.failed {
        println!("{}", "Turn failed".red().bold());
        if let Some(input) = &outcome.restored_input {
            println!("  {} {}", "Input to retry:".dimmed(), input);
        }
    }

    match &outcome.pending {
        Some(PendingApproval::Device(p)) => {
            println!("{} {}", "Pending device".green().bold(), p.id.dimmed());
            render_suggestion(&p.suggestion);
        }
        Some(PendingApproval::Batch(p)) => {
            println!(
                "{} {} {}",
                "Pending batch".green().bold(),
                format!("({} devices)", p.suggestions.len()).cyan(),
                p.id.dimmed()
            );
            for suggestion in &p.suggestions {
                render_suggestion(suggestion);
            }
        }
        Some(PendingApproval::Change(p)) => {
            println!("{} {}", "Pending change".green().bold(), p.id.dimmed());
            println!("  {} {}", p.change.tool.to_string().cyan(), p.change.description);
            if !p.change.reasoning.is_empty() {
                println!("  {}", p.change.reasoning.dimmed());
            }
        }
        Some(PendingApproval::Proposal(p)) => {
            println!("{} {}", "Pending proposal".green().bold(), p.id.dimmed());
            render_proposal(&p.proposal);
        }
        None => println!("{}", "Nothing to approve".dimmed()),
    }

    if !outcome.notices.is_empty() {
        println!();
        for notice in &outcome.notices {
            render_notice(notice);
        }
    }
}

fn render_suggestion(placed: &PlacedSuggestion) {
    let device = &placed.suggestion.device;
    println!(
        "  {} {} at ({}, {}) via {}",
        device.name.bold(),
        format!("[{}]", device.device_type.as_str()).cyan(),
        placed.placement.x,
        placed.placement.y,
        placed.placement.strategy.as_str().dimmed()
    );
    for conn in &placed.suggestion.connections {
        println!("    {} {}", "->".dimmed(), conn.to_device_name);
    }
}

pub fn render_proposal(proposal: &ChangeProposal) {
    println!("  {}", proposal.summary.bold());
    if let Some(reasoning) = &proposal.reasoning {
        println!("  {}", reasoning.dimmed());
    }

    for device in &proposal.affected_devices {
        println!("  {} {}", device.name.cyan(), device.id.dimmed());
        for (path, change) in &device.changes {
            let line = format!("    {}: {} -> {}", path, change.old, change.new);
            if change.is_noop() {
                println!("{}", line.dimmed());
            } else {
                println!("{}", line);
            }
        }
    }

    for id in &proposal.missing_device_ids {
        println!("  {} unknown device {}", "✗".red(), id);
    }
    for (path, message) in &proposal.validation.errors {
        println!("  {} {}: {}", "✗".red(), path, message);
    }

    if proposal.is_approvable() {
        println!("  {}", "Ready for approval".green());
    } else {
        println!("  {}", "Blocked".red().bold());
    }
}

pub fn render_notice(notice: &Notice) {
    if notice.is_error() {
        println!("{} {}", "!".red().bold(), notice.message());
    } else {
        println!("{} {}", "i".blue(), notice.message().dimmed());
    }
}

pub fn render_receipt(receipt: &CommitReceipt) {
    println!("{}", "Committed".green().bold());
    for (label, ids) in [("created", &receipt.created), ("updated", &receipt.updated), ("removed", &receipt.removed)] {
        if !ids.is_empty() {
            println!("  {}: {}", label, ids.join(", "));
        }
    }
}
