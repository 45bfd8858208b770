//! Tool catalogue introspection.

use anyhow::Result;
use colored::*;
use netcanvas_orchestrator::tool_definitions;

use super::print_json;

/// Lists the tools offered to the LLM, optionally filtered by name.
pub fn list(filter: Option<&str>, json: bool) -> Result<()> {
    let tools: Vec<_> = tool_definitions()
        .into_iter()
        .filter(|t| filter.is_none_or(|f| t.name.contains(&f.to_lowercase())))
        .collect();

    if json {
        return print_json(&tools);
    }

    println!("{}", "Available Tools".bold().cyan());
    println!("{}", "─".repeat(80).dimmed());
    println!();

    if tools.is_empty() {
        println!("{}", "No tools found".yellow());
        return Ok(());
    }

    for tool in &tools {
        println!("{}", tool.name.bold().green());
        println!("  {}", tool.description.dimmed());

        if !tool.parameters.properties.is_empty() {
            println!("  {}", "Parameters:".dimmed());
            for (name, prop) in &tool.parameters.properties {
                let required = if tool.parameters.required.contains(name) { "required" } else { "optional" };
                println!("    {} ({}, {}) - {}", name.cyan(), prop.property_type, required, prop.description.dimmed());
            }
        }
        println!();
    }

    println!("{}", format!("Total: {} tool(s)", tools.len()).dimmed());
    Ok(())
}
