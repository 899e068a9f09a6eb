//! Validate command implementation.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use provmark_core::Config;
use serde_json::json;
use tracing::{info, warn};

/// Execute the validate command.
pub fn execute(identifier: String, config: Config, json: bool, quiet: bool) -> Result<()> {
    let ledger = config.ledger();
    let identifier = identifier.trim();

    let record = ledger
        .find_by_identifier(identifier)
        .with_context(|| format!("Failed to read ledger: {}", ledger.path().display()))?;
    // A line can carry the identifier without parsing as a full record
    let valid = record.is_some() || ledger.validate(identifier);

    if json {
        let report = json!({
            "identifier": identifier,
            "valid": valid,
            "record": record,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else if !quiet {
        println!();
        if valid {
            println!("{}", "╔════════════════════════════════════════╗".green());
            println!("{}", "║                VALID                   ║".green().bold());
            println!("{}", "╚════════════════════════════════════════╝".green());
            println!();
            println!("   {} {}", "UUID:".dimmed(), identifier);
            if let Some(record) = &record {
                println!("   {} {}", "Image:".dimmed(), record.image_name);
                println!("   {} {}", "Folder:".dimmed(), record.folder);
                println!("   {} {}", "Embedded at:".dimmed(), record.timestamp);
                println!("   {} {} bits", "Length:".dimmed(), record.bit_len);
                println!("   {} {}", "Hash:".dimmed(), record.content_hash);
            }
        } else {
            println!("{}", "╔════════════════════════════════════════╗".red());
            println!("{}", "║               UNKNOWN                  ║".red().bold());
            println!("{}", "╚════════════════════════════════════════╝".red());
            println!();
            println!("   {} {}", "UUID:".dimmed(), identifier);
            println!(
                "   {} {}",
                "Ledger:".dimmed(),
                ledger.path().display()
            );
        }
    }

    if !valid {
        warn!(identifier, "Identifier not found in ledger");
        bail!("Validation failed: identifier '{identifier}' not found in ledger");
    }

    info!(identifier, "Identifier found in ledger");
    Ok(())
}
