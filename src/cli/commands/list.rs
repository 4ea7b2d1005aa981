//! List command - show cached models

use super::open_store;
use crate::cache::{format_bytes, EntryInfo};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::StanCacheResult;
use crate::ui::{self, UiContext};
use console::style;
use std::path::Path;

/// Execute the list command
pub fn execute(args: ListArgs, config: &Config, cache_dir: &Path) -> StanCacheResult<()> {
    let store = open_store(config, cache_dir)?;
    let entries = store.entries()?;

    if entries.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No cached models");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(store.root(), &entries),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(root: &Path, entries: &[EntryInfo]) {
    println!(
        "{:<20} {:<14} {:<18} {:>10}  {}",
        style("MODEL").bold(),
        style("DIGEST").bold(),
        style("CREATED").bold(),
        style("SIZE").bold(),
        style("FILE").bold()
    );
    println!("{}", "-".repeat(90));

    for entry in entries {
        let file = entry
            .path
            .strip_prefix(root)
            .unwrap_or(&entry.path)
            .display()
            .to_string();
        let size = format_bytes(entry.size_bytes);

        match &entry.header {
            Ok(header) => println!(
                "{:<20} {:<14} {:<18} {:>10}  {}",
                header.model_name,
                &header.fingerprint[..header.fingerprint.len().min(12)],
                header.created_at.format("%Y-%m-%d %H:%M"),
                size,
                file
            ),
            Err(_) => println!(
                "{:<20} {:<14} {:<18} {:>10}  {}",
                style("?").dim(),
                style("unreadable").yellow(),
                "-",
                size,
                file
            ),
        }
    }

    println!();
    println!("Total: {} model(s)", entries.len());
}

fn print_json(entries: &[EntryInfo]) -> StanCacheResult<()> {
    #[derive(serde::Serialize)]
    struct EntryJson {
        path: String,
        size_bytes: u64,
        model_name: Option<String>,
        fingerprint: Option<String>,
        created_at: Option<String>,
        error: Option<String>,
    }

    let json_entries: Vec<EntryJson> = entries
        .iter()
        .map(|e| {
            let header = e.header.as_ref().ok();
            EntryJson {
                path: e.path.display().to_string(),
                size_bytes: e.size_bytes,
                model_name: header.map(|h| h.model_name.clone()),
                fingerprint: header.map(|h| h.fingerprint.clone()),
                created_at: header.map(|h| h.created_at.to_rfc3339()),
                error: e.header.as_ref().err().cloned(),
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json_entries)?);
    Ok(())
}

fn print_plain(entries: &[EntryInfo]) {
    for entry in entries {
        println!("{}", entry.path.display());
    }
}
