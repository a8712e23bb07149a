//! Setup overview and knowledge-base listing.
//!
//! `tutor status` reports which provider credentials are present and
//! whether the notes directory and knowledge base exist, so a user can see
//! at a glance why a quiz would come up empty. `tutor list` prints the
//! item names in the knowledge base.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

use crate::config::{Config, Credentials, ELEVENLABS_API_KEY_VAR, OPENAI_API_KEY_VAR};
use crate::knowledge::load_knowledge_base;
use crate::reader::scan_notes;

/// One row of the capability table.
struct CapabilityRow {
    name: &'static str,
    credential: &'static str,
    enabled: bool,
}

fn capability_rows(credentials: &Credentials) -> Vec<CapabilityRow> {
    let openai = credentials.openai_api_key.is_some();
    let elevenlabs = credentials.elevenlabs_api_key.is_some();
    vec![
        CapabilityRow {
            name: "language model",
            credential: OPENAI_API_KEY_VAR,
            enabled: openai,
        },
        CapabilityRow {
            name: "transcription",
            credential: OPENAI_API_KEY_VAR,
            enabled: openai,
        },
        CapabilityRow {
            name: "speech",
            credential: ELEVENLABS_API_KEY_VAR,
            enabled: elevenlabs,
        },
    ]
}

/// Run the status command.
pub fn run_status(config: &Config, credentials: &Credentials) -> Result<()> {
    println!("Recall Tutor Status");
    println!("===================");
    println!();
    println!("  {:<16} {:<20} ENABLED", "CAPABILITY", "CREDENTIAL");
    for row in capability_rows(credentials) {
        println!("  {:<16} {:<20} {}", row.name, row.credential, row.enabled);
    }
    println!();

    println!("  Notes:       {}", notes_summary(config));

    let kb_path = &config.knowledge.path;
    match kb_summary(kb_path) {
        Some((items, size, modified)) => {
            println!("  Knowledge:   {}", kb_path.display());
            println!("  Items:       {}", items);
            println!("  Size:        {}", format_bytes(size));
            println!("  Updated:     {}", modified);
        }
        None => {
            println!("  Knowledge:   {} (not built; run `tutor parse`)", kb_path.display());
        }
    }
    println!();

    Ok(())
}

fn notes_summary(config: &Config) -> String {
    let notes_dir = &config.notes.raw_dir;
    if !notes_dir.is_dir() {
        return format!("{} (missing)", notes_dir.display());
    }
    match scan_notes(&config.notes) {
        Ok(files) => format!("{} ({} files)", notes_dir.display(), files.len()),
        Err(e) => format!("{} (error: {:#})", notes_dir.display(), e),
    }
}

fn kb_summary(path: &Path) -> Option<(usize, u64, String)> {
    let meta = std::fs::metadata(path).ok()?;
    let items = match load_knowledge_base(path) {
        Ok(items) => items.len(),
        Err(e) => {
            tracing::warn!(error = %e, "could not read knowledge base");
            return None;
        }
    };
    let modified = meta
        .modified()
        .ok()
        .map(|t| format_age(DateTime::<Utc>::from(t)))
        .unwrap_or_else(|| "unknown".to_string());
    Some((items, meta.len(), modified))
}

/// Run the list command: one item name per line.
pub fn run_list(config: &Config) -> Result<()> {
    let items = load_knowledge_base(&config.knowledge.path)?;
    if items.is_empty() {
        println!("No knowledge items. Run `tutor parse` first.");
        return Ok(());
    }

    for (i, item) in items.iter().enumerate() {
        println!("{:>4}. {}", i + 1, item.name);
    }
    println!();
    println!("{} items in {}", items.len(), config.knowledge.path.display());
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// How long ago the knowledge base was written; an absolute date once it
/// is a month old or in the future.
fn format_age(at: DateTime<Utc>) -> String {
    let age = Utc::now() - at;
    let (count, unit) = match age {
        a if a < Duration::zero() || a >= Duration::days(30) => {
            return at.format("%Y-%m-%d %H:%M").to_string();
        }
        a if a < Duration::minutes(1) => return "just now".to_string(),
        a if a < Duration::hours(1) => (a.num_minutes(), "min"),
        a if a < Duration::days(1) => (a.num_hours(), "hour"),
        a => (a.num_days(), "day"),
    };
    let plural = if count == 1 { "" } else { "s" };
    format!("{} {}{} ago", count, unit, plural)
}
