//! `ec show`: conflict overview and line-level classification.

use std::process::ExitCode;

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use tracing::warn;

use easyconflict_core::config::ResolverConfig;
use easyconflict_core::conflict::{conflict_entries, FileClassification, LineEntry};
use easyconflict_core::engine::{ConflictStatus, MergeInputs, Session};

use crate::style;

#[derive(Serialize)]
struct ConflictSummary<'a> {
    index: usize,
    ours_label: Option<&'a str>,
    base_label: Option<&'a str>,
    theirs_label: Option<&'a str>,
    has_base: bool,
    status: ConflictStatus,
}

#[derive(Serialize)]
struct SessionSummary<'a> {
    merged: String,
    conflicts: Vec<ConflictSummary<'a>>,
    unresolved: usize,
    /// Absent when the stage files cannot be aligned with the merge view.
    classification: Option<FileClassification>,
}

pub async fn run(inputs: MergeInputs, options: ResolverConfig, json: bool) -> Result<ExitCode> {
    let session = Session::open(inputs, options).await?;
    if json {
        print_json(&session).await?;
    } else {
        print_session(&session);
    }
    Ok(crate::exit_for(session.unresolved_count()))
}

async fn print_json(session: &Session) -> Result<()> {
    let classification = match session.classify().await {
        Ok(c) => Some(c),
        Err(e) => {
            warn!(error = %e, "skipping line classification");
            None
        }
    };
    let conflicts = session
        .document()
        .conflicts()
        .enumerate()
        .map(|(index, c)| ConflictSummary {
            index,
            ours_label: c.ours_label.as_deref(),
            base_label: c.base_label.as_deref(),
            theirs_label: c.theirs_label.as_deref(),
            has_base: c.has_base(),
            status: session.status(index).unwrap_or(ConflictStatus::Unresolved),
        })
        .collect();
    let summary = SessionSummary {
        merged: session.inputs().merged.display().to_string(),
        conflicts,
        unresolved: session.unresolved_count(),
        classification,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Status table followed by each conflict's classified lines.
pub fn print_session(session: &Session) {
    let doc = session.document();
    println!(
        "{}",
        style::header(&format!(
            "{}: {} conflict(s), {} unresolved",
            session.inputs().merged.display(),
            doc.conflict_count(),
            session.unresolved_count()
        ))
    );
    if !doc.has_conflicts() {
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Ours", "Theirs", "Base", "Status"]);
    for (index, c) in doc.conflicts().enumerate() {
        let status = session.status(index).unwrap_or(ConflictStatus::Unresolved);
        let status_cell = match status {
            ConflictStatus::Resolved(r) => Cell::new(format!("✓ {r}")).fg(Color::Green),
            ConflictStatus::Manual => Cell::new("✎ manual").fg(Color::Cyan),
            ConflictStatus::Unresolved => Cell::new("✗ unresolved").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(index),
            Cell::new(c.ours_label.as_deref().unwrap_or("-")),
            Cell::new(c.theirs_label.as_deref().unwrap_or("-")),
            Cell::new(if c.has_base() { "yes" } else { "missing" }),
            status_cell,
        ]);
    }
    println!("{table}");

    for (index, c) in doc.conflicts().enumerate() {
        let status = session.status(index).unwrap_or(ConflictStatus::Unresolved);
        println!();
        println!("{} {}", style::header(&format!("Conflict {index}")), style::status(status));
        let (ours, theirs) = conflict_entries(c);
        print_side(c.ours_label.as_deref().unwrap_or("ours"), &ours);
        print_side(c.theirs_label.as_deref().unwrap_or("theirs"), &theirs);
    }
}

fn print_side(label: &str, entries: &[LineEntry]) {
    println!("  {}", style::dim(label));
    if entries.is_empty() {
        println!("    {}", style::dim("(empty)"));
    }
    for entry in entries {
        println!("    {}", style::line(entry.category, &entry.text));
    }
}
