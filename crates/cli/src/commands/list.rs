//! `ec list`: conflicted files of the current repository.

use std::process::ExitCode;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use dialoguer::Select;

use easyconflict_core::config::ResolverConfig;
use easyconflict_core::engine::{check_resolved_file, MergeInputs, Session};
use easyconflict_core::git::ConflictRepo;

use super::show::print_session;
use crate::style;

pub async fn run(options: ResolverConfig, select: bool) -> Result<ExitCode> {
    let cwd = std::env::current_dir()
        .and_then(|d| d.canonicalize())
        .context("failed to resolve current directory")?;
    let repo = ConflictRepo::discover(&cwd)?;
    let paths = repo.conflicted_paths(Some(&cwd))?;

    if paths.is_empty() {
        println!("{}", style::success("No conflicted files"));
        return Ok(ExitCode::SUCCESS);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Path", "State"]);
    let mut conflicted = 0usize;
    for path in &paths {
        let state = match check_resolved_file(&repo.workdir().join(path)).await {
            Ok(true) => Cell::new("✓ markers resolved").fg(Color::Green),
            Ok(false) => {
                conflicted += 1;
                Cell::new("✗ conflicted").fg(Color::Red)
            }
            Err(e) => {
                conflicted += 1;
                Cell::new(format!("⚠ {e}")).fg(Color::Yellow)
            }
        };
        table.add_row(vec![Cell::new(path), state]);
    }
    println!("{table}");

    if !select {
        return Ok(crate::exit_for(conflicted));
    }

    let choice = Select::new()
        .with_prompt("Select a file")
        .items(&paths[..])
        .default(0)
        .interact_opt()
        .context("failed to read file selection")?;
    let Some(choice) = choice else {
        return Ok(crate::exit_for(conflicted));
    };

    let stages = repo.materialize_stages(&paths[choice])?;
    if stages.missing_base {
        println!("{}", style::warn("index has no base stage for this file"));
    }
    let inputs = MergeInputs {
        base: stages.base.clone(),
        local: stages.local.clone(),
        remote: stages.remote.clone(),
        merged: stages.merged.clone(),
    };
    let session = Session::open(inputs, crate::with_missing_base(options, stages.missing_base)).await?;
    print_session(&session);
    Ok(crate::exit_for(session.unresolved_count()))
}
