//! `ec resolve` and `ec edit`: scripted and editor-driven resolution.

use std::io::{Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::info;

use easyconflict_core::config::ResolverConfig;
use easyconflict_core::engine::{parse_script, MergeInputs, Session, WriteOutcome};

use crate::style;

/// Editor used when neither `--editor` nor `$EDITOR` is set.
const FALLBACK_EDITOR: &str = "vi";

fn read_script(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read script from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read script {source}"))
    }
}

pub async fn run(
    inputs: MergeInputs,
    options: ResolverConfig,
    script: Option<&str>,
    write: bool,
) -> Result<ExitCode> {
    let mut session = Session::open(inputs, options).await?;

    if let Some(source) = script {
        let commands = parse_script(&read_script(source)?)?;
        info!(commands = commands.len(), "running resolution script");
        for command in commands {
            let label = command.to_string();
            session
                .execute(command)
                .with_context(|| format!("script command '{label}' failed"))?;
        }
    }

    if write {
        report_write(session.write().await?, &session);
    } else {
        let (bytes, _) = session.render_output();
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.flush()?;
    }
    Ok(crate::exit_for(session.unresolved_count()))
}

pub async fn edit(inputs: MergeInputs, options: ResolverConfig, editor: Option<String>) -> Result<ExitCode> {
    let editor = editor
        .or_else(|| std::env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()))
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string());

    let mut session = Session::open(inputs, options).await?;
    session.edit_with(&editor).await?;

    let total = session.document().conflict_count();
    let unresolved = session.unresolved_count();
    println!(
        "{}",
        style::header(&format!(
            "{}: {} of {total} conflict(s) resolved ({} manual)",
            session.inputs().merged.display(),
            total - unresolved,
            session.manual().len()
        ))
    );
    Ok(crate::exit_for(unresolved))
}

fn report_write(outcome: WriteOutcome, session: &Session) {
    let merged = session.inputs().merged.display();
    match outcome {
        WriteOutcome::Resolved => println!("{}", style::success(&format!("{merged}: all conflicts resolved"))),
        WriteOutcome::Partial { unresolved } => println!(
            "{}",
            style::warn(&format!("{merged}: written with {unresolved} unresolved conflict(s)"))
        ),
        WriteOutcome::Unchanged => println!("{}", style::dim(&format!("{merged}: unchanged"))),
    }
}
