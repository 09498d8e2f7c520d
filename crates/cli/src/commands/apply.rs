//! `ec apply --all <resolution>`: non-interactive bulk resolution.

use std::process::ExitCode;

use anyhow::Result;

use easyconflict_core::config::ResolverConfig;
use easyconflict_core::engine::{apply_all_and_write, ApplyOutcome, MergeInputs};
use easyconflict_core::markers::Resolution;

use crate::style;

pub async fn run(inputs: MergeInputs, resolution: Resolution, options: &ResolverConfig) -> Result<ExitCode> {
    let merged = inputs.merged.display().to_string();
    match apply_all_and_write(&inputs, resolution, options).await? {
        ApplyOutcome::NoConflicts => {
            println!("{}", style::dim(&format!("{merged}: no conflicts, nothing to do")));
        }
        ApplyOutcome::Unchanged => {
            println!("{}", style::dim(&format!("{merged}: already resolved with '{resolution}'")));
        }
        ApplyOutcome::Written { conflicts } => {
            println!(
                "{}",
                style::success(&format!("{merged}: resolved {conflicts} conflict(s) with '{resolution}'"))
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}
