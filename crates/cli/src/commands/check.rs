//! `ec check`: CI-style test for leftover conflict markers.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;

use easyconflict_core::engine::check_resolved_file;

use crate::style;

pub async fn run(merged: &Path) -> Result<ExitCode> {
    if check_resolved_file(merged).await? {
        println!("{}", style::success(&format!("{} is resolved", merged.display())));
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}", style::warn(&format!("{} still has conflicts", merged.display())));
        Ok(crate::exit_for(1))
    }
}
