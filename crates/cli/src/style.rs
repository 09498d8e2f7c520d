//! Shared styling utilities for terminal output.

use console::Style;

use easyconflict_core::conflict::LineCategory;
use easyconflict_core::engine::ConflictStatus;

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create an error-styled string (red with cross).
pub fn error(msg: &str) -> String {
    let style = Style::new().red();
    format!("{} {}", style.apply_to("✗"), msg)
}

/// Create a warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Create a header-styled string (bold, white).
pub fn header(msg: &str) -> String {
    let style = Style::new().bold();
    style.apply_to(msg).to_string()
}

/// Create a dim-styled string.
pub fn dim(msg: &str) -> String {
    let style = Style::new().dim();
    style.apply_to(msg).to_string()
}

/// Status badge for a conflict.
pub fn status(status: ConflictStatus) -> String {
    match status {
        ConflictStatus::Resolved(r) => Style::new().green().apply_to(format!("● {r}")).to_string(),
        ConflictStatus::Manual => Style::new().cyan().apply_to("● manual").to_string(),
        ConflictStatus::Unresolved => Style::new().red().apply_to("○ unresolved").to_string(),
    }
}

/// One classified line with a gutter sign, colored by category.
pub fn line(category: LineCategory, text: &str) -> String {
    let (sign, style) = match category {
        LineCategory::Equal => (' ', Style::new().dim()),
        LineCategory::Added => ('+', Style::new().green()),
        LineCategory::Removed => ('-', Style::new().red().dim()),
        LineCategory::Modified => ('~', Style::new().yellow()),
        LineCategory::Conflicted => ('!', Style::new().red().bold()),
    };
    style.apply_to(format!("{sign} {text}")).to_string()
}
