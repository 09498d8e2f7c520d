//! Subcommand implementations.

pub mod apply;
pub mod check;
pub mod list;
pub mod resolve;
pub mod show;
