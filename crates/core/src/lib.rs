//! easy-conflict core library.
//!
//! This crate provides the components for structured three-way conflict
//! resolution: conflict-marker parsing and rendering, bounded undo/redo
//! resolution state, LCS line classification, reconciliation of externally
//! edited files, merge view producers, and configuration.

pub mod config;
pub mod conflict;
pub mod engine;
pub mod errors;
pub mod git;
pub mod lines;
pub mod markers;

// Re-exports for convenience.
pub use config::AppConfig;
pub use engine::{ResolutionState, Session};
pub use errors::CoreError;
pub use markers::{parse, Document, Resolution};
