//! Resolution engine: bounded undo/redo state, resolution scripts, and the
//! file-level session workflow built on top of them.

pub mod base;
pub mod script;
pub mod session;
pub mod state;

pub use base::validate_base_completeness;
pub use script::{parse_script, ScriptCommand};
pub use session::{
    apply_all_and_write, backup_path, check_resolved_file, produce_merge_view, ApplyOutcome,
    ConflictStatus, MergeInputs, Session, WriteOutcome,
};
pub use state::ResolutionState;
