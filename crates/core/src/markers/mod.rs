//! Conflict-marker documents: parsing, the document model, and rendering.

pub mod parser;
pub mod render;
pub mod types;

pub use parser::{is_marker_line, is_resolved, parse};
pub use render::{render, render_permissive, render_resolved, render_with_unresolved, RenderMode};
pub use types::{
    ConflictRef, ConflictSegment, Document, ManualResolutions, MarkerLines, Resolution, Segment,
    TextSegment, UnknownResolution,
};
