//! Resolution state with bounded undo/redo.
//!
//! History entries are full [`Document`] snapshots. Both stacks hold at most
//! `max_depth` entries; pushing past the bound evicts the single oldest one.

use std::collections::VecDeque;

use tracing::debug;

use crate::errors::{RenderError, StateError};
use crate::markers::{render_resolved, Document, Resolution};

/// Owns the live document and its undo/redo history.
#[derive(Debug, Clone)]
pub struct ResolutionState {
    doc: Document,
    undo: VecDeque<Document>,
    redo: VecDeque<Document>,
    max_depth: usize,
}

impl ResolutionState {
    /// Wrap `doc` with history bounded to `max_depth` (must be >= 1).
    pub fn new(doc: Document, max_depth: usize) -> Result<Self, StateError> {
        if max_depth < 1 {
            return Err(StateError::InvalidDepth(max_depth));
        }
        Ok(Self {
            doc,
            undo: VecDeque::with_capacity(max_depth),
            redo: VecDeque::with_capacity(max_depth),
            max_depth,
        })
    }

    /// Set the resolution of conflict `index`.
    ///
    /// Applying the value a conflict already holds records no history.
    pub fn apply_resolution(&mut self, index: usize, resolution: Resolution) -> Result<(), StateError> {
        let len = self.doc.conflict_count();
        let current = self
            .doc
            .conflict(index)
            .ok_or(StateError::IndexOutOfRange { index, len })?
            .resolution();
        check_canonical(resolution)?;
        if current == resolution {
            return Ok(());
        }

        self.begin_mutation();
        self.doc.set_resolution(index, resolution);
        debug!(index, %resolution, "applied resolution");
        Ok(())
    }

    /// Set every conflict to `resolution`; a no-op if all already hold it.
    pub fn apply_all(&mut self, resolution: Resolution) -> Result<(), StateError> {
        check_canonical(resolution)?;
        if self.doc.conflicts().all(|c| c.resolution() == resolution) {
            return Ok(());
        }

        self.begin_mutation();
        for index in 0..self.doc.conflict_count() {
            self.doc.set_resolution(index, resolution);
        }
        debug!(%resolution, conflicts = self.doc.conflict_count(), "applied resolution to all");
        Ok(())
    }

    /// Replace the whole document as one undoable step.
    ///
    /// Returns false, recording nothing, when `doc` equals the current one.
    pub fn replace_document(&mut self, doc: Document) -> bool {
        if self.doc == doc {
            return false;
        }
        self.begin_mutation();
        self.doc = doc;
        true
    }

    pub fn undo(&mut self) -> Result<(), StateError> {
        let previous = self.undo.pop_back().ok_or(StateError::NothingToUndo)?;
        let current = std::mem::replace(&mut self.doc, previous);
        push_bounded(&mut self.redo, current, self.max_depth);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), StateError> {
        let next = self.redo.pop_back().ok_or(StateError::NothingToRedo)?;
        let current = std::mem::replace(&mut self.doc, next);
        push_bounded(&mut self.undo, current, self.max_depth);
        Ok(())
    }

    /// Strictly render the current document.
    pub fn preview(&self) -> Result<Vec<u8>, RenderError> {
        render_resolved(&self.doc)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    fn begin_mutation(&mut self) {
        push_bounded(&mut self.undo, self.doc.clone(), self.max_depth);
        self.redo.clear();
    }
}

fn check_canonical(resolution: Resolution) -> Result<(), StateError> {
    if resolution.is_canonical() {
        Ok(())
    } else {
        Err(StateError::InvalidResolution(resolution))
    }
}

fn push_bounded(stack: &mut VecDeque<Document>, doc: Document, max: usize) {
    stack.push_back(doc);
    while stack.len() > max {
        stack.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::parse;

    const TWO_WAY: &str = "line1\n<<<<<<< HEAD\nours\n=======\ntheirs\n>>>>>>> branch\nline2\n";
    const THREE: &str = "<<<<<<<\na\n=======\nb\n>>>>>>>\n-\n<<<<<<<\nc\n=======\nd\n>>>>>>>\n-\n<<<<<<<\ne\n=======\nf\n>>>>>>>\n";

    fn state(input: &str, depth: usize) -> ResolutionState {
        ResolutionState::new(parse(input.as_bytes()).unwrap(), depth).unwrap()
    }

    fn resolution_of(s: &ResolutionState, i: usize) -> Resolution {
        s.document().conflict(i).unwrap().resolution()
    }

    #[test]
    fn test_zero_depth_rejected() {
        let doc = parse(TWO_WAY.as_bytes()).unwrap();
        assert_eq!(
            ResolutionState::new(doc, 0).unwrap_err(),
            StateError::InvalidDepth(0)
        );
    }

    #[test]
    fn test_apply_both_and_preview() {
        let mut s = state(TWO_WAY, 10);
        s.apply_resolution(0, Resolution::Both).unwrap();
        assert_eq!(s.preview().unwrap(), b"line1\nours\ntheirs\nline2\n");
    }

    #[test]
    fn test_preview_unresolved_fails() {
        let s = state(TWO_WAY, 10);
        assert_eq!(s.preview(), Err(RenderError::Unresolved { conflict: 0 }));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let mut s = state(TWO_WAY, 10);
        assert_eq!(
            s.apply_resolution(1, Resolution::Ours),
            Err(StateError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            s.apply_resolution(0, Resolution::Unset),
            Err(StateError::InvalidResolution(Resolution::Unset))
        );
        assert_eq!(
            s.apply_all(Resolution::Unset),
            Err(StateError::InvalidResolution(Resolution::Unset))
        );
        assert_eq!(s.undo_depth(), 0);
    }

    #[test]
    fn test_idempotent_apply_records_once() {
        let mut s = state(TWO_WAY, 10);
        s.apply_resolution(0, Resolution::Ours).unwrap();
        s.apply_resolution(0, Resolution::Ours).unwrap();
        assert_eq!(s.undo_depth(), 1);
    }

    #[test]
    fn test_apply_all_skips_when_unchanged() {
        let mut s = state(THREE, 10);
        s.apply_all(Resolution::Theirs).unwrap();
        assert_eq!(s.undo_depth(), 1);
        s.apply_all(Resolution::Theirs).unwrap();
        assert_eq!(s.undo_depth(), 1);
        assert!((0..3).all(|i| resolution_of(&s, i) == Resolution::Theirs));

        s.apply_resolution(1, Resolution::Ours).unwrap();
        s.apply_all(Resolution::Theirs).unwrap();
        assert_eq!(s.undo_depth(), 3);
    }

    #[test]
    fn test_history_is_bounded() {
        let n = 3;
        let mut s = state(TWO_WAY, n);
        let cycle = [Resolution::Ours, Resolution::Theirs];
        for step in 0..(n + 2) {
            s.apply_resolution(0, cycle[step % 2]).unwrap();
        }
        assert_eq!(s.undo_depth(), n);

        for _ in 0..n {
            s.undo().unwrap();
        }
        assert_eq!(s.undo(), Err(StateError::NothingToUndo));
        assert_eq!(s.redo_depth(), n);
    }

    #[test]
    fn test_eviction_keeps_most_recent_snapshots() {
        let mut s = state(THREE, 2);
        s.apply_resolution(0, Resolution::Ours).unwrap();
        s.apply_resolution(1, Resolution::Ours).unwrap();
        s.apply_resolution(2, Resolution::Ours).unwrap();
        s.undo().unwrap();
        s.undo().unwrap();
        // The snapshot before the first apply was evicted.
        assert_eq!(resolution_of(&s, 0), Resolution::Ours);
        assert_eq!(resolution_of(&s, 1), Resolution::Unset);
    }

    #[test]
    fn test_undo_redo_inverse() {
        let mut s = state(THREE, 10);
        s.apply_resolution(0, Resolution::Ours).unwrap();
        s.apply_resolution(2, Resolution::None).unwrap();
        let before = s.document().clone();

        s.undo().unwrap();
        assert_eq!(resolution_of(&s, 2), Resolution::Unset);
        s.redo().unwrap();
        assert_eq!(s.document(), &before);
        assert_eq!(s.redo(), Err(StateError::NothingToRedo));
    }

    #[test]
    fn test_redo_without_undo_fails() {
        let mut s = state(TWO_WAY, 10);
        s.apply_resolution(0, Resolution::Ours).unwrap();
        assert_eq!(s.redo(), Err(StateError::NothingToRedo));
    }

    #[test]
    fn test_new_mutation_clears_redo() {
        let mut s = state(TWO_WAY, 10);
        s.apply_resolution(0, Resolution::Ours).unwrap();
        s.undo().unwrap();
        assert_eq!(s.redo_depth(), 1);
        s.apply_resolution(0, Resolution::Theirs).unwrap();
        assert_eq!(s.redo_depth(), 0);
    }

    #[test]
    fn test_snapshots_are_independent() {
        let mut s = state(TWO_WAY, 10);
        s.apply_resolution(0, Resolution::Ours).unwrap();
        s.apply_resolution(0, Resolution::Theirs).unwrap();
        s.undo().unwrap();
        assert_eq!(resolution_of(&s, 0), Resolution::Ours);
        s.undo().unwrap();
        assert_eq!(resolution_of(&s, 0), Resolution::Unset);
    }

    #[test]
    fn test_replace_document() {
        let mut s = state(TWO_WAY, 10);
        let same = s.document().clone();
        assert!(!s.replace_document(same));
        assert_eq!(s.undo_depth(), 0);

        let mut other = s.document().clone();
        other.set_resolution(0, Resolution::None);
        assert!(s.replace_document(other));
        assert_eq!(s.undo_depth(), 1);
        assert_eq!(resolution_of(&s, 0), Resolution::None);
        s.undo().unwrap();
        assert_eq!(resolution_of(&s, 0), Resolution::Unset);
    }
}
