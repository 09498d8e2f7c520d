//! Document model produced by the marker parser.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Manual resolutions recovered from an externally edited file, keyed by
/// conflict index (not segment index). Entries take rendering priority over
/// the conflict's [`Resolution`].
pub type ManualResolutions = BTreeMap<usize, Vec<u8>>;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// How a single conflict is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Not yet resolved.
    #[default]
    Unset,
    /// Keep our side.
    Ours,
    /// Keep their side.
    Theirs,
    /// Ours followed by theirs, no separator.
    Both,
    /// Drop both sides.
    None,
}

impl Resolution {
    /// The four values a caller may apply.
    pub const CANONICAL: [Resolution; 4] = [
        Resolution::Ours,
        Resolution::Theirs,
        Resolution::Both,
        Resolution::None,
    ];

    pub fn is_canonical(self) -> bool {
        self != Resolution::Unset
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Ours => "ours",
            Self::Theirs => "theirs",
            Self::Both => "both",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no canonical resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resolution '{0}' (expected ours|theirs|both|none)")]
pub struct UnknownResolution(pub String);

impl FromStr for Resolution {
    type Err = UnknownResolution;

    /// Parses the canonical values only; `unset` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ours" => Ok(Self::Ours),
            "theirs" => Ok(Self::Theirs),
            "both" => Ok(Self::Both),
            "none" => Ok(Self::None),
            _ => Err(UnknownResolution(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

/// An opaque run of bytes outside any conflict block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub bytes: Vec<u8>,
}

/// The verbatim marker lines of a parsed conflict, terminators included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerLines {
    pub start: Vec<u8>,
    pub base: Option<Vec<u8>>,
    pub mid: Vec<u8>,
    pub end: Vec<u8>,
}

/// A single conflict block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictSegment {
    pub ours: Vec<u8>,
    /// `None` when the block had no `|||||||` section.
    pub base: Option<Vec<u8>>,
    pub theirs: Vec<u8>,

    pub ours_label: Option<String>,
    pub base_label: Option<String>,
    pub theirs_label: Option<String>,

    /// Original marker lines, kept so unresolved blocks re-render byte-exactly.
    pub markers: Option<MarkerLines>,

    pub(crate) resolution: Resolution,
}

impl ConflictSegment {
    /// Build an unresolved conflict without labels.
    pub fn new(ours: impl Into<Vec<u8>>, base: Option<Vec<u8>>, theirs: impl Into<Vec<u8>>) -> Self {
        Self {
            ours: ours.into(),
            base,
            theirs: theirs.into(),
            ours_label: None,
            base_label: None,
            theirs_label: None,
            markers: None,
            resolution: Resolution::Unset,
        }
    }

    pub fn with_labels(
        mut self,
        ours: Option<&str>,
        base: Option<&str>,
        theirs: Option<&str>,
    ) -> Self {
        self.ours_label = ours.map(str::to_owned);
        self.base_label = base.map(str::to_owned);
        self.theirs_label = theirs.map(str::to_owned);
        self
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_canonical()
    }

    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Bytes this conflict contributes under `resolution`, or `None` when
    /// `resolution` is `Unset`.
    pub fn resolved_bytes(&self, resolution: Resolution) -> Option<Vec<u8>> {
        match resolution {
            Resolution::Unset => None,
            Resolution::Ours => Some(self.ours.clone()),
            Resolution::Theirs => Some(self.theirs.clone()),
            Resolution::Both => Some([self.ours.as_slice(), self.theirs.as_slice()].concat()),
            Resolution::None => Some(Vec::new()),
        }
    }
}

/// Either plain text or a conflict block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(TextSegment),
    Conflict(ConflictSegment),
}

impl Segment {
    pub fn as_conflict(&self) -> Option<&ConflictSegment> {
        match self {
            Segment::Conflict(c) => Some(c),
            Segment::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextSegment> {
        match self {
            Segment::Text(t) => Some(t),
            Segment::Conflict(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Index of a conflict segment inside [`Document::segments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConflictRef {
    pub segment_index: usize,
}

/// Ordered segments plus a stable enumeration of the conflicts among them.
///
/// Every [`ConflictRef`] points at a [`Segment::Conflict`], in segment order.
/// Only resolutions are mutable, and only from inside this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    segments: Vec<Segment>,
    conflicts: Vec<ConflictRef>,
}

impl Document {
    /// Build a document, indexing its conflicts in segment order.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let conflicts = segments
            .iter()
            .enumerate()
            .filter(|(_, seg)| matches!(seg, Segment::Conflict(_)))
            .map(|(segment_index, _)| ConflictRef { segment_index })
            .collect();
        Self {
            segments,
            conflicts,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn conflict_refs(&self) -> &[ConflictRef] {
        &self.conflicts
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// The `index`-th conflict in enumeration order.
    pub fn conflict(&self, index: usize) -> Option<&ConflictSegment> {
        let r = self.conflicts.get(index)?;
        self.segments[r.segment_index].as_conflict()
    }

    /// Conflicts in enumeration order.
    pub fn conflicts(&self) -> impl Iterator<Item = &ConflictSegment> + '_ {
        self.conflicts
            .iter()
            .filter_map(|r| self.segments[r.segment_index].as_conflict())
    }

    pub fn unresolved_count(&self) -> usize {
        self.conflicts().filter(|c| !c.is_resolved()).count()
    }

    pub(crate) fn set_resolution(&mut self, index: usize, resolution: Resolution) -> bool {
        let Some(r) = self.conflicts.get(index) else {
            return false;
        };
        match &mut self.segments[r.segment_index] {
            Segment::Conflict(c) => {
                c.resolution = resolution;
                true
            }
            Segment::Text(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_from_str() {
        assert_eq!("ours".parse::<Resolution>(), Ok(Resolution::Ours));
        assert_eq!(" Theirs ".parse::<Resolution>(), Ok(Resolution::Theirs));
        assert_eq!("both".parse::<Resolution>(), Ok(Resolution::Both));
        assert_eq!("none".parse::<Resolution>(), Ok(Resolution::None));
        assert!("unset".parse::<Resolution>().is_err());
        assert!("".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_document_indexes_conflicts_in_order() {
        let doc = Document::from_segments(vec![
            Segment::Text(TextSegment { bytes: b"a\n".to_vec() }),
            Segment::Conflict(ConflictSegment::new("o1\n", None, "t1\n")),
            Segment::Text(TextSegment { bytes: b"b\n".to_vec() }),
            Segment::Conflict(ConflictSegment::new("o2\n", None, "t2\n")),
        ]);
        let refs: Vec<usize> = doc.conflict_refs().iter().map(|r| r.segment_index).collect();
        assert_eq!(refs, vec![1, 3]);
        assert_eq!(doc.conflict(1).map(|c| c.ours.as_slice()), Some(&b"o2\n"[..]));
        assert!(doc.conflict(2).is_none());
        assert_eq!(doc.unresolved_count(), 2);
    }

    #[test]
    fn test_resolved_bytes() {
        let c = ConflictSegment::new("o\n", Some(b"b\n".to_vec()), "t\n");
        assert_eq!(c.resolved_bytes(Resolution::Both), Some(b"o\nt\n".to_vec()));
        assert_eq!(c.resolved_bytes(Resolution::None), Some(Vec::new()));
        assert_eq!(c.resolved_bytes(Resolution::Unset), None);
    }
}
