//! Base-section checks for merge views.

use crate::errors::SessionError;
use crate::markers::Document;

/// Require every conflict to carry a diff3 base section.
///
/// A base section that is present but empty (both sides added lines at the
/// same spot) passes; only an absent `|||||||` section fails.
pub fn validate_base_completeness(doc: &Document) -> Result<(), SessionError> {
    match doc.conflicts().position(|c| !c.has_base()) {
        Some(index) => Err(SessionError::MissingBase(index)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::parse;

    #[test]
    fn test_all_conflicts_with_base_pass() {
        let doc = parse(b"<<<<<<<\na\n|||||||\nb\n=======\nc\n>>>>>>>\n").unwrap();
        assert!(validate_base_completeness(&doc).is_ok());
    }

    #[test]
    fn test_empty_base_section_passes() {
        let doc = parse(b"<<<<<<<\na\n|||||||\n=======\nc\n>>>>>>>\n").unwrap();
        assert!(validate_base_completeness(&doc).is_ok());
    }

    #[test]
    fn test_missing_base_reports_first_conflict() {
        let input = b"<<<<<<<\na\n|||||||\nb\n=======\nc\n>>>>>>>\nx\n<<<<<<<\nd\n=======\ne\n>>>>>>>\n";
        let doc = parse(input).unwrap();
        let err = validate_base_completeness(&doc).unwrap_err();
        assert!(matches!(err, SessionError::MissingBase(1)));
    }

    #[test]
    fn test_document_without_conflicts_passes() {
        let doc = parse(b"plain\n").unwrap();
        assert!(validate_base_completeness(&doc).is_ok());
    }
}
