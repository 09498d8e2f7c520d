//! Line-level helpers shared by the parser, the diff engine and the
//! reconciler.

/// Split `data` into lines that keep their `\n` terminator.
///
/// The final line may lack a terminator. Empty input yields no lines.
pub fn split_keep_eol(data: &[u8]) -> Vec<&[u8]> {
    data.split_inclusive(|&b| b == b'\n').collect()
}

/// Split `data` into display lines with `\n` / `\r\n` terminators removed.
///
/// Invalid UTF-8 is replaced lossily; this is only used for classification
/// and display, never for rendering output bytes.
pub fn split_display(data: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(data)
        .lines()
        .map(str::to_owned)
        .collect()
}

/// Find the leftmost occurrence of `needle` as a contiguous run of
/// `haystack`, starting at or after `start`.
///
/// An empty needle matches at `start` (clamped to the haystack length).
pub fn find_subslice<T: PartialEq>(haystack: &[T], start: usize, needle: &[T]) -> Option<usize> {
    let start = start.min(haystack.len());
    if needle.is_empty() {
        return Some(start);
    }
    if haystack.len() < needle.len() {
        return None;
    }
    (start..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keep_eol() {
        let lines = split_keep_eol(b"a\nb\r\nc");
        assert_eq!(lines, vec![&b"a\n"[..], &b"b\r\n"[..], &b"c"[..]]);
        assert!(split_keep_eol(b"").is_empty());
        assert_eq!(split_keep_eol(b"\n"), vec![&b"\n"[..]]);
    }

    #[test]
    fn test_split_display_strips_crlf() {
        assert_eq!(split_display(b"a\r\nb\n"), vec!["a", "b"]);
        assert_eq!(split_display(b"x"), vec!["x"]);
        assert!(split_display(b"").is_empty());
    }

    #[test]
    fn test_find_subslice_leftmost_at_or_after() {
        let hay = ["a", "b", "a", "b"];
        assert_eq!(find_subslice(&hay, 0, &["a", "b"]), Some(0));
        assert_eq!(find_subslice(&hay, 1, &["a", "b"]), Some(2));
        assert_eq!(find_subslice(&hay, 3, &["a", "b"]), None);
        assert_eq!(find_subslice(&hay, 2, &[] as &[&str]), Some(2));
        assert_eq!(find_subslice(&hay, 9, &[] as &[&str]), Some(4));
        assert_eq!(find_subslice(&["a"], 0, &["a", "b"]), None);
    }
}
