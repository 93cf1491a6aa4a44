//! Asset name validation shared by asset references and archive entries.

/// Longest file name the asset root accepts, in bytes.
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// Accept `raw` as the name of a file directly under the asset root.
///
/// A valid name is a single visible path segment: non-empty, at most
/// [`MAX_FILE_NAME_BYTES`], not starting with `.` (which also rules out `.`
/// and `..`), and free of `/`, backslashes, drive separators and NUL bytes.
/// Hidden names are reserved for in-flight writes and never exported.
pub fn asset_file_name(raw: &str) -> Option<&str> {
    if raw.is_empty() || raw.len() > MAX_FILE_NAME_BYTES || raw.starts_with('.') {
        return None;
    }
    if raw.contains(['/', '\\', ':', '\0']) {
        return None;
    }
    Some(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert_eq!(asset_file_name("a.png"), Some("a.png"));
        assert_eq!(asset_file_name("0193_runner-2.JPG"), Some("0193_runner-2.JPG"));
        assert!(asset_file_name(&"a".repeat(MAX_FILE_NAME_BYTES)).is_some());
    }

    #[test]
    fn rejects_escapes_nesting_and_hidden_names() {
        let too_long = "a".repeat(MAX_FILE_NAME_BYTES + 1);
        for raw in [
            "",
            "/etc/passwd",
            "../products.json",
            "a/../../b",
            "sub/a.png",
            "a//b",
            "./a",
            "a/",
            ".",
            "..",
            ".hidden.png",
            ".tmp-123",
            "..\\x",
            "C:evil",
            "a\0b",
            too_long.as_str(),
        ] {
            assert!(asset_file_name(raw).is_none(), "accepted {raw:?}");
        }
    }
}
