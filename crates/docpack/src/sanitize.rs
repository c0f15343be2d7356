//! Helpers for sanitizing data before it enters tracing spans or archive
//! member names.
//!
//! Traces are safe to share for debugging, so span fields only carry file
//! names, never full paths.

use std::path::Path;

/// Fallback used when a display name sanitizes down to nothing.
pub const FALLBACK_NAME: &str = "document";

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Makes a user-supplied display name usable as a flat archive member name.
///
/// - `Q3/rapport` → `Q3_rapport`
/// - `  notes  ` → `notes`
/// - `..` → `document`
pub fn sanitize_base_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Leading/trailing dots turn into hidden files or vanish on Windows.
    let cleaned = cleaned.trim_matches('.').trim();

    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_path_returns_filename() {
        assert_eq!(
            redact_path(Path::new("/home/user/Documents/rapport.docx")),
            "rapport.docx"
        );
    }

    #[test]
    fn test_redact_path_no_filename() {
        assert_eq!(redact_path(Path::new("/")), "<unknown>");
    }

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize_base_name("Q3/rapport"), "Q3_rapport");
        assert_eq!(sanitize_base_name("a\\b:c"), "a_b_c");
    }

    #[test]
    fn test_sanitize_trims_whitespace_and_dots() {
        assert_eq!(sanitize_base_name("  notes  "), "notes");
        assert_eq!(sanitize_base_name(".hidden."), "hidden");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_base_name(""), FALLBACK_NAME);
        assert_eq!(sanitize_base_name(".."), FALLBACK_NAME);
        assert_eq!(sanitize_base_name("   "), FALLBACK_NAME);
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_base_name("Übersicht été"), "Übersicht été");
    }
}
