//! Suffix list loading.
//!
//! A suffix file has one suffix per line. Blank lines and `#` comments are
//! skipped, and only suffixes up to a maximum length are kept, so a full
//! public-suffix dump can be narrowed to short TLDs.

use crate::error::SweepError;
use std::collections::HashSet;
use std::path::Path;

/// Default cap on suffix length when filtering a suffix list.
pub const DEFAULT_MAX_SUFFIX_LENGTH: usize = 3;

/// Parse suffix list text.
///
/// Each kept entry is trimmed, stripped of one leading dot and lowercased.
/// Entries longer than `max_length` characters are dropped and duplicates are
/// removed, keeping the first occurrence.
pub fn parse_suffix_list(text: &str, max_length: usize) -> Vec<String> {
    let mut seen = HashSet::new();

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.strip_prefix('.').unwrap_or(line).to_lowercase())
        .filter(|suffix| !suffix.is_empty() && suffix.chars().count() <= max_length)
        .filter(|suffix| seen.insert(suffix.clone()))
        .collect()
}

/// Read and parse a suffix file.
///
/// # Errors
///
/// Returns `SweepError::FileError` if the file cannot be read.
pub fn load_suffix_file<P: AsRef<Path>>(
    path: P,
    max_length: usize,
) -> Result<Vec<String>, SweepError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| SweepError::file_error(path.display().to_string(), e.to_string()))?;

    let suffixes = parse_suffix_list(&text, max_length);
    tracing::debug!(path = %path.display(), count = suffixes.len(), "loaded suffix file");
    Ok(suffixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_filters_and_normalizes() {
        let text = "# short tlds\n\nIM\n.io\ncom\nonline\n  ai  \n#cn\nim\n.\n";
        let suffixes = parse_suffix_list(text, 3);
        assert_eq!(suffixes, vec!["im", "io", "com", "ai"]);
    }

    #[test]
    fn test_parse_max_length() {
        let text = "im\ncom\nshop\n";
        assert_eq!(parse_suffix_list(text, 2), vec!["im"]);
        assert_eq!(parse_suffix_list(text, 4), vec!["im", "com", "shop"]);
    }

    #[test]
    fn test_load_suffix_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# list").unwrap();
        writeln!(file, "im").unwrap();
        writeln!(file, "dev").unwrap();

        let suffixes = load_suffix_file(file.path(), DEFAULT_MAX_SUFFIX_LENGTH).unwrap();
        assert_eq!(suffixes, vec!["im", "dev"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_suffix_file("/nonexistent/suffixes.txt", 3).unwrap_err();
        assert!(matches!(err, SweepError::FileError { .. }));
    }
}
