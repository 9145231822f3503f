//! Target list loading.

use crate::{Error, Result};
use std::path::Path;

/// A line that failed URL validation, reported but never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    pub line_number: usize,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct TargetList {
    pub urls: Vec<String>,
    pub invalid: Vec<InvalidLine>,
}

/// Load targets from a newline-delimited file: blank lines and `#`
/// comments are skipped, URLs must start with http:// or https://.
/// Invalid lines are collected, not errors.
pub fn load_targets(path: &Path) -> Result<TargetList> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::Input(format!("cannot read {}: {}", path.display(), e))
    })?;
    Ok(parse_targets(&text))
}

pub fn parse_targets(text: &str) -> TargetList {
    let mut list = TargetList::default();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with("http://") || line.starts_with("https://") {
            list.urls.push(line.to_string());
        } else {
            list.invalid.push(InvalidLine {
                line_number: index + 1,
                content: line.to_string(),
            });
        }
    }

    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let list = parse_targets("\n# staging targets\nhttps://a.example\n\nhttp://b.example\n");
        assert_eq!(list.urls, vec!["https://a.example", "http://b.example"]);
        assert!(list.invalid.is_empty());
    }

    #[test]
    fn test_invalid_lines_reported_with_line_numbers() {
        let list = parse_targets("https://a.example\nexample.com\nftp://c.example\n");
        assert_eq!(list.urls, vec!["https://a.example"]);
        assert_eq!(
            list.invalid,
            vec![
                InvalidLine { line_number: 2, content: "example.com".to_string() },
                InvalidLine { line_number: 3, content: "ftp://c.example".to_string() },
            ]
        );
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let list = parse_targets("  https://a.example  \n");
        assert_eq!(list.urls, vec!["https://a.example"]);
    }
}
