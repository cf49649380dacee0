//! Text helpers shared by every backend: file classification, size
//! formatting, case folding and snippet extraction.

use std::collections::BTreeSet;

/// Characters of context kept on each side of a snippet hit.
pub const SNIPPET_CONTEXT_CHARS: usize = 200;

const ELLIPSIS: &str = "...";

/// Whether an object can be shown as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Decodable text, eligible for content search and display.
    Text,
    /// Anything else; only its key and size are ever used.
    Binary,
}

/// Set of file extensions treated as text. Extensions include the dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextExtensions {
    extensions: BTreeSet<String>,
}

impl TextExtensions {
    /// Build a set from extensions like `".md"`. Matching is case-insensitive.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Extensions recognized for line counts in filesystem metadata.
    pub fn line_countable() -> Self {
        Self::new([
            ".md", ".txt", ".csv", ".json", ".yaml", ".yml", ".py", ".js", ".ts",
        ])
    }

    /// Whether `key` ends with one of the extensions.
    pub fn matches(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.extensions.iter().any(|ext| key.ends_with(ext.as_str()))
    }
}

impl Default for TextExtensions {
    fn default() -> Self {
        Self::new([
            ".md", ".txt", ".csv", ".json", ".yaml", ".yml", ".xml", ".py", ".js", ".ts",
            ".html", ".css", ".sql", ".sh", ".toml", ".cfg", ".ini", ".log", ".rst",
        ])
    }
}

/// Classify `key` against an explicit extension set.
pub fn classify(key: &str, extensions: &TextExtensions) -> FileKind {
    if extensions.matches(key) {
        FileKind::Text
    } else {
        FileKind::Binary
    }
}

/// Human-readable size: bytes, then KB and MB to one decimal.
pub fn format_size(size: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if size < KIB {
        format!("{} B", size)
    } else if size < MIB {
        format!("{:.1} KB", size as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", size as f64 / MIB as f64)
    }
}

/// Decode bytes as UTF-8, replacing invalid sequences.
pub fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Number of lines in `text`, splitting on every Unicode line boundary
/// (`\n`, `\r`, `\r\n`, vertical tab, form feed, the separator controls,
/// NEL, U+2028 and U+2029). A trailing break does not start a new line.
pub fn count_lines(text: &str) -> usize {
    let mut lines = 0;
    let mut open = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                lines += 1;
                open = false;
            }
            '\n' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}'
            | '\u{2029}' => {
                lines += 1;
                open = false;
            }
            _ => open = true,
        }
    }
    lines + usize::from(open)
}

/// Lowercase `s` one char at a time, so char offsets in the result line up
/// with char offsets in the input.
pub fn fold(s: &str) -> String {
    s.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Case-insensitive substring test.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    fold(haystack).contains(&fold(needle))
}

/// Char offset of the first occurrence of `needle` in `haystack`.
fn find_char(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}

/// Extract an excerpt of `content` around the first match of `query`.
///
/// Tries the whole query first, then each whitespace-separated word. With no
/// hit at all, returns the head of the document. The window keeps
/// `context_chars` characters on either side and is marked with `...` where
/// it cuts the document.
pub fn extract_snippet(content: &str, query: &str, context_chars: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    let folded = fold(content);
    let query_folded = fold(query);

    let hit = find_char(&folded, &query_folded).or_else(|| {
        query_folded
            .split_whitespace()
            .find_map(|word| find_char(&folded, word))
    });

    let Some(idx) = hit else {
        let head: String = chars.iter().take(context_chars * 2).collect();
        return head + ELLIPSIS;
    };

    let start = idx.saturating_sub(context_chars);
    let end = (idx + query.chars().count() + context_chars).min(chars.len());

    let mut snippet: String = chars[start..end].iter().collect();
    if start > 0 {
        snippet.insert_str(0, ELLIPSIS);
    }
    if end < chars.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_default_set() {
        let exts = TextExtensions::default();
        assert_eq!(classify("company-docs/policies/pto-policy.md", &exts), FileKind::Text);
        assert_eq!(classify("reports/Q1.CSV", &exts), FileKind::Text);
        assert_eq!(classify("images/logo.png", &exts), FileKind::Binary);
        assert_eq!(classify("README", &exts), FileKind::Binary);
    }

    #[test]
    fn test_classify_custom_set() {
        let exts = TextExtensions::new([".PNG"]);
        assert_eq!(classify("images/logo.png", &exts), FileKind::Text);
        assert_eq!(classify("notes.md", &exts), FileKind::Binary);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
    }

    #[test]
    fn test_decode_is_lossy() {
        assert_eq!(decode(b"ok \xff done"), "ok \u{fffd} done");
    }

    #[test]
    fn test_count_lines_matches_every_break() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("one"), 1);
        assert_eq!(count_lines("one\n"), 1);
        assert_eq!(count_lines("one\n\ntwo"), 3);
        assert_eq!(count_lines("a\rb\rc\r"), 3);
        assert_eq!(count_lines("a\r\nb\r\n"), 2);
        assert_eq!(count_lines("a\x0cb\u{2028}c"), 3);
        assert_eq!(count_lines("\n"), 1);
    }

    #[test]
    fn test_snippet_short_document_has_no_ellipsis() {
        let snippet = extract_snippet("We offer Unlimited PTO to all staff.", "pto", 200);
        assert_eq!(snippet, "We offer Unlimited PTO to all staff.");
    }

    #[test]
    fn test_snippet_window_is_marked() {
        let content = format!("{}needle{}", "a".repeat(300), "b".repeat(300));
        let snippet = extract_snippet(&content, "NEEDLE", 10);
        assert_eq!(snippet, format!("...{}needle{}...", "a".repeat(10), "b".repeat(10)));
    }

    #[test]
    fn test_snippet_falls_back_to_words() {
        let content = "The deployment runbook covers rollbacks.";
        let snippet = extract_snippet(content, "canary rollbacks", 5);
        assert_eq!(snippet, "...vers rollbacks.");
    }

    #[test]
    fn test_snippet_without_hit_returns_head() {
        let content = "x".repeat(50);
        assert_eq!(extract_snippet(&content, "zzz", 10), format!("{}...", "x".repeat(20)));
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let content = format!("{}Ünïcödé match{}", "é".repeat(30), "ß".repeat(30));
        let snippet = extract_snippet(&content, "MATCH", 4);
        assert_eq!(snippet, "...ödé matchßßßß...");
    }
}
