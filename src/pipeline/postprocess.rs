//! Post-processing: deterministic cleanup of generated eBook text.
//!
//! Even well-prompted models occasionally wrap their answer in
//! ` ```markdown ... ``` ` fences, emit Windows line endings, or lead with a
//! blank line. The layout engine treats the first line as the title, so
//! these quirks would shift the whole document. The rules here fix them
//! without touching the prose.
//!
//! ## Rule Order
//!
//! Fences are stripped before line endings are normalised so the fence regex
//! sees the raw answer; leading blank lines are dropped last so the title
//! ends up on line one.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw model output.
///
/// Rules (applied in order):
/// 1. Strip outer markdown fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 5. Unwrap `**bold**` / `__bold__` emphasis markers
/// 6. Drop leading blank lines so the title is the first line
pub fn clean_body(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = remove_invisible_chars(&s);
    let s = unwrap_strong_emphasis(&s);
    drop_leading_blank_lines(&s)
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 5: Unwrap strong emphasis ───────────────────────────────────────────
//
// The PDF is set in plain Helvetica; literal asterisks around words would be
// printed as-is.

static RE_STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*|__([^_\n]+?)__").unwrap());

fn unwrap_strong_emphasis(input: &str) -> String {
    RE_STRONG
        .replace_all(input, |caps: &regex::Captures<'_>| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
        .to_string()
}

// ── Rule 6: Drop leading blank lines ─────────────────────────────────────────

fn drop_leading_blank_lines(input: &str) -> String {
    let mut lines = input.lines().skip_while(|l| l.trim().is_empty()).peekable();
    if lines.peek().is_none() {
        return String::new();
    }
    lines.collect::<Vec<_>>().join("\n")
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let input = "```markdown\n# Hello\nWorld\n```";
        assert_eq!(strip_markdown_fences(input), "# Hello\nWorld");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        let input = "```\n# Hello\nWorld\n```";
        assert_eq!(strip_markdown_fences(input), "# Hello\nWorld");
    }

    #[test]
    fn test_no_fences_passthrough() {
        let input = "# Hello\nWorld";
        assert_eq!(strip_markdown_fences(input), "# Hello\nWorld");
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(
            trim_trailing_whitespace("  hello   \nworld  "),
            "  hello\nworld"
        );
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar";
        assert_eq!(remove_invisible_chars(input), "helloworldfoobar");
    }

    #[test]
    fn test_unwrap_strong_emphasis() {
        assert_eq!(
            unwrap_strong_emphasis("The **blue whale** is __huge__, *really*."),
            "The blue whale is huge, *really*."
        );
    }

    #[test]
    fn test_drop_leading_blank_lines() {
        assert_eq!(drop_leading_blank_lines("\n  \n# Title\n\nText"), "# Title\n\nText");
        assert_eq!(drop_leading_blank_lines("\n\n"), "");
    }

    #[test]
    fn test_clean_body_keeps_blank_lines_between_paragraphs() {
        let input = "```markdown\r\n\r\n# Title\r\n\r\nSome **text**   \r\n\r\n\r\n## Chapter 1\r\n```";
        let result = clean_body(input);
        assert_eq!(result, "# Title\n\nSome text\n\n\n## Chapter 1");
    }
}
