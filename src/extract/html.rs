//! HTML to clean text
//!
//! Conversion runs in two stages:
//!
//! 1. **htmd conversion**: HTML to markdown, with boilerplate elements skipped
//! 2. **Flattening**: a line-by-line pass that drops markdown syntax while
//!    keeping paragraph and list structure

use htmd::HtmlToMarkdown;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Elements that never carry document text
const BOILERPLATE_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "iframe", "svg", "nav", "header", "footer",
    "aside", "button",
];

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:```|~~~)").expect("CODE_FENCE: hardcoded regex is valid")
});

static SETEXT_UNDERLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:=+|-+)\s*$").expect("SETEXT_UNDERLINE: hardcoded regex is valid")
});

static ATX_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#{1,6}\s+(.*?)(?:\s+#+)?\s*$").expect("ATX_HEADING: hardcoded regex is valid")
});

static HORIZONTAL_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,})$")
        .expect("HORIZONTAL_RULE: hardcoded regex is valid")
});

static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)(?:>\s?)+").expect("BLOCKQUOTE: hardcoded regex is valid")
});

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)[*+-]\s+").expect("LIST_MARKER: hardcoded regex is valid")
});

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Bounded quantifiers keep backtracking in check on hostile markup
    Regex::new(r"!\[([^\]]{0,200})\]\([^)]{0,2000}\)").expect("IMAGE_RE: hardcoded regex is valid")
});

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]{0,500})\]\([^)]{0,2000}\)").expect("LINK_RE: hardcoded regex is valid")
});

static STRONG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\*\*|__)(.+?)(?:\*\*|__)").expect("STRONG_RE: hardcoded regex is valid")
});

static STAR_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").expect("STAR_EMPHASIS: hardcoded regex is valid")
});

static UNDERSCORE_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w\\])_([^_\s](?:[^_]*[^_\s])?)_([^\w]|$)")
        .expect("UNDERSCORE_EMPHASIS: hardcoded regex is valid")
});

static STRIKETHROUGH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"~~(.+?)~~").expect("STRIKETHROUGH: hardcoded regex is valid")
});

static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`+([^`]*)`+").expect("INLINE_CODE: hardcoded regex is valid")
});

static ESCAPED_CHAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\([\\`*_{}\[\]()#+\-.!|>~<])").expect("ESCAPED_CHAR: hardcoded regex is valid")
});

/// Converts an HTML document to clean text
///
/// Returns `None` if conversion fails or leaves no text behind.
pub fn html_to_text(html: &str) -> Option<String> {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(BOILERPLATE_TAGS.to_vec())
        .build();

    match converter.convert(html) {
        Ok(markdown) => {
            let text = flatten_markdown(&markdown);
            (!text.is_empty()).then_some(text)
        }
        Err(e) => {
            debug!("HTML conversion failed: {}", e);
            None
        }
    }
}

/// Flattens markdown into plain text
///
/// Headers become their text followed by a blank line, emphasis markers are
/// stripped, links keep their anchor text, images become `[Image: alt]`,
/// tables lose their pipes, blockquote markers and code fences are dropped,
/// horizontal rules become `---`, runs of blank lines collapse to one, and
/// trailing whitespace is trimmed from every line. List items keep a `- `
/// marker.
///
/// Code keeps its text: fence lines and inline backticks are removed, and
/// lines inside a fence are copied without further flattening.
pub fn flatten_markdown(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_fence = false;

    for raw in markdown.lines() {
        let line = raw.trim_end();

        if CODE_FENCE.is_match(line) {
            in_fence = !in_fence;
            continue;
        }

        if in_fence {
            lines.push(line.to_string());
            continue;
        }

        let follows_text = lines
            .last()
            .is_some_and(|prev| !prev.trim().is_empty() && prev != "---");
        if follows_text && SETEXT_UNDERLINE.is_match(line) {
            lines.push(String::new());
            continue;
        }

        let line = BLOCKQUOTE.replace(line, "$1");

        if HORIZONTAL_RULE.is_match(&line) {
            lines.push("---".to_string());
            continue;
        }

        if let Some(caps) = ATX_HEADING.captures(&line) {
            lines.push(flatten_inline(&caps[1]));
            lines.push(String::new());
            continue;
        }

        if line.contains('|') {
            if is_table_separator(&line) {
                continue;
            }
            let trimmed = line.trim();
            if trimmed.starts_with('|') {
                let cells: Vec<&str> = trimmed
                    .trim_matches('|')
                    .split('|')
                    .map(str::trim)
                    .filter(|cell| !cell.is_empty())
                    .collect();
                lines.push(flatten_inline(&cells.join("  ")));
                continue;
            }
        }

        let line = LIST_MARKER.replace(&line, "${1}- ");
        lines.push(flatten_inline(&line));
    }

    collapse_blank_lines(&lines)
}

fn flatten_inline(text: &str) -> String {
    let text = IMAGE_RE.replace_all(text, "[Image: $1]");
    let text = LINK_RE.replace_all(&text, "$1");
    let text = STRONG_RE.replace_all(&text, "$1");
    let text = STAR_EMPHASIS.replace_all(&text, "$1");
    let text = UNDERSCORE_EMPHASIS.replace_all(&text, "${1}${2}${3}");
    let text = STRIKETHROUGH.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = ESCAPED_CHAR.replace_all(&text, "$1");
    text.trim_end().to_string()
}

fn is_table_separator(line: &str) -> bool {
    line.contains('-')
        && line
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':') || c.is_whitespace())
}

fn collapse_blank_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut pending_blank = false;

    for line in lines {
        if line.trim().is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_document() {
        let markdown = "\
# Privacy Policy
Last updated: **January 1, 2024**

## Data We Collect
We collect *personal data* as described in [our terms](https://example.com/terms).

![Company logo](/logo.png)

> Quoted notice

| Purpose | Basis |
| --- | --- |
| Billing | Contract |

```text
retention = 30 days
```

Use `opt-out` links.

***



* First item
* Second item   
";

        let expected = "\
Privacy Policy

Last updated: January 1, 2024

Data We Collect

We collect personal data as described in our terms.

[Image: Company logo]

Quoted notice

Purpose  Basis
Billing  Contract

retention = 30 days

Use opt-out links.

---

- First item
- Second item";

        assert_eq!(flatten_markdown(markdown), expected);
    }

    #[test]
    fn test_fenced_code_kept_verbatim() {
        let markdown = "Example:\n\n~~~\n# retention_days = 30\n* not a list\n~~~\n\nDone with `x`.";
        assert_eq!(
            flatten_markdown(markdown),
            "Example:\n\n# retention_days = 30\n* not a list\n\nDone with x."
        );
    }

    #[test]
    fn test_setext_heading() {
        let markdown = "Terms of Use\n============\nThese terms apply.";
        assert_eq!(flatten_markdown(markdown), "Terms of Use\n\nThese terms apply.");
    }

    #[test]
    fn test_underscore_in_words_kept() {
        assert_eq!(flatten_markdown("see user_data_table"), "see user_data_table");
        assert_eq!(flatten_markdown("an _important_ clause"), "an important clause");
    }

    #[test]
    fn test_escapes_removed() {
        assert_eq!(flatten_markdown(r"Section 1\. Definitions \[A\]"), "Section 1. Definitions [A]");
    }

    #[test]
    fn test_ordered_list_kept() {
        assert_eq!(flatten_markdown("1. One\n2. Two"), "1. One\n2. Two");
    }

    #[test]
    fn test_html_to_text_drops_boilerplate() {
        let html = r#"<html><head><title>Ignored</title><style>body { color: red; }</style></head>
<body>
<nav><a href="/">Home</a></nav>
<script>var tracking = 1;</script>
<main>
<h1>Terms of Service</h1>
<p>By using <a href="https://example.com/">our site</a> you <strong>agree</strong>.</p>
<ul><li>First</li><li>Second</li></ul>
</main>
<footer>Copyright 2024</footer>
</body></html>"#;

        let text = html_to_text(html).unwrap();

        assert!(text.contains("Terms of Service"));
        assert!(text.contains("By using our site you agree."));
        assert!(text.contains("- First"));
        assert!(text.contains("- Second"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("Home"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("https://example.com"));
        assert!(!text.contains('#'));
        assert!(!text.contains("**"));
    }

    #[test]
    fn test_html_to_text_empty_document() {
        assert_eq!(html_to_text("<html><body><script>x()</script></body></html>"), None);
    }
}
