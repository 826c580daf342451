//! Shared Markdown parsing for the document converters
//!
//! Both converters consume the same minimal dialect the generation
//! prompts produce: ATX headings up to three levels, bold/italic
//! emphasis, numbered citation brackets `[n]`, and pipe tables. The
//! pass is strictly line-by-line with no backtracking; inline rules are
//! applied in a fixed order (bold-italic, bold, italic, citation).

use regex_lite::Regex;
use std::sync::OnceLock;

/// One structural line of the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// ATX heading, level 1-3.
    Heading { level: u8, text: &'a str },
    /// A `|`-delimited table row, split into trimmed cells.
    TableRow(Vec<&'a str>),
    /// The `|---|---|` alignment row under a table header.
    TableSeparator,
    Blank,
    Text(&'a str),
}

/// An inline fragment of a paragraph or heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Emphasis {
        text: String,
        bold: bool,
        italic: bool,
    },
    /// Numbered citation bracket `[n]`.
    Citation(u32),
}

fn inline_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Order matters: the bold-italic alternative must come before bold
    // and italic so the longer marker wins.
    RE.get_or_init(|| {
        Regex::new(r"\*\*\*([^*]+)\*\*\*|\*\*([^*]+)\*\*|\*([^*]+)\*|\[(\d+)\]")
            .expect("inline regex is valid")
    })
}

/// Classify a single source line.
pub fn classify_line(line: &str) -> Line<'_> {
    let trimmed = line.trim_end();
    if trimmed.trim().is_empty() {
        return Line::Blank;
    }

    for (level, prefix) in [(1u8, "# "), (2, "## "), (3, "### ")] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return Line::Heading {
                level,
                text: rest.trim(),
            };
        }
    }

    let stripped = trimmed.trim();
    if stripped.starts_with('|') && stripped.ends_with('|') && stripped.len() > 1 {
        let cells: Vec<&str> = stripped[1..stripped.len() - 1]
            .split('|')
            .map(str::trim)
            .collect();
        let is_separator = !cells.is_empty()
            && cells.iter().all(|c| {
                !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':')
            });
        if is_separator {
            return Line::TableSeparator;
        }
        return Line::TableRow(cells);
    }

    Line::Text(stripped)
}

/// Tokenize inline content into text, emphasis, and citation fragments.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let re = inline_regex();
    let mut fragments = Vec::new();
    let mut last_end = 0;

    for caps in re.captures_iter(text) {
        let m = caps.get(0).expect("capture group 0 always present");
        if m.start() > last_end {
            fragments.push(Inline::Text(text[last_end..m.start()].to_string()));
        }

        if let Some(inner) = caps.get(1) {
            fragments.push(Inline::Emphasis {
                text: inner.as_str().to_string(),
                bold: true,
                italic: true,
            });
        } else if let Some(inner) = caps.get(2) {
            fragments.push(Inline::Emphasis {
                text: inner.as_str().to_string(),
                bold: true,
                italic: false,
            });
        } else if let Some(inner) = caps.get(3) {
            fragments.push(Inline::Emphasis {
                text: inner.as_str().to_string(),
                bold: false,
                italic: true,
            });
        } else if let Some(num) = caps.get(4) {
            match num.as_str().parse::<u32>() {
                Ok(n) => fragments.push(Inline::Citation(n)),
                // Out-of-range digits stay as literal text.
                Err(_) => fragments.push(Inline::Text(m.as_str().to_string())),
            }
        }

        last_end = m.end();
    }

    if last_end < text.len() {
        fragments.push(Inline::Text(text[last_end..].to_string()));
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_headings() {
        assert_eq!(
            classify_line("# 引言"),
            Line::Heading { level: 1, text: "引言" }
        );
        assert_eq!(
            classify_line("## 研究背景"),
            Line::Heading { level: 2, text: "研究背景" }
        );
        assert_eq!(
            classify_line("### 细分"),
            Line::Heading { level: 3, text: "细分" }
        );
        // Only three levels are recognized
        assert_eq!(classify_line("#### deep"), Line::Text("#### deep"));
    }

    #[test]
    fn test_classify_table() {
        assert_eq!(
            classify_line("| 方法 | 准确率 |"),
            Line::TableRow(vec!["方法", "准确率"])
        );
        assert_eq!(classify_line("|---|:---:|"), Line::TableSeparator);
        assert_eq!(classify_line("   "), Line::Blank);
    }

    #[test]
    fn test_inline_bold_italic_composition() {
        let fragments = parse_inline("a ***bi*** b **bold** c *it* d");
        assert_eq!(
            fragments,
            vec![
                Inline::Text("a ".into()),
                Inline::Emphasis { text: "bi".into(), bold: true, italic: true },
                Inline::Text(" b ".into()),
                Inline::Emphasis { text: "bold".into(), bold: true, italic: false },
                Inline::Text(" c ".into()),
                Inline::Emphasis { text: "it".into(), bold: false, italic: true },
                Inline::Text(" d".into()),
            ]
        );
    }

    #[test]
    fn test_inline_citation_brackets() {
        let fragments = parse_inline("如文献[3]与[12]所述");
        assert!(fragments.contains(&Inline::Citation(3)));
        assert!(fragments.contains(&Inline::Citation(12)));
    }

    #[test]
    fn test_non_numeric_bracket_is_text() {
        let fragments = parse_inline("see [note] here");
        assert_eq!(fragments, vec![Inline::Text("see [note] here".into())]);
    }

    #[test]
    fn test_plain_text_passthrough() {
        let fragments = parse_inline("无标记文本");
        assert_eq!(fragments, vec![Inline::Text("无标记文本".into())]);
    }
}
