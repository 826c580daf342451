//! Markdown to LaTeX conversion
//!
//! Same source dialect as the DOCX converter, targeting typesetting
//! markup instead: headings map to the sectioning commands (numbering
//! comes from the document class), emphasis maps to `\textbf`/`\textit`,
//! citation brackets map to `\cite` markers, reserved characters are
//! escaped, and pipe tables become a `tabular` environment.

use crate::markdown::{classify_line, parse_inline, Inline, Line};

/// Convert Markdown to a complete LaTeX document.
pub fn markdown_to_latex(title: &str, markdown: &str) -> String {
    let mut out = String::new();
    out.push_str("\\documentclass[12pt,a4paper]{article}\n");
    out.push_str("\\usepackage[UTF8]{ctex}\n");
    out.push_str("\\usepackage{geometry}\n");
    out.push_str("\\geometry{left=3cm,right=3cm,top=2.5cm,bottom=2.5cm}\n\n");

    if !title.trim().is_empty() {
        out.push_str(&format!("\\title{{{}}}\n", escape_latex(title.trim())));
        out.push_str("\\date{}\n");
    }

    out.push_str("\\begin{document}\n");
    if !title.trim().is_empty() {
        out.push_str("\\maketitle\n");
    }
    out.push('\n');

    out.push_str(&convert_body(markdown));

    out.push_str("\\end{document}\n");
    out
}

/// Convert the Markdown body without the document preamble.
pub fn convert_body(markdown: &str) -> String {
    let mut out = String::new();
    let mut table_rows: Vec<Vec<String>> = Vec::new();

    for line in markdown.lines() {
        match classify_line(line) {
            Line::TableRow(cells) => {
                table_rows.push(cells.into_iter().map(str::to_string).collect());
                continue;
            }
            Line::TableSeparator => continue,
            classified => {
                if !table_rows.is_empty() {
                    out.push_str(&convert_table(std::mem::take(&mut table_rows)));
                }
                match classified {
                    Line::Heading { level, text } => {
                        let command = match level {
                            1 => "section",
                            2 => "subsection",
                            _ => "subsubsection",
                        };
                        out.push_str(&format!("\\{}{{{}}}\n", command, convert_inline(text)));
                    }
                    Line::Text(text) => {
                        out.push_str(&convert_inline(text));
                        out.push('\n');
                    }
                    Line::Blank => out.push('\n'),
                    Line::TableRow(_) | Line::TableSeparator => unreachable!(),
                }
            }
        }
    }

    if !table_rows.is_empty() {
        out.push_str(&convert_table(table_rows));
    }

    out
}

/// Apply the inline rules in fixed order, escaping plain text segments.
fn convert_inline(text: &str) -> String {
    parse_inline(text)
        .into_iter()
        .map(|fragment| match fragment {
            Inline::Text(t) => escape_latex(&t),
            Inline::Emphasis { text, bold, italic } => {
                let escaped = escape_latex(&text);
                match (bold, italic) {
                    (true, true) => format!("\\textbf{{\\textit{{{}}}}}", escaped),
                    (true, false) => format!("\\textbf{{{}}}", escaped),
                    (false, true) => format!("\\textit{{{}}}", escaped),
                    (false, false) => escaped,
                }
            }
            Inline::Citation(n) => format!("\\cite{{ref{}}}", n),
        })
        .collect()
}

/// Escape characters reserved by the LaTeX lexer.
///
/// The backslash must be handled in the same pass as the other
/// characters, otherwise escapes introduced here would be re-escaped.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' => out.push_str("\\&"),
            '%' => out.push_str("\\%"),
            '$' => out.push_str("\\$"),
            '#' => out.push_str("\\#"),
            '_' => out.push_str("\\_"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Render collected pipe-table rows as a `tabular` environment.
///
/// The first row is treated as the header; column count follows it.
fn convert_table(rows: Vec<Vec<String>>) -> String {
    let columns = rows.first().map(Vec::len).unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let spec: String = std::iter::repeat("|c").take(columns).collect::<String>() + "|";

    let mut out = String::new();
    out.push_str(&format!("\\begin{{tabular}}{{{}}}\n", spec));
    out.push_str("\\hline\n");
    for row in rows {
        let cells: Vec<String> = (0..columns)
            .map(|i| row.get(i).map(|c| convert_inline(c)).unwrap_or_default())
            .collect();
        out.push_str(&cells.join(" & "));
        out.push_str(" \\\\\n\\hline\n");
    }
    out.push_str("\\end{tabular}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_map_to_sectioning() {
        let body = convert_body("# 引言\n## 背景\n### 细节\n");
        assert!(body.contains("\\section{引言}"));
        assert!(body.contains("\\subsection{背景}"));
        assert!(body.contains("\\subsubsection{细节}"));
    }

    #[test]
    fn test_emphasis_mapping() {
        let body = convert_body("**粗体** 与 *斜体* 与 ***both***\n");
        assert!(body.contains("\\textbf{粗体}"));
        assert!(body.contains("\\textit{斜体}"));
        assert!(body.contains("\\textbf{\\textit{both}}"));
    }

    #[test]
    fn test_citation_marker() {
        let body = convert_body("见文献[5]。\n");
        assert!(body.contains("\\cite{ref5}"));
    }

    #[test]
    fn test_reserved_characters_escaped() {
        assert_eq!(escape_latex("50% & $3"), "50\\% \\& \\$3");
        assert_eq!(escape_latex("a_b #1"), "a\\_b \\#1");
        assert_eq!(escape_latex("{x}"), "\\{x\\}");
        assert_eq!(escape_latex("~^"), "\\textasciitilde{}\\textasciicircum{}");
        assert_eq!(escape_latex("a\\b"), "a\\textbackslash{}b");
    }

    #[test]
    fn test_escape_is_single_pass() {
        // A backslash followed by an escapable character must not be
        // double-escaped.
        assert_eq!(escape_latex("\\%"), "\\textbackslash{}\\%");
    }

    #[test]
    fn test_pipe_table_becomes_tabular() {
        let body = convert_body("| 方法 | 准确率 |\n|---|---|\n| CNN | 92% |\n");
        assert!(body.contains("\\begin{tabular}{|c|c|}"));
        assert!(body.contains("方法 & 准确率 \\\\"));
        assert!(body.contains("CNN & 92\\% \\\\"));
        assert!(body.contains("\\end{tabular}"));
    }

    #[test]
    fn test_ragged_table_rows_padded() {
        let body = convert_body("| a | b |\n| only |\n");
        // Second row padded to the header width
        assert!(body.contains("only &  \\\\"));
    }

    #[test]
    fn test_full_document_wrapper() {
        let doc = markdown_to_latex("测试标题", "# 一\n内容\n");
        assert!(doc.starts_with("\\documentclass"));
        assert!(doc.contains("\\title{测试标题}"));
        assert!(doc.contains("\\maketitle"));
        assert!(doc.trim_end().ends_with("\\end{document}"));
    }
}
