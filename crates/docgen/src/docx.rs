//! Markdown to DOCX conversion
//!
//! Maps the generated Markdown onto the Word paragraph/run model:
//! headings become styled paragraphs attached to a multilevel numbering
//! definition ("%1.", "%1.%2", "%1.%2.%3"), emphasis becomes run-level
//! bold/italic formatting, and citation brackets become superscript
//! reference markers.

use crate::markdown::{classify_line, parse_inline, Inline, Line};
use crate::DocgenError;
use docx_rs::{
    AbstractNumbering, AlignmentType, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat,
    Numbering, NumberingId, Paragraph, Run, Start, Style, StyleType, Table, TableCell, TableRow,
    VertAlignType,
};
use std::io::Cursor;

const HEADING_NUMBERING_ID: usize = 1;

/// Convert Markdown to a packed DOCX byte buffer.
pub fn markdown_to_docx(title: &str, markdown: &str) -> Result<Vec<u8>, DocgenError> {
    let mut docx = base_document();

    if !title.trim().is_empty() {
        docx = docx.add_paragraph(
            Paragraph::new()
                .style("Title")
                .align(AlignmentType::Center)
                .add_run(Run::new().add_text(title.trim()).bold().size(36)),
        );
    }

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
                    docx = docx.add_table(build_table(std::mem::take(&mut table_rows)));
                }
                match classified {
                    Line::Heading { level, text } => {
                        docx = docx.add_paragraph(heading_paragraph(level, text));
                    }
                    Line::Text(text) => {
                        docx = docx.add_paragraph(body_paragraph(text));
                    }
                    Line::Blank => {}
                    Line::TableRow(_) | Line::TableSeparator => unreachable!(),
                }
            }
        }
    }

    if !table_rows.is_empty() {
        docx = docx.add_table(build_table(table_rows));
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| DocgenError::Docx(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Document skeleton: heading styles plus the auto-numbering scheme.
fn base_document() -> Docx {
    let numbering = AbstractNumbering::new(HEADING_NUMBERING_ID)
        .add_level(Level::new(
            0,
            Start::new(1),
            NumberFormat::new("decimal"),
            LevelText::new("%1."),
            LevelJc::new("left"),
        ))
        .add_level(Level::new(
            1,
            Start::new(1),
            NumberFormat::new("decimal"),
            LevelText::new("%1.%2"),
            LevelJc::new("left"),
        ))
        .add_level(Level::new(
            2,
            Start::new(1),
            NumberFormat::new("decimal"),
            LevelText::new("%1.%2.%3"),
            LevelJc::new("left"),
        ));

    Docx::new()
        .add_style(
            Style::new("Title", StyleType::Paragraph)
                .name("Title")
                .size(36)
                .bold(),
        )
        .add_style(
            Style::new("Heading1", StyleType::Paragraph)
                .name("Heading 1")
                .size(32)
                .bold(),
        )
        .add_style(
            Style::new("Heading2", StyleType::Paragraph)
                .name("Heading 2")
                .size(28)
                .bold(),
        )
        .add_style(
            Style::new("Heading3", StyleType::Paragraph)
                .name("Heading 3")
                .size(24)
                .bold(),
        )
        .add_abstract_numbering(numbering)
        .add_numbering(Numbering::new(HEADING_NUMBERING_ID, HEADING_NUMBERING_ID))
}

/// Heading level N maps to numbering depth N-1.
fn heading_paragraph(level: u8, text: &str) -> Paragraph {
    let style = match level {
        1 => "Heading1",
        2 => "Heading2",
        _ => "Heading3",
    };

    let mut paragraph = Paragraph::new()
        .style(style)
        .numbering(
            NumberingId::new(HEADING_NUMBERING_ID),
            IndentLevel::new((level - 1) as usize),
        );

    for run in inline_runs(text) {
        paragraph = paragraph.add_run(run);
    }
    paragraph
}

fn body_paragraph(text: &str) -> Paragraph {
    let mut paragraph = Paragraph::new();
    for run in inline_runs(text) {
        paragraph = paragraph.add_run(run);
    }
    paragraph
}

/// Inline fragments to formatted runs.
fn inline_runs(text: &str) -> Vec<Run> {
    parse_inline(text)
        .into_iter()
        .map(|fragment| match fragment {
            Inline::Text(t) => Run::new().add_text(t),
            Inline::Emphasis { text, bold, italic } => {
                let mut run = Run::new().add_text(text);
                if bold {
                    run = run.bold();
                }
                if italic {
                    run = run.italic();
                }
                run
            }
            Inline::Citation(n) => {
                // Superscript lives on the run property, not the run itself
                let mut run = Run::new().add_text(format!("[{}]", n));
                run.run_property = run.run_property.vert_align(VertAlignType::SuperScript);
                run
            }
        })
        .collect()
}

fn build_table(rows: Vec<Vec<String>>) -> Table {
    let table_rows = rows
        .into_iter()
        .map(|cells| {
            TableRow::new(
                cells
                    .into_iter()
                    .map(|cell| TableCell::new().add_paragraph(body_paragraph(&cell)))
                    .collect(),
            )
        })
        .collect();
    Table::new(table_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packs_nonempty_archive() {
        let bytes = markdown_to_docx("测试论文", "# 引言\n\n正文**重点**内容[1]。\n").unwrap();
        // ZIP local file header magic; entry names are stored verbatim
        assert_eq!(&bytes[..2], b"PK");
        let raw = String::from_utf8_lossy(&bytes).to_string();
        assert!(raw.contains("word/document.xml"));
    }

    #[test]
    fn test_heading_levels_map_to_numbering_depth() {
        for (level, depth) in [(1u8, 0usize), (2, 1), (3, 2)] {
            let paragraph = heading_paragraph(level, "标题");
            let numbering = paragraph
                .property
                .numbering_property
                .as_ref()
                .expect("heading carries numbering");
            assert_eq!(
                numbering.id.as_ref().map(|id| id.id),
                Some(HEADING_NUMBERING_ID),
                "level {}",
                level
            );
            assert_eq!(
                numbering.level.as_ref().map(|l| l.val),
                Some(depth),
                "level {}",
                level
            );
        }
    }

    #[test]
    fn test_bold_italic_compose_on_runs() {
        let runs = inline_runs("***both***");
        assert_eq!(runs.len(), 1);
        assert!(runs[0].run_property.bold.is_some());
        assert!(runs[0].run_property.italic.is_some());

        let bold_only = inline_runs("**b**");
        assert!(bold_only[0].run_property.bold.is_some());
        assert!(bold_only[0].run_property.italic.is_none());
    }

    #[test]
    fn test_citation_bracket_becomes_superscript_marker() {
        let runs = inline_runs("前文[7]所述");
        let marker = runs
            .iter()
            .find(|r| r.run_property.vert_align.is_some())
            .expect("superscript run present");
        let has_text = marker.children.iter().any(|child| {
            matches!(child, docx_rs::RunChild::Text(t) if t.text == "[7]")
        });
        assert!(has_text);
    }

    #[test]
    fn test_table_rows_collected() {
        let bytes = markdown_to_docx(
            "",
            "| 方法 | 得分 |\n|---|---|\n| A | 0.9 |\n\n后续段落\n",
        )
        .unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
