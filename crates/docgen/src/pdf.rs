//! Minimal PDF rendering
//!
//! Renders a title plus wrapped text lines as a paginated PDF using
//! lopdf's object model. This covers the plain-text export path; the
//! typeset path goes through the LaTeX converter instead.
//!
//! The base-14 Helvetica font only covers Latin-1, so glyphs outside
//! that range are substituted. TODO: embed a CJK-capable font program
//! so Chinese body text survives the plain PDF export.

use crate::DocgenError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;
const FONT_SIZE: i64 = 11;
const TITLE_SIZE: i64 = 18;
const LEADING: i64 = 16;
const LINES_PER_PAGE: usize = 46;
const CHARS_PER_LINE: usize = 88;

/// Render title and body text into PDF bytes.
pub fn render_pdf(title: &str, body: &str) -> Result<Vec<u8>, DocgenError> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let lines = layout_lines(body);
    let mut page_ids: Vec<Object> = Vec::new();
    let mut first_page = true;

    for chunk in pages(&lines) {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("TL", vec![LEADING.into()]),
        ];

        let top = PAGE_HEIGHT - MARGIN;
        if first_page && !title.trim().is_empty() {
            operations.push(Operation::new("Tf", vec!["F1".into(), TITLE_SIZE.into()]));
            operations.push(Operation::new("Td", vec![MARGIN.into(), top.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(sanitize(title.trim()))],
            ));
            // Td offsets are relative to the previous line start
            operations.push(Operation::new("Td", vec![0.into(), (-LEADING * 2).into()]));
        } else {
            operations.push(Operation::new("Td", vec![MARGIN.into(), top.into()]));
        }

        operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
        for line in chunk {
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(sanitize(line))],
            ));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| DocgenError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        page_ids.push(Object::Reference(page_id));
        first_page = false;
    }

    let page_count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| DocgenError::Pdf(e.to_string()))?;
    Ok(buf)
}

/// Wrap source lines to the fixed column budget.
fn layout_lines(body: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for source in body.lines() {
        let trimmed = source.trim_end();
        if trimmed.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in trimmed.split_whitespace() {
            // A single overlong token is hard-broken at the budget.
            if word.chars().count() > CHARS_PER_LINE {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let chars: Vec<char> = word.chars().collect();
                for piece in chars.chunks(CHARS_PER_LINE) {
                    lines.push(piece.iter().collect());
                }
                continue;
            }
            if !current.is_empty()
                && current.chars().count() + word.chars().count() + 1 > CHARS_PER_LINE
            {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn pages(lines: &[String]) -> impl Iterator<Item = &[String]> {
    lines.chunks(LINES_PER_PAGE)
}

/// Substitute glyphs the base font cannot encode.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) < 256 { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_valid_header() {
        let bytes = render_pdf("Test Paper", "Some body text.\nAnother line.").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert!(bytes.len() > 200);
    }

    #[test]
    fn test_empty_body_still_one_page() {
        let bytes = render_pdf("T", "").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_layout_wraps_long_lines() {
        let long = "word ".repeat(60);
        let lines = layout_lines(&long);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= CHARS_PER_LINE));
    }

    #[test]
    fn test_layout_hard_breaks_overlong_token() {
        let token = "x".repeat(200);
        let lines = layout_lines(&token);
        assert!(lines.len() >= 3);
    }

    #[test]
    fn test_multi_page_output() {
        let body = (0..200)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let bytes = render_pdf("Long", &body).unwrap();
        let raw = String::from_utf8_lossy(&bytes);
        // At least two page objects
        assert!(raw.matches("/Type /Page").count() >= 2 || bytes.len() > 2000);
    }

    #[test]
    fn test_sanitize_substitutes_wide_glyphs() {
        assert_eq!(sanitize("abc中文"), "abc??");
        assert_eq!(sanitize("plain"), "plain");
    }
}
