//! Text extraction from uploaded files
//!
//! Knowledge documents arrive as raw bytes; this module turns them
//! into plain text. PDFs are parsed from their content streams, text
//! and markdown files are decoded as UTF-8.

use paperdraft_common::errors::{AppError, Result};

/// Extract plain text from an uploaded file by content type
pub fn extract_text(content_type: &str, bytes: &[u8]) -> Result<String> {
    match content_type {
        "application/pdf" => extract_pdf_text(bytes),
        "text/plain" | "text/markdown" => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            if text.trim().is_empty() {
                Err(AppError::InvalidFormat {
                    message: "Uploaded file contains no text".to_string(),
                })
            } else {
                Ok(text)
            }
        }
        other => Err(AppError::InvalidFormat {
            message: format!("Unsupported content type: {}", other),
        }),
    }
}

/// Extract text from PDF bytes
fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| AppError::InvalidFormat {
        message: format!("Failed to parse PDF: {}", e),
    })?;

    let mut text = String::new();
    for page_id in doc.page_iter() {
        match doc.get_page_content(page_id) {
            Ok(content) => {
                text.push_str(&extract_text_from_content(&content));
                text.push('\n');
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read page content, skipping");
            }
        }
    }

    if text.trim().is_empty() {
        return Err(AppError::InvalidFormat {
            message: "No text content extracted from PDF".to_string(),
        });
    }

    Ok(clean_text(&text))
}

/// Extract text from a PDF content stream.
///
/// Looks for text-showing operators between BT and ET blocks.
fn extract_text_from_content(content: &[u8]) -> String {
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;
    let mut current_text = String::new();

    for line in content_str.lines() {
        let trimmed = line.trim();

        if trimmed == "BT" {
            in_text_block = true;
            continue;
        }

        if trimmed == "ET" {
            in_text_block = false;
            if !current_text.is_empty() {
                text.push_str(&current_text);
                text.push(' ');
                current_text.clear();
            }
            continue;
        }

        if in_text_block {
            if let Some(text_content) = extract_text_from_operator(trimmed) {
                current_text.push_str(&text_content);
            }
        }
    }

    text
}

/// Extract text from a PDF text operator line
fn extract_text_from_operator(line: &str) -> Option<String> {
    // (text) Tj and the quote variants
    if line.ends_with("Tj") || line.ends_with('\'') || line.ends_with('"') {
        if let (Some(start), Some(end)) = (line.find('('), line.rfind(')')) {
            if start < end {
                return Some(decode_pdf_string(&line[start + 1..end]));
            }
        }
    }

    // [(text) num (text)] TJ
    if line.ends_with("TJ") {
        let mut result = String::new();
        let mut in_paren = false;
        let mut current = String::new();

        for ch in line.chars() {
            match ch {
                '(' => in_paren = true,
                ')' => {
                    in_paren = false;
                    result.push_str(&decode_pdf_string(&current));
                    current.clear();
                }
                _ if in_paren => current.push(ch),
                _ => {}
            }
        }

        if !result.is_empty() {
            return Some(result);
        }
    }

    None
}

/// Decode PDF string escapes
fn decode_pdf_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('(') => result.push('('),
                Some(')') => result.push(')'),
                Some(c) => result.push(c),
                None => {}
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Collapse whitespace in extracted text
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        let text = extract_text("text/plain", "hello world".as_bytes()).unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(extract_text("text/plain", b"   ").is_err());
    }

    #[test]
    fn test_unsupported_type_rejected() {
        assert!(extract_text("image/png", b"...").is_err());
    }

    #[test]
    fn test_tj_operator() {
        let content = b"BT\n(Hello) Tj\n(World) Tj\nET\n";
        assert_eq!(extract_text_from_content(content).trim(), "HelloWorld");
    }

    #[test]
    fn test_tj_array_operator() {
        let content = b"BT\n[(Hel) -20 (lo)] TJ\nET\n";
        assert_eq!(extract_text_from_content(content).trim(), "Hello");
    }

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string("Hello\\nWorld"), "Hello\nWorld");
        assert_eq!(decode_pdf_string("Test\\(paren\\)"), "Test(paren)");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("Hello   World\n\nTest"), "Hello World Test");
    }
}
