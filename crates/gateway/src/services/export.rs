//! Document export
//!
//! Renders a paper's markdown content into Word, PDF, or LaTeX,
//! appends the formatted reference list, uploads the file, and stores
//! the resulting URL on the paper.

use crate::AppState;
use paperdraft_common::db::models::Paper;
use paperdraft_common::errors::{AppError, Result};
use paperdraft_common::metrics::record_export;
use paperdraft_common::storage::export_key;
use paperdraft_docgen::{
    format_citation, markdown_to_docx, markdown_to_latex, render_pdf, CitationStyle, ReferenceData,
};
use std::time::Instant;

const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PDF_MIME: &str = "application/pdf";
const LATEX_MIME: &str = "application/x-latex";

/// Export a paper in the given format and return the updated paper
/// plus the uploaded file URL.
pub async fn export_paper(state: &AppState, paper: &Paper, format: &str) -> Result<(Paper, String)> {
    let content = paper
        .content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::Conflict {
            message: "Paper has no content to export".to_string(),
        })?;

    let markdown = with_references(state, paper, content).await?;
    let start = Instant::now();

    let render_result = match format {
        "docx" => markdown_to_docx(&paper.title, &markdown)
            .map(|bytes| (bytes, DOCX_MIME, "docx"))
            .map_err(|e| AppError::Internal {
                message: format!("DOCX rendering failed: {}", e),
            }),
        "pdf" => render_pdf(&paper.title, &flatten_markdown(&markdown))
            .map(|bytes| (bytes, PDF_MIME, "pdf"))
            .map_err(|e| AppError::Internal {
                message: format!("PDF rendering failed: {}", e),
            }),
        "latex" => Ok((
            markdown_to_latex(&paper.title, &markdown).into_bytes(),
            LATEX_MIME,
            "tex",
        )),
        other => Err(AppError::InvalidFormat {
            message: format!("Unknown export format: {}", other),
        }),
    };

    let (bytes, mime, extension) = match render_result {
        Ok(rendered) => rendered,
        Err(e) => {
            record_export(start.elapsed().as_secs_f64(), format, false);
            return Err(e);
        }
    };

    let key = export_key(paper.id, format, extension);
    let url = match state.storage.put_bytes(&key, bytes, mime).await {
        Ok(url) => url,
        Err(e) => {
            record_export(start.elapsed().as_secs_f64(), format, false);
            return Err(e);
        }
    };

    let updated = state
        .repo
        .set_export_url(paper.id, format, url.clone())
        .await?;
    record_export(start.elapsed().as_secs_f64(), format, true);

    tracing::info!(paper_id = %paper.id, format = format, url = %url, "Paper exported");

    Ok((updated, url))
}

/// Append the GB/T 7714 formatted reference list if the paper has
/// references and the content does not already carry entries.
async fn with_references(state: &AppState, paper: &Paper, content: &str) -> Result<String> {
    let references = state.repo.list_references(paper.id).await?;
    if references.is_empty() {
        return Ok(content.to_string());
    }

    let mut markdown = content.to_string();
    if !markdown.contains("# 参考文献") && !markdown.contains("# References") {
        markdown.push_str("\n\n# 参考文献\n");
    }
    markdown.push('\n');
    for (index, reference) in references.iter().enumerate() {
        let data = ReferenceData {
            title: reference.title.clone(),
            authors: reference.author_list(),
            year: reference.year,
            journal: reference.journal.clone(),
            volume: reference.volume.clone(),
            issue: reference.issue.clone(),
            pages: reference.pages.clone(),
            doi: reference.doi.clone(),
        };
        markdown.push_str(&format!(
            "[{}] {}\n",
            index + 1,
            format_citation(&data, CitationStyle::Gbt7714)
        ));
    }

    Ok(markdown)
}

/// Strip markdown markers for the plain-text PDF renderer
fn flatten_markdown(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    for line in markdown.lines() {
        let stripped = line.trim_start_matches('#').trim_start();
        let cleaned = stripped.replace("***", "").replace("**", "").replace('*', "");
        out.push_str(&cleaned);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_removes_markers() {
        let markdown = "# 引言\n\n这是**重点**内容*强调*。";
        let flat = flatten_markdown(markdown);
        assert!(flat.contains("引言"));
        assert!(flat.contains("这是重点内容强调。"));
        assert!(!flat.contains('#'));
        assert!(!flat.contains('*'));
    }
}
