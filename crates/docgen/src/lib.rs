//! PaperDraft Document Generation Library
//!
//! Pure, synchronous text transforms shared by the API services:
//! - Citation formatting across four bibliography styles
//! - Markdown to DOCX / LaTeX conversion
//! - Graduation thesis structure normalization
//! - Minimal PDF rendering
//!
//! Nothing in this crate performs I/O or talks to the database; every
//! function is deterministic and unit-testable in isolation.

pub mod citation;
pub mod docx;
pub mod latex;
pub mod markdown;
pub mod pdf;
pub mod structure;

use thiserror::Error;

/// Errors raised while assembling binary document formats.
///
/// The text transforms themselves are total functions; only the final
/// packing step (ZIP container, PDF object graph) can fail.
#[derive(Error, Debug)]
pub enum DocgenError {
    #[error("failed to assemble DOCX: {0}")]
    Docx(String),

    #[error("failed to assemble PDF: {0}")]
    Pdf(String),
}

pub use citation::{format_citation, CitationStyle, ReferenceData};
pub use docx::markdown_to_docx;
pub use latex::markdown_to_latex;
pub use pdf::render_pdf;
pub use structure::normalize_graduation_structure;
