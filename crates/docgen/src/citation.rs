//! Citation formatting
//!
//! Renders a reference record into a single citation string in one of
//! four bibliography styles. Missing optional fields are omitted
//! together with their surrounding punctuation, so a sparse record
//! still produces a clean citation.

use serde::{Deserialize, Serialize};

/// Supported bibliography styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStyle {
    /// GB/T 7714, the Chinese national standard
    Gbt7714,
    Apa,
    Mla,
    Chicago,
}

impl CitationStyle {
    /// Parse a style tag as it appears in API requests.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gbt7714" | "gb/t7714" | "gbt" => Some(CitationStyle::Gbt7714),
            "apa" => Some(CitationStyle::Apa),
            "mla" => Some(CitationStyle::Mla),
            "chicago" => Some(CitationStyle::Chicago),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CitationStyle::Gbt7714 => "gbt7714",
            CitationStyle::Apa => "apa",
            CitationStyle::Mla => "mla",
            CitationStyle::Chicago => "chicago",
        }
    }
}

/// The fields of a reference record relevant to formatting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceData {
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
}

/// Format a reference in the requested style.
pub fn format_citation(reference: &ReferenceData, style: CitationStyle) -> String {
    match style {
        CitationStyle::Gbt7714 => format_gbt7714(reference),
        CitationStyle::Apa => format_apa(reference),
        CitationStyle::Mla => format_mla(reference),
        CitationStyle::Chicago => format_chicago(reference),
    }
}

/// Whether the author list reads as Chinese (drives the "等" vs
/// "et al." truncation marker for GB/T 7714).
fn is_cjk_author(name: &str) -> bool {
    name.chars().any(|c| {
        let cp = c as u32;
        (0x4E00..=0x9FFF).contains(&cp) || (0x3400..=0x4DBF).contains(&cp)
    })
}

/// GB/T 7714 truncates at 3 authors.
fn authors_gbt7714(authors: &[String]) -> String {
    if authors.is_empty() {
        return String::new();
    }
    if authors.len() > 3 {
        let marker = if is_cjk_author(&authors[0]) { "等" } else { "et al." };
        format!("{}, {}", authors[..3].join(", "), marker)
    } else {
        authors.join(", ")
    }
}

/// APA truncates at 7 authors: first six, ellipsis, last.
fn authors_apa(authors: &[String]) -> String {
    match authors.len() {
        0 => String::new(),
        1 => authors[0].clone(),
        2..=7 => {
            let (init, last) = authors.split_at(authors.len() - 1);
            format!("{}, & {}", init.join(", "), last[0])
        }
        _ => {
            let last = authors.last().map(String::as_str).unwrap_or_default();
            format!("{}, ... {}", authors[..6].join(", "), last)
        }
    }
}

/// MLA lists at most two authors before falling back to "et al.".
fn authors_mla(authors: &[String]) -> String {
    match authors.len() {
        0 => String::new(),
        1 => authors[0].clone(),
        2 => format!("{}, and {}", authors[0], authors[1]),
        _ => format!("{}, et al.", authors[0]),
    }
}

/// Chicago lists up to ten authors; beyond that, first seven + "et al.".
fn authors_chicago(authors: &[String]) -> String {
    match authors.len() {
        0 => String::new(),
        1 => authors[0].clone(),
        2..=10 => {
            let (init, last) = authors.split_at(authors.len() - 1);
            format!("{}, and {}", init.join(", "), last[0])
        }
        _ => format!("{} et al.", authors[..7].join(", ")),
    }
}

/// `作者. 题名[J]. 刊名, 年, 卷(期): 页码. DOI: xxx.`
fn format_gbt7714(r: &ReferenceData) -> String {
    let mut out = String::new();

    let authors = authors_gbt7714(&r.authors);
    if !authors.is_empty() {
        out.push_str(&authors);
        out.push_str(". ");
    }

    out.push_str(r.title.trim());
    out.push_str("[J]");

    if let Some(journal) = non_empty(&r.journal) {
        out.push_str(". ");
        out.push_str(journal);
    }

    let mut tail: Vec<String> = Vec::new();
    if let Some(year) = r.year {
        tail.push(year.to_string());
    }
    match (non_empty(&r.volume), non_empty(&r.issue)) {
        (Some(v), Some(i)) => tail.push(format!("{}({})", v, i)),
        (Some(v), None) => tail.push(v.to_string()),
        (None, Some(i)) => tail.push(format!("({})", i)),
        (None, None) => {}
    }
    if !tail.is_empty() {
        out.push_str(", ");
        out.push_str(&tail.join(", "));
    }

    if let Some(pages) = non_empty(&r.pages) {
        out.push_str(": ");
        out.push_str(pages);
    }
    out.push('.');

    if let Some(doi) = non_empty(&r.doi) {
        out.push_str(&format!(" DOI: {}.", doi));
    }

    out
}

/// `Authors (Year). Title. Journal, Volume(Issue), Pages. https://doi.org/xxx`
fn format_apa(r: &ReferenceData) -> String {
    let mut out = String::new();

    let authors = authors_apa(&r.authors);
    if !authors.is_empty() {
        out.push_str(&authors);
        out.push(' ');
    }

    if let Some(year) = r.year {
        out.push_str(&format!("({}). ", year));
    }

    out.push_str(r.title.trim());
    out.push_str(". ");

    if let Some(journal) = non_empty(&r.journal) {
        out.push_str(journal);
        match (non_empty(&r.volume), non_empty(&r.issue)) {
            (Some(v), Some(i)) => out.push_str(&format!(", {}({})", v, i)),
            (Some(v), None) => out.push_str(&format!(", {}", v)),
            (None, Some(i)) => out.push_str(&format!(", ({})", i)),
            (None, None) => {}
        }
        if let Some(pages) = non_empty(&r.pages) {
            out.push_str(&format!(", {}", pages));
        }
        out.push('.');
    }

    if let Some(doi) = non_empty(&r.doi) {
        out.push_str(&format!(" https://doi.org/{}", doi));
    }

    out.trim_end().to_string()
}

/// `Authors. "Title." Journal, vol. V, no. N, Year, pp. P.`
fn format_mla(r: &ReferenceData) -> String {
    let mut out = String::new();

    let authors = authors_mla(&r.authors);
    if !authors.is_empty() {
        out.push_str(&authors);
        if !authors.ends_with('.') {
            out.push('.');
        }
        out.push(' ');
    }

    out.push_str(&format!("\"{}.\"", r.title.trim()));

    let mut tail: Vec<String> = Vec::new();
    if let Some(journal) = non_empty(&r.journal) {
        tail.push(journal.to_string());
    }
    if let Some(v) = non_empty(&r.volume) {
        tail.push(format!("vol. {}", v));
    }
    if let Some(i) = non_empty(&r.issue) {
        tail.push(format!("no. {}", i));
    }
    if let Some(year) = r.year {
        tail.push(year.to_string());
    }
    if let Some(p) = non_empty(&r.pages) {
        tail.push(format!("pp. {}", p));
    }
    if !tail.is_empty() {
        out.push(' ');
        out.push_str(&tail.join(", "));
    }
    out.push('.');

    if let Some(doi) = non_empty(&r.doi) {
        out.push_str(&format!(" doi:{}.", doi));
    }

    out
}

/// `Authors. "Title." Journal V, no. N (Year): P. https://doi.org/xxx`
fn format_chicago(r: &ReferenceData) -> String {
    let mut out = String::new();

    let authors = authors_chicago(&r.authors);
    if !authors.is_empty() {
        out.push_str(&authors);
        if !authors.ends_with('.') {
            out.push('.');
        }
        out.push(' ');
    }

    out.push_str(&format!("\"{}.\"", r.title.trim()));

    if let Some(journal) = non_empty(&r.journal) {
        out.push(' ');
        out.push_str(journal);
        if let Some(v) = non_empty(&r.volume) {
            out.push_str(&format!(" {}", v));
        }
        if let Some(i) = non_empty(&r.issue) {
            out.push_str(&format!(", no. {}", i));
        }
    }

    if let Some(year) = r.year {
        out.push_str(&format!(" ({})", year));
    }

    if let Some(p) = non_empty(&r.pages) {
        out.push_str(&format!(": {}", p));
    }
    out.push('.');

    if let Some(doi) = non_empty(&r.doi) {
        out.push_str(&format!(" https://doi.org/{}.", doi));
    }

    out
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_reference() -> ReferenceData {
        ReferenceData {
            title: "深度学习在自然语言处理中的应用".to_string(),
            authors: vec!["张三".into(), "李四".into(), "王五".into()],
            year: Some(2023),
            journal: Some("计算机学报".into()),
            volume: Some("46".into()),
            issue: Some("3".into()),
            pages: Some("512-530".into()),
            doi: Some("10.1000/xyz123".into()),
        }
    }

    #[test]
    fn test_style_parse() {
        assert_eq!(CitationStyle::parse("GBT7714"), Some(CitationStyle::Gbt7714));
        assert_eq!(CitationStyle::parse("apa"), Some(CitationStyle::Apa));
        assert_eq!(CitationStyle::parse("bibtex"), None);
    }

    #[test]
    fn test_gbt7714_full() {
        let cite = format_citation(&full_reference(), CitationStyle::Gbt7714);
        assert_eq!(
            cite,
            "张三, 李四, 王五. 深度学习在自然语言处理中的应用[J]. 计算机学报, 2023, 46(3): 512-530. DOI: 10.1000/xyz123."
        );
    }

    #[test]
    fn test_gbt7714_truncates_at_three_authors() {
        let mut r = full_reference();
        r.authors = (1..=5).map(|i| format!("作者{}", i)).collect();
        let cite = format_citation(&r, CitationStyle::Gbt7714);
        assert!(cite.starts_with("作者1, 作者2, 作者3, 等."));
        assert!(!cite.contains("作者4"));
    }

    #[test]
    fn test_gbt7714_western_authors_use_et_al() {
        let mut r = full_reference();
        r.authors = vec![
            "Smith J".into(),
            "Jones K".into(),
            "Brown L".into(),
            "Davis M".into(),
        ];
        let cite = format_citation(&r, CitationStyle::Gbt7714);
        assert!(cite.starts_with("Smith J, Jones K, Brown L, et al."));
    }

    #[test]
    fn test_apa_two_authors() {
        let mut r = full_reference();
        r.authors = vec!["Smith, J.".into(), "Jones, K.".into()];
        let cite = format_citation(&r, CitationStyle::Apa);
        assert!(cite.starts_with("Smith, J., & Jones, K. (2023)."));
    }

    #[test]
    fn test_apa_truncates_long_author_list() {
        let mut r = full_reference();
        r.authors = (1..=9).map(|i| format!("A{}", i)).collect();
        let cite = format_citation(&r, CitationStyle::Apa);
        assert!(cite.contains("A1, A2, A3, A4, A5, A6, ... A9"));
        assert!(!cite.contains("A7,"));
    }

    #[test]
    fn test_mla_et_al() {
        let mut r = full_reference();
        r.authors = vec!["Smith, John".into(), "Jones, Kay".into(), "Brown, Lee".into()];
        let cite = format_citation(&r, CitationStyle::Mla);
        assert!(cite.starts_with("Smith, John, et al."));
        assert!(cite.contains("\"深度学习在自然语言处理中的应用.\""));
        assert!(cite.contains("vol. 46, no. 3, 2023, pp. 512-530"));
    }

    #[test]
    fn test_chicago_full() {
        let cite = format_citation(&full_reference(), CitationStyle::Chicago);
        assert!(cite.contains("计算机学报 46, no. 3 (2023): 512-530."));
        assert!(cite.ends_with("https://doi.org/10.1000/xyz123."));
    }

    #[test]
    fn test_missing_fields_no_stray_punctuation() {
        let bare = ReferenceData {
            title: "Untitled Manuscript".to_string(),
            authors: vec![],
            ..Default::default()
        };
        for style in [
            CitationStyle::Gbt7714,
            CitationStyle::Apa,
            CitationStyle::Mla,
            CitationStyle::Chicago,
        ] {
            let cite = format_citation(&bare, style);
            assert!(!cite.is_empty(), "{:?} produced empty output", style);
            assert!(!cite.contains(", ,"), "{:?}: {}", style, cite);
            assert!(!cite.contains("()"), "{:?}: {}", style, cite);
            assert!(!cite.contains(": ."), "{:?}: {}", style, cite);
            assert!(!cite.contains(",."), "{:?}: {}", style, cite);
        }
    }

    #[test]
    fn test_year_without_journal() {
        let r = ReferenceData {
            title: "标题".to_string(),
            authors: vec!["张三".into()],
            year: Some(2020),
            ..Default::default()
        };
        let cite = format_citation(&r, CitationStyle::Gbt7714);
        assert_eq!(cite, "张三. 标题[J], 2020.");
    }

    #[test]
    fn test_issue_without_volume() {
        let mut r = full_reference();
        r.volume = None;
        let cite = format_citation(&r, CitationStyle::Gbt7714);
        assert!(cite.contains("2023, (3): 512-530"));
    }
}
