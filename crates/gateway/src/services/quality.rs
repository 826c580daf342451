//! LLM-backed quality checking
//!
//! Scores a paper on a 0-100 scale across four dimensions plus an
//! overall score, with concrete issues and suggestions. The model is
//! asked for strict JSON; scores are clamped before persistence.

use crate::AppState;
use paperdraft_common::db::models::{Paper, QualityCheck};
use paperdraft_common::errors::{AppError, Result};
use paperdraft_common::metrics::record_llm_call;
use std::time::Instant;

const QUALITY_SYSTEM: &str = "你是一位严格的学术论文评审专家。\
对论文从结构、连贯性、引用规范和语言表达四个维度打分(0-100),并给出总分。\
输出严格的 JSON,格式为:\
{\"overall_score\": 0, \"structure_score\": 0, \"coherence_score\": 0, \
\"citation_score\": 0, \"language_score\": 0, \
\"issues\": [\"...\"], \"suggestions\": [\"...\"]}";

// Long papers get truncated so the prompt stays within context limits.
const MAX_CONTENT_CHARS: usize = 24_000;

/// Run a quality check against the paper's content
pub async fn run_quality_check(state: &AppState, paper: &Paper) -> Result<QualityCheck> {
    let content = paper
        .content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::Conflict {
            message: "Paper has no content to check".to_string(),
        })?;

    let truncated: String = content.chars().take(MAX_CONTENT_CHARS).collect();
    let user_prompt = format!("论文标题:{}\n论文内容:\n{}", paper.title, truncated);

    let start = Instant::now();
    let result = state.llm.complete_json(QUALITY_SYSTEM, &user_prompt).await;
    record_llm_call(
        start.elapsed().as_secs_f64(),
        state.llm.model_name(),
        "quality_check",
        result.is_ok(),
    );
    let value = result?;

    let check = state
        .repo
        .create_quality_check(
            paper.id,
            score_field(&value, "overall_score"),
            score_field(&value, "structure_score"),
            score_field(&value, "coherence_score"),
            score_field(&value, "citation_score"),
            score_field(&value, "language_score"),
            string_list(&value, "issues"),
            string_list(&value, "suggestions"),
        )
        .await?;

    Ok(check)
}

/// Read a score field, clamped to 0..=100. Missing fields read as 0.
fn score_field(value: &serde_json::Value, key: &str) -> i32 {
    value
        .get(key)
        .and_then(|v| v.as_i64())
        .unwrap_or(0)
        .clamp(0, 100) as i32
}

fn string_list(value: &serde_json::Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_clamped() {
        let value = json!({"overall_score": 150, "structure_score": -3});
        assert_eq!(score_field(&value, "overall_score"), 100);
        assert_eq!(score_field(&value, "structure_score"), 0);
        assert_eq!(score_field(&value, "missing"), 0);
    }

    #[test]
    fn test_string_list_skips_non_strings() {
        let value = json!({"issues": ["a", 1, "b", null]});
        assert_eq!(string_list(&value, "issues"), vec!["a", "b"]);
        assert!(string_list(&value, "missing").is_empty());
    }
}
