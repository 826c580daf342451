//! Text polishing
//!
//! Rewrites a passage in one of three modes and records the
//! original/polished pair in the user's history.

use crate::AppState;
use paperdraft_common::db::models::PolishHistory;
use paperdraft_common::errors::{AppError, Result};
use paperdraft_common::metrics::record_llm_call;
use std::time::Instant;
use uuid::Uuid;

/// Polish modes supported by the service
pub const POLISH_MODES: &[&str] = &["academic", "concise", "expand"];

fn system_prompt(mode: &str) -> Result<&'static str> {
    match mode {
        "academic" => Ok("你是一位学术编辑。将下面的文字改写为更规范的学术表达,\
保持原意不变,只输出改写后的文字。"),
        "concise" => Ok("你是一位学术编辑。将下面的文字精简压缩,去除冗余表达,\
保持核心论点完整,只输出改写后的文字。"),
        "expand" => Ok("你是一位学术编辑。将下面的文字适度扩写,补充论证和细节,\
保持原有观点和结构,只输出改写后的文字。"),
        other => Err(AppError::Validation {
            message: format!("Unknown polish mode: {}", other),
            field: Some("mode".to_string()),
        }),
    }
}

/// Polish a passage and record the result
pub async fn polish_text(
    state: &AppState,
    user_id: Uuid,
    paper_id: Option<Uuid>,
    mode: &str,
    text: &str,
) -> Result<PolishHistory> {
    let system = system_prompt(mode)?;

    let start = Instant::now();
    let result = state.llm.complete(system, text).await;
    record_llm_call(
        start.elapsed().as_secs_f64(),
        state.llm.model_name(),
        "polish",
        result.is_ok(),
    );
    let polished = result?;

    state
        .repo
        .create_polish_record(
            user_id,
            paper_id,
            mode.to_string(),
            text.to_string(),
            polished,
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_modes_have_prompts() {
        for mode in POLISH_MODES {
            assert!(system_prompt(mode).is_ok());
        }
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(system_prompt("casual").is_err());
    }
}
