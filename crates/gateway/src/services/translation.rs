//! Academic translation
//!
//! Stateless zh<->en translation tuned for academic register. Nothing
//! is persisted; the handler returns the translated text directly.

use crate::AppState;
use paperdraft_common::errors::{AppError, Result};
use paperdraft_common::metrics::record_llm_call;
use std::time::Instant;

/// Translation directions supported by the service
pub const DIRECTIONS: &[&str] = &["zh-en", "en-zh"];

/// Pick a direction from the dominant script of the input.
///
/// More CJK than Latin letters reads as Chinese source; everything
/// else translates into Chinese.
pub fn detect_direction(text: &str) -> &'static str {
    let mut cjk = 0usize;
    let mut latin = 0usize;
    for c in text.chars() {
        if matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}') {
            cjk += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }
    if cjk > latin {
        "zh-en"
    } else {
        "en-zh"
    }
}

fn system_prompt(direction: &str) -> Result<&'static str> {
    match direction {
        "zh-en" => Ok("You are an academic translator. Translate the following Chinese \
academic text into formal academic English. Preserve terminology and citation \
markers like [1]. Output only the translation."),
        "en-zh" => Ok("你是一位学术翻译。将下面的英文学术文本翻译为规范的中文学术表达,\
保留术语和 [1] 形式的引用标记,只输出译文。"),
        other => Err(AppError::Validation {
            message: format!("Unknown translation direction: {}", other),
            field: Some("direction".to_string()),
        }),
    }
}

/// Translate a passage in the given direction
pub async fn translate_text(state: &AppState, direction: &str, text: &str) -> Result<String> {
    let system = system_prompt(direction)?;

    let start = Instant::now();
    let result = state.llm.complete(system, text).await;
    record_llm_call(
        start.elapsed().as_secs_f64(),
        state.llm.model_name(),
        "translate",
        result.is_ok(),
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions_have_prompts() {
        for direction in DIRECTIONS {
            assert!(system_prompt(direction).is_ok());
        }
        assert!(system_prompt("en-fr").is_err());
    }

    #[test]
    fn test_detects_chinese_source() {
        assert_eq!(detect_direction("本文提出了一种新的方法。"), "zh-en");
        // Chinese prose with embedded Latin terms still reads as Chinese
        assert_eq!(detect_direction("基于 CNN 的图像分类方法研究"), "zh-en");
    }

    #[test]
    fn test_detects_english_source() {
        assert_eq!(detect_direction("We propose a novel method."), "en-zh");
        assert_eq!(detect_direction(""), "en-zh");
    }
}
