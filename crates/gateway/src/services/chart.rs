//! Chart generation
//!
//! Turns a natural-language description into a typed chart
//! specification the frontend can render. The model output is
//! validated into `ChartSpec` so malformed responses surface as LLM
//! errors rather than leaking through.

use crate::AppState;
use paperdraft_common::errors::{AppError, Result};
use paperdraft_common::metrics::record_llm_call;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const CHART_SYSTEM: &str = "你是一位数据可视化助手。\
根据用户的描述生成图表定义,输出严格的 JSON,格式为:\
{\"chart_type\": \"bar|line|pie\", \"title\": \"...\", \
\"labels\": [\"...\"], \"series\": [{\"name\": \"...\", \"data\": [0]}]}。\
数据应与描述吻合,不要输出 JSON 以外的内容。";

/// A renderable chart definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: String,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub data: Vec<f64>,
}

const CHART_TYPES: &[&str] = &["bar", "line", "pie"];

impl ChartSpec {
    /// Check structural consistency of a decoded spec
    fn validate(&self) -> Result<()> {
        if !CHART_TYPES.contains(&self.chart_type.as_str()) {
            return Err(AppError::LlmError {
                message: format!("Model produced unknown chart type: {}", self.chart_type),
            });
        }
        if self.labels.is_empty() || self.series.is_empty() {
            return Err(AppError::LlmError {
                message: "Model produced an empty chart".to_string(),
            });
        }
        for series in &self.series {
            if series.data.len() != self.labels.len() {
                return Err(AppError::LlmError {
                    message: format!(
                        "Series '{}' has {} points for {} labels",
                        series.name,
                        series.data.len(),
                        self.labels.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Generate a chart spec from a description
pub async fn generate_chart(state: &AppState, description: &str) -> Result<ChartSpec> {
    let start = Instant::now();
    let result = state.llm.complete_json(CHART_SYSTEM, description).await;
    record_llm_call(
        start.elapsed().as_secs_f64(),
        state.llm.model_name(),
        "chart",
        result.is_ok(),
    );
    let value = result?;

    let spec: ChartSpec = serde_json::from_value(value).map_err(|e| AppError::LlmError {
        message: format!("Model returned malformed chart spec: {}", e),
    })?;
    spec.validate()?;

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ChartSpec {
        ChartSpec {
            chart_type: "bar".to_string(),
            title: "样本分布".to_string(),
            labels: vec!["A".to_string(), "B".to_string()],
            series: vec![ChartSeries {
                name: "count".to_string(),
                data: vec![1.0, 2.0],
            }],
        }
    }

    #[test]
    fn test_valid_spec() {
        assert!(spec().validate().is_ok());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut s = spec();
        s.chart_type = "radar".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let mut s = spec();
        s.series[0].data.push(3.0);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_empty_chart_rejected() {
        let mut s = spec();
        s.series.clear();
        assert!(s.validate().is_err());
    }
}
