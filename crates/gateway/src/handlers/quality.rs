//! Quality check handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::handlers::load_owned_paper;
use crate::services::quality::run_quality_check;
use crate::AppState;
use paperdraft_common::{
    auth::AuthContext,
    db::models::QualityCheck,
    errors::{AppError, Result},
};

#[derive(Serialize)]
pub struct QualityCheckResponse {
    pub id: Uuid,
    pub paper_id: Uuid,
    pub overall_score: i32,
    pub structure_score: i32,
    pub coherence_score: i32,
    pub citation_score: i32,
    pub language_score: i32,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub created_at: String,
}

impl From<QualityCheck> for QualityCheckResponse {
    fn from(check: QualityCheck) -> Self {
        Self {
            id: check.id,
            paper_id: check.paper_id,
            overall_score: check.overall_score,
            structure_score: check.structure_score,
            coherence_score: check.coherence_score,
            citation_score: check.citation_score,
            language_score: check.language_score,
            issues: string_array(&check.issues),
            suggestions: string_array(&check.suggestions),
            created_at: check.created_at.to_rfc3339(),
        }
    }
}

fn string_array(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Run a fresh quality check on the paper
pub async fn check_quality(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<(StatusCode, Json<QualityCheckResponse>)> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;
    let check = run_quality_check(&state, &paper).await?;

    Ok((StatusCode::CREATED, Json(check.into())))
}

/// Get the latest quality check for the paper
pub async fn latest_quality(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<QualityCheckResponse>> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;

    let check = state
        .repo
        .latest_quality_check(paper.id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource_type: "quality_check".to_string(),
            id: paper_id.to_string(),
        })?;

    Ok(Json(check.into()))
}
