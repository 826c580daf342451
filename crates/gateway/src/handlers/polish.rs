//! Text polishing handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::polish::polish_text;
use crate::AppState;
use paperdraft_common::{
    auth::AuthContext,
    db::models::PolishHistory,
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct PolishRequest {
    #[validate(length(min = 1, max = 20000))]
    pub text: String,

    /// academic, concise, expand
    pub mode: String,

    /// Optional owning paper
    pub paper_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PolishHistoryQuery {
    pub paper_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    20
}

#[derive(Serialize)]
pub struct PolishResponse {
    pub id: Uuid,
    pub mode: String,
    pub paper_id: Option<Uuid>,
    pub original_text: String,
    pub polished_text: String,
    pub created_at: String,
}

impl From<PolishHistory> for PolishResponse {
    fn from(record: PolishHistory) -> Self {
        Self {
            id: record.id,
            mode: record.mode,
            paper_id: record.paper_id,
            original_text: record.original_text,
            polished_text: record.polished_text,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct PolishHistoryResponse {
    pub history: Vec<PolishResponse>,
}

/// Polish a passage of text
pub async fn polish(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<PolishRequest>,
) -> Result<Json<PolishResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    // Ownership check when the polish targets a paper
    if let Some(paper_id) = request.paper_id {
        crate::handlers::load_owned_paper(&state, &auth, paper_id).await?;
    }

    let record = polish_text(
        &state,
        auth.user_id,
        request.paper_id,
        &request.mode,
        &request.text,
    )
    .await?;

    Ok(Json(record.into()))
}

/// List the caller's polish history, newest first
pub async fn polish_history(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<PolishHistoryQuery>,
) -> Result<Json<PolishHistoryResponse>> {
    let history = state
        .repo
        .list_polish_history(auth.user_id, query.paper_id, query.limit.clamp(1, 100))
        .await?;

    Ok(Json(PolishHistoryResponse {
        history: history.into_iter().map(Into::into).collect(),
    }))
}
