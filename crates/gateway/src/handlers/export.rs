//! Document export handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::load_owned_paper;
use crate::services::export::export_paper;
use crate::AppState;
use paperdraft_common::{auth::AuthContext, errors::Result};

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    /// docx, pdf, latex
    pub format: String,
}

#[derive(Serialize)]
pub struct ExportResponse {
    pub paper_id: Uuid,
    pub format: String,
    pub url: String,
}

/// Export a paper as docx, pdf, or latex
pub async fn export(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ExportResponse>> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;
    let (_, url) = export_paper(&state, &paper, &request.format).await?;

    Ok(Json(ExportResponse {
        paper_id,
        format: request.format,
        url,
    }))
}
