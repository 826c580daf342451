//! Chart generation handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::services::chart::{generate_chart, ChartSpec};
use crate::AppState;
use paperdraft_common::{
    auth::AuthContext,
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateChartRequest {
    #[validate(length(min = 1, max = 4000))]
    pub description: String,
}

/// Generate a chart spec from a natural-language description
pub async fn generate(
    State(state): State<AppState>,
    _auth: AuthContext,
    Json(request): Json<GenerateChartRequest>,
) -> Result<Json<ChartSpec>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let spec = generate_chart(&state, &request.description).await?;

    Ok(Json(spec))
}
