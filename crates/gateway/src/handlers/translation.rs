//! Translation handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::translation::{detect_direction, translate_text};
use crate::AppState;
use paperdraft_common::{
    auth::AuthContext,
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct TranslateRequest {
    #[validate(length(min = 1, max = 20000))]
    pub text: String,

    /// zh-en or en-zh; omitted means detect from the input script
    pub direction: Option<String>,
}

#[derive(Serialize)]
pub struct TranslateResponse {
    pub direction: String,
    pub translated_text: String,
}

/// Translate a passage between Chinese and English
pub async fn translate(
    State(state): State<AppState>,
    _auth: AuthContext,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let direction = request
        .direction
        .unwrap_or_else(|| detect_direction(&request.text).to_string());
    let translated = translate_text(&state, &direction, &request.text).await?;

    Ok(Json(TranslateResponse {
        direction,
        translated_text: translated,
    }))
}
