//! Reference management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::load_owned_paper;
use crate::AppState;
use paperdraft_common::{
    auth::AuthContext,
    db::models::Reference,
    errors::{AppError, Result},
};
use paperdraft_docgen::{format_citation, CitationStyle, ReferenceData};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReferenceRequest {
    #[validate(length(min = 1, max = 1000))]
    pub title: String,

    #[validate(length(min = 1))]
    pub authors: Vec<String>,

    pub year: Option<i32>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReferenceRequest {
    #[validate(length(min = 1, max = 1000))]
    pub title: Option<String>,

    pub authors: Option<Vec<String>>,
    pub year: Option<i32>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
}

#[derive(Serialize)]
pub struct ReferenceResponse {
    pub id: Uuid,
    pub paper_id: Uuid,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
    pub created_at: String,
}

impl From<Reference> for ReferenceResponse {
    fn from(reference: Reference) -> Self {
        let authors = reference.author_list();
        Self {
            id: reference.id,
            paper_id: reference.paper_id,
            title: reference.title,
            authors,
            year: reference.year,
            journal: reference.journal,
            volume: reference.volume,
            issue: reference.issue,
            pages: reference.pages,
            doi: reference.doi,
            created_at: reference.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ListReferencesResponse {
    pub references: Vec<ReferenceResponse>,
}

#[derive(Debug, Deserialize)]
pub struct FormattedQuery {
    #[serde(default = "default_style")]
    pub style: String,
}

fn default_style() -> String {
    "gbt7714".to_string()
}

#[derive(Serialize)]
pub struct FormattedReferencesResponse {
    pub style: String,
    pub entries: Vec<String>,
}

/// Add a reference to a paper
pub async fn create_reference(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
    Json(request): Json<CreateReferenceRequest>,
) -> Result<(StatusCode, Json<ReferenceResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let paper = load_owned_paper(&state, &auth, paper_id).await?;

    let reference = state
        .repo
        .create_reference(
            paper.id,
            request.title,
            request.authors,
            request.year,
            request.journal,
            request.volume,
            request.issue,
            request.pages,
            request.doi,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(reference.into())))
}

/// List a paper's references
pub async fn list_references(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<ListReferencesResponse>> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;
    let references = state.repo.list_references(paper.id).await?;

    Ok(Json(ListReferencesResponse {
        references: references.into_iter().map(Into::into).collect(),
    }))
}

/// List a paper's references formatted in a citation style
pub async fn formatted_references(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
    Query(query): Query<FormattedQuery>,
) -> Result<Json<FormattedReferencesResponse>> {
    let style = CitationStyle::parse(&query.style).ok_or_else(|| AppError::Validation {
        message: format!("Unknown citation style: {}", query.style),
        field: Some("style".to_string()),
    })?;

    let paper = load_owned_paper(&state, &auth, paper_id).await?;
    let references = state.repo.list_references(paper.id).await?;

    let entries = references
        .iter()
        .enumerate()
        .map(|(index, reference)| {
            let data = ReferenceData {
                title: reference.title.clone(),
                authors: reference.author_list(),
                year: reference.year,
                journal: reference.journal.clone(),
                volume: reference.volume.clone(),
                issue: reference.issue.clone(),
                pages: reference.pages.clone(),
                doi: reference.doi.clone(),
            };
            format!("[{}] {}", index + 1, format_citation(&data, style))
        })
        .collect();

    Ok(Json(FormattedReferencesResponse {
        style: style.as_str().to_string(),
        entries,
    }))
}

/// Update a reference
pub async fn update_reference(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((paper_id, reference_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateReferenceRequest>,
) -> Result<Json<ReferenceResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let paper = load_owned_paper(&state, &auth, paper_id).await?;
    require_reference_on_paper(&state, paper.id, reference_id).await?;

    let updated = state
        .repo
        .update_reference(
            reference_id,
            request.title,
            request.authors,
            request.year.map(Some),
            request.journal.map(Some),
            request.volume.map(Some),
            request.issue.map(Some),
            request.pages.map(Some),
            request.doi.map(Some),
        )
        .await?;

    Ok(Json(updated.into()))
}

/// Delete a reference
pub async fn delete_reference(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((paper_id, reference_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;
    require_reference_on_paper(&state, paper.id, reference_id).await?;

    state.repo.delete_reference(reference_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn require_reference_on_paper(
    state: &AppState,
    paper_id: Uuid,
    reference_id: Uuid,
) -> Result<()> {
    let reference = state
        .repo
        .find_reference_by_id(reference_id)
        .await?
        .ok_or_else(|| AppError::ReferenceNotFound {
            id: reference_id.to_string(),
        })?;

    if reference.paper_id != paper_id {
        return Err(AppError::ReferenceNotFound {
            id: reference_id.to_string(),
        });
    }

    Ok(())
}
