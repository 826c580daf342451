//! Paper management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::{load_owned_paper, load_owned_paper_any};
use crate::services::generation;
use crate::AppState;
use metrics::counter;
use paperdraft_common::{
    auth::AuthContext,
    db::models::{Paper, PaperType},
    errors::{AppError, Result},
    metrics::METRICS_PREFIX,
    storage::export_key,
};

/// Request to create a new paper
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaperRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    /// graduation_thesis, journal_paper, course_paper, proposal_report
    pub paper_type: String,
}

/// Request to update a paper's editable fields
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaperRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,

    pub outline: Option<String>,

    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPapersQuery {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    20
}

/// Paper representation returned by the API
#[derive(Serialize)]
pub struct PaperResponse {
    pub id: Uuid,
    pub title: String,
    pub paper_type: String,
    pub status: String,
    pub outline: Option<String>,
    pub content: Option<String>,
    pub error_message: Option<String>,
    pub docx_url: Option<String>,
    pub pdf_url: Option<String>,
    pub latex_url: Option<String>,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Paper> for PaperResponse {
    fn from(paper: Paper) -> Self {
        Self {
            id: paper.id,
            title: paper.title,
            paper_type: paper.paper_type,
            status: paper.status,
            outline: paper.outline,
            content: paper.content,
            error_message: paper.error_message,
            docx_url: paper.docx_url,
            pdf_url: paper.pdf_url,
            latex_url: paper.latex_url,
            deleted_at: paper.deleted_at.map(|dt| dt.to_rfc3339()),
            created_at: paper.created_at.to_rfc3339(),
            updated_at: paper.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ListPapersResponse {
    pub papers: Vec<PaperResponse>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Create a new paper in the generating state
pub async fn create_paper(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreatePaperRequest>,
) -> Result<(StatusCode, Json<PaperResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let paper_type =
        PaperType::parse(&request.paper_type).ok_or_else(|| AppError::Validation {
            message: format!("Unknown paper type: {}", request.paper_type),
            field: Some("paper_type".to_string()),
        })?;

    let paper = state
        .repo
        .create_paper(auth.user_id, request.title, paper_type)
        .await?;
    counter!(format!("{}_papers_created_total", METRICS_PREFIX)).increment(1);

    tracing::info!(
        paper_id = %paper.id,
        user_id = %auth.user_id,
        paper_type = %paper.paper_type,
        "Paper created"
    );

    Ok((StatusCode::CREATED, Json(paper.into())))
}

/// List the caller's live papers
pub async fn list_papers(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListPapersQuery>,
) -> Result<Json<ListPapersResponse>> {
    let limit = query.limit.clamp(1, 100);
    let (papers, total) = state
        .repo
        .list_papers(auth.user_id, query.offset, limit)
        .await?;

    Ok(Json(ListPapersResponse {
        papers: papers.into_iter().map(Into::into).collect(),
        total,
        offset: query.offset,
        limit,
    }))
}

/// Get a paper by ID
pub async fn get_paper(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<PaperResponse>> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;
    Ok(Json(paper.into()))
}

/// Update a paper's title/outline/content.
///
/// A content change takes a version snapshot before the update so the
/// previous text stays recoverable.
pub async fn update_paper(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
    Json(request): Json<UpdatePaperRequest>,
) -> Result<Json<PaperResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let paper = load_owned_paper(&state, &auth, paper_id).await?;

    if should_snapshot(&request, &paper) {
        state
            .repo
            .create_version(
                paper.id,
                paper.outline.clone(),
                paper.content.clone(),
                Some("edited".to_string()),
            )
            .await?;
    }

    let updated = state
        .repo
        .update_paper_text(paper.id, request.title, request.outline, request.content)
        .await?;

    Ok(Json(updated.into()))
}

/// An edit save on a paper that already has content snapshots the
/// previous text first, whichever field changes.
fn should_snapshot(request: &UpdatePaperRequest, paper: &Paper) -> bool {
    let edits = request.title.is_some() || request.outline.is_some() || request.content.is_some();
    edits && paper.content.is_some()
}

/// Generate an outline for the paper
pub async fn generate_outline(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<PaperResponse>> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;
    let updated = generation::generate_outline(&state.repo, state.llm.as_ref(), paper).await?;
    Ok(Json(updated.into()))
}

/// Generate the paper's content from its outline
pub async fn generate_content(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<PaperResponse>> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;
    let updated = generation::generate_content(&state.repo, state.llm.as_ref(), paper).await?;
    Ok(Json(updated.into()))
}

/// Soft-delete a paper (move to recycle bin)
pub async fn delete_paper(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<StatusCode> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;
    state.repo.soft_delete_paper(paper.id).await?;

    tracing::info!(paper_id = %paper_id, user_id = %auth.user_id, "Paper moved to recycle bin");

    Ok(StatusCode::NO_CONTENT)
}

/// List the caller's recycle bin
pub async fn list_recycle_bin(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ListPapersResponse>> {
    let papers = state.repo.list_deleted_papers(auth.user_id).await?;
    let total = papers.len() as u64;

    Ok(Json(ListPapersResponse {
        papers: papers.into_iter().map(Into::into).collect(),
        total,
        offset: 0,
        limit: total.max(1),
    }))
}

/// Restore a paper from the recycle bin
pub async fn restore_paper(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<PaperResponse>> {
    let paper = load_owned_paper_any(&state, &auth, paper_id).await?;

    if !paper.is_deleted() {
        return Err(AppError::Conflict {
            message: "Paper is not in the recycle bin".to_string(),
        });
    }

    let restored = state.repo.restore_paper(paper.id).await?;
    Ok(Json(restored.into()))
}

/// Permanently delete a paper and all dependent data
pub async fn purge_paper(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<StatusCode> {
    let paper = load_owned_paper_any(&state, &auth, paper_id).await?;

    // Exported files go with the row; a failed cleanup does not block the purge
    for (format, extension, url) in [
        ("docx", "docx", &paper.docx_url),
        ("pdf", "pdf", &paper.pdf_url),
        ("latex", "tex", &paper.latex_url),
    ] {
        if url.is_some() {
            let key = export_key(paper.id, format, extension);
            if let Err(e) = state.storage.delete(&key).await {
                tracing::warn!(paper_id = %paper.id, key = %key, error = %e, "Export cleanup failed");
            }
        }
    }

    state.repo.purge_paper(paper.id).await?;

    tracing::info!(paper_id = %paper_id, user_id = %auth.user_id, "Paper permanently deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use paperdraft_common::db::models::{PaperStatus, PaperType};

    fn paper_with_content(content: Option<&str>) -> Paper {
        let now = Utc::now();
        Paper {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "测试论文".to_string(),
            paper_type: PaperType::JournalPaper.as_str().to_string(),
            status: PaperStatus::Completed.as_str().to_string(),
            outline: Some("# 引言".to_string()),
            content: content.map(String::from),
            error_message: None,
            docx_url: None,
            pdf_url: None,
            latex_url: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_outline_only_edit_snapshots_existing_content() {
        let request = UpdatePaperRequest {
            title: None,
            outline: Some("# 新大纲".to_string()),
            content: None,
        };
        assert!(should_snapshot(&request, &paper_with_content(Some("正文"))));
    }

    #[test]
    fn test_title_only_edit_snapshots_existing_content() {
        let request = UpdatePaperRequest {
            title: Some("新标题".to_string()),
            outline: None,
            content: None,
        };
        assert!(should_snapshot(&request, &paper_with_content(Some("正文"))));
    }

    #[test]
    fn test_no_snapshot_without_prior_content() {
        let request = UpdatePaperRequest {
            title: None,
            outline: None,
            content: Some("首次内容".to_string()),
        };
        assert!(!should_snapshot(&request, &paper_with_content(None)));
    }

    #[test]
    fn test_empty_patch_does_not_snapshot() {
        let request = UpdatePaperRequest {
            title: None,
            outline: None,
            content: None,
        };
        assert!(!should_snapshot(&request, &paper_with_content(Some("正文"))));
    }
}
