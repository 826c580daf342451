//! Paper version handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::handlers::load_owned_paper;
use crate::AppState;
use paperdraft_common::{
    auth::AuthContext,
    db::models::PaperVersion,
    errors::{AppError, Result},
};

/// Version metadata for listings
#[derive(Serialize)]
pub struct VersionSummary {
    pub id: Uuid,
    pub version_number: i32,
    pub note: Option<String>,
    pub created_at: String,
}

/// Full version content
#[derive(Serialize)]
pub struct VersionResponse {
    pub id: Uuid,
    pub paper_id: Uuid,
    pub version_number: i32,
    pub outline: Option<String>,
    pub content: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
}

impl From<PaperVersion> for VersionResponse {
    fn from(version: PaperVersion) -> Self {
        Self {
            id: version.id,
            paper_id: version.paper_id,
            version_number: version.version_number,
            outline: version.outline,
            content: version.content,
            note: version.note,
            created_at: version.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ListVersionsResponse {
    pub versions: Vec<VersionSummary>,
}

/// List versions of a paper, newest first
pub async fn list_versions(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<ListVersionsResponse>> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;
    let versions = state.repo.list_versions(paper.id).await?;

    Ok(Json(ListVersionsResponse {
        versions: versions
            .into_iter()
            .map(|v| VersionSummary {
                id: v.id,
                version_number: v.version_number,
                note: v.note,
                created_at: v.created_at.to_rfc3339(),
            })
            .collect(),
    }))
}

/// Get a specific version with its full text
pub async fn get_version(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((paper_id, version_number)): Path<(Uuid, i32)>,
) -> Result<Json<VersionResponse>> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;

    let version = state
        .repo
        .find_version(paper.id, version_number)
        .await?
        .ok_or_else(|| AppError::VersionNotFound {
            paper_id: paper_id.to_string(),
            version: version_number,
        })?;

    Ok(Json(version.into()))
}

/// Restore the paper's text from a version.
///
/// The restore itself is snapshotted as a new version, so the history
/// only ever grows.
pub async fn restore_version(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((paper_id, version_number)): Path<(Uuid, i32)>,
) -> Result<Json<crate::handlers::papers::PaperResponse>> {
    let paper = load_owned_paper(&state, &auth, paper_id).await?;

    let version = state
        .repo
        .find_version(paper.id, version_number)
        .await?
        .ok_or_else(|| AppError::VersionNotFound {
            paper_id: paper_id.to_string(),
            version: version_number,
        })?;

    let updated = state
        .repo
        .update_paper_text(
            paper.id,
            None,
            version.outline.clone(),
            version.content.clone(),
        )
        .await?;

    state
        .repo
        .create_version(
            paper.id,
            version.outline,
            version.content,
            Some(format!("restored from v{}", version_number)),
        )
        .await?;

    tracing::info!(
        paper_id = %paper_id,
        version = version_number,
        "Paper restored from version"
    );

    Ok(Json(updated.into()))
}
