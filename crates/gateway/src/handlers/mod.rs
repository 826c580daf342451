//! HTTP request handlers

pub mod charts;
pub mod dashboard;
pub mod export;
pub mod health;
pub mod knowledge;
pub mod papers;
pub mod polish;
pub mod quality;
pub mod references;
pub mod translation;
pub mod versions;

use crate::AppState;
use paperdraft_common::auth::AuthContext;
use paperdraft_common::db::models::Paper;
use paperdraft_common::errors::{AppError, Result};
use uuid::Uuid;

/// Load a live paper and verify ownership.
///
/// Soft-deleted papers read as not found here; the recycle-bin
/// handlers use [`load_owned_paper_any`].
pub(crate) async fn load_owned_paper(
    state: &AppState,
    auth: &AuthContext,
    paper_id: Uuid,
) -> Result<Paper> {
    let paper = load_owned_paper_any(state, auth, paper_id).await?;
    if paper.is_deleted() {
        return Err(AppError::PaperNotFound {
            id: paper_id.to_string(),
        });
    }
    Ok(paper)
}

/// Load a paper (deleted or not) and verify ownership
pub(crate) async fn load_owned_paper_any(
    state: &AppState,
    auth: &AuthContext,
    paper_id: Uuid,
) -> Result<Paper> {
    let paper = state
        .repo
        .find_paper_by_id(paper_id)
        .await?
        .ok_or_else(|| AppError::PaperNotFound {
            id: paper_id.to_string(),
        })?;

    auth.require_owner(paper.user_id)?;

    Ok(paper)
}
