//! Dashboard statistics handlers

use axum::{extract::State, Json};
use chrono::{Datelike, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use paperdraft_common::{auth::AuthContext, db::models::PaperStatus, errors::Result};

#[derive(Serialize)]
pub struct DashboardResponse {
    pub papers: PaperCounts,
    pub papers_this_month: u64,
    pub latest_quality_score: Option<i32>,
    pub recent_papers: Vec<RecentPaper>,
}

#[derive(Serialize)]
pub struct PaperCounts {
    pub total: u64,
    pub generating: u64,
    pub completed: u64,
    pub failed: u64,
}

#[derive(Serialize)]
pub struct RecentPaper {
    pub id: Uuid,
    pub title: String,
    pub paper_type: String,
    pub status: String,
    pub updated_at: String,
}

/// Aggregate statistics for the caller's dashboard
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<DashboardResponse>> {
    let generating = state
        .repo
        .count_papers_with_status(auth.user_id, PaperStatus::Generating)
        .await?;
    let completed = state
        .repo
        .count_papers_with_status(auth.user_id, PaperStatus::Completed)
        .await?;
    let failed = state
        .repo
        .count_papers_with_status(auth.user_id, PaperStatus::Failed)
        .await?;

    let now = Utc::now();
    let month_start = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    let papers_this_month = state
        .repo
        .count_papers_since(auth.user_id, month_start)
        .await?;

    let recent = state.repo.recent_papers(auth.user_id, 5).await?;

    // Latest quality score among the most recently touched papers
    let mut latest_quality_score = None;
    for paper in &recent {
        if let Some(check) = state.repo.latest_quality_check(paper.id).await? {
            latest_quality_score = Some(check.overall_score);
            break;
        }
    }

    Ok(Json(DashboardResponse {
        papers: PaperCounts {
            total: generating + completed + failed,
            generating,
            completed,
            failed,
        },
        papers_this_month,
        latest_quality_score,
        recent_papers: recent
            .into_iter()
            .map(|p| RecentPaper {
                id: p.id,
                title: p.title,
                paper_type: p.paper_type,
                status: p.status,
                updated_at: p.updated_at.to_rfc3339(),
            })
            .collect(),
    }))
}
