//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations and is the
//! single place where the persistence invariants are enforced:
//! - paper status only advances generating -> completed | failed
//! - version numbers are monotonically increasing per paper
//! - deletion is soft by default; purging is a separate explicit path

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Paper Operations
    // ========================================================================

    /// Create a new paper in the generating state
    pub async fn create_paper(
        &self,
        user_id: Uuid,
        title: String,
        paper_type: PaperType,
    ) -> Result<Paper> {
        let now = Utc::now();
        let paper = PaperActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(title),
            paper_type: Set(paper_type.as_str().to_string()),
            status: Set(PaperStatus::Generating.as_str().to_string()),
            outline: Set(None),
            content: Set(None),
            error_message: Set(None),
            docx_url: Set(None),
            pdf_url: Set(None),
            latex_url: Set(None),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        paper.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find paper by ID (including soft-deleted rows)
    pub async fn find_paper_by_id(&self, id: Uuid) -> Result<Option<Paper>> {
        PaperEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List live papers for a user with row-offset pagination
    pub async fn list_papers(
        &self,
        user_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Paper>, u64)> {
        let query = PaperEntity::find()
            .filter(PaperColumn::UserId.eq(user_id))
            .filter(PaperColumn::DeletedAt.is_null());

        let total = query.clone().count(self.read_conn()).await?;
        let papers = query
            .order_by_desc(PaperColumn::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.read_conn())
            .await?;

        Ok((papers, total))
    }

    /// List soft-deleted papers (the recycle bin)
    pub async fn list_deleted_papers(&self, user_id: Uuid) -> Result<Vec<Paper>> {
        PaperEntity::find()
            .filter(PaperColumn::UserId.eq(user_id))
            .filter(PaperColumn::DeletedAt.is_not_null())
            .order_by_desc(PaperColumn::DeletedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Overwrite a paper's outline/content text
    pub async fn update_paper_text(
        &self,
        paper_id: Uuid,
        title: Option<String>,
        outline: Option<String>,
        content: Option<String>,
    ) -> Result<Paper> {
        let mut paper: PaperActiveModel = self.require_paper(paper_id).await?.into();

        if let Some(t) = title {
            paper.title = Set(t);
        }
        if let Some(o) = outline {
            paper.outline = Set(Some(o));
        }
        if let Some(c) = content {
            paper.content = Set(Some(c));
        }
        paper.updated_at = Set(Utc::now());

        paper.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Advance a paper's status, enforcing the transition invariant.
    ///
    /// Only generating -> completed and generating -> failed are legal;
    /// anything else is a conflict.
    pub async fn advance_paper_status(
        &self,
        paper_id: Uuid,
        next: PaperStatus,
        error_message: Option<String>,
    ) -> Result<Paper> {
        let current = self.require_paper(paper_id).await?;
        let current_status = current.paper_status();

        if !current_status.can_transition_to(next) {
            return Err(AppError::InvalidStatusTransition {
                from: current_status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }

        let mut paper: PaperActiveModel = current.into();
        paper.status = Set(next.as_str().to_string());
        paper.error_message = Set(error_message);
        paper.updated_at = Set(Utc::now());

        paper.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Reset a completed/failed paper back to generating for a re-run.
    ///
    /// This is the one sanctioned re-entry point: regeneration starts a
    /// fresh lifecycle rather than mutating a terminal one in place.
    pub async fn restart_paper_generation(&self, paper_id: Uuid) -> Result<Paper> {
        let current = self.require_paper(paper_id).await?;

        let mut paper: PaperActiveModel = current.into();
        paper.status = Set(PaperStatus::Generating.as_str().to_string());
        paper.error_message = Set(None);
        paper.updated_at = Set(Utc::now());

        paper.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Record an exported file URL on the paper
    pub async fn set_export_url(
        &self,
        paper_id: Uuid,
        format: &str,
        url: String,
    ) -> Result<Paper> {
        let mut paper: PaperActiveModel = self.require_paper(paper_id).await?.into();

        match format {
            "docx" => paper.docx_url = Set(Some(url)),
            "pdf" => paper.pdf_url = Set(Some(url)),
            "latex" => paper.latex_url = Set(Some(url)),
            other => {
                return Err(AppError::InvalidFormat {
                    message: format!("Unknown export format: {}", other),
                })
            }
        }
        paper.updated_at = Set(Utc::now());

        paper.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Soft-delete a paper (move to recycle bin)
    pub async fn soft_delete_paper(&self, paper_id: Uuid) -> Result<Paper> {
        let mut paper: PaperActiveModel = self.require_paper(paper_id).await?.into();
        paper.deleted_at = Set(Some(Utc::now()));
        paper.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Restore a soft-deleted paper
    pub async fn restore_paper(&self, paper_id: Uuid) -> Result<Paper> {
        let mut paper: PaperActiveModel = self.require_paper(paper_id).await?.into();
        paper.deleted_at = Set(None);
        paper.updated_at = Set(Utc::now());
        paper.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Permanently delete a paper and its dependent rows
    pub async fn purge_paper(&self, paper_id: Uuid) -> Result<bool> {
        PaperVersionEntity::delete_many()
            .filter(PaperVersionColumn::PaperId.eq(paper_id))
            .exec(self.write_conn())
            .await?;
        ReferenceEntity::delete_many()
            .filter(ReferenceColumn::PaperId.eq(paper_id))
            .exec(self.write_conn())
            .await?;
        QualityCheckEntity::delete_many()
            .filter(QualityCheckColumn::PaperId.eq(paper_id))
            .exec(self.write_conn())
            .await?;

        let result = PaperEntity::delete_by_id(paper_id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn require_paper(&self, paper_id: Uuid) -> Result<Paper> {
        PaperEntity::find_by_id(paper_id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::PaperNotFound {
                id: paper_id.to_string(),
            })
    }

    // ========================================================================
    // Version Operations
    // ========================================================================

    /// Snapshot the given text as the next version of a paper.
    ///
    /// The number is assigned here as max(version_number) + 1 so it is
    /// monotonically increasing per paper.
    pub async fn create_version(
        &self,
        paper_id: Uuid,
        outline: Option<String>,
        content: Option<String>,
        note: Option<String>,
    ) -> Result<PaperVersion> {
        let latest = PaperVersionEntity::find()
            .filter(PaperVersionColumn::PaperId.eq(paper_id))
            .order_by_desc(PaperVersionColumn::VersionNumber)
            .one(self.write_conn())
            .await?;

        let next_number = latest.map(|v| v.version_number + 1).unwrap_or(1);

        let version = PaperVersionActiveModel {
            id: Set(Uuid::new_v4()),
            paper_id: Set(paper_id),
            version_number: Set(next_number),
            outline: Set(outline),
            content: Set(content),
            note: Set(note),
            created_at: Set(Utc::now()),
        };

        version.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// List versions of a paper, newest first
    pub async fn list_versions(&self, paper_id: Uuid) -> Result<Vec<PaperVersion>> {
        PaperVersionEntity::find()
            .filter(PaperVersionColumn::PaperId.eq(paper_id))
            .order_by_desc(PaperVersionColumn::VersionNumber)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find a specific version of a paper
    pub async fn find_version(
        &self,
        paper_id: Uuid,
        version_number: i32,
    ) -> Result<Option<PaperVersion>> {
        PaperVersionEntity::find()
            .filter(PaperVersionColumn::PaperId.eq(paper_id))
            .filter(PaperVersionColumn::VersionNumber.eq(version_number))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Reference Operations
    // ========================================================================

    /// Create a reference for a paper
    #[allow(clippy::too_many_arguments)]
    pub async fn create_reference(
        &self,
        paper_id: Uuid,
        title: String,
        authors: Vec<String>,
        year: Option<i32>,
        journal: Option<String>,
        volume: Option<String>,
        issue: Option<String>,
        pages: Option<String>,
        doi: Option<String>,
    ) -> Result<Reference> {
        let now = Utc::now();
        let reference = ReferenceActiveModel {
            id: Set(Uuid::new_v4()),
            paper_id: Set(paper_id),
            title: Set(title),
            authors: Set(serde_json::json!(authors)),
            year: Set(year),
            journal: Set(journal),
            volume: Set(volume),
            issue: Set(issue),
            pages: Set(pages),
            doi: Set(doi),
            created_at: Set(now),
            updated_at: Set(now),
        };

        reference.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// List references of a paper in insertion order
    pub async fn list_references(&self, paper_id: Uuid) -> Result<Vec<Reference>> {
        ReferenceEntity::find()
            .filter(ReferenceColumn::PaperId.eq(paper_id))
            .order_by_asc(ReferenceColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find a reference by ID
    pub async fn find_reference_by_id(&self, id: Uuid) -> Result<Option<Reference>> {
        ReferenceEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Update fields of a reference
    #[allow(clippy::too_many_arguments)]
    pub async fn update_reference(
        &self,
        id: Uuid,
        title: Option<String>,
        authors: Option<Vec<String>>,
        year: Option<Option<i32>>,
        journal: Option<Option<String>>,
        volume: Option<Option<String>>,
        issue: Option<Option<String>>,
        pages: Option<Option<String>>,
        doi: Option<Option<String>>,
    ) -> Result<Reference> {
        let existing = ReferenceEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::ReferenceNotFound { id: id.to_string() })?;

        let mut reference: ReferenceActiveModel = existing.into();
        if let Some(t) = title {
            reference.title = Set(t);
        }
        if let Some(a) = authors {
            reference.authors = Set(serde_json::json!(a));
        }
        if let Some(y) = year {
            reference.year = Set(y);
        }
        if let Some(j) = journal {
            reference.journal = Set(j);
        }
        if let Some(v) = volume {
            reference.volume = Set(v);
        }
        if let Some(i) = issue {
            reference.issue = Set(i);
        }
        if let Some(p) = pages {
            reference.pages = Set(p);
        }
        if let Some(d) = doi {
            reference.doi = Set(d);
        }
        reference.updated_at = Set(Utc::now());

        reference.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Delete a reference
    pub async fn delete_reference(&self, id: Uuid) -> Result<bool> {
        let result = ReferenceEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Quality Check Operations
    // ========================================================================

    /// Store a quality check result
    #[allow(clippy::too_many_arguments)]
    pub async fn create_quality_check(
        &self,
        paper_id: Uuid,
        overall_score: i32,
        structure_score: i32,
        coherence_score: i32,
        citation_score: i32,
        language_score: i32,
        issues: Vec<String>,
        suggestions: Vec<String>,
    ) -> Result<QualityCheck> {
        let check = QualityCheckActiveModel {
            id: Set(Uuid::new_v4()),
            paper_id: Set(paper_id),
            overall_score: Set(overall_score),
            structure_score: Set(structure_score),
            coherence_score: Set(coherence_score),
            citation_score: Set(citation_score),
            language_score: Set(language_score),
            issues: Set(serde_json::json!(issues)),
            suggestions: Set(serde_json::json!(suggestions)),
            created_at: Set(Utc::now()),
        };

        check.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Latest quality check for a paper
    pub async fn latest_quality_check(&self, paper_id: Uuid) -> Result<Option<QualityCheck>> {
        QualityCheckEntity::find()
            .filter(QualityCheckColumn::PaperId.eq(paper_id))
            .order_by_desc(QualityCheckColumn::CreatedAt)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Polish Operations
    // ========================================================================

    /// Record a polish request and its result
    pub async fn create_polish_record(
        &self,
        user_id: Uuid,
        paper_id: Option<Uuid>,
        mode: String,
        original_text: String,
        polished_text: String,
    ) -> Result<PolishHistory> {
        let record = PolishHistoryActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            paper_id: Set(paper_id),
            mode: Set(mode),
            original_text: Set(original_text),
            polished_text: Set(polished_text),
            created_at: Set(Utc::now()),
        };

        record.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// List polish history for a user, newest first
    pub async fn list_polish_history(
        &self,
        user_id: Uuid,
        paper_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<PolishHistory>> {
        let mut query = PolishHistoryEntity::find()
            .filter(PolishHistoryColumn::UserId.eq(user_id));

        if let Some(pid) = paper_id {
            query = query.filter(PolishHistoryColumn::PaperId.eq(pid));
        }

        query
            .order_by_desc(PolishHistoryColumn::CreatedAt)
            .limit(limit)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Knowledge Document Operations
    // ========================================================================

    /// Create a knowledge document record in the uploading state
    pub async fn create_document(
        &self,
        user_id: Uuid,
        file_name: String,
        content_type: String,
        size_bytes: i64,
    ) -> Result<KnowledgeDocument> {
        let now = Utc::now();
        let document = KnowledgeDocumentActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            file_name: Set(file_name),
            content_type: Set(content_type),
            size_bytes: Set(size_bytes),
            extracted_text: Set(None),
            summary: Set(None),
            keywords: Set(serde_json::json!([])),
            status: Set(DocumentStatus::Uploading.as_str().to_string()),
            error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        document.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Move a document to the processing state
    pub async fn mark_document_processing(&self, id: Uuid) -> Result<KnowledgeDocument> {
        let mut document: KnowledgeDocumentActiveModel = self.require_document(id).await?.into();
        document.status = Set(DocumentStatus::Processing.as_str().to_string());
        document.updated_at = Set(Utc::now());
        document.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Store extraction results and mark the document ready
    pub async fn complete_document(
        &self,
        id: Uuid,
        extracted_text: String,
        summary: Option<String>,
        keywords: Vec<String>,
    ) -> Result<KnowledgeDocument> {
        let mut document: KnowledgeDocumentActiveModel = self.require_document(id).await?.into();
        document.extracted_text = Set(Some(extracted_text));
        document.summary = Set(summary);
        document.keywords = Set(serde_json::json!(keywords));
        document.status = Set(DocumentStatus::Ready.as_str().to_string());
        document.error_message = Set(None);
        document.updated_at = Set(Utc::now());
        document.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Mark a document failed with the stored error message
    pub async fn fail_document(&self, id: Uuid, error: String) -> Result<KnowledgeDocument> {
        let mut document: KnowledgeDocumentActiveModel = self.require_document(id).await?.into();
        document.status = Set(DocumentStatus::Failed.as_str().to_string());
        document.error_message = Set(Some(error));
        document.updated_at = Set(Utc::now());
        document.update(self.write_conn()).await.map_err(Into::into)
    }

    /// List a user's knowledge documents, newest first
    pub async fn list_documents(&self, user_id: Uuid) -> Result<Vec<KnowledgeDocument>> {
        KnowledgeDocumentEntity::find()
            .filter(KnowledgeDocumentColumn::UserId.eq(user_id))
            .order_by_desc(KnowledgeDocumentColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find a knowledge document by ID
    pub async fn find_document_by_id(&self, id: Uuid) -> Result<Option<KnowledgeDocument>> {
        KnowledgeDocumentEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete a knowledge document
    pub async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let result = KnowledgeDocumentEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn require_document(&self, id: Uuid) -> Result<KnowledgeDocument> {
        KnowledgeDocumentEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::DocumentNotFound { id: id.to_string() })
    }

    // ========================================================================
    // Dashboard Operations
    // ========================================================================

    /// Count a user's live papers with the given status
    pub async fn count_papers_with_status(
        &self,
        user_id: Uuid,
        status: PaperStatus,
    ) -> Result<u64> {
        PaperEntity::find()
            .filter(PaperColumn::UserId.eq(user_id))
            .filter(PaperColumn::DeletedAt.is_null())
            .filter(PaperColumn::Status.eq(status.as_str()))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Count a user's live papers created at or after the given instant
    pub async fn count_papers_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        PaperEntity::find()
            .filter(PaperColumn::UserId.eq(user_id))
            .filter(PaperColumn::DeletedAt.is_null())
            .filter(PaperColumn::CreatedAt.gte(since))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Most recently updated live papers
    pub async fn recent_papers(&self, user_id: Uuid, limit: u64) -> Result<Vec<Paper>> {
        PaperEntity::find()
            .filter(PaperColumn::UserId.eq(user_id))
            .filter(PaperColumn::DeletedAt.is_null())
            .order_by_desc(PaperColumn::UpdatedAt)
            .limit(limit)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }
}
