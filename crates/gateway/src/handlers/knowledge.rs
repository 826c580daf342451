//! Knowledge base handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::knowledge::{answer_question, answer_question_for_document, process_upload};
use crate::AppState;
use paperdraft_common::{
    auth::AuthContext,
    db::models::KnowledgeDocument,
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct UploadDocumentRequest {
    #[validate(length(min = 1, max = 500))]
    pub file_name: String,

    /// application/pdf, text/plain, text/markdown
    pub content_type: String,

    /// Base64-encoded file bytes
    pub data: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub status: String,
    pub summary: Option<String>,
    pub keywords: Vec<String>,
    pub error_message: Option<String>,
    pub created_at: String,
}

impl From<KnowledgeDocument> for DocumentResponse {
    fn from(document: KnowledgeDocument) -> Self {
        let keywords = document
            .keywords
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: document.id,
            file_name: document.file_name,
            content_type: document.content_type,
            size_bytes: document.size_bytes,
            status: document.status,
            summary: document.summary,
            keywords,
            error_message: document.error_message,
            created_at: document.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ListDocumentsResponse {
    pub documents: Vec<DocumentResponse>,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<String>,
}

/// Upload a document into the knowledge base
pub async fn upload_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<UploadDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let data = base64::engine::general_purpose::STANDARD
        .decode(&request.data)
        .map_err(|e| AppError::InvalidFormat {
            message: format!("Invalid base64 payload: {}", e),
        })?;

    let document = process_upload(
        &state,
        auth.user_id,
        request.file_name,
        request.content_type,
        data,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(document.into())))
}

/// List the caller's knowledge documents
pub async fn list_documents(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ListDocumentsResponse>> {
    let documents = state.repo.list_documents(auth.user_id).await?;

    Ok(Json(ListDocumentsResponse {
        documents: documents.into_iter().map(Into::into).collect(),
    }))
}

/// Get a knowledge document
pub async fn get_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentResponse>> {
    let document = load_owned_document(&state, &auth, document_id).await?;
    Ok(Json(document.into()))
}

/// Delete a knowledge document
pub async fn delete_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(document_id): Path<Uuid>,
) -> Result<StatusCode> {
    let document = load_owned_document(&state, &auth, document_id).await?;
    state.repo.delete_document(document.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Answer a question from the caller's knowledge base
pub async fn ask(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let (answer, sources) = answer_question(&state, auth.user_id, &request.question).await?;

    Ok(Json(AskResponse { answer, sources }))
}

/// Answer a question against one document
pub async fn ask_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(document_id): Path<Uuid>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let document = load_owned_document(&state, &auth, document_id).await?;
    let answer = answer_question_for_document(&state, &document, &request.question).await?;

    Ok(Json(AskResponse {
        answer,
        sources: vec![document.file_name],
    }))
}

async fn load_owned_document(
    state: &AppState,
    auth: &AuthContext,
    document_id: Uuid,
) -> Result<KnowledgeDocument> {
    let document = state
        .repo
        .find_document_by_id(document_id)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound {
            id: document_id.to_string(),
        })?;

    auth.require_owner(document.user_id)?;

    Ok(document)
}
