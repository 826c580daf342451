//! Knowledge base processing and Q&A
//!
//! Uploads go through extraction and LLM summarization before the
//! document becomes ready. Questions are answered against the
//! extracted text of the user's ready documents.

use crate::services::extract::extract_text;
use crate::AppState;
use metrics::counter;
use paperdraft_common::db::models::{DocumentStatus, KnowledgeDocument};
use paperdraft_common::errors::{AppError, Result};
use paperdraft_common::metrics::{record_llm_call, METRICS_PREFIX};
use std::time::Instant;
use uuid::Uuid;

const SUMMARY_SYSTEM: &str = "你是一位文献整理助手。\
阅读下面的文档内容,输出严格的 JSON:\
{\"summary\": \"不超过200字的摘要\", \"keywords\": [\"关键词\"]}。\
关键词不超过8个。";

const ANSWER_SYSTEM: &str = "你是一位研究助理。\
仅根据提供的资料回答用户的问题,如果资料中没有答案就明确说明。\
回答使用与问题相同的语言。";

// Per-document and total context caps for Q&A prompts.
const DOC_CONTEXT_CHARS: usize = 4_000;
const TOTAL_CONTEXT_CHARS: usize = 20_000;

/// Ingest an uploaded file into the knowledge base.
///
/// The returned document is either ready or failed; extraction or
/// summarization errors are recorded on the row instead of failing
/// the upload request.
pub async fn process_upload(
    state: &AppState,
    user_id: Uuid,
    file_name: String,
    content_type: String,
    data: Vec<u8>,
) -> Result<KnowledgeDocument> {
    let limit = state.config.server.max_upload_bytes;
    if data.len() > limit {
        return Err(AppError::PayloadTooLarge {
            size: data.len(),
            limit,
        });
    }

    let document = state
        .repo
        .create_document(user_id, file_name, content_type.clone(), data.len() as i64)
        .await?;
    counter!(format!("{}_documents_uploaded_total", METRICS_PREFIX)).increment(1);

    let document = state.repo.mark_document_processing(document.id).await?;

    let text = match extract_text(&content_type, &data) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(document_id = %document.id, error = %e, "Extraction failed");
            return state.repo.fail_document(document.id, e.to_string()).await;
        }
    };

    let truncated: String = text.chars().take(DOC_CONTEXT_CHARS).collect();
    let start = Instant::now();
    let summary_result = state.llm.complete_json(SUMMARY_SYSTEM, &truncated).await;
    record_llm_call(
        start.elapsed().as_secs_f64(),
        state.llm.model_name(),
        "summarize",
        summary_result.is_ok(),
    );

    match summary_result {
        Ok(value) => {
            let summary = value
                .get("summary")
                .and_then(|v| v.as_str())
                .map(String::from);
            let keywords = value
                .get("keywords")
                .and_then(|v| v.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|i| i.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default();

            state
                .repo
                .complete_document(document.id, text, summary, keywords)
                .await
        }
        Err(e) => {
            tracing::warn!(document_id = %document.id, error = %e, "Summarization failed");
            state.repo.fail_document(document.id, e.to_string()).await
        }
    }
}

/// Answer a question against a single ready document
pub async fn answer_question_for_document(
    state: &AppState,
    document: &KnowledgeDocument,
    question: &str,
) -> Result<String> {
    if document.document_status() != DocumentStatus::Ready {
        return Err(AppError::Conflict {
            message: format!("Document is {}, not ready", document.status),
        });
    }

    let text = document.extracted_text.as_deref().unwrap_or_default();
    let snippet: String = text.chars().take(TOTAL_CONTEXT_CHARS).collect();
    let user_prompt = format!(
        "资料:\n【{}】\n{}\n\n问题:{}",
        document.file_name, snippet, question
    );

    let start = Instant::now();
    let result = state.llm.complete(ANSWER_SYSTEM, &user_prompt).await;
    record_llm_call(
        start.elapsed().as_secs_f64(),
        state.llm.model_name(),
        "knowledge_qa",
        result.is_ok(),
    );
    let answer = result?;
    counter!(format!("{}_knowledge_questions_total", METRICS_PREFIX)).increment(1);

    Ok(answer)
}

/// Answer a question against the user's ready documents.
///
/// Returns the answer and the file names used as context.
pub async fn answer_question(
    state: &AppState,
    user_id: Uuid,
    question: &str,
) -> Result<(String, Vec<String>)> {
    let documents = state.repo.list_documents(user_id).await?;
    let ready: Vec<&KnowledgeDocument> = documents
        .iter()
        .filter(|d| d.document_status() == DocumentStatus::Ready)
        .collect();

    if ready.is_empty() {
        return Err(AppError::Conflict {
            message: "No ready documents in the knowledge base".to_string(),
        });
    }

    let mut context = String::new();
    let mut sources = Vec::new();
    for document in &ready {
        if context.chars().count() >= TOTAL_CONTEXT_CHARS {
            break;
        }
        let Some(ref text) = document.extracted_text else {
            continue;
        };
        let snippet: String = text.chars().take(DOC_CONTEXT_CHARS).collect();
        context.push_str(&format!("【{}】\n{}\n\n", document.file_name, snippet));
        sources.push(document.file_name.clone());
    }

    let user_prompt = format!("资料:\n{}\n问题:{}", context, question);

    let start = Instant::now();
    let result = state.llm.complete(ANSWER_SYSTEM, &user_prompt).await;
    record_llm_call(
        start.elapsed().as_secs_f64(),
        state.llm.model_name(),
        "knowledge_qa",
        result.is_ok(),
    );
    let answer = result?;
    counter!(format!("{}_knowledge_questions_total", METRICS_PREFIX)).increment(1);

    Ok((answer, sources))
}
