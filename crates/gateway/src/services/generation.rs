//! Outline and content generation
//!
//! Each run drives the owning paper through its lifecycle: the paper is
//! (re)set to generating, the model is called once, and the result
//! either completes or fails the paper. There are no retries; a failed
//! run is visible on the paper itself.

use async_trait::async_trait;
use paperdraft_common::db::models::{Paper, PaperStatus, PaperType, PaperVersion};
use paperdraft_common::db::Repository;
use paperdraft_common::errors::{AppError, Result};
use paperdraft_common::llm::LlmClient;
use paperdraft_common::metrics::{record_generation, record_llm_call};
use paperdraft_docgen::normalize_graduation_structure;
use std::time::Instant;
use uuid::Uuid;

const OUTLINE_SYSTEM: &str = "你是一位经验丰富的学术论文写作助手。\
根据论文标题和类型生成结构清晰的论文大纲。\
使用 Markdown 格式输出,一级标题用 #,二级标题用 ##,不要输出其他说明文字。";

const CONTENT_SYSTEM: &str = "你是一位经验丰富的学术论文写作助手。\
根据给定的大纲撰写完整的论文正文。\
使用 Markdown 格式,保持学术语言风格,引用处使用 [1] 形式的编号标记。";

/// Persistence surface the generation flows touch
#[async_trait]
pub trait GenerationStore: Send + Sync {
    async fn update_paper_text(
        &self,
        paper_id: Uuid,
        title: Option<String>,
        outline: Option<String>,
        content: Option<String>,
    ) -> Result<Paper>;

    async fn advance_paper_status(
        &self,
        paper_id: Uuid,
        next: PaperStatus,
        error_message: Option<String>,
    ) -> Result<Paper>;

    async fn restart_paper_generation(&self, paper_id: Uuid) -> Result<Paper>;

    async fn create_version(
        &self,
        paper_id: Uuid,
        outline: Option<String>,
        content: Option<String>,
        note: Option<String>,
    ) -> Result<PaperVersion>;
}

#[async_trait]
impl GenerationStore for Repository {
    async fn update_paper_text(
        &self,
        paper_id: Uuid,
        title: Option<String>,
        outline: Option<String>,
        content: Option<String>,
    ) -> Result<Paper> {
        Repository::update_paper_text(self, paper_id, title, outline, content).await
    }

    async fn advance_paper_status(
        &self,
        paper_id: Uuid,
        next: PaperStatus,
        error_message: Option<String>,
    ) -> Result<Paper> {
        Repository::advance_paper_status(self, paper_id, next, error_message).await
    }

    async fn restart_paper_generation(&self, paper_id: Uuid) -> Result<Paper> {
        Repository::restart_paper_generation(self, paper_id).await
    }

    async fn create_version(
        &self,
        paper_id: Uuid,
        outline: Option<String>,
        content: Option<String>,
        note: Option<String>,
    ) -> Result<PaperVersion> {
        Repository::create_version(self, paper_id, outline, content, note).await
    }
}

fn type_hint(paper_type: PaperType) -> &'static str {
    match paper_type {
        PaperType::GraduationThesis => "这是一篇本科毕业论文,需要包含摘要、正文章节、参考文献和致谢。",
        PaperType::JournalPaper => "这是一篇期刊论文,结构应包含引言、方法、结果、讨论和结论。",
        PaperType::CoursePaper => "这是一篇课程论文,篇幅适中,论证围绕课程主题展开。",
        PaperType::ProposalReport => "这是一篇开题报告,需要包含选题背景、研究意义、研究方案和进度安排。",
    }
}

/// Generate an outline for the paper.
///
/// On success the outline is stored and the paper completes; on model
/// failure the paper is marked failed with the error message.
pub async fn generate_outline(
    store: &dyn GenerationStore,
    llm: &dyn LlmClient,
    paper: Paper,
) -> Result<Paper> {
    let paper = ensure_generating(store, paper).await?;
    let start = Instant::now();

    let user_prompt = format!(
        "{}\n论文标题:{}\n请生成论文大纲。",
        type_hint(paper.paper_type()),
        paper.title
    );

    let result = llm.complete(OUTLINE_SYSTEM, &user_prompt).await;
    record_llm_call(
        start.elapsed().as_secs_f64(),
        llm.model_name(),
        "outline",
        result.is_ok(),
    );

    match result {
        Ok(outline) => {
            store
                .update_paper_text(paper.id, None, Some(outline), None)
                .await?;
            let updated = store
                .advance_paper_status(paper.id, PaperStatus::Completed, None)
                .await?;
            record_generation(start.elapsed().as_secs_f64(), "outline", true);
            Ok(updated)
        }
        Err(e) => {
            store
                .advance_paper_status(paper.id, PaperStatus::Failed, Some(e.to_string()))
                .await?;
            record_generation(start.elapsed().as_secs_f64(), "outline", false);
            Err(e)
        }
    }
}

/// Generate the full content for the paper from its outline.
///
/// Graduation theses are normalized into the canonical front-to-back
/// section order after generation. A version snapshot is taken on
/// success.
pub async fn generate_content(
    store: &dyn GenerationStore,
    llm: &dyn LlmClient,
    paper: Paper,
) -> Result<Paper> {
    let outline = match paper.outline {
        Some(ref o) if !o.trim().is_empty() => o.clone(),
        _ => {
            return Err(AppError::Conflict {
                message: "Paper has no outline; generate an outline first".to_string(),
            })
        }
    };

    let paper = ensure_generating(store, paper).await?;
    let start = Instant::now();

    let user_prompt = format!(
        "{}\n论文标题:{}\n论文大纲:\n{}\n请根据大纲撰写完整正文。",
        type_hint(paper.paper_type()),
        paper.title,
        outline
    );

    let result = llm.complete(CONTENT_SYSTEM, &user_prompt).await;
    record_llm_call(
        start.elapsed().as_secs_f64(),
        llm.model_name(),
        "content",
        result.is_ok(),
    );

    match result {
        Ok(raw) => {
            let content = if paper.paper_type() == PaperType::GraduationThesis {
                normalize_graduation_structure(&raw)
            } else {
                raw
            };

            store
                .update_paper_text(paper.id, None, None, Some(content.clone()))
                .await?;
            store
                .create_version(
                    paper.id,
                    Some(outline),
                    Some(content),
                    Some("generated".to_string()),
                )
                .await?;
            let updated = store
                .advance_paper_status(paper.id, PaperStatus::Completed, None)
                .await?;
            record_generation(start.elapsed().as_secs_f64(), "content", true);
            Ok(updated)
        }
        Err(e) => {
            store
                .advance_paper_status(paper.id, PaperStatus::Failed, Some(e.to_string()))
                .await?;
            record_generation(start.elapsed().as_secs_f64(), "content", false);
            Err(e)
        }
    }
}

/// Put the paper into the generating state, restarting terminal papers.
async fn ensure_generating(store: &dyn GenerationStore, paper: Paper) -> Result<Paper> {
    if paper.paper_status() == PaperStatus::Generating {
        Ok(paper)
    } else {
        store.restart_paper_generation(paper.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use paperdraft_common::llm::MockLlm;
    use std::sync::Mutex;

    /// In-memory store holding a single paper, mirroring the
    /// repository's transition guard.
    struct MemoryStore {
        paper: Mutex<Paper>,
        versions: Mutex<Vec<PaperVersion>>,
    }

    impl MemoryStore {
        fn new(paper: Paper) -> Self {
            Self {
                paper: Mutex::new(paper),
                versions: Mutex::new(Vec::new()),
            }
        }

        fn paper(&self) -> Paper {
            self.paper.lock().unwrap().clone()
        }

        fn version_count(&self) -> usize {
            self.versions.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerationStore for MemoryStore {
        async fn update_paper_text(
            &self,
            _paper_id: Uuid,
            title: Option<String>,
            outline: Option<String>,
            content: Option<String>,
        ) -> Result<Paper> {
            let mut paper = self.paper.lock().unwrap();
            if let Some(t) = title {
                paper.title = t;
            }
            if let Some(o) = outline {
                paper.outline = Some(o);
            }
            if let Some(c) = content {
                paper.content = Some(c);
            }
            Ok(paper.clone())
        }

        async fn advance_paper_status(
            &self,
            _paper_id: Uuid,
            next: PaperStatus,
            error_message: Option<String>,
        ) -> Result<Paper> {
            let mut paper = self.paper.lock().unwrap();
            let current = paper.paper_status();
            if !current.can_transition_to(next) {
                return Err(AppError::InvalidStatusTransition {
                    from: current.as_str().to_string(),
                    to: next.as_str().to_string(),
                });
            }
            paper.status = next.as_str().to_string();
            paper.error_message = error_message;
            Ok(paper.clone())
        }

        async fn restart_paper_generation(&self, _paper_id: Uuid) -> Result<Paper> {
            let mut paper = self.paper.lock().unwrap();
            paper.status = PaperStatus::Generating.as_str().to_string();
            paper.error_message = None;
            Ok(paper.clone())
        }

        async fn create_version(
            &self,
            paper_id: Uuid,
            outline: Option<String>,
            content: Option<String>,
            note: Option<String>,
        ) -> Result<PaperVersion> {
            let mut versions = self.versions.lock().unwrap();
            let version = PaperVersion {
                id: Uuid::new_v4(),
                paper_id,
                version_number: versions.len() as i32 + 1,
                outline,
                content,
                note,
                created_at: Utc::now(),
            };
            versions.push(version.clone());
            Ok(version)
        }
    }

    fn paper(status: PaperStatus, outline: Option<&str>) -> Paper {
        let now = Utc::now();
        Paper {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "深度学习综述".to_string(),
            paper_type: PaperType::JournalPaper.as_str().to_string(),
            status: status.as_str().to_string(),
            outline: outline.map(String::from),
            content: None,
            error_message: None,
            docx_url: None,
            pdf_url: None,
            latex_url: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_failed_outline_marks_paper_failed() {
        let store = MemoryStore::new(paper(PaperStatus::Generating, None));
        let llm = MockLlm::failing();

        let result = generate_outline(&store, &llm, store.paper()).await;
        assert!(result.is_err());

        let stored = store.paper();
        assert_eq!(stored.paper_status(), PaperStatus::Failed);
        assert!(stored.error_message.is_some());
    }

    #[tokio::test]
    async fn test_outline_success_completes_paper() {
        let store = MemoryStore::new(paper(PaperStatus::Generating, None));
        let llm = MockLlm::with_responses(vec!["# 引言\n## 背景"]);

        let updated = generate_outline(&store, &llm, store.paper()).await.unwrap();
        assert_eq!(updated.paper_status(), PaperStatus::Completed);
        assert_eq!(store.paper().outline.as_deref(), Some("# 引言\n## 背景"));
    }

    #[tokio::test]
    async fn test_content_requires_outline() {
        let store = MemoryStore::new(paper(PaperStatus::Completed, None));
        let llm = MockLlm::new();

        let result = generate_content(&store, &llm, store.paper()).await;
        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_content_success_snapshots_version() {
        let store = MemoryStore::new(paper(PaperStatus::Completed, Some("# 引言")));
        let llm = MockLlm::with_responses(vec!["正文内容"]);

        let updated = generate_content(&store, &llm, store.paper()).await.unwrap();
        assert_eq!(updated.paper_status(), PaperStatus::Completed);
        assert_eq!(store.paper().content.as_deref(), Some("正文内容"));
        assert_eq!(store.version_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_content_records_error_message() {
        let store = MemoryStore::new(paper(PaperStatus::Completed, Some("# 引言")));
        let llm = MockLlm::failing();

        let result = generate_content(&store, &llm, store.paper()).await;
        assert!(result.is_err());

        let stored = store.paper();
        assert_eq!(stored.paper_status(), PaperStatus::Failed);
        assert_eq!(stored.error_message.as_deref(), Some("LLM provider error: mock failure"));
        assert_eq!(store.version_count(), 0);
    }
}
