//! Paper entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Paper type enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperType {
    GraduationThesis,
    JournalPaper,
    CoursePaper,
    ProposalReport,
}

impl PaperType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "graduation_thesis" => Some(PaperType::GraduationThesis),
            "journal_paper" => Some(PaperType::JournalPaper),
            "course_paper" => Some(PaperType::CoursePaper),
            "proposal_report" => Some(PaperType::ProposalReport),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaperType::GraduationThesis => "graduation_thesis",
            PaperType::JournalPaper => "journal_paper",
            PaperType::CoursePaper => "course_paper",
            PaperType::ProposalReport => "proposal_report",
        }
    }
}

/// Paper status enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperStatus {
    Generating,
    Completed,
    Failed,
}

impl PaperStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "generating" => Some(PaperStatus::Generating),
            "completed" => Some(PaperStatus::Completed),
            "failed" => Some(PaperStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaperStatus::Generating => "generating",
            PaperStatus::Completed => "completed",
            PaperStatus::Failed => "failed",
        }
    }

    /// Status only advances generating -> completed or generating -> failed.
    pub fn can_transition_to(&self, next: PaperStatus) -> bool {
        matches!(
            (self, next),
            (PaperStatus::Generating, PaperStatus::Completed)
                | (PaperStatus::Generating, PaperStatus::Failed)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "papers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    pub paper_type: String,

    pub status: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub outline: Option<String>,

    #[sea_orm(column_type = "custom(\"LONGTEXT\")", nullable)]
    pub content: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub docx_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub pdf_url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub latex_url: Option<String>,

    /// Soft delete marker; set rows live in the recycle bin
    pub deleted_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn paper_status(&self) -> PaperStatus {
        PaperStatus::parse(&self.status).unwrap_or(PaperStatus::Failed)
    }

    /// Unknown stored values read as a journal paper, which gets no
    /// structure-specific handling.
    pub fn paper_type(&self) -> PaperType {
        PaperType::parse(&self.paper_type).unwrap_or(PaperType::JournalPaper)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(has_many = "super::paper_version::Entity")]
    Versions,

    #[sea_orm(has_many = "super::reference::Entity")]
    References,

    #[sea_orm(has_many = "super::quality_check::Entity")]
    QualityChecks,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::paper_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Versions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(PaperStatus::Generating.can_transition_to(PaperStatus::Completed));
        assert!(PaperStatus::Generating.can_transition_to(PaperStatus::Failed));
        assert!(!PaperStatus::Completed.can_transition_to(PaperStatus::Generating));
        assert!(!PaperStatus::Failed.can_transition_to(PaperStatus::Completed));
        assert!(!PaperStatus::Completed.can_transition_to(PaperStatus::Failed));
    }

    #[test]
    fn test_type_roundtrip() {
        for t in [
            PaperType::GraduationThesis,
            PaperType::JournalPaper,
            PaperType::CoursePaper,
            PaperType::ProposalReport,
        ] {
            assert_eq!(PaperType::parse(t.as_str()), Some(t));
        }
        assert_eq!(PaperType::parse("poem"), None);
    }
}
