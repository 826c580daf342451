//! Quality check entity
//!
//! Stores the LLM-produced score breakdown and issue/suggestion lists
//! for a paper. One row per check run; readers fetch the latest.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quality_checks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub paper_id: Uuid,

    /// Scores on a 0-100 scale
    pub overall_score: i32,
    pub structure_score: i32,
    pub coherence_score: i32,
    pub citation_score: i32,
    pub language_score: i32,

    /// Issue descriptions as a JSON array of strings
    #[sea_orm(column_type = "Json")]
    pub issues: Json,

    /// Improvement suggestions as a JSON array of strings
    #[sea_orm(column_type = "Json")]
    pub suggestions: Json,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::paper::Entity",
        from = "Column::PaperId",
        to = "super::paper::Column::Id"
    )]
    Paper,
}

impl Related<super::paper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Paper.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
