//! Paper version entity
//!
//! Immutable snapshots of a paper's outline/content, created on each
//! edit save. Version numbers are monotonically increasing per paper;
//! the repository assigns them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "paper_versions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub paper_id: Uuid,

    pub version_number: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub outline: Option<String>,

    #[sea_orm(column_type = "custom(\"LONGTEXT\")", nullable)]
    pub content: Option<String>,

    /// Optional save note ("restored from v3", user-provided, ...)
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,

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
