//! Reference entity
//!
//! Citation metadata attached to a paper. Formatting into citation
//! strings happens in the docgen crate; this entity just stores fields.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "paper_references")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub paper_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    /// Author names as a JSON array, in citation order
    #[sea_orm(column_type = "Json")]
    pub authors: Json,

    pub year: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub journal: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub volume: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub issue: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub pages: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub doi: Option<String>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Author list decoded from the JSON column.
    pub fn author_list(&self) -> Vec<String> {
        serde_json::from_value(self.authors.clone()).unwrap_or_default()
    }
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
