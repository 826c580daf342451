//! User entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// External identity provider subject
    #[sea_orm(column_type = "Text", nullable)]
    pub oauth_id: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub email: String,

    /// "user" or "admin"
    pub role: String,

    /// SHA-256 hash of the issued API key
    #[sea_orm(column_type = "Text", nullable)]
    pub api_key_hash: Option<String>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::paper::Entity")]
    Papers,

    #[sea_orm(has_many = "super::knowledge_document::Entity")]
    KnowledgeDocuments,
}

impl Related<super::paper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Papers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
