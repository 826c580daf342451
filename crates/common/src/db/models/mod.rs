//! SeaORM entity models
//!
//! Database entities for the PaperDraft platform

mod knowledge_document;
mod paper;
mod paper_version;
mod polish_history;
mod quality_check;
mod reference;
mod user;

pub use paper::{
    ActiveModel as PaperActiveModel, Column as PaperColumn, Entity as PaperEntity, Model as Paper,
    PaperStatus, PaperType,
};

pub use paper_version::{
    ActiveModel as PaperVersionActiveModel, Column as PaperVersionColumn,
    Entity as PaperVersionEntity, Model as PaperVersion,
};

pub use reference::{
    ActiveModel as ReferenceActiveModel, Column as ReferenceColumn, Entity as ReferenceEntity,
    Model as Reference,
};

pub use quality_check::{
    ActiveModel as QualityCheckActiveModel, Column as QualityCheckColumn,
    Entity as QualityCheckEntity, Model as QualityCheck,
};

pub use polish_history::{
    ActiveModel as PolishHistoryActiveModel, Column as PolishHistoryColumn,
    Entity as PolishHistoryEntity, Model as PolishHistory,
};

pub use knowledge_document::{
    ActiveModel as KnowledgeDocumentActiveModel, Column as KnowledgeDocumentColumn,
    DocumentStatus, Entity as KnowledgeDocumentEntity, Model as KnowledgeDocument,
};

pub use user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User,
};
