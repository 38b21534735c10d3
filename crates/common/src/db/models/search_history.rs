//! Search history entity (append-only)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "search_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// The query exactly as the user typed it
    #[sea_orm(column_type = "Text", nullable)]
    pub keyword: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub search_mode: Option<String>,

    /// Comma-joined list of searched fields
    #[sea_orm(column_type = "Text", nullable)]
    pub fields_to_search: Option<String>,

    /// Data-source descriptor
    #[sea_orm(column_type = "Text", nullable)]
    pub data_search_mode: Option<String>,

    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
