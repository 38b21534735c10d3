//! Password reset request entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reset request status
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetStatus {
    Pending,
    Completed,
}

impl From<String> for ResetStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Completed" => ResetStatus::Completed,
            _ => ResetStatus::Pending,
        }
    }
}

impl From<ResetStatus> for String {
    fn from(status: ResetStatus) -> Self {
        match status {
            ResetStatus::Pending => "Pending".to_string(),
            ResetStatus::Completed => "Completed".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "password_reset_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// Username at the time of the request
    #[sea_orm(column_type = "Text")]
    pub username: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub timestamp: DateTimeUtc,
}

impl Model {
    /// Get the request status as an enum
    pub fn reset_status(&self) -> ResetStatus {
        ResetStatus::from(self.status.clone())
    }

    /// Check if an administrator still has to act on this request
    pub fn is_pending(&self) -> bool {
        self.reset_status() == ResetStatus::Pending
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
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
