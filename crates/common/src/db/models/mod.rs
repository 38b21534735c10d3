//! SeaORM entity models
//!
//! Account store entities for PaperCompass

mod user;
mod search_history;
mod password_reset;

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};

pub use search_history::{
    Entity as SearchHistoryEntity,
    Model as SearchHistory,
    ActiveModel as SearchHistoryActiveModel,
    Column as SearchHistoryColumn,
};

pub use password_reset::{
    Entity as PasswordResetEntity,
    Model as PasswordResetRequest,
    ActiveModel as PasswordResetActiveModel,
    Column as PasswordResetColumn,
    ResetStatus,
};
