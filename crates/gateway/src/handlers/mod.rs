//! API handlers module

pub mod admin;
pub mod auth;
pub mod conferences;
pub mod expansion;
pub mod health;
pub mod history;
pub mod model;
pub mod search;
