pub mod inference;
pub mod models;
pub mod query;
pub mod user;
