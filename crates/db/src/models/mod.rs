//! Row structs mapped with `sqlx::FromRow`.
//!
//! Each converts into its `vocalis_core` counterpart; the core never sees
//! sqlx types.

pub mod job;
pub mod ml_model;
pub mod result;
