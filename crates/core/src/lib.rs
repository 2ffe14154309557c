//! Domain logic for the Vocalis audio inference service.
//!
//! Holds the capability registry and resolver, the job lifecycle, the
//! per-capability result schemas and the capability handlers themselves.
//! Persistence and model inference are reached only through the traits in
//! [`store`] and [`inference`], so nothing here touches a database or the
//! network directly.

pub mod audio;
pub mod capability;
pub mod error;
pub mod inference;
pub mod jobs;
pub mod models;
pub mod query;
pub mod registry;
pub mod resolver;
pub mod results;
pub mod store;
pub mod types;
