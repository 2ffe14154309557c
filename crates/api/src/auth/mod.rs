//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token validation (and generation, used by tests
//!   and tooling; tokens are issued outside this service).

pub mod jwt;
