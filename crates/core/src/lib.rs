//! Core business logic for agora.
//!
//! Services sit between the HTTP layer and the repositories. Every mutation
//! that touches a relation on both sides goes through
//! [`services::integrity::IntegrityService`], which runs it as one
//! database transaction.

pub mod services;

pub use services::*;
