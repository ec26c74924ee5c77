//! Append-only audit log service: every security-sensitive action performed
//! across the system lands here, queryable only by administrators.

pub mod client;
pub mod dto;
pub mod routes;
pub mod service;

pub use client::AuditClient;
pub use routes::{router, AuditState, ALLOWED_READERS, ALLOWED_WRITERS};
