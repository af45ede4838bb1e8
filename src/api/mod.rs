//! Remote bug service: wire types and HTTP client.

mod client;
mod models;

pub use client::{ApiError, BugApi, HttpBugApi};
pub use models::{Bug, BugDraft, BugFilter, BugStatus, ErrorBody, Priority, TokenResponse};
