//! Bug Studio - desktop client for a bug tracker REST service
//!
//! Provides the API client, the bug synchronization store, session and theme
//! persistence, and error telemetry.

pub mod api;
pub mod config;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod theme;

// Re-export commonly used types
pub use api::{ApiError, Bug, BugApi, BugDraft, BugFilter, BugStatus, HttpBugApi, Priority};
pub use config::AppConfig;
pub use session::Session;
pub use store::BugStore;
pub use theme::{Theme, ThemeKind};
