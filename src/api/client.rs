//! HTTP client for the bug tracker REST API.
//!
//! All bug endpoints require a bearer credential; `login`/`register` are the
//! only unauthenticated calls. The [`BugApi`] trait is the seam the
//! synchronization store works against, so tests can substitute an in-memory
//! implementation.

use serde_json::json;

use super::models::{Bug, BugDraft, BugFilter, ErrorBody, TokenResponse};

/// A failure observed at the API boundary.
///
/// `Transport` covers everything below HTTP (unreachable host, timeout,
/// broken response body); `Status` is a non-success HTTP status, carrying the
/// server's structured message when one could be parsed out of the body.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned status {code}")]
    Status { code: u16, message: Option<String> },
}

impl ApiError {
    /// Message to show the user: the server-provided one verbatim when
    /// present, otherwise the caller's generic fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let message = response
                    .into_string()
                    .ok()
                    .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
                    .and_then(ErrorBody::into_message);
                Self::Status { code, message }
            }
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}

/// Remote bug service operations.
pub trait BugApi {
    fn list(&self, filter: &BugFilter, token: &str) -> Result<Vec<Bug>, ApiError>;
    fn create(&self, draft: &BugDraft, token: &str) -> Result<Bug, ApiError>;
    fn update(&self, id: &str, draft: &BugDraft, token: &str) -> Result<Bug, ApiError>;
    fn delete(&self, id: &str, token: &str) -> Result<(), ApiError>;
    fn login(&self, username: &str, password: &str) -> Result<String, ApiError>;
    fn register(&self, username: &str, password: &str) -> Result<(), ApiError>;
}

/// `ureq`-backed [`BugApi`] implementation.
pub struct HttpBugApi {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBugApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            agent: ureq::Agent::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }
}

impl BugApi for HttpBugApi {
    fn list(&self, filter: &BugFilter, token: &str) -> Result<Vec<Bug>, ApiError> {
        let mut url = format!("{}/bugs", self.base_url);
        let query = filter.to_query();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        self.agent
            .get(&url)
            .set("Authorization", &Self::bearer(token))
            .set("Content-Type", "application/json")
            .call()?
            .into_json()
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    fn create(&self, draft: &BugDraft, token: &str) -> Result<Bug, ApiError> {
        self.agent
            .post(&format!("{}/bugs", self.base_url))
            .set("Authorization", &Self::bearer(token))
            .send_json(draft)?
            .into_json()
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    fn update(&self, id: &str, draft: &BugDraft, token: &str) -> Result<Bug, ApiError> {
        self.agent
            .put(&format!("{}/bugs/{id}", self.base_url))
            .set("Authorization", &Self::bearer(token))
            .send_json(draft)?
            .into_json()
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    fn delete(&self, id: &str, token: &str) -> Result<(), ApiError> {
        // Response body is empty or ignored.
        self.agent
            .delete(&format!("{}/bugs/{id}", self.base_url))
            .set("Authorization", &Self::bearer(token))
            .set("Content-Type", "application/json")
            .call()?;
        Ok(())
    }

    fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let response: TokenResponse = self
            .agent
            .post(&format!("{}/login", self.base_url))
            .send_json(json!({ "username": username, "password": password }))?
            .into_json()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(response.access_token)
    }

    fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        self.agent
            .post(&format!("{}/register", self.base_url))
            .send_json(json!({ "username": username, "password": password }))?;
        Ok(())
    }
}
