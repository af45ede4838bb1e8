//! Wire types for the bug tracker REST API

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A tracked bug as returned by the server.
///
/// Identity is the server-assigned `id`; the server may encode it as a JSON
/// number or a string, both are accepted and kept as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bug {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    pub status: BugStatus,
    pub priority: Priority,
}

/// Payload for create and update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugDraft {
    pub title: String,
    pub status: BugStatus,
    pub priority: Priority,
}

impl Default for BugDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            status: BugStatus::Open,
            priority: Priority::Medium,
        }
    }
}

/// Bug workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BugStatus {
    Open,
    InProgress,
    Closed,
}

impl BugStatus {
    pub const ALL: [BugStatus; 3] = [BugStatus::Open, BugStatus::InProgress, BugStatus::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Closed => "closed",
        }
    }

    /// Human-readable form for UI labels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BugStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in-progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            other => Err(format!(
                "unknown status '{other}' (expected open, in-progress or closed)"
            )),
        }
    }
}

/// Bug severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "unknown priority '{other}' (expected low, medium or high)"
            )),
        }
    }
}

/// Optional status/priority constraints for the next list request.
///
/// The filter only parameterizes the query string; it is never applied
/// client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BugFilter {
    pub status: Option<BugStatus>,
    pub priority: Option<Priority>,
}

impl BugFilter {
    /// Query string for the list endpoint, without the leading `?`.
    /// Empty when no constraint is set.
    pub fn to_query(&self) -> String {
        let mut parts = Vec::new();
        if let Some(status) = self.status {
            parts.push(format!("status={}", status.as_str()));
        }
        if let Some(priority) = self.priority {
            parts.push(format!("priority={}", priority.as_str()));
        }
        parts.join("&")
    }
}

/// Success body of `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Failure body of any endpoint. The bug endpoints use `error`, the auth
/// endpoints use `msg`; `message` is accepted as a further fallback.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub msg: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.msg).or(self.message)
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}
