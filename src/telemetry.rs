//! Error reporting sinks.
//!
//! Every failure the synchronization store catches is mirrored to a sink for
//! diagnostic visibility. Reporting is fire-and-forget: a sink's own failure
//! is logged and swallowed, it never reaches store state.

use serde::Serialize;
use std::sync::Arc;

/// One reported failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    /// Which operation failed, e.g. `fetch_bugs`.
    pub operation: String,
    pub message: String,
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

impl ErrorEvent {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
            captured_at: chrono::Utc::now(),
        }
    }
}

pub trait ErrorSink: Send + Sync {
    fn capture(&self, event: ErrorEvent);
}

/// Reports through the `log` facade. Always available.
pub struct LogSink;

impl ErrorSink for LogSink {
    fn capture(&self, event: ErrorEvent) {
        log::error!("[telemetry] {}: {}", event.operation, event.message);
    }
}

/// POSTs each event as JSON to a collector endpoint.
///
/// The request runs on its own thread so a slow or dead collector never
/// stalls the UI.
pub struct HttpSink {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl ErrorSink for HttpSink {
    fn capture(&self, event: ErrorEvent) {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        std::thread::spawn(move || {
            if let Err(e) = agent.post(&endpoint).send_json(&event) {
                log::warn!("Failed to deliver telemetry event: {}", e);
            }
        });
    }
}

/// Sink chosen from configuration: HTTP when an endpoint is configured,
/// log-only otherwise.
pub fn from_endpoint(endpoint: Option<&str>) -> Arc<dyn ErrorSink> {
    match endpoint {
        Some(url) => {
            log::info!("Telemetry events go to {}", url);
            Arc::new(HttpSink::new(url))
        }
        None => Arc::new(LogSink),
    }
}
