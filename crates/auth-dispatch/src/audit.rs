//! Audit logging for dispatch and OTP validation events
//!
//! Structured JSON-lines logging for compliance and forensics. Every backend
//! outcome, every dispatch decision, and every OTP validation verdict gets
//! one entry. Audit failures are logged and swallowed; they never affect the
//! authentication path.

use crate::dispatcher::{BackendOutcome, Decision};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::error;

/// Audit event type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// One backend's outcome within a dispatch
    BackendOutcome,
    /// Final decision of a dispatch
    DispatchDecision,
    /// An OTP validation accepted
    OtpAccepted,
    /// An OTP validation rejected
    OtpRejected,
}

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Timestamp (Unix epoch seconds)
    pub timestamp: u64,
    /// ISO 8601 formatted timestamp
    pub timestamp_iso: String,
    /// Event type
    pub event_type: AuditEventType,
    /// Username (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Backend name (for per-backend events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Per-backend outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<BackendOutcome>,
    /// Dispatch decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    /// Elapsed milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AuditEntry {
    /// Create a new audit entry stamped with the current time
    pub fn new(event_type: AuditEventType) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let timestamp_iso = chrono::DateTime::from_timestamp(timestamp as i64, 0)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        AuditEntry {
            timestamp,
            timestamp_iso,
            event_type,
            username: None,
            backend: None,
            outcome: None,
            decision: None,
            elapsed_ms: None,
            details: None,
        }
    }

    /// Set username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set backend name
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Set per-backend outcome
    pub fn with_outcome(mut self, outcome: BackendOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Set dispatch decision
    pub fn with_decision(mut self, decision: Decision) -> Self {
        self.decision = Some(decision);
        self
    }

    /// Set elapsed time
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(elapsed.as_millis() as u64);
        self
    }

    /// Set details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Audit logger
pub struct AuditLogger {
    /// File path for audit log
    file_path: Option<String>,
    /// File handle (wrapped in Arc<Mutex> for thread safety)
    file: Option<Arc<Mutex<std::fs::File>>>,
}

impl AuditLogger {
    /// Create a new audit logger; `None` disables logging
    pub fn new(file_path: Option<String>) -> std::io::Result<Self> {
        let file = if let Some(ref path) = file_path {
            let f = OpenOptions::new().create(true).append(true).open(path)?;
            Some(Arc::new(Mutex::new(f)))
        } else {
            None
        };

        Ok(AuditLogger { file_path, file })
    }

    /// Log an audit entry
    pub async fn log(&self, entry: AuditEntry) {
        if let Some(ref file) = self.file {
            match serde_json::to_string(&entry) {
                Ok(json) => {
                    let mut f = file.lock().await;
                    if let Err(e) = writeln!(f, "{}", json) {
                        error!("Failed to write audit log: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize audit entry: {}", e);
                }
            }
        }
    }

    /// Check if audit logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    /// Get the audit log file path
    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_audit_entry_creation() {
        let entry = AuditEntry::new(AuditEventType::BackendOutcome)
            .with_username("testuser")
            .with_backend("primary")
            .with_outcome(BackendOutcome::Accepted)
            .with_elapsed(Duration::from_millis(250));

        assert_eq!(entry.username, Some("testuser".to_string()));
        assert_eq!(entry.backend, Some("primary".to_string()));
        assert_eq!(entry.outcome, Some(BackendOutcome::Accepted));
        assert_eq!(entry.elapsed_ms, Some(250));
    }

    #[test]
    fn test_audit_entry_serialization() {
        let entry = AuditEntry::new(AuditEventType::DispatchDecision)
            .with_username("alice")
            .with_decision(Decision::Reject)
            .with_details("2 backend outcomes");

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("dispatch_decision"));
        assert!(json.contains("alice"));
        assert!(json.contains("reject"));
        // Unset optional fields stay out of the JSON
        assert!(!json.contains("backend\""));
    }

    #[tokio::test]
    async fn test_audit_logger_writes_json_lines() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let logger = AuditLogger::new(Some(path.clone())).unwrap();
        assert!(logger.is_enabled());

        logger
            .log(
                AuditEntry::new(AuditEventType::BackendOutcome)
                    .with_username("testuser")
                    .with_backend("primary")
                    .with_outcome(BackendOutcome::TimedOut),
            )
            .await;
        logger
            .log(
                AuditEntry::new(AuditEventType::DispatchDecision)
                    .with_username("testuser")
                    .with_decision(Decision::Fail),
            )
            .await;

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("timed_out"));
        assert!(contents.contains("fail"));
    }

    #[test]
    fn test_audit_logger_disabled() {
        let logger = AuditLogger::new(None).unwrap();
        assert!(!logger.is_enabled());
        assert!(logger.file_path().is_none());
    }
}
