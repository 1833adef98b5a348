//! Parallel any-accept dispatch
//!
//! One authentication attempt is broadcast to every configured backend at
//! once. All calls share a single deadline; outcomes are collected over a
//! channel and the decision is made only after every backend has either
//! answered, errored, or run out the clock:
//!
//! - any backend accepted        -> `Accept`
//! - else any explicitly rejected -> `Reject`
//! - else (all timed out/errored, or no backends) -> `Fail`
//!
//! `Fail` is deliberately distinct from `Reject`: "wrong credentials" and
//! "nobody could answer" need different upstream handling. Retries, if any,
//! belong to the caller; a dispatch call never retries.

use crate::audit::{AuditEntry, AuditEventType, AuditLogger};
use crate::backend::Backend;
use crate::transport::AuthTransport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Per-backend outcome of one dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendOutcome {
    /// Backend returned Access-Accept
    Accepted,
    /// Backend returned Access-Reject
    Rejected,
    /// No reply before the shared deadline
    TimedOut,
    /// Connection failure or malformed reply
    Errored(String),
}

/// Final decision for one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
    Fail,
}

/// One backend's contribution to a [`DispatchReport`]
#[derive(Debug, Clone)]
pub struct BackendReport {
    /// Backend display name
    pub backend: String,
    /// What the backend did
    pub outcome: BackendOutcome,
    /// Time from fan-out to this outcome
    pub elapsed: Duration,
}

/// Complete result of one dispatch call
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub decision: Decision,
    pub reports: Vec<BackendReport>,
}

/// Parallel authentication dispatcher
pub struct Dispatcher {
    transport: Arc<dyn AuthTransport>,
    audit: Option<Arc<AuditLogger>>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn AuthTransport>) -> Self {
        Dispatcher {
            transport,
            audit: None,
        }
    }

    /// Attach an audit logger
    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Broadcast one credential pair to every backend and decide
    pub async fn dispatch(
        &self,
        username: &str,
        password: &str,
        backends: &[Arc<Backend>],
        timeout: Duration,
    ) -> DispatchReport {
        if backends.is_empty() {
            warn!(username = username, "Dispatch with no backends configured");
            self.audit_decision(username, Decision::Fail, Duration::ZERO, 0)
                .await;
            return DispatchReport {
                decision: Decision::Fail,
                reports: Vec::new(),
            };
        }

        let started = Instant::now();
        let (tx, mut rx) = mpsc::channel::<BackendReport>(backends.len());

        for backend in backends {
            let backend = Arc::clone(backend);
            let transport = Arc::clone(&self.transport);
            let tx = tx.clone();
            let username = username.to_string();
            let password = password.to_string();

            tokio::spawn(async move {
                backend.stats().record_request();
                let call_started = Instant::now();

                let outcome = match tokio::time::timeout(
                    timeout,
                    transport.authenticate(&backend, &username, &password),
                )
                .await
                {
                    Ok(Ok(true)) => {
                        backend.stats().record_accept();
                        BackendOutcome::Accepted
                    }
                    Ok(Ok(false)) => {
                        backend.stats().record_reject();
                        BackendOutcome::Rejected
                    }
                    Ok(Err(e)) => {
                        backend.stats().record_error();
                        BackendOutcome::Errored(e.to_string())
                    }
                    Err(_) => {
                        backend.stats().record_timeout();
                        BackendOutcome::TimedOut
                    }
                };

                // Receiver only goes away if the dispatch was dropped
                let _ = tx
                    .send(BackendReport {
                        backend: backend.name.clone(),
                        outcome,
                        elapsed: call_started.elapsed(),
                    })
                    .await;
            });
        }
        drop(tx);

        // Every task reports exactly once (timeouts included), so this
        // drains until all senders are gone.
        let mut reports = Vec::with_capacity(backends.len());
        while let Some(report) = rx.recv().await {
            match &report.outcome {
                BackendOutcome::Accepted => {
                    info!(
                        username = username,
                        backend = %report.backend,
                        elapsed_ms = report.elapsed.as_millis() as u64,
                        "Backend accepted"
                    );
                }
                BackendOutcome::Rejected => {
                    info!(
                        username = username,
                        backend = %report.backend,
                        elapsed_ms = report.elapsed.as_millis() as u64,
                        "Backend rejected"
                    );
                }
                BackendOutcome::TimedOut => {
                    warn!(
                        username = username,
                        backend = %report.backend,
                        timeout_ms = timeout.as_millis() as u64,
                        "Backend timed out"
                    );
                }
                BackendOutcome::Errored(message) => {
                    warn!(
                        username = username,
                        backend = %report.backend,
                        error = %message,
                        "Backend errored"
                    );
                }
            }

            self.audit_outcome(username, &report).await;
            reports.push(report);
        }

        let decision = decide(&reports);
        let elapsed = started.elapsed();
        debug!(
            username = username,
            decision = ?decision,
            backends = reports.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Dispatch decided"
        );

        self.audit_decision(username, decision, elapsed, reports.len())
            .await;

        DispatchReport { decision, reports }
    }

    async fn audit_outcome(&self, username: &str, report: &BackendReport) {
        if let Some(ref audit) = self.audit {
            audit
                .log(
                    AuditEntry::new(AuditEventType::BackendOutcome)
                        .with_username(username)
                        .with_backend(&report.backend)
                        .with_outcome(report.outcome.clone())
                        .with_elapsed(report.elapsed),
                )
                .await;
        }
    }

    async fn audit_decision(
        &self,
        username: &str,
        decision: Decision,
        elapsed: Duration,
        backends: usize,
    ) {
        if let Some(ref audit) = self.audit {
            audit
                .log(
                    AuditEntry::new(AuditEventType::DispatchDecision)
                        .with_username(username)
                        .with_decision(decision)
                        .with_elapsed(elapsed)
                        .with_details(format!("{} backend outcomes", backends)),
                )
                .await;
        }
    }
}

/// Apply the any-accept decision rule to a collected outcome set
fn decide(reports: &[BackendReport]) -> Decision {
    if reports
        .iter()
        .any(|r| r.outcome == BackendOutcome::Accepted)
    {
        return Decision::Accept;
    }
    if reports
        .iter()
        .any(|r| r.outcome == BackendOutcome::Rejected)
    {
        return Decision::Reject;
    }
    Decision::Fail
}
