//! End-to-end dispatch scenarios with scripted transports
//!
//! Mixed outcome sets, shared-deadline behavior, outcome isolation, and the
//! per-backend audit trail.

use auth_dispatch::{
    AuditLogger, Backend, BackendConfig, BackendOutcome, Decision, Dispatcher, StaticTransport,
};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

fn backend(name: &str, port: u16) -> Arc<Backend> {
    Arc::new(
        Backend::new(BackendConfig {
            host: "127.0.0.1".to_string(),
            port,
            secret: "testing123".to_string(),
            name: Some(name.to_string()),
            enabled: true,
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn slow_accept_beats_fast_reject_and_timeout() {
    // Backend A accepts slowly, B never answers, C rejects quickly;
    // any-accept means the overall decision is Accept and every backend
    // still gets its outcome recorded.
    let transport = StaticTransport::new()
        .accept_after("a", Duration::from_millis(100))
        .hang("b")
        .reject_after("c", Duration::from_millis(20));

    let backends = [backend("a", 1812), backend("b", 1813), backend("c", 1814)];
    let dispatcher = Dispatcher::new(Arc::new(transport));

    let report = dispatcher
        .dispatch("alice", "otp123456", &backends, Duration::from_millis(250))
        .await;

    assert_eq!(report.decision, Decision::Accept);
    assert_eq!(report.reports.len(), 3);

    let outcome_of = |name: &str| {
        report
            .reports
            .iter()
            .find(|r| r.backend == name)
            .map(|r| r.outcome.clone())
            .unwrap()
    };
    assert_eq!(outcome_of("a"), BackendOutcome::Accepted);
    assert_eq!(outcome_of("b"), BackendOutcome::TimedOut);
    assert_eq!(outcome_of("c"), BackendOutcome::Rejected);

    // Stats reflect the outcomes
    assert_eq!(backends[0].stats().accepts(), 1);
    assert_eq!(backends[1].stats().timeouts(), 1);
    assert_eq!(backends[2].stats().rejects(), 1);
}

#[tokio::test]
async fn all_rejects_is_reject() {
    let transport = StaticTransport::new()
        .reject_after("a", Duration::from_millis(5))
        .reject_after("b", Duration::from_millis(10));

    let backends = [backend("a", 1812), backend("b", 1813)];
    let dispatcher = Dispatcher::new(Arc::new(transport));

    let report = dispatcher
        .dispatch("alice", "wrong", &backends, Duration::from_millis(250))
        .await;

    assert_eq!(report.decision, Decision::Reject);
}

#[tokio::test]
async fn all_timeouts_is_fail() {
    let transport = StaticTransport::new().hang("a").hang("b");

    let backends = [backend("a", 1812), backend("b", 1813)];
    let dispatcher = Dispatcher::new(Arc::new(transport));

    let report = dispatcher
        .dispatch("alice", "otp123456", &backends, Duration::from_millis(50))
        .await;

    assert_eq!(report.decision, Decision::Fail);
    assert!(report
        .reports
        .iter()
        .all(|r| r.outcome == BackendOutcome::TimedOut));
}

#[tokio::test]
async fn empty_backend_set_is_fail() {
    let dispatcher = Dispatcher::new(Arc::new(StaticTransport::new()));
    let report = dispatcher
        .dispatch("alice", "otp123456", &[], Duration::from_secs(1))
        .await;

    assert_eq!(report.decision, Decision::Fail);
    assert!(report.reports.is_empty());
}

#[tokio::test]
async fn backend_error_is_isolated() {
    // One backend blowing up must not take the others down with it
    let transport = StaticTransport::new()
        .error_after("a", "connection refused", Duration::from_millis(5))
        .accept_after("b", Duration::from_millis(20));

    let backends = [backend("a", 1812), backend("b", 1813)];
    let dispatcher = Dispatcher::new(Arc::new(transport));

    let report = dispatcher
        .dispatch("alice", "otp123456", &backends, Duration::from_millis(250))
        .await;

    assert_eq!(report.decision, Decision::Accept);
    assert!(matches!(
        report.reports.iter().find(|r| r.backend == "a").unwrap().outcome,
        BackendOutcome::Errored(_)
    ));
}

#[tokio::test]
async fn errors_without_rejects_are_fail_not_reject() {
    let transport = StaticTransport::new()
        .error_after("a", "connection refused", Duration::from_millis(5))
        .hang("b");

    let backends = [backend("a", 1812), backend("b", 1813)];
    let dispatcher = Dispatcher::new(Arc::new(transport));

    let report = dispatcher
        .dispatch("alice", "otp123456", &backends, Duration::from_millis(50))
        .await;

    assert_eq!(report.decision, Decision::Fail);
}

#[tokio::test]
async fn audit_trail_has_one_line_per_outcome_plus_decision() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_str().unwrap().to_string();
    let audit = Arc::new(AuditLogger::new(Some(path.clone())).unwrap());

    let transport = StaticTransport::new()
        .accept_after("a", Duration::from_millis(5))
        .reject_after("b", Duration::from_millis(5));

    let backends = [backend("a", 1812), backend("b", 1813)];
    let dispatcher = Dispatcher::new(Arc::new(transport)).with_audit(audit);

    let report = dispatcher
        .dispatch("alice", "otp123456", &backends, Duration::from_millis(250))
        .await;
    assert_eq!(report.decision, Decision::Accept);

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3); // two backend outcomes + one decision

    assert_eq!(
        lines
            .iter()
            .filter(|l| l.contains("backend_outcome"))
            .count(),
        2
    );
    let decision_line = lines
        .iter()
        .find(|l| l.contains("dispatch_decision"))
        .unwrap();
    assert!(decision_line.contains("accept"));
    assert!(decision_line.contains("alice"));
}
