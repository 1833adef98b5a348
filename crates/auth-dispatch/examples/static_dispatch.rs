//! Dispatch demo against scripted backends
//!
//! Shows the any-accept decision rule without needing real RADIUS servers:
//! one slow accepter, one hung backend, one fast rejecter.
//!
//! Run with: cargo run --example static_dispatch

use auth_dispatch::{Backend, BackendConfig, Dispatcher, StaticTransport};
use std::sync::Arc;
use std::time::Duration;

fn backend(name: &str, port: u16) -> Arc<Backend> {
    Arc::new(
        Backend::new(BackendConfig {
            host: "127.0.0.1".to_string(),
            port,
            secret: "testing123".to_string(),
            name: Some(name.to_string()),
            enabled: true,
        })
        .expect("valid backend config"),
    )
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let transport = StaticTransport::new()
        .accept_after("primary", Duration::from_millis(400))
        .hang("unreachable")
        .reject_after("legacy", Duration::from_millis(50));

    let backends = [
        backend("primary", 1812),
        backend("unreachable", 1813),
        backend("legacy", 1814),
    ];

    let dispatcher = Dispatcher::new(Arc::new(transport));
    let report = dispatcher
        .dispatch("alice", "123456", &backends, Duration::from_secs(1))
        .await;

    println!("decision: {:?}", report.decision);
    for r in &report.reports {
        println!(
            "  {} -> {:?} after {}ms",
            r.backend,
            r.outcome,
            r.elapsed.as_millis()
        );
    }
}
