//! Parallel Authentication Dispatcher
//!
//! Broadcasts one credential pair to N upstream RADIUS backends and accepts
//! on the first positive answer ("any-accept"), tolerating slow, broken, or
//! unreachable backends. Also hosts the enrolled-token registry that wires
//! the `otp-engine` crate to configuration, plus JSON config and JSON-lines
//! audit logging.
//!
//! # Example
//!
//! ```rust,no_run
//! use auth_dispatch::{Backend, BackendConfig, Decision, Dispatcher, RadiusTransport};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = Arc::new(
//!         Backend::new(BackendConfig {
//!             host: "10.0.0.5".to_string(),
//!             port: 1812,
//!             secret: "testing123".to_string(),
//!             name: Some("privacyidea".to_string()),
//!             enabled: true,
//!         })
//!         .unwrap(),
//!     );
//!
//!     let dispatcher = Dispatcher::new(Arc::new(RadiusTransport::default()));
//!     let report = dispatcher
//!         .dispatch("alice", "secret-otp", &[backend], Duration::from_secs(5))
//!         .await;
//!
//!     match report.decision {
//!         Decision::Accept => println!("accepted"),
//!         Decision::Reject => println!("rejected"),
//!         Decision::Fail => println!("no backend could answer"),
//!     }
//! }
//! ```

pub mod audit;
pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod radius;
pub mod tokens;
pub mod transport;

pub use audit::{AuditEntry, AuditEventType, AuditLogger};
pub use backend::{Backend, BackendConfig, BackendStats, DEFAULT_AUTH_PORT};
pub use config::{Config, TokenKind, TokenUser};
pub use dispatcher::{BackendOutcome, BackendReport, Decision, DispatchReport, Dispatcher};
pub use error::{ConfigError, TransportError};
pub use radius::RadiusTransport;
pub use tokens::{TokenError, TokenRegistry};
pub use transport::{AuthTransport, StaticTransport};
