//! Transport seam between the dispatcher and the wire
//!
//! The dispatcher only cares about "send a credential pair, get back
//! accept / reject / error"; everything wire-shaped lives behind
//! [`AuthTransport`]. The production implementation is the RADIUS client in
//! [`crate::radius`]; tests script outcomes with [`StaticTransport`].

use crate::backend::Backend;
use crate::error::TransportError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Asynchronous credential-pair authentication against one backend
///
/// `Ok(true)` is an explicit accept, `Ok(false)` an explicit reject, and
/// `Err` covers unreachable backends and malformed replies. Timeouts are the
/// dispatcher's concern, not the transport's.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    async fn authenticate(
        &self,
        backend: &Backend,
        username: &str,
        password: &str,
    ) -> Result<bool, TransportError>;
}

/// Scripted outcome for one backend of a [`StaticTransport`]
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Reply with accept/reject after a delay
    Reply { accept: bool, delay: Duration },
    /// Fail with a protocol error after a delay
    Error { message: String, delay: Duration },
    /// Never reply (forces the dispatcher's deadline)
    Hang,
}

/// In-memory transport with scripted per-backend outcomes
///
/// Backends are matched by display name; an unscripted backend errors
/// immediately.
#[derive(Debug, Default)]
pub struct StaticTransport {
    replies: HashMap<String, ScriptedReply>,
}

impl StaticTransport {
    pub fn new() -> Self {
        StaticTransport {
            replies: HashMap::new(),
        }
    }

    /// Script an accept after a delay
    pub fn accept_after(mut self, backend: impl Into<String>, delay: Duration) -> Self {
        self.replies.insert(
            backend.into(),
            ScriptedReply::Reply {
                accept: true,
                delay,
            },
        );
        self
    }

    /// Script a reject after a delay
    pub fn reject_after(mut self, backend: impl Into<String>, delay: Duration) -> Self {
        self.replies.insert(
            backend.into(),
            ScriptedReply::Reply {
                accept: false,
                delay,
            },
        );
        self
    }

    /// Script a transport error after a delay
    pub fn error_after(
        mut self,
        backend: impl Into<String>,
        message: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.replies.insert(
            backend.into(),
            ScriptedReply::Error {
                message: message.into(),
                delay,
            },
        );
        self
    }

    /// Script a backend that never answers
    pub fn hang(mut self, backend: impl Into<String>) -> Self {
        self.replies.insert(backend.into(), ScriptedReply::Hang);
        self
    }
}

#[async_trait]
impl AuthTransport for StaticTransport {
    async fn authenticate(
        &self,
        backend: &Backend,
        _username: &str,
        _password: &str,
    ) -> Result<bool, TransportError> {
        match self.replies.get(&backend.name) {
            Some(ScriptedReply::Reply { accept, delay }) => {
                tokio::time::sleep(*delay).await;
                Ok(*accept)
            }
            Some(ScriptedReply::Error { message, delay }) => {
                tokio::time::sleep(*delay).await;
                Err(TransportError::Protocol(message.clone()))
            }
            Some(ScriptedReply::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(TransportError::Protocol(format!(
                "No scripted reply for backend '{}'",
                backend.name
            ))),
        }
    }
}
