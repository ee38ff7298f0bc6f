use std::fmt;
use std::future::Future;

use amber_route::{SignalId, SignalStatus};
use serde::{Deserialize, Serialize};

/// Identifier of a preemption request, e.g. `request-0001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Acknowledgement of a preemption request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "request_id", rename_all = "snake_case")]
pub enum RequestAck {
    /// A new pending request was queued for the police.
    Created(RequestId),
    /// A request for this signal was already pending; nothing new queued.
    AlreadyPending(RequestId),
}

impl RequestAck {
    pub fn request_id(&self) -> &RequestId {
        match self {
            RequestAck::Created(id) | RequestAck::AlreadyPending(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthorityError {
    #[error("{0} not found")]
    SignalNotFound(SignalId),

    #[error("signal request not found: {0}")]
    RequestNotFound(RequestId),

    #[error("signal authority unreachable: {0}")]
    Unreachable(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// The party that owns signal state and grants preemption.
///
/// Both calls may fail transiently; callers are expected to keep polling
/// rather than treat an error as a verdict.
pub trait SignalAuthority: Send + Sync {
    /// Ask for the signal to be turned green. Idempotent while a request for
    /// the same signal is pending.
    fn request_preemption(
        &self,
        signal: SignalId,
    ) -> impl Future<Output = Result<RequestAck, AuthorityError>> + Send;

    /// Current status of the signal as the authority sees it.
    fn signal_status(
        &self,
        signal: SignalId,
    ) -> impl Future<Output = Result<SignalStatus, AuthorityError>> + Send;
}
