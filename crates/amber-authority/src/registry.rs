//! In-memory signal registry and police request queue.
//!
//! Holds the signals of the active route together with every preemption
//! request raised against them. Ambulance-side calls go through
//! [`SignalAuthority`]; the police console drives `pending_requests` and
//! `accept`.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use amber_route::{Signal, SignalId, SignalStatus};
use serde::{Deserialize, Serialize};

use crate::authority::{AuthorityError, RequestAck, RequestId, SignalAuthority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
}

/// A preemption request raised by an ambulance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRequest {
    pub id: RequestId,
    pub signal_id: SignalId,
    pub status: RequestStatus,
    /// The signal as it was when the request was listed.
    pub signal: Signal,
}

#[derive(Debug, Default)]
struct Registry {
    signals: BTreeMap<SignalId, Signal>,
    /// Insertion order is creation order.
    requests: Vec<(RequestId, SignalId, RequestStatus)>,
    next_id: u64,
}

impl Registry {
    fn signal(&self, id: SignalId) -> Result<&Signal, AuthorityError> {
        self.signals.get(&id).ok_or(AuthorityError::SignalNotFound(id))
    }
}

/// Signal authority backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryAuthority {
    inner: Mutex<Registry>,
}

impl InMemoryAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signals(signals: &[Signal]) -> Self {
        let authority = Self::new();
        authority.init_signals(signals);
        authority
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Upsert signals by index. Position and status are overwritten.
    pub fn init_signals(&self, signals: &[Signal]) {
        let mut registry = self.lock();
        for signal in signals {
            registry.signals.insert(signal.index, signal.clone());
        }
    }

    /// Queue a preemption request unless one is already pending.
    pub fn request(&self, signal_id: SignalId) -> Result<RequestAck, AuthorityError> {
        let mut registry = self.lock();
        registry.signal(signal_id)?;

        let pending = registry
            .requests
            .iter()
            .find(|(_, sid, status)| *sid == signal_id && *status == RequestStatus::Pending);
        if let Some((id, _, _)) = pending {
            return Ok(RequestAck::AlreadyPending(id.clone()));
        }

        registry.next_id += 1;
        let id = RequestId(format!("request-{:04}", registry.next_id));
        registry
            .requests
            .push((id.clone(), signal_id, RequestStatus::Pending));
        Ok(RequestAck::Created(id))
    }

    pub fn status(&self, signal_id: SignalId) -> Result<SignalStatus, AuthorityError> {
        Ok(self.lock().signal(signal_id)?.status)
    }

    pub fn signal(&self, signal_id: SignalId) -> Option<Signal> {
        self.lock().signals.get(&signal_id).cloned()
    }

    /// Requests still awaiting a police decision, oldest first.
    pub fn pending_requests(&self) -> Vec<SignalRequest> {
        let registry = self.lock();
        registry
            .requests
            .iter()
            .filter(|(_, _, status)| *status == RequestStatus::Pending)
            .filter_map(|(id, signal_id, status)| {
                let signal = registry.signals.get(signal_id)?.clone();
                Some(SignalRequest {
                    id: id.clone(),
                    signal_id: *signal_id,
                    status: *status,
                    signal,
                })
            })
            .collect()
    }

    /// Accept a request and turn its signal green.
    pub fn accept(&self, request_id: &RequestId) -> Result<SignalId, AuthorityError> {
        let mut registry = self.lock();
        let entry = registry
            .requests
            .iter_mut()
            .find(|(id, _, _)| id == request_id)
            .ok_or_else(|| AuthorityError::RequestNotFound(request_id.clone()))?;
        entry.2 = RequestStatus::Accepted;
        let signal_id = entry.1;

        let signal = registry
            .signals
            .get_mut(&signal_id)
            .ok_or(AuthorityError::SignalNotFound(signal_id))?;
        signal.status = SignalStatus::Green;
        Ok(signal_id)
    }

    /// Operator override of a signal's status.
    pub fn set_status(&self, signal_id: SignalId, status: SignalStatus) -> Result<(), AuthorityError> {
        let mut registry = self.lock();
        let signal = registry
            .signals
            .get_mut(&signal_id)
            .ok_or(AuthorityError::SignalNotFound(signal_id))?;
        signal.status = status;
        Ok(())
    }

    pub fn signal_count(&self) -> usize {
        self.lock().signals.len()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }
}

impl SignalAuthority for InMemoryAuthority {
    async fn request_preemption(&self, signal: SignalId) -> Result<RequestAck, AuthorityError> {
        self.request(signal)
    }

    async fn signal_status(&self, signal: SignalId) -> Result<SignalStatus, AuthorityError> {
        self.status(signal)
    }
}

#[cfg(test)]
mod tests {
    use amber_route::Waypoint;

    use super::*;

    fn signals() -> Vec<Signal> {
        vec![
            Signal::new(SignalId(0), Waypoint::new(12.9, 77.6)),
            Signal::new(SignalId(1), Waypoint::new(12.9, 77.7)),
        ]
    }

    #[test]
    fn test_request_ids_are_sequential() {
        let authority = InMemoryAuthority::with_signals(&signals());
        let a = authority.request(SignalId(0)).unwrap();
        let b = authority.request(SignalId(1)).unwrap();
        assert_eq!(a, RequestAck::Created(RequestId("request-0001".into())));
        assert_eq!(b, RequestAck::Created(RequestId("request-0002".into())));
    }

    #[test]
    fn test_pending_request_is_reused() {
        let authority = InMemoryAuthority::with_signals(&signals());
        let first = authority.request(SignalId(0)).unwrap();
        let second = authority.request(SignalId(0)).unwrap();
        assert_eq!(second, RequestAck::AlreadyPending(first.request_id().clone()));
        assert_eq!(authority.request_count(), 1);
    }

    #[test]
    fn test_new_request_after_acceptance() {
        let authority = InMemoryAuthority::with_signals(&signals());
        let first = authority.request(SignalId(0)).unwrap();
        authority.accept(first.request_id()).unwrap();
        let second = authority.request(SignalId(0)).unwrap();
        assert!(matches!(second, RequestAck::Created(_)));
        assert_ne!(second.request_id(), first.request_id());
    }

    #[test]
    fn test_unknown_signal() {
        let authority = InMemoryAuthority::new();
        assert_eq!(
            authority.request(SignalId(3)),
            Err(AuthorityError::SignalNotFound(SignalId(3)))
        );
        assert!(authority.status(SignalId(3)).is_err());
    }

    #[test]
    fn test_init_overwrites_status() {
        let authority = InMemoryAuthority::with_signals(&signals());
        authority.set_status(SignalId(0), SignalStatus::Green).unwrap();
        authority.init_signals(&signals());
        assert_eq!(authority.status(SignalId(0)).unwrap(), SignalStatus::Red);
        assert_eq!(authority.signal_count(), 2);
    }
}
