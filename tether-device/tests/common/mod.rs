//! Test harnesses for registration E2E tests.
//!
//! A scripted transport plays back a fixed sequence of responses and records
//! every call the state machine makes (with paused-clock timestamps, so
//! interval arithmetic can be asserted exactly).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tether_core::registration::{
    DeviceId, DeviceRegistrationState, HubId, OperationId, OperationStatus,
};
use tether_core::wire::{AttestationPayload, RegistrationResponse, SubmitRequest};
use tether_device::security::{AttestationError, SecurityClient};
use tether_device::transport::{ProvisioningTransport, TransportError};
use tokio::time::Instant;

/// One scripted transport reaction.
pub enum Step {
    Respond(RegistrationResponse),
    Fail(TransportError),
    /// Never resolve; the caller is expected to cancel or time out.
    Hang,
}

/// A call the state machine made, with the time it was made.
#[derive(Debug, Clone)]
#[allow(dead_code)] // not every test inspects every field
pub enum Call {
    Submit { request: SubmitRequest, at: Instant },
    Query { operation_id: OperationId, at: Instant },
}

#[derive(Default)]
struct Inner {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Call>>,
    end_sessions: AtomicUsize,
    end_session_error: Mutex<Option<TransportError>>,
}

/// Transport that plays back a script. Cloning shares the recording.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<Inner>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            inner: Arc::new(Inner {
                script: Mutex::new(script.into()),
                ..Inner::default()
            }),
        }
    }

    /// Make the next `end_session` call fail with the given error.
    pub fn fail_next_end_session(&self, err: TransportError) {
        *self.inner.end_session_error.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn submit_calls(&self) -> Vec<(SubmitRequest, Instant)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Submit { request, at } => Some((request, at)),
                Call::Query { .. } => None,
            })
            .collect()
    }

    pub fn query_calls(&self) -> Vec<(OperationId, Instant)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Query { operation_id, at } => Some((operation_id, at)),
                Call::Submit { .. } => None,
            })
            .collect()
    }

    pub fn end_session_count(&self) -> usize {
        self.inner.end_sessions.load(Ordering::SeqCst)
    }

    async fn next(&self) -> Result<RegistrationResponse, TransportError> {
        let step = self
            .inner
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport called more often than scripted");
        match step {
            Step::Respond(response) => Ok(response),
            Step::Fail(err) => Err(err),
            Step::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl ProvisioningTransport for ScriptedTransport {
    async fn submit(&self, request: &SubmitRequest) -> Result<RegistrationResponse, TransportError> {
        self.inner.calls.lock().unwrap().push(Call::Submit {
            request: request.clone(),
            at: Instant::now(),
        });
        self.next().await
    }

    async fn query_operation_status(
        &self,
        operation_id: &OperationId,
    ) -> Result<RegistrationResponse, TransportError> {
        self.inner.calls.lock().unwrap().push(Call::Query {
            operation_id: operation_id.clone(),
            at: Instant::now(),
        });
        self.next().await
    }

    async fn end_session(&self) -> Result<(), TransportError> {
        self.inner.end_sessions.fetch_add(1, Ordering::SeqCst);
        match self.inner.end_session_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Security client serving a fixed payload.
pub struct StaticSecurity {
    pub payload: Vec<u8>,
}

#[async_trait]
impl SecurityClient for StaticSecurity {
    async fn attestation(&self) -> Result<AttestationPayload, AttestationError> {
        Ok(AttestationPayload::new(self.payload.clone()))
    }
}

/// Security client that always fails acquisition.
pub struct FailingSecurity;

#[async_trait]
impl SecurityClient for FailingSecurity {
    async fn attestation(&self) -> Result<AttestationPayload, AttestationError> {
        Err(AttestationError::Acquisition(
            "key store unavailable".into(),
        ))
    }
}

// ── Response builders ────────────────────────────────────────────────────

pub fn assigning(operation_id: &str, retry_after_ms: Option<i64>) -> RegistrationResponse {
    RegistrationResponse {
        operation_id: Some(OperationId::new(operation_id)),
        status: OperationStatus::Assigning,
        retry_after_ms,
        registration_state: None,
    }
}

pub fn assigned(operation_id: Option<&str>, device_id: &str, hub: &str) -> RegistrationResponse {
    RegistrationResponse {
        operation_id: operation_id.map(OperationId::new),
        status: OperationStatus::Assigned,
        retry_after_ms: None,
        registration_state: Some(DeviceRegistrationState {
            device_id: Some(DeviceId::new(device_id)),
            assigned_hub: Some(HubId::new(hub)),
            ..DeviceRegistrationState::default()
        }),
    }
}

pub fn failed(operation_id: Option<&str>, message: &str) -> RegistrationResponse {
    RegistrationResponse {
        operation_id: operation_id.map(OperationId::new),
        status: OperationStatus::Failed,
        retry_after_ms: None,
        registration_state: Some(DeviceRegistrationState {
            error_message: Some(message.to_string()),
            ..DeviceRegistrationState::default()
        }),
    }
}

pub fn transient(message: &str) -> TransportError {
    TransportError::transient(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        message.to_string(),
    ))
}
