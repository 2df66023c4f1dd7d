//! Transport handler contract consumed by the polling state machine.
//!
//! A transport implements one wire protocol (HTTP polling, AMQP, ...) and
//! exposes the three primitives the state machine needs: submit a
//! registration, query a pending operation, and tear the session down. The
//! state machine never sees framing, TLS, or headers.

use async_trait::async_trait;
use tether_core::registration::OperationId;
use tether_core::wire::{RegistrationResponse, SubmitRequest};
use thiserror::Error;

/// Errors a transport implementation reports to the state machine.
///
/// The split decides retry behavior: transient failures are retried up to
/// the configured bound, malformed responses abort the attempt immediately.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network or service error that may succeed on retry.
    #[error("transient transport failure: {0}")]
    Transient(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Unparseable or structurally invalid response. Never retried.
    #[error("malformed response: {detail}")]
    Malformed { detail: String },
}

impl TransportError {
    /// Wrap an underlying error as a retryable failure.
    pub fn transient(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Transient(source.into())
    }

    /// Build a fatal malformed-response error.
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Wire-protocol primitives for the registration long-running operation.
#[async_trait]
pub trait ProvisioningTransport: Send + Sync {
    /// Submit a registration request.
    ///
    /// Returns either an immediately terminal response or a pending one
    /// carrying the operation id to poll.
    async fn submit(&self, request: &SubmitRequest) -> Result<RegistrationResponse, TransportError>;

    /// Query the status of a pending operation.
    async fn query_operation_status(
        &self,
        operation_id: &OperationId,
    ) -> Result<RegistrationResponse, TransportError>;

    /// Tear the session down, aborting any outstanding network call.
    ///
    /// Fire-and-forget from the caller's perspective, but must complete (or
    /// fail) before the session is reusable.
    async fn end_session(&self) -> Result<(), TransportError>;
}
