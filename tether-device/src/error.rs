//! Registration error taxonomy.

use std::time::Duration;

use tether_core::registration::OperationStatus;
use thiserror::Error;

use crate::security::AttestationError;
use crate::transport::TransportError;

/// Everything that can go wrong with one registration attempt.
///
/// Exactly one of these (or a successful result) is delivered per `register`
/// call; the variants are distinct so callers can tell user-initiated
/// cancellation apart from system failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProvisioningError {
    /// A second `register` was attempted while one is in flight. The
    /// original attempt is unaffected.
    #[error("a registration attempt is already in flight")]
    Busy,

    /// The security client could not produce credential material; the
    /// transport was never touched.
    #[error("attestation failed: {0}")]
    Attestation(#[from] AttestationError),

    /// Transient transport failures exceeded the retry bound.
    #[error("transport failure after {retries} retries")]
    Transport {
        retries: u32,
        #[source]
        source: TransportError,
    },

    /// Unparseable or structurally invalid response. Not retried.
    #[error("malformed response from transport: {detail}")]
    Malformed { detail: String },

    /// The service concluded the registration with `failed` or `disabled`.
    #[error("service reported registration {status}: {detail}")]
    ServiceTerminal {
        status: OperationStatus,
        detail: String,
    },

    /// Explicit session teardown failed. Never retried; distinct from the
    /// best-effort cleanup after a terminal outcome, which is only logged.
    #[error("session teardown failed: {0}")]
    SessionEnd(#[source] TransportError),

    /// The attempt was cancelled by the caller.
    #[error("registration cancelled")]
    Cancelled,

    /// The whole submit+poll sequence exceeded its wall-clock budget.
    #[error("registration attempt exceeded its {}ms budget", budget.as_millis())]
    Timeout { budget: Duration },
}
