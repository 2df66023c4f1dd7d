//! Submit request and registration response bodies.
//!
//! These are the transport-agnostic shapes the polling state machine
//! exchanges with a transport implementation. A concrete transport maps
//! them onto its own framing (HTTP bodies, AMQP properties, ...).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::registration::{DeviceRegistrationState, OperationId, OperationStatus, RegistrationId};

/// Opaque proof-of-identity material supplied by a security client.
///
/// For X.509 attestation this is the DER-encoded certificate. Serialized as
/// standard base64 on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttestationPayload(#[serde(with = "base64_bytes")] pub Vec<u8>);

impl AttestationPayload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

mod base64_bytes {
    use base64::prelude::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        BASE64_STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64_STANDARD
            .decode(&encoded)
            .map_err(serde::de::Error::custom)
    }
}

/// Body of the initial registration submit call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub registration_id: RegistrationId,
    pub attestation: AttestationPayload,
    /// Discard any server-side cached prior attempt and start fresh.
    pub force_registration: bool,
}

impl SubmitRequest {
    pub fn new(
        registration_id: RegistrationId,
        attestation: AttestationPayload,
        force_registration: bool,
    ) -> Self {
        Self {
            registration_id,
            attestation,
            force_registration,
        }
    }
}

/// Response shape shared by the submit and query-operation-status calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationResponse {
    /// Present on non-terminal responses; identifies the pending operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<OperationId>,
    pub status: OperationStatus,
    /// Server hint for when to poll next, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_state: Option<DeviceRegistrationState>,
}

impl RegistrationResponse {
    /// The server's poll interval hint, if it is usable.
    ///
    /// Zero and negative hints are treated as absent; the caller falls back
    /// to its configured default.
    pub fn retry_after(&self) -> Option<Duration> {
        match self.retry_after_ms {
            Some(ms) if ms > 0 => u64::try_from(ms).ok().map(Duration::from_millis),
            _ => None,
        }
    }
}
