//! Registration facade composing the security client and the state machine.

use tether_core::registration::{OperationStatus, RegistrationId, RegistrationResult};
use tether_core::wire::SubmitRequest;
use tokio::sync::broadcast;

use crate::config::ProvisioningConfig;
use crate::error::ProvisioningError;
use crate::machine::PollingStateMachine;
use crate::security::SecurityClient;
use crate::transport::ProvisioningTransport;

/// Single entry point for registering a device.
///
/// Hides the attestation step: `register` obtains credential material from
/// the security client, hands the request to the polling state machine, and
/// maps the terminal registration state into the public result shape. Holds
/// no state of its own beyond its two collaborators.
pub struct RegistrationClient<T, S> {
    machine: PollingStateMachine<T>,
    security: S,
}

impl<T: ProvisioningTransport, S: SecurityClient> RegistrationClient<T, S> {
    pub fn new(transport: T, security: S, config: ProvisioningConfig) -> Self {
        Self {
            machine: PollingStateMachine::new(transport, config),
            security,
        }
    }

    /// Register the device and wait for its hub assignment.
    ///
    /// # Errors
    ///
    /// An attestation failure surfaces without touching the transport; every
    /// other outcome comes from the state machine unchanged.
    pub async fn register(
        &self,
        registration_id: RegistrationId,
        force_registration: bool,
    ) -> Result<RegistrationResult, ProvisioningError> {
        let attestation = self.security.attestation().await?;
        let request = SubmitRequest::new(registration_id, attestation, force_registration);
        let state = self.machine.register(request).await?;

        match (state.device_id, state.assigned_hub) {
            (Some(device_id), Some(assigned_hub)) => Ok(RegistrationResult {
                device_id,
                assigned_hub,
            }),
            // The machine validates assignment fields; this covers the type
            // system, not an expected path.
            _ => Err(ProvisioningError::Malformed {
                detail: "assigned result missing device or hub identifier".to_string(),
            }),
        }
    }

    /// Cancel the in-flight attempt, if any.
    pub async fn cancel(&self) -> Result<(), ProvisioningError> {
        self.machine.cancel().await
    }

    /// Tear the transport session down.
    pub async fn end_session(&self) -> Result<(), ProvisioningError> {
        self.machine.end_session().await
    }

    /// Subscribe to per-poll status notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<OperationStatus> {
        self.machine.subscribe()
    }
}
