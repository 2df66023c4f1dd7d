//! # Tether Device
//!
//! Client library for registering a device with a Tether provisioning
//! service and receiving its hub assignment.
//!
//! Registration is a long-running operation: the initial submit either
//! concludes immediately or returns an operation handle that is polled until
//! the service reaches a terminal status (`assigned`, `failed`, `disabled`).
//! The [`machine::PollingStateMachine`] drives that protocol; the
//! [`client::RegistrationClient`] composes it with a [`security`] client so
//! callers get a single `register` entry point.
//!
//! The wire transport and the attestation mechanism are injected via the
//! [`transport::ProvisioningTransport`] and [`security::SecurityClient`]
//! traits; this crate contains no network code of its own.
//!
//! ## Example
//!
//! ```ignore
//! use tether_device::{ProvisioningConfig, RegistrationClient, X509Security};
//!
//! let security = X509Security::from_der(cert_der)?;
//! let registration_id = security.registration_id().clone();
//! let client = RegistrationClient::new(transport, security, ProvisioningConfig::default());
//!
//! let result = client.register(registration_id, false).await?;
//! println!("assigned to {}", result.assigned_hub.as_str());
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod machine;
pub mod security;
pub mod transport;

pub use client::RegistrationClient;
pub use config::ProvisioningConfig;
pub use error::ProvisioningError;
pub use machine::PollingStateMachine;
pub use security::{AttestationError, SecurityClient, X509Security};
pub use transport::{ProvisioningTransport, TransportError};

// Re-export the domain types callers handle directly.
pub use tether_core::registration::{
    DeviceId, HubId, OperationId, OperationStatus, RegistrationId, RegistrationResult,
};
pub use tether_core::wire::{AttestationPayload, RegistrationResponse, SubmitRequest};
