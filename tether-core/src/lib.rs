//! # Tether Core
//!
//! Pure domain and wire types for the Tether device provisioning client.
//!
//! ## Design Principles
//!
//! This crate is intentionally **IO-free**:
//! - No network calls
//! - No filesystem operations
//! - No timers or async machinery
//!
//! All types are plain Rust structs/enums with serde serialization. The
//! actual orchestration (submit, poll loop, cancellation) lives in
//! `tether-device`.
//!
//! ## Stability
//!
//! The public API includes the serde serialization format of the wire types
//! (JSON field names, status strings, base64 attestation encoding). Breaking
//! changes to that format bump the major version.
//!
//! ## Modules
//!
//! - [`registration`] - Identifiers, operation status, registration state
//! - [`wire`] - Submit request and registration response bodies

pub mod registration;
pub mod wire;

// Re-export commonly used types at crate root for convenience.
pub use registration::{
    DeviceId, DeviceRegistrationState, HubId, OperationId, OperationStatus, RegistrationId,
    RegistrationResult, StatusParseError,
};
pub use wire::{AttestationPayload, RegistrationResponse, SubmitRequest};
