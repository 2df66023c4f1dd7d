//! Pure certificate utilities for Tether.
//!
//! This crate is intentionally IO-free:
//! - No filesystem operations
//! - No network calls
//! - No logging
//!
//! The device client (`tether-device`) uses these helpers to validate the
//! certificate an X.509 security client presents as attestation material.

pub mod cert;

pub use cert::{common_name, validate_cert_der, CertError, MAX_CERT_SIZE};
