//! Security client contract and the X.509 implementation.
//!
//! A security client produces the proof-of-identity material attached to a
//! registration submit. The contract is asynchronous because acquisition may
//! involve a key store or hardware module; [`X509Security`] is the simple
//! in-memory case of a pre-loaded device certificate.

use async_trait::async_trait;
use tether_auth::cert;
use tether_core::registration::RegistrationId;
use tether_core::wire::AttestationPayload;
use thiserror::Error;

/// Errors produced while acquiring attestation material.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttestationError {
    /// The device certificate failed validation.
    #[error("invalid attestation certificate: {0}")]
    Certificate(#[from] cert::CertError),

    /// The underlying credential source failed.
    #[error("credential acquisition failed: {0}")]
    Acquisition(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Supplies proof-of-identity material for one registration attempt.
#[async_trait]
pub trait SecurityClient: Send + Sync {
    /// Produce the attestation payload to attach to the submit request.
    ///
    /// Called once per registration attempt.
    async fn attestation(&self) -> Result<AttestationPayload, AttestationError>;
}

/// Security client backed by a DER-encoded X.509 device certificate.
///
/// The certificate is validated at construction; the subject common name
/// doubles as the conventional registration id so the service can match the
/// attestation to its enrollment record.
#[derive(Debug, Clone)]
pub struct X509Security {
    cert_der: Vec<u8>,
    registration_id: RegistrationId,
}

impl X509Security {
    /// Build a security client from a DER-encoded certificate.
    ///
    /// # Errors
    ///
    /// Fails if the certificate is oversized, unparseable, or has no subject
    /// common name.
    pub fn from_der(cert_der: Vec<u8>) -> Result<Self, AttestationError> {
        let registration_id = RegistrationId::new(cert::common_name(&cert_der)?);
        Ok(Self {
            cert_der,
            registration_id,
        })
    }

    /// Registration id derived from the certificate common name.
    pub fn registration_id(&self) -> &RegistrationId {
        &self.registration_id
    }
}

#[async_trait]
impl SecurityClient for X509Security {
    async fn attestation(&self) -> Result<AttestationPayload, AttestationError> {
        Ok(AttestationPayload::new(self.cert_der.clone()))
    }
}
