//! Certificate validation for X.509 attestation.
//!
//! # Security
//!
//! - Input is limited to 16KB to prevent DoS
//! - The x509_parser library handles ASN.1 parsing safely

use thiserror::Error;
use x509_parser::prelude::*;

/// Maximum certificate size (16KB is generous for a single cert)
pub const MAX_CERT_SIZE: usize = 16 * 1024;

/// Errors that can occur during certificate validation.
#[derive(Debug, Error)]
pub enum CertError {
    #[error("certificate too large: {0} bytes (max {MAX_CERT_SIZE})")]
    TooLarge(usize),

    #[error("failed to parse X.509 certificate: {0}")]
    ParseError(String),

    #[error("certificate subject has no common name")]
    MissingCommonName,
}

/// Validate a DER-encoded X.509 certificate.
///
/// # Errors
///
/// Returns `CertError::TooLarge` if the certificate exceeds 16KB.
/// Returns `CertError::ParseError` if the certificate is malformed.
pub fn validate_cert_der(cert_der: &[u8]) -> Result<(), CertError> {
    parse(cert_der).map(|_| ())
}

/// Extract the subject common name from a DER-encoded X.509 certificate.
///
/// Provisioning conventionally uses the common name as the registration id,
/// so the service can tie the attestation to the enrollment record.
///
/// # Errors
///
/// Returns `CertError::MissingCommonName` if the subject carries no CN, in
/// addition to the validation errors of [`validate_cert_der`].
pub fn common_name(cert_der: &[u8]) -> Result<String, CertError> {
    let cert = parse(cert_der)?;
    let cn = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string);
    cn.ok_or(CertError::MissingCommonName)
}

fn parse(cert_der: &[u8]) -> Result<X509Certificate<'_>, CertError> {
    // Input size validation (DoS protection)
    if cert_der.len() > MAX_CERT_SIZE {
        return Err(CertError::TooLarge(cert_der.len()));
    }

    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| CertError::ParseError(format!("{:?}", e)))?;

    Ok(cert)
}
