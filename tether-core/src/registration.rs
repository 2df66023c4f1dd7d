//! Identifiers and registration status types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-supplied identifier for a device registration, unique per device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(pub String);

impl RegistrationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier the service issues for a pending registration operation.
///
/// Assigned once per submit call and never reissued for the lifetime of that
/// registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub String);

impl OperationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier the service assigns to the device on successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of the hub endpoint the device was assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HubId(pub String);

impl HubId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Overall status of a registration operation as reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    /// The service has not started processing the registration.
    #[default]
    Unassigned,
    /// The service is still working on the assignment; keep polling.
    Assigning,
    /// The device has been assigned to a hub (terminal).
    Assigned,
    /// The registration failed (terminal).
    Failed,
    /// The enrollment record is disabled on the service (terminal).
    Disabled,
}

impl OperationStatus {
    /// Returns true if no further polling follows this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Assigned | Self::Failed | Self::Disabled)
    }

    /// The wire string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Assigning => "assigning",
            Self::Assigned => "assigned",
            Self::Failed => "failed",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not one of the five known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation status: {0:?}")]
pub struct StatusParseError(pub String);

impl FromStr for OperationStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unassigned" => Ok(Self::Unassigned),
            "assigning" => Ok(Self::Assigning),
            "assigned" => Ok(Self::Assigned),
            "failed" => Ok(Self::Failed),
            "disabled" => Ok(Self::Disabled),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// Per-device registration record the service reports on poll responses.
///
/// On `assigned` the device and hub identifiers are populated; on `failed`
/// or `disabled` the error fields carry the service-provided detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceRegistrationState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_hub: Option<HubId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DeviceRegistrationState {
    /// Service-provided error detail, or a placeholder when absent.
    pub fn error_detail(&self) -> String {
        match (&self.error_code, &self.error_message) {
            (Some(code), Some(msg)) => format!("{code}: {msg}"),
            (None, Some(msg)) => msg.clone(),
            (Some(code), None) => code.to_string(),
            (None, None) => "no detail provided".to_string(),
        }
    }
}

/// The public result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    pub device_id: DeviceId,
    pub assigned_hub: HubId,
}
