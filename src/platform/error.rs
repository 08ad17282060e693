//! Errors raised by platform services.

use serde::Serialize;
use thiserror::Error;

/// Failure reading a platform service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The service does not exist in this environment.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// The service exists but the read failed.
    #[error("Platform read failed: {0}")]
    Failed(String),
}

/// Position error codes, numbered like the geolocation services report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationErrorCode {
    PermissionDenied = 1,
    PositionUnavailable = 2,
    Timeout = 3,
}

/// Failure delivered to a position callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code:?}: {message}")]
pub struct GeolocationError {
    pub code: GeolocationErrorCode,
    pub message: String,
}

impl GeolocationError {
    pub fn new(code: GeolocationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
