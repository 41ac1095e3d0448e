//! Error types for lookups and location resolution.
//!
//! Each type can produce the message the dashboard shows to the user via
//! `user_message()`; the `Display` output keeps the technical detail for logs.

use thiserror::Error;

/// Message shown for any failed city search or weather fetch.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch weather data. Please try again.";

/// Failure of a geocoding or weather request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("city not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("http error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl LookupError {
    pub fn user_message(&self) -> &'static str {
        FETCH_FAILED_MESSAGE
    }
}

/// Why the device location capability could not produce coordinates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("location request timed out")]
    Timeout,

    #[error("location error: {0}")]
    Other(String),
}

impl DeviceError {
    fn advice(&self) -> &'static str {
        match self {
            DeviceError::PermissionDenied => "Please allow location access in your settings.",
            DeviceError::PositionUnavailable => {
                "Location service unavailable. Please search for a city instead."
            }
            DeviceError::Timeout => "Location request timed out. Please try again.",
            DeviceError::Other(_) => "Please search for a city instead.",
        }
    }
}

/// Terminal failure of the geolocation flow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("geolocation capability is not available")]
    Unsupported,

    /// Device lookup failed and the IP fallback did not recover.
    #[error("device location failed ({0}) and IP fallback did not recover")]
    Device(DeviceError),

    /// Coordinates were obtained but fetching weather for them failed.
    #[error("weather fetch for resolved position failed: {0}")]
    Fetch(#[from] LookupError),
}

impl GeolocationError {
    pub fn user_message(&self) -> String {
        match self {
            GeolocationError::Unsupported => {
                "Geolocation is not supported on this device.".to_string()
            }
            GeolocationError::Device(reason) => {
                format!("Unable to get your location. {}", reason.advice())
            }
            GeolocationError::Fetch(error) => error.user_message().to_string(),
        }
    }
}
