//! Error types for the rate provider.

use pennywise_core::fx::SyncError;
use thiserror::Error;

/// Errors that can occur while fetching rates.
#[derive(Error, Debug)]
pub enum RateProviderError {
    /// The request did not complete in time.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// The provider could not be reached.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("{provider} returned HTTP {status}: {message}")]
    HttpStatus {
        provider: String,
        status: u16,
        message: String,
    },

    /// The body could not be read as a rate response.
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },
}

impl RateProviderError {
    /// Whether the failure happened before the provider produced an answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network(_))
    }
}

impl From<RateProviderError> for SyncError {
    fn from(err: RateProviderError) -> Self {
        if err.is_transport() {
            SyncError::Network(err.to_string())
        } else {
            SyncError::RemoteProtocol(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_are_protocol_failures() {
        let err = RateProviderError::HttpStatus {
            provider: "FREECURRENCYAPI".to_string(),
            status: 401,
            message: "Invalid authentication credentials".to_string(),
        };
        assert!(!err.is_transport());
        match SyncError::from(err) {
            SyncError::RemoteProtocol(msg) => assert!(msg.contains("401")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_timeouts_are_network_failures() {
        let err = RateProviderError::Timeout {
            provider: "FREECURRENCYAPI".to_string(),
        };
        assert!(matches!(SyncError::from(err), SyncError::Network(_)));
    }
}
