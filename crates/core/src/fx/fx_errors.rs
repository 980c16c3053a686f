use thiserror::Error;

/// Errors raised by currency lookups and conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Cannot convert between rates quoted against {from_base} and {to_base}")]
    CrossBaseConversion { from_base: String, to_base: String },

    #[error("Invalid rate {rate} for {code}")]
    InvalidRate { code: String, rate: f64 },
}

/// Errors surfaced by a rate sync pass.
///
/// `Clone` so a single failure can be handed to every caller that joined the
/// same in-flight request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The provider could not be reached (connect failure, timeout).
    #[error("Network failure: {0}")]
    Network(String),

    /// The provider answered, but not with a usable snapshot.
    #[error("Remote provider error: {0}")]
    RemoteProtocol(String),

    /// The snapshot was fetched but could not be written.
    #[error("Failed to store rates: {0}")]
    Store(String),
}
