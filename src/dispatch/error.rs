use thiserror::Error;

/// Reasons a request is refused. The `Display` text is what the operator sees.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid params")]
    InvalidParams,

    #[error("New data is equal to old")]
    UnchangedPayload,

    #[error("Invalid Option")]
    InvalidOption(i64),

    #[error("Invalid request")]
    Malformed(#[source] serde_json::Error),

    #[error("Invalid request")]
    NotUtf8(#[source] std::string::FromUtf8Error),

    #[error("Request too large (limit {limit} bytes)")]
    TooLarge { limit: usize },

    #[error("Failed to encode the chain")]
    Encode(#[source] serde_json::Error),

    #[error("Ledger unavailable")]
    Unavailable,
}
