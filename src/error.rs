//! SecondBrain error types

use thiserror::Error;

/// SecondBrain error type
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid session
    #[error("Not authenticated: {0}")]
    Auth(String),

    /// Missing or malformed required field
    #[error("{0}")]
    Validation(String),

    /// Item does not exist or is not owned by the caller
    #[error("{0}")]
    NotFound(String),

    /// Completion gateway answered 429
    #[error("{0}")]
    RateLimited(String),

    /// Completion gateway answered 402
    #[error("{0}")]
    QuotaExhausted(String),

    /// Any other upstream failure
    #[error("{0}")]
    Gateway(String),

    /// Transport failure reaching the store, gateway or proxy
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

impl Error {
    /// HTTP status the proxy functions answer with for this error.
    ///
    /// Only the two gateway quota conditions keep their own status; every
    /// other failure is reported as a 500.
    pub fn proxy_status(&self) -> u16 {
        match self {
            Error::RateLimited(_) => 429,
            Error::QuotaExhausted(_) => 402,
            _ => 500,
        }
    }

    /// HTTP status for the local items API
    pub fn api_status(&self) -> u16 {
        match self {
            Error::Auth(_) => 401,
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::RateLimited(_) => 429,
            Error::QuotaExhausted(_) => 402,
            Error::Gateway(_) | Error::Network(_) => 502,
            _ => 500,
        }
    }
}

/// Result type alias for SecondBrain operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_status_mapping() {
        assert_eq!(Error::RateLimited("slow down".into()).proxy_status(), 429);
        assert_eq!(Error::QuotaExhausted("no credits".into()).proxy_status(), 402);
        assert_eq!(Error::Gateway("boom".into()).proxy_status(), 500);
        assert_eq!(Error::Network("refused".into()).proxy_status(), 500);
        assert_eq!(Error::Auth("no session".into()).proxy_status(), 500);
    }

    #[test]
    fn test_api_status_mapping() {
        assert_eq!(Error::Auth("x".into()).api_status(), 401);
        assert_eq!(Error::Validation("x".into()).api_status(), 400);
        assert_eq!(Error::NotFound("x".into()).api_status(), 404);
        assert_eq!(Error::Internal("x".into()).api_status(), 500);
    }

    #[test]
    fn test_gateway_messages_are_verbatim() {
        let err = Error::RateLimited("Rate limited. Try again shortly.".into());
        assert_eq!(err.to_string(), "Rate limited. Try again shortly.");
    }
}
