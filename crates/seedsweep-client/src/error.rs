//! Error types for client operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the qBittorrent client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured host or port does not form a valid URL.
    #[error("Invalid client URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {source}")]
    Build {
        #[source]
        source: reqwest::Error,
    },

    /// The server rejected the credentials.
    #[error("Failed to log in to qBittorrent. Check credentials.")]
    LoginFailed,

    /// The server banned this address after too many failed logins.
    #[error("qBittorrent refused the login: IP is banned after too many failed attempts")]
    Banned,

    /// The session is missing or expired.
    #[error("Not authenticated with qBittorrent")]
    NotAuthenticated,

    /// Transport failure.
    #[error("Request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Unexpected HTTP status.
    #[error("{endpoint} returned {status}")]
    Status { endpoint: String, status: StatusCode },

    /// The response body did not match the expected shape.
    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Check whether the error means the session is unusable.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::LoginFailed | Self::Banned | Self::NotAuthenticated
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors() {
        assert!(ClientError::LoginFailed.is_auth());
        assert!(ClientError::NotAuthenticated.is_auth());
        assert!(
            !ClientError::Status {
                endpoint: "torrents/info".to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            }
            .is_auth()
        );
    }

    #[test]
    fn test_status_message() {
        let err = ClientError::Status {
            endpoint: "torrents/files".to_string(),
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(err.to_string(), "torrents/files returned 404 Not Found");
    }
}
