//! Error types for dnssd-stream.

use std::time::Duration;

/// Classification domain for protocol-level discovery failures
/// (invalid inputs, resolution timeouts).
pub const DISCOVERY_ERROR_DOMAIN: &str = "dnssd-stream.discovery";

/// Classification domain for failures of the underlying engine or
/// operating system, surfaced verbatim.
pub const SYSTEM_ERROR_DOMAIN: &str = "dnssd-stream.system";

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service type is not a valid DNS-SD type such as `_http._tcp`.
    #[error("invalid service type: {0}")]
    InvalidServiceType(String),

    /// The requested browse domain is not supported by the engine.
    #[error("unsupported domain: {0}")]
    UnsupportedDomain(String),

    /// No resolution completed within the requested bound.
    #[error("resolution timed out after {0:?}")]
    ResolveTimeout(Duration),

    /// DNS-SD engine error.
    #[error("DNS-SD engine error: {0}")]
    Daemon(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an engine error.
    pub fn daemon<S: Into<String>>(msg: S) -> Self {
        Self::Daemon(msg.into())
    }

    /// The classification domain this error belongs to.
    ///
    /// Protocol-level failures map to [`DISCOVERY_ERROR_DOMAIN`];
    /// engine and OS failures map to [`SYSTEM_ERROR_DOMAIN`].
    pub fn domain(&self) -> &'static str {
        match self {
            Error::InvalidServiceType(_)
            | Error::UnsupportedDomain(_)
            | Error::ResolveTimeout(_) => DISCOVERY_ERROR_DOMAIN,
            Error::Daemon(_) | Error::Io(_) => SYSTEM_ERROR_DOMAIN,
        }
    }

    /// Whether this error is a resolution timeout.
    ///
    /// A timeout only terminates the single in-flight resolution; it is
    /// not fatal to any concurrent browse.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::ResolveTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_domains() {
        assert_eq!(
            Error::InvalidServiceType("http".into()).domain(),
            DISCOVERY_ERROR_DOMAIN
        );
        assert_eq!(
            Error::UnsupportedDomain("example.com".into()).domain(),
            DISCOVERY_ERROR_DOMAIN
        );
        assert_eq!(
            Error::ResolveTimeout(Duration::from_secs(1)).domain(),
            DISCOVERY_ERROR_DOMAIN
        );
        assert_eq!(Error::daemon("socket closed").domain(), SYSTEM_ERROR_DOMAIN);
        assert_eq!(
            Error::Io(std::io::Error::other("down")).domain(),
            SYSTEM_ERROR_DOMAIN
        );
    }

    #[test]
    fn test_timeout_classification() {
        assert!(Error::ResolveTimeout(Duration::from_secs(2)).is_timeout());
        assert!(!Error::daemon("boom").is_timeout());
    }
}
