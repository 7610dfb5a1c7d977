//! Error taxonomy for artifact resolution.
//!
//! Only `ResolveError::MalformedInput` ever reaches a caller of the
//! resolution entry points. Collaborator failures are absorbed at the call
//! site: the surrounding tier or stage logs them and degrades to an
//! absent/negative result, so batch processing never aborts on partial
//! information.

use thiserror::Error;

/// Errors surfaced by the resolution entry points.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input string could not be parsed into an artifact reference.
    #[error("malformed artifact reference '{input}': expected 'org/name' or a platform URL")]
    MalformedInput { input: String },
}

/// Failures from an external collaborator call.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or the connection dropped.
    #[error("transport failure talking to {service}: {detail}")]
    Transport { service: String, detail: String },

    /// The call exceeded its configured timeout.
    #[error("{service} call timed out")]
    Timeout { service: String },

    /// The collaborator answered with something outside its contract.
    #[error("unexpected {service} response: {detail}")]
    Protocol { service: String, detail: String },

    /// Local I/O failure (artifact store).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Result type for collaborator calls.
pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_displays_the_input() {
        let err = ResolveError::MalformedInput {
            input: "not-a-reference".to_string(),
        };
        assert!(err.to_string().contains("not-a-reference"));
    }

    #[test]
    fn test_transport_error_displays_service_and_detail() {
        let err = CollaboratorError::Transport {
            service: "registry".to_string(),
            detail: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("registry"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_timeout_error_displays_service() {
        let err = CollaboratorError::Timeout {
            service: "inference".to_string(),
        };
        assert!(err.to_string().contains("inference"));
    }
}
