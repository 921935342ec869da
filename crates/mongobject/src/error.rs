//! Error types for mongobject

use thiserror::Error;

/// Result type alias for mongobject operations
pub type Result<T> = std::result::Result<T, MongobjectError>;

/// Unified error type for all mongobject operations
#[derive(Error, Debug, Clone)]
pub enum MongobjectError {
    /// Error reported by the driver or the server
    #[error("MongoDB error: {0}")]
    MongoDB(String),

    #[error("Connection error: {0}")]
    Connection(String),

    /// An operation that needs a client ran before `open`/`connect`
    #[error("Not connected to a MongoDB instance")]
    NotConnected,

    /// Missing or contradictory configuration (addressing, database, collection)
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MongobjectError {
    /// Returns true if the error is a precondition failure raised before any I/O
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            MongobjectError::NotConnected
                | MongobjectError::Configuration(_)
                | MongobjectError::Validation(_)
        )
    }
}

impl From<mongodb::error::Error> for MongobjectError {
    fn from(err: mongodb::error::Error) -> Self {
        MongobjectError::MongoDB(err.to_string())
    }
}

impl From<bson::ser::Error> for MongobjectError {
    fn from(err: bson::ser::Error) -> Self {
        MongobjectError::Serialization(format!("BSON serialization error: {}", err))
    }
}

impl From<bson::de::Error> for MongobjectError {
    fn from(err: bson::de::Error) -> Self {
        MongobjectError::Serialization(format!("BSON deserialization error: {}", err))
    }
}

impl From<serde_json::Error> for MongobjectError {
    fn from(err: serde_json::Error) -> Self {
        MongobjectError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_mongodb() {
        let err = MongobjectError::MongoDB("connection refused".to_string());
        assert_eq!(err.to_string(), "MongoDB error: connection refused");
    }

    #[test]
    fn test_error_display_not_connected() {
        assert_eq!(
            MongobjectError::NotConnected.to_string(),
            "Not connected to a MongoDB instance"
        );
    }

    #[test]
    fn test_error_display_configuration() {
        let err = MongobjectError::Configuration("no database selected".to_string());
        assert_eq!(err.to_string(), "Configuration error: no database selected");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: MongobjectError = json_err.into();
        assert!(matches!(err, MongobjectError::Serialization(_)));
    }

    #[test]
    fn test_is_precondition() {
        assert!(MongobjectError::NotConnected.is_precondition());
        assert!(MongobjectError::Configuration("x".to_string()).is_precondition());
        assert!(MongobjectError::Validation("x".to_string()).is_precondition());
        assert!(!MongobjectError::MongoDB("x".to_string()).is_precondition());
        assert!(!MongobjectError::Connection("x".to_string()).is_precondition());
    }
}
