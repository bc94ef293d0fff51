//! Error types for contactbook.
//!
//! Only faults live here. A rejected form is a value (see
//! [`crate::validation::FieldError`]) and a missing contact is `None`; neither
//! is an `Error`.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for contactbook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// The backing file exists but does not hold a serialized collection.
    #[error("contact store at {path} is corrupt: {source}")]
    StorageCorrupt {
        /// Path to the backing file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to read the backing file.
    #[error("failed to read contact store at {path}: {source}")]
    StorageRead {
        /// Path to the backing file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the backing file.
    #[error("failed to write contact store at {path}: {source}")]
    StorageWrite {
        /// Path that was being written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Server Errors ===
    /// The HTTP listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address we tried to listen on.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Generic Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for contactbook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error means the backing file could not be parsed.
    #[must_use]
    pub fn is_storage_corrupt(&self) -> bool {
        matches!(self, Self::StorageCorrupt { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<Vec<u8>>("not valid json").unwrap_err()
    }

    #[test]
    fn test_storage_corrupt_display() {
        let err = Error::StorageCorrupt {
            path: PathBuf::from("/data/contacts.json"),
            source: json_error(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/contacts.json"));
        assert!(msg.contains("corrupt"));
        assert!(err.is_storage_corrupt());
    }

    #[test]
    fn test_is_storage_corrupt_false_for_other_errors() {
        assert!(!Error::internal("boom").is_storage_corrupt());
        let err: Error = json_error().into();
        assert!(!err.is_storage_corrupt());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("unknown phone region: xx-XX");
        assert_eq!(
            err.to_string(),
            "invalid configuration: unknown phone region: xx-XX"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_storage_write_error_display() {
        let err = Error::StorageWrite {
            path: PathBuf::from("/readonly/contacts.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/readonly/contacts.json"));
        assert!(msg.contains("access denied"));
    }

    #[test]
    fn test_bind_error_display() {
        let err = Error::Bind {
            addr: "127.0.0.1:3000".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().contains("127.0.0.1:3000"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
