use std::io;

use thiserror::Error;

use crate::dialect::Dialect;

/// Errors that surface as `Err` values rather than findings.
///
/// Everything here is a configuration or environment problem (bad dialect
/// identifier, uncompilable bundled schema, unreadable input stream, libxml2
/// refusing to allocate a context). Problems with the *document under
/// validation* are never represented by this type; they are reported as
/// [`Finding`](crate::Finding)s instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("unknown dialect identifier: {identifier:?}")]
    UnknownDialect { identifier: String },

    #[error("bundled schema for {dialect} failed to compile: {details}")]
    SchemaCompile { dialect: Dialect, details: String },

    #[error("libxml2 validation context creation failed")]
    ValidationContext,

    #[error("libxml2 internal error: code {code}")]
    Internal { code: i32 },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_dialect_display() {
        let err = Error::UnknownDialect {
            identifier: "2.0".to_string(),
        };
        assert!(err.to_string().contains("unknown dialect"));
        assert!(err.to_string().contains("2.0"));
    }

    #[test]
    fn test_schema_compile_display() {
        let err = Error::SchemaCompile {
            dialect: Dialect::Pbcore13,
            details: "attribute 'name' is required".to_string(),
        };
        assert!(err.to_string().contains("failed to compile"));
        assert!(err.to_string().contains("PBCore 1.3"));
        assert!(err.to_string().contains("attribute 'name' is required"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "stream gone");
        let err: Error = io_error.into();
        match err {
            Error::Io(_) => (),
            other => panic!("expected Error::Io, got {other:?}"),
        }
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error as _;

        let err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "stream gone"));
        let source = err.source().expect("io variant keeps its source");
        assert_eq!(source.to_string(), "stream gone");
    }
}
