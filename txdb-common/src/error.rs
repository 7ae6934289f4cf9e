//! Common error types for TXDB
//!
//! Every build-time structural problem aborts the whole catalog build, so the
//! variants carry enough context (table name, offending text) to point at the
//! upstream format drift without re-running anything.

use thiserror::Error;

/// Common result type for TXDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the TXDB crates
#[derive(Error, Debug)]
pub enum Error {
    /// The fetch collaborator could not supply a table
    #[error("Fetch unavailable for {table}: {reason}")]
    FetchUnavailable { table: String, reason: String },

    /// A table's anchor pattern is unusable (programmer/config error)
    #[error("Malformed anchor for {table} ({pattern}): {reason}")]
    MalformedAnchor {
        table: String,
        pattern: String,
        reason: String,
    },

    /// The start anchor never matched
    #[error("Block not found in {table}: start anchor never matched")]
    BlockNotFound { table: String },

    /// The end anchor never matched after the block opened
    #[error("Unterminated block in {table}: end anchor never matched")]
    UnterminatedBlock { table: String },

    /// The table-specific rewrite could not handle a surviving line
    #[error("Unparseable line in {table}: {line}")]
    UnparseableLine { table: String, line: String },

    /// A normalized line is not valid under the minimal grammar
    #[error("Invalid literal in {table}: {reason} (line: {line})")]
    InvalidLiteral {
        table: String,
        line: String,
        reason: String,
    },

    /// The tempo dispatch function no longer has the expected shape
    #[error("Unrecognized dispatch shape: {0}")]
    UnrecognizedDispatchShape(String),

    /// A record references a key absent from a table it must join against
    #[error("Missing join key {key} in {table}")]
    MissingJoinKey { table: String, key: String },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors caused by the upstream table format drifting away
    /// from what the normalizer, materializer or rule miner expect.
    pub fn is_format_drift(&self) -> bool {
        matches!(
            self,
            Error::UnparseableLine { .. }
                | Error::InvalidLiteral { .. }
                | Error::UnrecognizedDispatchShape(_)
                | Error::BlockNotFound { .. }
                | Error::UnterminatedBlock { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_drift_classification() {
        let drift = Error::UnparseableLine {
            table: "titletbl.js".to_string(),
            line: "garbage".to_string(),
        };
        assert!(drift.is_format_drift());

        let config = Error::MalformedAnchor {
            table: "actbl.js".to_string(),
            pattern: "^actbl=.*$".to_string(),
            reason: "no delimiter capture".to_string(),
        };
        assert!(!config.is_format_drift());
    }

    #[test]
    fn test_display_includes_table_and_line() {
        let err = Error::InvalidLiteral {
            table: "datatbl.js".to_string(),
            line: "\"k\":[1,".to_string(),
            reason: "unbalanced list".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("datatbl.js"));
        assert!(message.contains("unbalanced list"));
    }
}
