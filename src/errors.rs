//! Apicize transcoder error types
use std::fmt::Display;
use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::{SerializationError, Violation};

/// A 1-based line/column position within a source unit
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Failures locating or decoding an embedded metadata block
#[derive(Error, Debug)]
pub enum MetadataError {
    /// No metadata block is present; callers treat this as a warning
    #[error("metadata block is missing")]
    Missing,
    /// A start marker was found without a matching end marker
    #[error("metadata block starting at line {} is not terminated", .start.line)]
    Unterminated {
        /// Location of the start marker within the decoded text
        start: Position,
    },
    /// The block is delimited but its payload cannot be decoded
    #[error(
        "metadata block is malformed{}: {description}",
        .position.map(|p| format!(" at payload {p}")).unwrap_or_default()
    )]
    Malformed {
        /// Location within the payload, when the payload itself failed to decode
        position: Option<Position>,
        /// Reason the payload was rejected
        description: String,
    },
    /// A record could not be serialized
    #[error("unable to encode metadata: {0}")]
    Encode(#[source] serde_json::Error),
}

impl MetadataError {
    /// True if the block was absent rather than broken
    pub fn is_missing(&self) -> bool {
        matches!(self, MetadataError::Missing)
    }

    pub(crate) fn from_payload(err: serde_json::Error) -> Self {
        MetadataError::Malformed {
            position: Some(Position {
                line: err.line(),
                column: err.column(),
            }),
            description: err.to_string(),
        }
    }
}

/// Failures parsing a single source unit
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The unit contains invalid syntax
    #[error("{file_name}:{position}: {description}")]
    Syntax {
        /// Unit that failed
        file_name: String,
        /// First error location
        position: Position,
        /// Diagnostic text
        description: String,
    },
    /// Declarations are nested deeper than the configured bound
    #[error("{file_name}:{position}: declarations nested deeper than {max_depth} levels")]
    DepthExceeded {
        /// Unit that failed
        file_name: String,
        /// Location of the first declaration past the bound
        position: Position,
        /// Configured bound
        max_depth: usize,
    },
    /// The syntax tree capability could not be initialized
    #[error("unable to initialize TypeScript grammar: {0}")]
    Language(String),
}

/// Workbook failed structural validation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("workbook has {} structural violation(s)", .violations.len())]
pub struct StructuralError {
    /// All violations, in document order
    pub violations: Vec<Violation>,
}

/// Represents errors occurring while transcoding workbooks
#[derive(Error, Debug)]
pub enum ApicizeError {
    /// Workbook structure is invalid
    #[error(transparent)]
    Structural(#[from] StructuralError),
    /// Source unit could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Metadata block is present but unusable
    #[error("{context}: {source}")]
    Metadata {
        /// Node or unit the metadata belongs to
        context: String,
        /// Underlying codec error
        #[source]
        source: MetadataError,
    },
    /// File or JSON serialization failure
    #[error("{file_name}: {error}")]
    Serialization {
        /// Name of the file (or value) being processed
        file_name: String,
        /// Underlying error
        #[source]
        error: SerializationError,
    },
    /// Operation was cancelled before it started
    #[error("cancelled")]
    Cancelled,
    /// Other error
    #[error("{description}")]
    Error {
        /// Description of error
        description: String,
    },
}

impl ApicizeError {
    /// Wrap a serde error encountered while processing `name`
    pub fn from_serde(err: serde_json::Error, name: &str) -> ApicizeError {
        ApicizeError::Serialization {
            file_name: name.to_string(),
            error: SerializationError::JSON(err),
        }
    }

    /// Wrap an I/O error encountered while processing `name`
    pub fn from_io(err: io::Error, name: &str) -> ApicizeError {
        ApicizeError::Serialization {
            file_name: name.to_string(),
            error: SerializationError::IO(err),
        }
    }

    /// Wrap a metadata error with the node it belongs to
    pub fn from_metadata(err: MetadataError, context: &str) -> ApicizeError {
        ApicizeError::Metadata {
            context: context.to_string(),
            source: err,
        }
    }

    /// Short label for the error category
    pub fn get_label(&self) -> &'static str {
        match self {
            ApicizeError::Structural(_) => "StructuralError",
            ApicizeError::Parse(_) => "ParseError",
            ApicizeError::Metadata { .. } => "MetadataError",
            ApicizeError::Serialization { error, .. } => match error {
                SerializationError::IO(_) => "IOError",
                SerializationError::JSON(_) => "ParseError",
            },
            ApicizeError::Cancelled => "Cancelled",
            ApicizeError::Error { .. } => "Error",
        }
    }
}

impl Serialize for ApicizeError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("errorType", self.get_label())?;
        map.serialize_entry("errorDescription", &self.to_string())?;
        if let Some(source) = std::error::Error::source(self) {
            map.serialize_entry("errorSource", &source.to_string())?;
        }
        map.end()
    }
}
