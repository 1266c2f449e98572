//! Error types for cell readout validation

use crate::geometry::Position;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadoutError {
    #[error("Value {value} does not fit field '{field}' of width {width}")]
    OutOfRange {
        field: String,
        value: i64,
        width: u8,
    },

    #[error("Unknown field: '{0}'")]
    UnknownField(String),

    #[error("Duplicate field: '{0}'")]
    DuplicateField(String),

    #[error("Invalid field descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Fields '{field}' and '{other}' occupy overlapping bit ranges")]
    Overlap { field: String, other: String },

    #[error("No region encloses point {0}")]
    NoEnclosingRegion(Position),

    #[error("No region maps to identifier {0:#018x}")]
    UnknownIdentifier(u64),

    #[error("Aggregation maps disagree: forward {forward} entries, reverse {reverse}")]
    DistinctnessMismatch { forward: usize, reverse: usize },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ReadoutError {
    /// Whether the error is a recoverable per-item condition rather than a
    /// hard contract violation. Soft errors are counted and logged by the
    /// event loop; hard errors abort the operation that raised them.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            ReadoutError::NoEnclosingRegion(_)
                | ReadoutError::UnknownIdentifier(_)
                | ReadoutError::DistinctnessMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_error_classification() {
        let soft = ReadoutError::UnknownIdentifier(0xdead);
        let hard = ReadoutError::OutOfRange {
            field: "layer".to_string(),
            value: 300,
            width: 8,
        };
        assert!(soft.is_soft());
        assert!(!hard.is_soft());
    }

    #[test]
    fn test_error_messages_name_the_field() {
        let err = ReadoutError::OutOfRange {
            field: "row".to_string(),
            value: 256,
            width: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("row"));
        assert!(msg.contains("256"));
    }
}
