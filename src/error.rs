//! Errors raised while reconciling edits.
//!
//! Every failure leaves the document untouched: operations are validated
//! against the current state before anything is written.

/// A reconciliation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A text operation reaches past the end of the content it was applied to.
    /// Usually a stale version or a reordered delivery.
    #[error("operation at {position} (length {length}) out of range for content of length {len}")]
    OutOfRange {
        position: usize,
        length: usize,
        len: usize,
    },

    /// A local cell edit addressed a cell outside the grid.
    #[error("cell {row},{col} outside of {rows}x{cols} grid")]
    CellOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// An inbound payload is missing fields, carries invalid values, or does
    /// not fit the active document model.
    #[error("malformed operation: {0}")]
    Malformed(String),

    /// The transport refused an outbound message.
    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Shorthand for a [`Error::Malformed`] with a message.
    pub fn malformed(message: impl Into<String>) -> Error {
        return Error::Malformed(message.into());
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        return Error::Malformed(err.to_string());
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
