//! Operations on a linear text document.
//!
//! An operation describes one contiguous change: either some text inserted
//! at a position, or a run of characters removed starting at a position.
//! Positions and lengths count `char`s, not bytes.
//!
//! On the wire an operation is a tagged JSON object:
//!
//! ```text
//! {"type": "insert", "position": 2, "text": "XY"}
//! {"type": "delete", "position": 0, "length": 2}
//! ```
//!
//! Older clients send `character` for the inserted text and `len` for the
//! deleted length. Both are accepted; a `len` on an insert is ignored.

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;

/// A single contiguous edit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Splice `text` in before the character at `position`.
    Insert {
        position: usize,
        #[serde(alias = "character")]
        text: String,
    },
    /// Remove `length` characters starting at `position`.
    Delete {
        position: usize,
        #[serde(alias = "len")]
        length: usize,
    },
}

impl Operation {
    /// Create an insert operation.
    pub fn insert(position: usize, text: impl Into<String>) -> Operation {
        return Operation::Insert {
            position,
            text: text.into(),
        };
    }

    /// Create a delete operation.
    pub fn delete(position: usize, length: usize) -> Operation {
        return Operation::Delete { position, length };
    }

    /// The position the operation starts at.
    pub fn position(&self) -> usize {
        return match self {
            Operation::Insert { position, .. } => *position,
            Operation::Delete { position, .. } => *position,
        };
    }

    /// Number of characters inserted or removed.
    pub fn len(&self) -> usize {
        return match self {
            Operation::Insert { text, .. } => text.chars().count(),
            Operation::Delete { length, .. } => *length,
        };
    }

    /// True for a degenerate operation that changes nothing.
    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// How much the operation changes the content length by.
    pub fn delta(&self) -> isize {
        return match self {
            Operation::Insert { .. } => self.len() as isize,
            Operation::Delete { length, .. } => -(*length as isize),
        };
    }

    /// Check the shape of an operation, independent of any content.
    ///
    /// Inserts must carry text and deletes must remove something.
    pub fn validate(&self) -> Result<()> {
        return match self {
            Operation::Insert { text, .. } if text.is_empty() => Err(Error::malformed("insert with empty text")),
            Operation::Delete { length: 0, .. } => Err(Error::malformed("delete with zero length")),
            _ => Ok(()),
        };
    }
}
