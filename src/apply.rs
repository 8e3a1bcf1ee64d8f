//! Applying operations to text content.
//!
//! Both entry points check the operation against the content first and only
//! then write, so a rejected operation never leaves partial changes behind.
//! Re-applying an operation to content it was already applied to is not
//! detected here; ordering is the transport's job.

use tracing::debug;

use crate::error::Error;
use crate::error::Result;
use crate::op::Operation;

/// Check that `op` is well-formed and fits content of `len` characters.
pub fn check(op: &Operation, len: usize) -> Result<()> {
    op.validate()?;
    match op {
        Operation::Insert { position, .. } => {
            if *position > len {
                return Err(Error::OutOfRange {
                    position: *position,
                    length: 0,
                    len,
                });
            }
        }
        Operation::Delete { position, length } => {
            let in_range = position
                .checked_add(*length)
                .is_some_and(|end| end <= len);
            if !in_range {
                return Err(Error::OutOfRange {
                    position: *position,
                    length: *length,
                    len,
                });
            }
        }
    }
    return Ok(());
}

/// Apply `op` to `content`, returning the new content.
pub fn apply(content: &[char], op: &Operation) -> Result<Vec<char>> {
    check(op, content.len())?;
    let mut result = Vec::with_capacity((content.len() as isize + op.delta()).max(0) as usize);
    match op {
        Operation::Insert { position, text } => {
            result.extend_from_slice(&content[..*position]);
            result.extend(text.chars());
            result.extend_from_slice(&content[*position..]);
        }
        Operation::Delete { position, length } => {
            result.extend_from_slice(&content[..*position]);
            result.extend_from_slice(&content[*position + *length..]);
        }
    }
    return Ok(result);
}

/// Apply `op` to `content` in place.
pub fn apply_in_place(content: &mut Vec<char>, op: &Operation) -> Result<()> {
    check(op, content.len())?;
    match op {
        Operation::Insert { position, text } => {
            content.splice(*position..*position, text.chars());
        }
        Operation::Delete { position, length } => {
            content.drain(*position..*position + *length);
        }
    }
    debug!(position = op.position(), delta = op.delta(), len = content.len(), "applied operation");
    return Ok(());
}

/// Apply `op` to a string.
pub fn apply_str(content: &str, op: &Operation) -> Result<String> {
    let chars: Vec<char> = content.chars().collect();
    return Ok(apply(&chars, op)?.into_iter().collect());
}
