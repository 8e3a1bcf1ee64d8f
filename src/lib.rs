//! Tandem - change reconciliation for a collaborative editor client.
//!
//! An editing surface reports what its buffer looks like after each local
//! edit. Tandem turns that into a small operation to send to the authority,
//! applies operations relayed back from other clients, and keeps the local
//! caret anchored while the text moves under it. Concurrent edits are not
//! merged here: the authority serializes them and we apply them in order.
//!
//! Two document models are supported behind [`model::DocumentModel`]: a
//! linear string, and a fixed-size grid of single-character cells.
//!
//! # Quick Start
//!
//! ```
//! use tandem::model::{DocumentModel, TextEdit, TextModel};
//! use tandem::op::Operation;
//! use tandem::protocol::{Changes, Load, Update};
//!
//! let mut doc = TextModel::new();
//! doc.load(Load::Text { content: "helo".into(), version: None }).unwrap();
//!
//! // The text control now reads "hello" with the caret after the new 'l'.
//! let changes = doc.apply_local_change(TextEdit::new("hello", 4)).unwrap();
//! assert_eq!(changes, Some(Changes::Text(Operation::insert(3, "l"))));
//!
//! // Someone else typed at the front; our caret moves along.
//! doc.apply_remote_change(Update::Op { op: Operation::insert(0, ">> "), version: None }).unwrap();
//! assert_eq!(doc.text(), ">> hello");
//! assert_eq!(doc.caret(), 7);
//! ```

pub mod apply;
pub mod config;
pub mod cursor;
pub mod diff;
pub mod error;
pub mod grid;
pub mod model;
pub mod op;
pub mod protocol;
pub mod session;

pub use error::Error;
pub use error::Result;
