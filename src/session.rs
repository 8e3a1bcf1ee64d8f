//! An open document session.
//!
//! A [`Session`] owns the document model and the transport for one document.
//! It is created explicitly with [`Session::open`], which announces the
//! document to the authority, and ends with [`Session::close`], which hands
//! the transport back. Nothing is shared between sessions.
//!
//! Events are processed one at a time: a local edit, a `load` or an
//! `update`. The session relies on the transport to deliver updates in the
//! order the authority applied them and to deliver the `load` first; it does
//! not reorder, buffer or deduplicate anything itself. When an inbound
//! message is rejected the document is left untouched and the error is
//! returned, so the caller can decide to [`Session::resync`].

use std::sync::mpsc;

use tracing::info;
use tracing::info_span;
use tracing::warn;

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::model::DocumentModel;
use crate::model::Model;
use crate::protocol::Changes;
use crate::protocol::Inbound;
use crate::protocol::Outbound;

/// Carries outbound messages to the authority.
pub trait Transport {
    fn send(&mut self, message: Outbound) -> Result<()>;
}

/// A transport that keeps everything it is given, for relaying by hand.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    sent: Vec<Outbound>,
}

impl Outbox {
    pub fn new() -> Outbox {
        return Outbox { sent: Vec::new() };
    }

    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> &[Outbound] {
        return &self.sent;
    }

    /// Take every message sent so far.
    pub fn drain(&mut self) -> Vec<Outbound> {
        return std::mem::take(&mut self.sent);
    }
}

impl Transport for Outbox {
    fn send(&mut self, message: Outbound) -> Result<()> {
        self.sent.push(message);
        return Ok(());
    }
}

impl Transport for mpsc::Sender<Outbound> {
    fn send(&mut self, message: Outbound) -> Result<()> {
        return mpsc::Sender::send(self, message).map_err(|err| Error::Transport(err.to_string()));
    }
}

/// A document being edited, bound to one transport.
pub struct Session<M: DocumentModel = Model, T: Transport = Outbox> {
    doc_id: String,
    model: M,
    transport: T,
    loaded: bool,
}

impl<T: Transport> Session<Model, T> {
    /// Open a session whose model is chosen by `config`.
    pub fn with_config(config: &Config, doc_id: impl Into<String>, transport: T) -> Result<Self> {
        let model = Model::from_config(config)?;
        return Session::open(doc_id, model, transport);
    }
}

impl<M: DocumentModel, T: Transport> Session<M, T> {
    /// Open a session and send `join` for `doc_id`.
    pub fn open(doc_id: impl Into<String>, model: M, mut transport: T) -> Result<Self> {
        let doc_id = doc_id.into();
        transport.send(Outbound::Join { doc_id: doc_id.clone() })?;
        info!(doc_id = %doc_id, "opened session");
        return Ok(Session {
            doc_id,
            model,
            transport,
            loaded: false,
        });
    }

    pub fn doc_id(&self) -> &str {
        return &self.doc_id;
    }

    pub fn model(&self) -> &M {
        return &self.model;
    }

    pub fn transport(&self) -> &T {
        return &self.transport;
    }

    pub fn transport_mut(&mut self) -> &mut T {
        return &mut self.transport;
    }

    /// Whether a `load` has been received.
    pub fn is_loaded(&self) -> bool {
        return self.loaded;
    }

    pub fn snapshot(&self) -> M::Snapshot {
        return self.model.snapshot();
    }

    pub fn fingerprint(&self) -> blake3::Hash {
        return self.model.fingerprint();
    }

    /// Apply a local edit optimistically and send it.
    ///
    /// If the transport fails the local state keeps the edit; resync to
    /// recover.
    pub fn local_change(&mut self, edit: impl Into<M::Local>) -> Result<Option<Changes>> {
        let _span = info_span!("session", doc_id = %self.doc_id).entered();
        let Some(changes) = self.model.apply_local_change(edit.into())? else {
            return Ok(None);
        };
        self.transport.send(Outbound::Edit {
            doc_id: self.doc_id.clone(),
            changes: changes.clone(),
            version: self.model.version(),
        })?;
        return Ok(Some(changes));
    }

    /// Fold an inbound message into the document.
    pub fn receive(&mut self, inbound: Inbound) -> Result<()> {
        let _span = info_span!("session", doc_id = %self.doc_id).entered();
        let event = inbound.event();
        let result = match inbound {
            Inbound::Load(load) => {
                let result = self.model.load(load);
                self.loaded |= result.is_ok();
                result
            }
            Inbound::Update(update) => {
                if !self.loaded {
                    warn!("update received before load");
                }
                self.model.apply_remote_change(update)
            }
        };
        if let Err(err) = &result {
            warn!(event, error = %err, "rejected inbound message");
        }
        return result;
    }

    /// Decode and fold in a raw event from the transport.
    pub fn receive_raw(&mut self, event: &str, payload: &str) -> Result<()> {
        let inbound = Inbound::decode(event, payload).inspect_err(|err| {
            warn!(doc_id = %self.doc_id, event, error = %err, "undecodable inbound message");
        })?;
        return self.receive(inbound);
    }

    /// Ask the authority for a fresh snapshot.
    pub fn resync(&mut self) -> Result<()> {
        info!(doc_id = %self.doc_id, "requesting resync");
        return self.transport.send(Outbound::Join { doc_id: self.doc_id.clone() });
    }

    /// End the session, returning the transport.
    pub fn close(self) -> T {
        info!(doc_id = %self.doc_id, "closed session");
        return self.transport;
    }
}
