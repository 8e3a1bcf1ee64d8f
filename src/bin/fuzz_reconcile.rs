//! AFL fuzz harness for text reconciliation.
//!
//! Several sessions share a document through an in-memory authority that
//! applies each edit to its own copy and relays it to every other session
//! before the next edit happens. Checked after every step:
//! 1. Every session's content matches the authority's.
//! 2. Every caret lies within its session's content.
//! 3. Rejected inbound messages leave the session unchanged.

use afl::fuzz;
use tandem::apply::apply_in_place;
use tandem::model::TextEdit;
use tandem::model::TextModel;
use tandem::op::Operation;
use tandem::protocol::Changes;
use tandem::protocol::Inbound;
use tandem::protocol::Load;
use tandem::protocol::Outbound;
use tandem::protocol::Update;
use tandem::session::Outbox;
use tandem::session::Session;

const NUM_SESSIONS: usize = 3;

/// Operation types the fuzzer can generate
#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    /// Session types `len` characters at a fraction of the buffer
    Type { session: u8, pos_frac: u8, len: u8 },
    /// Session deletes a run of characters
    Erase { session: u8, pos_frac: u8, len: u8 },
    /// Session moves its caret without editing
    Move { session: u8, pos_frac: u8 },
    /// Authority sends a stale operation that must be rejected
    Stale { session: u8, len: u8 },
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        let (&kind, rest) = bytes.split_first()?;
        match kind % 4 {
            0 if rest.len() >= 3 => Some((
                FuzzOp::Type {
                    session: rest[0] % NUM_SESSIONS as u8,
                    pos_frac: rest[1],
                    len: (rest[2] % 8).saturating_add(1),
                },
                &rest[3..],
            )),
            1 if rest.len() >= 3 => Some((
                FuzzOp::Erase {
                    session: rest[0] % NUM_SESSIONS as u8,
                    pos_frac: rest[1],
                    len: (rest[2] % 8).saturating_add(1),
                },
                &rest[3..],
            )),
            2 if rest.len() >= 2 => Some((
                FuzzOp::Move {
                    session: rest[0] % NUM_SESSIONS as u8,
                    pos_frac: rest[1],
                },
                &rest[2..],
            )),
            3 if rest.len() >= 2 => Some((
                FuzzOp::Stale {
                    session: rest[0] % NUM_SESSIONS as u8,
                    len: rest[1],
                },
                &rest[2..],
            )),
            _ => None,
        }
    }
}

fn scaled(frac: u8, len: usize) -> usize {
    return frac as usize * len / u8::MAX as usize;
}

fn main() {
    fuzz!(|data: &[u8]| {
        let mut master: Vec<char> = "seed".chars().collect();
        let mut version = 1u64;
        let mut sessions: Vec<Session<TextModel>> = (0..NUM_SESSIONS)
            .map(|_| Session::open("fuzz", TextModel::new().versioned(true), Outbox::new()).unwrap())
            .collect();
        for session in &mut sessions {
            session.transport_mut().drain();
            let load = Load::Text { content: master.iter().collect(), version: Some(version) };
            session.receive(Inbound::Load(load)).unwrap();
        }

        let mut remaining = data;
        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;
            let (idx, edit) = match op {
                FuzzOp::Type { session, pos_frac, len } => {
                    let idx = session as usize;
                    let mut text: Vec<char> = sessions[idx].model().state().content.clone();
                    let pos = scaled(pos_frac, text.len());
                    let typed = (0..len).map(|i| (b'a' + i.wrapping_add(pos_frac) % 26) as char);
                    text.splice(pos..pos, typed);
                    (idx, TextEdit::new(text.iter().collect::<String>(), pos + len as usize))
                }
                FuzzOp::Erase { session, pos_frac, len } => {
                    let idx = session as usize;
                    let mut text: Vec<char> = sessions[idx].model().state().content.clone();
                    let pos = scaled(pos_frac, text.len());
                    let end = (pos + len as usize).min(text.len());
                    text.drain(pos..end);
                    (idx, TextEdit::new(text.iter().collect::<String>(), pos))
                }
                FuzzOp::Move { session, pos_frac } => {
                    let idx = session as usize;
                    let text: String = sessions[idx].model().text();
                    let caret = scaled(pos_frac, text.chars().count());
                    (idx, TextEdit::new(text, caret))
                }
                FuzzOp::Stale { session, len } => {
                    let idx = session as usize;
                    let before = sessions[idx].model().state().clone();
                    let caret = sessions[idx].model().caret();
                    let op = Operation::delete(before.len(), len as usize + 1);
                    let update = Inbound::Update(Update::Op { op, version: Some(version) });
                    assert!(sessions[idx].receive(update).is_err());
                    assert_eq!(sessions[idx].model().state(), &before);
                    assert_eq!(sessions[idx].model().caret(), caret);
                    continue;
                }
            };

            sessions[idx].local_change(edit).unwrap();
            for message in sessions[idx].transport_mut().drain() {
                let Outbound::Edit { changes, .. } = message else {
                    continue;
                };
                let Changes::Text(op) = &changes else {
                    panic!("text session sent grid changes");
                };
                apply_in_place(&mut master, op).unwrap();
                version += 1;
                for (other, session) in sessions.iter_mut().enumerate() {
                    if other != idx {
                        let update = changes.clone().into_update(Some(version));
                        session.receive(Inbound::Update(update)).unwrap();
                    }
                }
            }

            for session in &sessions {
                let state = session.model().state();
                assert_eq!(state.content, master, "replica diverged");
                assert!(session.model().caret() <= state.len(), "caret out of bounds");
            }
        }

        let fingerprint = sessions[0].fingerprint();
        for session in &sessions[1..] {
            assert_eq!(session.fingerprint(), fingerprint);
        }
    });
}
