//! Two editors sharing a document through a hand-driven relay.
//!
//! Logging honors `TANDEM_LOG`, then `RUST_LOG`, and defaults to `info`.

use std::env;

use tandem::config::Config;
use tandem::config::ModelKind;
use tandem::model::CellEdit;
use tandem::model::DocumentModel;
use tandem::model::Snapshot;
use tandem::model::TextEdit;
use tandem::protocol::Inbound;
use tandem::protocol::Load;
use tandem::protocol::Outbound;
use tandem::session::Outbox;
use tandem::session::Session;
use tracing_subscriber::EnvFilter;

type Error = Box<dyn std::error::Error + Send + Sync>;

fn filter() -> EnvFilter {
    if let Ok(level) = env::var("TANDEM_LOG") {
        return EnvFilter::new(level);
    }
    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }
    return EnvFilter::new("info");
}

/// Forward everything `from` sent as an update to `to`.
fn relay(from: &mut Session, to: &mut Session) -> Result<(), Error> {
    for message in from.transport_mut().drain() {
        if let Outbound::Edit { changes, version, .. } = message {
            to.receive(Inbound::Update(changes.into_update(version)))?;
        }
    }
    return Ok(());
}

fn show(name: &str, session: &Session) {
    match session.snapshot() {
        Snapshot::Text(state) => {
            println!("{name:>6} v{}: {:?}", state.version, state.text());
        }
        Snapshot::Grid(grid) => {
            println!("{name:>6}:");
            for line in grid.to_string().lines() {
                println!("        |{line}|");
            }
        }
    }
}

fn text_demo() -> Result<(), Error> {
    let config = Config {
        versioned: true,
        ..Config::default()
    };
    let mut alice = Session::with_config(&config, "notes", Outbox::new())?;
    let mut bob = Session::with_config(&config, "notes", Outbox::new())?;
    alice.transport_mut().drain();
    bob.transport_mut().drain();

    let load = Load::Text { content: "hello world".into(), version: Some(1) };
    alice.receive(Inbound::Load(load.clone()))?;
    bob.receive(Inbound::Load(load))?;

    // Bob's caret sits before "world".
    bob.local_change(TextEdit::new("hello world", 6))?;

    alice.local_change(TextEdit::new(">> hello world", 3))?;
    relay(&mut alice, &mut bob)?;
    bob.local_change(TextEdit::new(">> hello big world", 13))?;
    relay(&mut bob, &mut alice)?;

    show("alice", &alice);
    show("bob", &bob);
    if let tandem::model::Model::Text(model) = bob.model() {
        println!("   bob caret: {}", model.caret());
    }
    println!("   in sync: {}", alice.fingerprint() == bob.fingerprint());
    return Ok(());
}

fn grid_demo() -> Result<(), Error> {
    let config = Config {
        model: ModelKind::Grid,
        rows: 3,
        cols: 8,
        blank: '.',
        ..Config::default()
    };
    let mut alice = Session::with_config(&config, "board", Outbox::new())?;
    let mut bob = Session::with_config(&config, "board", Outbox::new())?;
    alice.transport_mut().drain();
    bob.transport_mut().drain();

    let empty = Load::Grid { grid_map: Default::default() };
    alice.receive(Inbound::Load(empty.clone()))?;
    bob.receive(Inbound::Load(empty))?;

    for (col, c) in "tandem".chars().enumerate() {
        alice.local_change(CellEdit::new(0, col, c.to_string()))?;
    }
    bob.local_change(CellEdit::new(1, 2, "ok"))?;
    alice.local_change(CellEdit::new(0, 5, ""))?;
    relay(&mut alice, &mut bob)?;
    relay(&mut bob, &mut alice)?;

    show("alice", &alice);
    show("bob", &bob);
    println!("   in sync: {}", alice.model().fingerprint() == bob.model().fingerprint());
    return Ok(());
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().with_env_filter(filter()).init();
    text_demo()?;
    grid_demo()?;
    return Ok(());
}
