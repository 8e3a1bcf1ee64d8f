//! Messages exchanged with the authority.
//!
//! The transport moves named events with JSON payloads. Outbound we send
//! `join` once per session and `edit` for every local change. Inbound we get
//! `load`, a full snapshot that always comes first, and `update`, which is
//! either a snapshot, a grid delta, or a single text operation.
//!
//! Payload shapes are distinguished structurally, the same way the
//! authority produces them:
//!
//! ```text
//! load    {"content": "..."}            {"content": "...", "version": 3}
//!         {"gridMap": {"0,0": "a"}}
//! update  {"op": {...}, "version": 4}   {"content": "..."}
//!         {"gridMap": {...}}            {"0,0": "a", "1,2": null}
//! ```

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::Error;
use crate::error::Result;
use crate::grid::Delta;
use crate::op::Operation;

/// The change carried by an `edit` message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Changes {
    Text(Operation),
    Grid(Delta),
}

impl Changes {
    /// The update the authority relays to other sessions for this change.
    pub fn into_update(self, version: Option<u64>) -> Update {
        return match self {
            Changes::Text(op) => Update::Op { op, version },
            Changes::Grid(delta) => Update::Delta(delta),
        };
    }
}

/// A message for the authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outbound {
    Edit {
        doc_id: String,
        changes: Changes,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<u64>,
    },
    Join {
        doc_id: String,
    },
}

impl Outbound {
    /// The event name the payload is sent under.
    pub fn event(&self) -> &'static str {
        return match self {
            Outbound::Join { .. } => "join",
            Outbound::Edit { .. } => "edit",
        };
    }

    pub fn doc_id(&self) -> &str {
        return match self {
            Outbound::Join { doc_id } => doc_id,
            Outbound::Edit { doc_id, .. } => doc_id,
        };
    }

    /// The JSON payload.
    pub fn payload(&self) -> Result<String> {
        return Ok(serde_json::to_string(self)?);
    }
}

/// A full snapshot replacing local state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Load {
    /// Grid payloads may also carry a flattened `content`; the map wins.
    Grid {
        #[serde(rename = "gridMap")]
        grid_map: Delta,
    },
    Text {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<u64>,
    },
}

/// A remote change to fold into local state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Update {
    Op {
        op: Operation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<u64>,
    },
    Grid {
        #[serde(rename = "gridMap")]
        grid_map: Delta,
    },
    Text {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<u64>,
    },
    Delta(Delta),
}

impl Load {
    /// Pick the payload shape by its keys: `gridMap` first, then `content`.
    fn from_value(value: &Value) -> Result<Load> {
        let fields = object(value, "load")?;
        if let Some(grid_map) = field(fields, "gridMap")? {
            return Ok(Load::Grid { grid_map });
        }
        if let Some(content) = field(fields, "content")? {
            let version = field(fields, "version")?;
            return Ok(Load::Text { content, version });
        }
        return Err(Error::malformed("load has neither `content` nor `gridMap`"));
    }
}

impl Update {
    /// Pick the payload shape by its keys: `op`, `gridMap`, `content`, and
    /// otherwise a bare cell map.
    fn from_value(value: &Value) -> Result<Update> {
        let fields = object(value, "update")?;
        if let Some(op) = field::<Operation>(fields, "op")? {
            op.validate()?;
            let version = field(fields, "version")?;
            return Ok(Update::Op { op, version });
        }
        if let Some(grid_map) = field(fields, "gridMap")? {
            return Ok(Update::Grid { grid_map });
        }
        if let Some(content) = field(fields, "content")? {
            let version = field(fields, "version")?;
            return Ok(Update::Text { content, version });
        }
        let delta = Delta::deserialize(value)
            .map_err(|err| Error::malformed(format!("update cell map: {err}")))?;
        return Ok(Update::Delta(delta));
    }
}

fn object<'a>(value: &'a Value, event: &str) -> Result<&'a Map<String, Value>> {
    return value
        .as_object()
        .ok_or_else(|| Error::malformed(format!("{event} payload is not an object")));
}

/// Decode `key` if it is present and not null.
fn field<'a, T: Deserialize<'a>>(fields: &'a Map<String, Value>, key: &str) -> Result<Option<T>> {
    return match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|err| Error::malformed(format!("`{key}`: {err}"))),
    };
}

/// A message from the authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound {
    Load(Load),
    Update(Update),
}

impl Inbound {
    /// Decode an event received from the transport.
    pub fn decode(event: &str, payload: &str) -> Result<Inbound> {
        return match event {
            "load" => Ok(Inbound::Load(Load::from_value(&serde_json::from_str(payload)?)?)),
            "update" => Ok(Inbound::Update(Update::from_value(&serde_json::from_str(payload)?)?)),
            other => Err(Error::malformed(format!("unknown event {other:?}"))),
        };
    }

    pub fn event(&self) -> &'static str {
        return match self {
            Inbound::Load(_) => "load",
            Inbound::Update(_) => "update",
        };
    }

    /// The JSON payload, as the authority would send it.
    pub fn payload(&self) -> Result<String> {
        return match self {
            Inbound::Load(load) => Ok(serde_json::to_string(load)?),
            Inbound::Update(update) => Ok(serde_json::to_string(update)?),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Coord;

    #[test]
    fn join_payload() {
        let join = Outbound::Join { doc_id: "notes".into() };
        assert_eq!(join.event(), "join");
        assert_eq!(join.payload().unwrap(), r#"{"doc_id":"notes"}"#);
    }

    #[test]
    fn versioned_text_edit_payload() {
        let edit = Outbound::Edit {
            doc_id: "notes".into(),
            changes: Changes::Text(Operation::insert(2, "XY")),
            version: Some(3),
        };
        assert_eq!(edit.event(), "edit");
        assert_eq!(
            edit.payload().unwrap(),
            r#"{"doc_id":"notes","changes":{"type":"insert","position":2,"text":"XY"},"version":3}"#
        );
    }

    #[test]
    fn grid_edit_payload_omits_version() {
        let mut delta = Delta::new();
        delta.insert(Coord::new(0, 1), None);
        let edit = Outbound::Edit {
            doc_id: "g".into(),
            changes: Changes::Grid(delta),
            version: None,
        };
        assert_eq!(edit.payload().unwrap(), r#"{"doc_id":"g","changes":{"0,1":null}}"#);
    }

    #[test]
    fn outbound_decodes_back() {
        let edit = Outbound::Edit {
            doc_id: "d".into(),
            changes: Changes::Text(Operation::delete(1, 2)),
            version: None,
        };
        let back: Outbound = serde_json::from_str(&edit.payload().unwrap()).unwrap();
        assert_eq!(back, edit);
    }

    #[test]
    fn load_text() {
        let inbound = Inbound::decode("load", r#"{"content":"hello","version":7}"#).unwrap();
        assert_eq!(
            inbound,
            Inbound::Load(Load::Text { content: "hello".into(), version: Some(7) })
        );
    }

    #[test]
    fn load_grid_prefers_map() {
        let inbound =
            Inbound::decode("load", r#"{"content":"a","gridMap":{"0,0":"a"}}"#).unwrap();
        let Inbound::Load(Load::Grid { grid_map }) = inbound else {
            panic!("expected grid load");
        };
        assert_eq!(grid_map.get(&Coord::new(0, 0)), Some(&Some('a')));
    }

    #[test]
    fn update_shapes() {
        assert!(matches!(
            Inbound::decode("update", r#"{"op":{"type":"delete","position":0,"length":1},"version":2}"#),
            Ok(Inbound::Update(Update::Op { version: Some(2), .. }))
        ));
        assert!(matches!(
            Inbound::decode("update", r#"{"content":"x"}"#),
            Ok(Inbound::Update(Update::Text { version: None, .. }))
        ));
        assert!(matches!(
            Inbound::decode("update", r#"{"gridMap":{}}"#),
            Ok(Inbound::Update(Update::Grid { .. }))
        ));
        assert!(matches!(
            Inbound::decode("update", r#"{"1,2":null,"0,0":"q"}"#),
            Ok(Inbound::Update(Update::Delta(_)))
        ));
    }

    #[test]
    fn malformed_payloads() {
        for (event, payload) in [
            ("update", r#"{"op":{"type":"insert","position":1}}"#),
            ("update", r#"{"op":{"type":"insert","position":1,"text":""}}"#),
            ("update", r#"{"op":{"type":"delete","position":1,"length":0}}"#),
            ("update", r#"{"not a key":"x"}"#),
            ("update", r#"{"0,0":"xy"}"#),
            ("update", "[1,2,3]"),
            ("load", r#"{"version":1}"#),
            ("load", "not json"),
            ("rename", "{}"),
        ] {
            assert!(
                matches!(Inbound::decode(event, payload), Err(Error::Malformed(_))),
                "{event} {payload} should be malformed"
            );
        }
    }

    #[test]
    fn malformed_reasons_name_the_field() {
        let Err(Error::Malformed(reason)) =
            Inbound::decode("update", r#"{"op":{"type":"insert","position":1}}"#)
        else {
            panic!("expected a malformed op");
        };
        assert!(reason.starts_with("`op`"), "{reason}");

        let Err(Error::Malformed(reason)) = Inbound::decode("load", r#"{"version":1}"#) else {
            panic!("expected a malformed load");
        };
        assert_eq!(reason, "load has neither `content` nor `gridMap`");

        let Err(Error::Malformed(reason)) = Inbound::decode("update", "[1,2,3]") else {
            panic!("expected a malformed update");
        };
        assert_eq!(reason, "update payload is not an object");
    }

    #[test]
    fn legacy_op_shapes_decode() {
        assert_eq!(
            Inbound::decode("update", r#"{"op":{"type":"insert","character":"XY","position":2,"len":2}}"#)
                .unwrap(),
            Inbound::Update(Update::Op { op: Operation::insert(2, "XY"), version: None })
        );
        assert_eq!(
            Inbound::decode("update", r#"{"op":{"type":"delete","position":0,"len":2},"version":null}"#)
                .unwrap(),
            Inbound::Update(Update::Op { op: Operation::delete(0, 2), version: None })
        );
    }

    #[test]
    fn inbound_payload_round_trips() {
        let update = Inbound::Update(Update::Op { op: Operation::insert(0, "a"), version: Some(1) });
        let back = Inbound::decode(update.event(), &update.payload().unwrap()).unwrap();
        assert_eq!(back, update);
    }
}
