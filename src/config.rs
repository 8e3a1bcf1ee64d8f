//! Session configuration.
//!
//! All fields are optional in the serialized form:
//!
//! ```text
//! {"model": "grid", "rows": 10, "cols": 20, "blank": " ", "versioned": false}
//! ```

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;

/// Which document model a session edits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// A linear string edited through a single text control.
    #[default]
    Text,
    /// A fixed-size grid of single-character cells.
    Grid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelKind,
    /// Grid height.
    pub rows: usize,
    /// Grid width.
    pub cols: usize,
    /// Fill character for empty grid cells when materializing.
    pub blank: char,
    /// Stamp outbound text edits with the document version.
    pub versioned: bool,
}

impl Default for Config {
    fn default() -> Self {
        return Config {
            model: ModelKind::Text,
            rows: 10,
            cols: 20,
            blank: ' ',
            versioned: false,
        };
    }
}

impl Config {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Config> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        return Ok(config);
    }

    /// Reject configurations no session could use.
    pub fn validate(&self) -> Result<()> {
        if self.model == ModelKind::Grid && (self.rows == 0 || self.cols == 0) {
            return Err(Error::malformed(format!(
                "grid must have at least one cell, got {}x{}",
                self.rows, self.cols
            )));
        }
        return Ok(());
    }
}
