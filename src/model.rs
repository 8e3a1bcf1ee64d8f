//! Document models a session can edit.
//!
//! A session owns exactly one model, chosen when it opens. Both models
//! expose the same capabilities through [`DocumentModel`]:
//!
//! - `load` replaces the state wholesale from a snapshot;
//! - `apply_local_change` records a local edit and returns what to send;
//! - `apply_remote_change` folds in a change relayed by the authority;
//! - `snapshot` renders the current state.
//!
//! Every method that takes a payload validates it completely before writing,
//! so on error the model is exactly as it was.

use tracing::debug;
use tracing::warn;

use crate::apply::apply;
use crate::apply::apply_in_place;
use crate::config::Config;
use crate::config::ModelKind;
use crate::cursor::CursorTracker;
use crate::diff::Diff;
use crate::diff::PrefixDiff;
use crate::error::Error;
use crate::error::Result;
use crate::grid::GridState;
use crate::grid::Materialized;
use crate::protocol::Changes;
use crate::protocol::Load;
use crate::protocol::Update;

/// The capability set shared by all document models.
pub trait DocumentModel {
    /// A local edit as reported by the editing surface.
    type Local;
    /// A rendering of the current state.
    type Snapshot;

    /// Replace the state with a snapshot from the authority.
    fn load(&mut self, load: Load) -> Result<()>;

    /// Record a local edit. Returns the change to transmit, if any.
    fn apply_local_change(&mut self, edit: Self::Local) -> Result<Option<Changes>>;

    /// Fold in a change relayed by the authority.
    fn apply_remote_change(&mut self, update: Update) -> Result<()>;

    fn snapshot(&self) -> Self::Snapshot;

    /// Version to stamp outbound edits with, if this model sequences them.
    fn version(&self) -> Option<u64> {
        return None;
    }

    /// Hash of the canonical content, for comparing replicas.
    fn fingerprint(&self) -> blake3::Hash;
}

// =============================================================================
// Linear text
// =============================================================================

/// Content and version of a linear text document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentState {
    pub content: Vec<char>,
    pub version: u64,
}

impl DocumentState {
    pub fn new(content: &str, version: u64) -> DocumentState {
        return DocumentState {
            content: content.chars().collect(),
            version,
        };
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        return self.content.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.content.is_empty();
    }

    pub fn text(&self) -> String {
        return self.content.iter().collect();
    }
}

/// A local edit to a text control: its new value and where the caret ended up.
///
/// `content` is diffed against the model's own text, not against the
/// previous value of the control. When the diff cannot express an edit (a
/// same-length substitution, or changes in two places) the model keeps its
/// text, and the caller should reset the control from [`TextModel::text`]
/// so that later edits are diffed against what the user sees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub content: String,
    pub caret: usize,
}

impl TextEdit {
    pub fn new(content: impl Into<String>, caret: usize) -> TextEdit {
        return TextEdit {
            content: content.into(),
            caret,
        };
    }
}

/// A linear text document with a local caret.
#[derive(Clone, Debug)]
pub struct TextModel<D: Diff = PrefixDiff> {
    state: DocumentState,
    cursor: CursorTracker,
    differ: D,
    versioned: bool,
}

impl TextModel {
    pub fn new() -> TextModel {
        return TextModel::with_diff(PrefixDiff);
    }
}

impl Default for TextModel {
    fn default() -> Self {
        return Self::new();
    }
}

impl<D: Diff> TextModel<D> {
    /// A text model using a custom differ.
    pub fn with_diff(differ: D) -> TextModel<D> {
        return TextModel {
            state: DocumentState::default(),
            cursor: CursorTracker::new(),
            differ,
            versioned: false,
        };
    }

    /// Whether outbound edits carry the document version.
    pub fn versioned(mut self, versioned: bool) -> TextModel<D> {
        self.versioned = versioned;
        return self;
    }

    pub fn state(&self) -> &DocumentState {
        return &self.state;
    }

    /// The local caret, in characters.
    pub fn caret(&self) -> usize {
        return self.cursor.caret();
    }

    pub fn text(&self) -> String {
        return self.state.text();
    }

    /// Swap in new content from a remote change, moving the caret with it.
    fn replace_remote(&mut self, content: Vec<char>, version: Option<u64>) {
        let caret = self.cursor.on_remote(&self.state.content, &content);
        self.state.content = content;
        self.advance_version(version);
        debug!(len = self.state.len(), version = self.state.version, caret, "applied remote change");
    }

    fn advance_version(&mut self, version: Option<u64>) {
        self.state.version = match version {
            Some(v) if v > self.state.version => v,
            Some(v) => {
                warn!(received = v, current = self.state.version, "remote version did not advance");
                self.state.version.saturating_add(1)
            }
            None => self.state.version.saturating_add(1),
        };
    }
}

impl<D: Diff> DocumentModel for TextModel<D> {
    type Local = TextEdit;
    type Snapshot = DocumentState;

    fn load(&mut self, load: Load) -> Result<()> {
        let Load::Text { content, version } = load else {
            return Err(Error::malformed("grid snapshot sent to a text document"));
        };
        self.state = DocumentState::new(&content, version.unwrap_or(0));
        self.cursor.set(self.cursor.caret(), self.state.len());
        debug!(len = self.state.len(), version = self.state.version, "loaded text snapshot");
        return Ok(());
    }

    /// Diff the control's value against the current text and apply the
    /// result. Whatever the diff could not capture stays out of the model;
    /// see [`TextEdit`].
    fn apply_local_change(&mut self, edit: TextEdit) -> Result<Option<Changes>> {
        let new: Vec<char> = edit.content.chars().collect();
        let Some(op) = self.differ.diff(&self.state.content, &new) else {
            self.cursor.set(edit.caret, self.state.len());
            return Ok(None);
        };
        apply_in_place(&mut self.state.content, &op)?;
        self.state.version = self.state.version.saturating_add(1);
        self.cursor.set(edit.caret, self.state.len());
        return Ok(Some(Changes::Text(op)));
    }

    fn apply_remote_change(&mut self, update: Update) -> Result<()> {
        match update {
            Update::Op { op, version } => {
                let content = apply(&self.state.content, &op)?;
                self.replace_remote(content, version);
            }
            Update::Text { content, version } => {
                self.replace_remote(content.chars().collect(), version);
            }
            Update::Grid { .. } | Update::Delta(_) => {
                return Err(Error::malformed("grid update sent to a text document"));
            }
        }
        return Ok(());
    }

    fn snapshot(&self) -> DocumentState {
        return self.state.clone();
    }

    fn version(&self) -> Option<u64> {
        if self.versioned {
            return Some(self.state.version);
        }
        return None;
    }

    fn fingerprint(&self) -> blake3::Hash {
        return blake3::hash(self.state.text().as_bytes());
    }
}

// =============================================================================
// Sparse grid
// =============================================================================

/// A local edit of one grid cell: the raw value of the cell's input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellEdit {
    pub row: usize,
    pub col: usize,
    pub input: String,
}

impl CellEdit {
    pub fn new(row: usize, col: usize, input: impl Into<String>) -> CellEdit {
        return CellEdit {
            row,
            col,
            input: input.into(),
        };
    }
}

/// A fixed-size grid document.
#[derive(Clone, Debug)]
pub struct GridModel {
    grid: GridState,
    blank: char,
}

impl GridModel {
    pub fn new(rows: usize, cols: usize) -> GridModel {
        return GridModel {
            grid: GridState::new(rows, cols),
            blank: ' ',
        };
    }

    /// Character used for empty cells in snapshots.
    pub fn blank(mut self, blank: char) -> GridModel {
        self.blank = blank;
        return self;
    }

    pub fn grid(&self) -> &GridState {
        return &self.grid;
    }

    /// Change the grid size, dropping cells that no longer fit.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.grid.resize(rows, cols);
    }
}

impl DocumentModel for GridModel {
    type Local = CellEdit;
    type Snapshot = Materialized;

    fn load(&mut self, load: Load) -> Result<()> {
        let Load::Grid { grid_map } = load else {
            return Err(Error::malformed("text snapshot sent to a grid document"));
        };
        self.grid.replace(&grid_map);
        debug!(cells = self.grid.len(), "loaded grid snapshot");
        return Ok(());
    }

    fn apply_local_change(&mut self, edit: CellEdit) -> Result<Option<Changes>> {
        let op = self.grid.cell_edited(edit.row, edit.col, &edit.input)?;
        return Ok(Some(Changes::Grid(op.into_delta())));
    }

    fn apply_remote_change(&mut self, update: Update) -> Result<()> {
        match update {
            Update::Delta(delta) => self.grid.apply_delta(&delta),
            Update::Grid { grid_map } => self.grid.replace(&grid_map),
            Update::Op { .. } | Update::Text { .. } => {
                return Err(Error::malformed("text update sent to a grid document"));
            }
        }
        debug!(cells = self.grid.len(), "applied remote grid change");
        return Ok(());
    }

    fn snapshot(&self) -> Materialized {
        return self.grid.materialize(self.blank);
    }

    fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.grid.rows() as u64).to_le_bytes());
        hasher.update(&(self.grid.cols() as u64).to_le_bytes());
        for (key, value) in self.grid.to_map() {
            hasher.update(&(key.row as u64).to_le_bytes());
            hasher.update(&(key.col as u64).to_le_bytes());
            hasher.update(&(value.map_or(0, u32::from)).to_le_bytes());
        }
        return hasher.finalize();
    }
}

// =============================================================================
// Selected per session
// =============================================================================

/// A local edit for either model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocalChange {
    Text(TextEdit),
    Cell(CellEdit),
}

impl From<TextEdit> for LocalChange {
    fn from(edit: TextEdit) -> LocalChange {
        return LocalChange::Text(edit);
    }
}

impl From<CellEdit> for LocalChange {
    fn from(edit: CellEdit) -> LocalChange {
        return LocalChange::Cell(edit);
    }
}

/// A snapshot of either model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Snapshot {
    Text(DocumentState),
    Grid(Materialized),
}

/// The model chosen by a session's [`Config`].
#[derive(Clone, Debug)]
pub enum Model {
    Text(TextModel),
    Grid(GridModel),
}

impl Model {
    pub fn from_config(config: &Config) -> Result<Model> {
        config.validate()?;
        let model = match config.model {
            ModelKind::Text => Model::Text(TextModel::new().versioned(config.versioned)),
            ModelKind::Grid => Model::Grid(GridModel::new(config.rows, config.cols).blank(config.blank)),
        };
        return Ok(model);
    }

    pub fn kind(&self) -> ModelKind {
        return match self {
            Model::Text(_) => ModelKind::Text,
            Model::Grid(_) => ModelKind::Grid,
        };
    }
}

impl DocumentModel for Model {
    type Local = LocalChange;
    type Snapshot = Snapshot;

    fn load(&mut self, load: Load) -> Result<()> {
        return match self {
            Model::Text(model) => model.load(load),
            Model::Grid(model) => model.load(load),
        };
    }

    fn apply_local_change(&mut self, edit: LocalChange) -> Result<Option<Changes>> {
        return match (self, edit) {
            (Model::Text(model), LocalChange::Text(edit)) => model.apply_local_change(edit),
            (Model::Grid(model), LocalChange::Cell(edit)) => model.apply_local_change(edit),
            (Model::Text(_), LocalChange::Cell(_)) => Err(Error::malformed("cell edit on a text document")),
            (Model::Grid(_), LocalChange::Text(_)) => Err(Error::malformed("text edit on a grid document")),
        };
    }

    fn apply_remote_change(&mut self, update: Update) -> Result<()> {
        return match self {
            Model::Text(model) => model.apply_remote_change(update),
            Model::Grid(model) => model.apply_remote_change(update),
        };
    }

    fn snapshot(&self) -> Snapshot {
        return match self {
            Model::Text(model) => Snapshot::Text(model.snapshot()),
            Model::Grid(model) => Snapshot::Grid(model.snapshot()),
        };
    }

    fn version(&self) -> Option<u64> {
        return match self {
            Model::Text(model) => model.version(),
            Model::Grid(model) => model.version(),
        };
    }

    fn fingerprint(&self) -> blake3::Hash {
        return match self {
            Model::Text(model) => model.fingerprint(),
            Model::Grid(model) => model.fingerprint(),
        };
    }
}
