//! A fixed-size character grid stored sparsely.
//!
//! The grid editing surface is a `rows x cols` matrix of single-character
//! cells. Only occupied cells are stored, keyed by [`Coord`]. Cells outside
//! the grid are never stored: edits addressed there are dropped, and
//! shrinking the grid drops whatever fell off the edge.
//!
//! Local edits produce a [`CellOperation`]; remote changes arrive as a
//! [`Delta`], a batch of per-cell values where `None` clears the cell.
//! Applying a delta is last-write-wins per cell, so applying the same delta
//! twice is a no-op and deltas over distinct cells commute.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::error::Error;
use crate::error::Result;

/// A cell address. Serialized as `"row,col"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Coord {
        return Coord { row, col };
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{},{}", self.row, self.col);
    }
}

impl FromStr for Coord {
    type Err = Error;

    fn from_str(s: &str) -> Result<Coord> {
        let (row, col) = s
            .split_once(',')
            .ok_or_else(|| Error::malformed(format!("cell key {s:?} is not \"row,col\"")))?;
        let row = row
            .trim()
            .parse()
            .map_err(|_| Error::malformed(format!("bad row in cell key {s:?}")))?;
        let col = col
            .trim()
            .parse()
            .map_err(|_| Error::malformed(format!("bad column in cell key {s:?}")))?;
        return Ok(Coord { row, col });
    }
}

impl TryFrom<String> for Coord {
    type Error = Error;

    fn try_from(s: String) -> Result<Coord> {
        return s.parse();
    }
}

impl From<Coord> for String {
    fn from(coord: Coord) -> String {
        return coord.to_string();
    }
}

/// What a cell edit leaves behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellValue {
    Char(char),
    Clear,
}

impl From<CellValue> for Option<char> {
    fn from(value: CellValue) -> Option<char> {
        return match value {
            CellValue::Char(c) => Some(c),
            CellValue::Clear => None,
        };
    }
}

impl From<Option<char>> for CellValue {
    fn from(value: Option<char>) -> CellValue {
        return match value {
            Some(c) => CellValue::Char(c),
            None => CellValue::Clear,
        };
    }
}

/// A point mutation of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellOperation {
    pub key: Coord,
    pub value: CellValue,
}

impl CellOperation {
    /// Wrap this operation as a single-entry delta for transmission.
    pub fn into_delta(self) -> Delta {
        let mut delta = Delta::new();
        delta.insert(self.key, self.value.into());
        return delta;
    }
}

/// A batch of cell values; `None` clears the cell.
///
/// Ordered so the wire form is deterministic.
pub type Delta = BTreeMap<Coord, Option<char>>;

/// Sparse grid document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridState {
    cells: FxHashMap<Coord, char>,
    rows: usize,
    cols: usize,
}

impl GridState {
    /// An empty grid of the given size.
    pub fn new(rows: usize, cols: usize) -> GridState {
        return GridState {
            cells: FxHashMap::default(),
            rows,
            cols,
        };
    }

    pub fn rows(&self) -> usize {
        return self.rows;
    }

    pub fn cols(&self) -> usize {
        return self.cols;
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        return self.cells.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.cells.is_empty();
    }

    /// Whether `coord` lies inside the grid.
    pub fn contains(&self, coord: Coord) -> bool {
        return coord.row < self.rows && coord.col < self.cols;
    }

    /// The character at `coord`, if any.
    pub fn get(&self, coord: Coord) -> Option<char> {
        return self.cells.get(&coord).copied();
    }

    /// Record a local edit of one cell and return the operation to send.
    ///
    /// `input` is the raw value of the cell's input control. Its last
    /// character wins, so typing into an occupied cell replaces the
    /// character; an empty value clears the cell.
    pub fn cell_edited(&mut self, row: usize, col: usize, input: &str) -> Result<CellOperation> {
        let key = Coord { row, col };
        if !self.contains(key) {
            return Err(Error::CellOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let value = CellValue::from(input.chars().last());
        let op = CellOperation { key, value };
        self.apply(&op);
        return Ok(op);
    }

    /// Apply a point operation. Returns false if the cell is outside the grid.
    pub fn apply(&mut self, op: &CellOperation) -> bool {
        return self.set(op.key, op.value.into());
    }

    /// Fold a remote delta into the grid.
    pub fn apply_delta(&mut self, delta: &Delta) {
        for (&key, &value) in delta {
            self.set(key, value);
        }
    }

    /// Replace the grid contents wholesale with the cells in `map`.
    pub fn replace(&mut self, map: &Delta) {
        self.cells.clear();
        self.apply_delta(map);
    }

    fn set(&mut self, key: Coord, value: Option<char>) -> bool {
        if !self.contains(key) {
            debug!(%key, rows = self.rows, cols = self.cols, "dropping cell outside grid");
            return false;
        }
        match value {
            Some(c) => {
                self.cells.insert(key, c);
            }
            None => {
                self.cells.remove(&key);
            }
        }
        return true;
    }

    /// Change the grid size, dropping cells that no longer fit.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        let before = self.cells.len();
        self.cells.retain(|key, _| key.row < rows && key.col < cols);
        if self.cells.len() != before {
            debug!(dropped = before - self.cells.len(), rows, cols, "resized grid");
        }
    }

    /// Render into a dense matrix, filling empty cells with `blank`.
    pub fn materialize(&self, blank: char) -> Materialized {
        let mut rows = vec![vec![blank; self.cols]; self.rows];
        for (key, &c) in &self.cells {
            // Never stored out of bounds, but the matrix must not panic if it were.
            if let Some(cell) = rows.get_mut(key.row).and_then(|row| row.get_mut(key.col)) {
                *cell = c;
            }
        }
        return Materialized { rows };
    }

    /// Occupied cells read left to right, top to bottom, blanks skipped.
    pub fn to_text(&self) -> String {
        return self.to_map().values().flatten().collect();
    }

    /// The occupied cells as a delta, suitable for a full snapshot.
    pub fn to_map(&self) -> Delta {
        return self.cells.iter().map(|(&key, &c)| (key, Some(c))).collect();
    }
}

/// A dense `rows x cols` rendering of a grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Materialized {
    pub rows: Vec<Vec<char>>,
}

impl Materialized {
    /// The character at `row`, `col`.
    pub fn get(&self, row: usize, col: usize) -> Option<char> {
        return self.rows.get(row).and_then(|r| r.get(col)).copied();
    }
}

impl fmt::Display for Materialized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for c in row {
                write!(f, "{c}")?;
            }
        }
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_round_trips_through_string() {
        let coord: Coord = "3,14".parse().unwrap();
        assert_eq!(coord, Coord::new(3, 14));
        assert_eq!(coord.to_string(), "3,14");
    }

    #[test]
    fn bad_coords_are_malformed() {
        assert!(matches!("3".parse::<Coord>(), Err(Error::Malformed(_))));
        assert!(matches!("a,1".parse::<Coord>(), Err(Error::Malformed(_))));
        assert!(matches!("1,-1".parse::<Coord>(), Err(Error::Malformed(_))));
    }

    #[test]
    fn delta_wire_form() {
        let mut delta = Delta::new();
        delta.insert(Coord::new(0, 1), Some('x'));
        delta.insert(Coord::new(2, 3), None);
        let json = serde_json::to_string(&delta).unwrap();
        assert_eq!(json, r#"{"0,1":"x","2,3":null}"#);
        let back: Delta = serde_json::from_str(&json).unwrap();
        assert_eq!(back, delta);
    }

    #[test]
    fn cell_edit_keeps_last_char() {
        let mut grid = GridState::new(2, 2);
        let op = grid.cell_edited(0, 1, "ab").unwrap();
        assert_eq!(op.value, CellValue::Char('b'));
        assert_eq!(grid.get(Coord::new(0, 1)), Some('b'));
    }

    #[test]
    fn empty_input_clears() {
        let mut grid = GridState::new(2, 2);
        grid.cell_edited(1, 1, "q").unwrap();
        let op = grid.cell_edited(1, 1, "").unwrap();
        assert_eq!(op, CellOperation { key: Coord::new(1, 1), value: CellValue::Clear });
        assert!(grid.is_empty());
    }

    #[test]
    fn edit_outside_grid_is_rejected() {
        let mut grid = GridState::new(2, 3);
        assert_eq!(
            grid.cell_edited(2, 0, "x"),
            Err(Error::CellOutOfRange { row: 2, col: 0, rows: 2, cols: 3 })
        );
        assert!(grid.is_empty());
    }

    #[test]
    fn delta_outside_grid_is_dropped() {
        let mut grid = GridState::new(2, 2);
        let mut delta = Delta::new();
        delta.insert(Coord::new(5, 5), Some('x'));
        delta.insert(Coord::new(1, 0), Some('y'));
        grid.apply_delta(&delta);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.get(Coord::new(1, 0)), Some('y'));
    }

    #[test]
    fn materialize_fills_blanks() {
        let mut grid = GridState::new(2, 3);
        grid.cell_edited(0, 0, "a").unwrap();
        grid.cell_edited(1, 2, "b").unwrap();
        let dense = grid.materialize('.');
        assert_eq!(dense.to_string(), "a..\n..b");
        assert_eq!(dense.get(1, 2), Some('b'));
        assert_eq!(dense.get(2, 0), None);
    }

    #[test]
    fn to_text_skips_blanks_in_reading_order() {
        let mut grid = GridState::new(3, 3);
        grid.cell_edited(2, 0, "c").unwrap();
        grid.cell_edited(0, 2, "a").unwrap();
        grid.cell_edited(1, 1, "b").unwrap();
        assert_eq!(grid.to_text(), "abc");
    }

    #[test]
    fn resize_drops_cells_off_the_edge() {
        let mut grid = GridState::new(3, 3);
        grid.cell_edited(0, 0, "a").unwrap();
        grid.cell_edited(2, 2, "z").unwrap();
        grid.resize(2, 2);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.materialize(' ').to_string(), "a \n  ");
    }

    #[test]
    fn replace_discards_previous_cells() {
        let mut grid = GridState::new(2, 2);
        grid.cell_edited(0, 0, "a").unwrap();
        let mut map = Delta::new();
        map.insert(Coord::new(1, 1), Some('b'));
        grid.replace(&map);
        assert_eq!(grid.to_map(), map);
    }
}
