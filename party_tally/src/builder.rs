pub use crate::config::*;

use std::collections::BTreeMap;

/// A builder that groups the rows of a single result table.
///
/// Every row is attributed to its trimmed group key. Once the table is
/// consumed, the builder is folded into a [`crate::VoteAccumulator`].
///
/// ```
/// use party_tally::builder::FileTally;
/// use party_tally::VoteAccumulator;
///
/// let mut file = FileTally::new();
/// file.add_row(" PT ", "1.000");
/// file.add_row("PSDB", "50");
/// file.add_row("PSDB", "n/a");
///
/// let mut acc = VoteAccumulator::new();
/// acc.merge(&file);
/// assert_eq!(acc.total("PT"), 1000);
/// assert_eq!(acc.total("PSDB"), 50);
/// assert_eq!(acc.cell_stats().malformed, 1);
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FileTally {
    pub(crate) _groups: BTreeMap<String, i64>,
    pub(crate) _cells: CellStats,
    pub(crate) _blank_keys: u64,
}

impl FileTally {
    pub fn new() -> FileTally {
        FileTally {
            _groups: BTreeMap::new(),
            _cells: CellStats::default(),
            _blank_keys: 0,
        }
    }

    /// Adds a row with the raw text of its vote cell.
    ///
    /// The cell is parsed with [`crate::classify_vote_cell`]. A cell that cannot be
    /// read still creates the group, with a contribution of zero.
    pub fn add_row(&mut self, key: &str, votes_text: &str) -> VoteCell {
        let cell = crate::classify_vote_cell(votes_text);
        self._cells.record(cell);
        self.add_votes(key, cell.votes());
        cell
    }

    /// Adds an already parsed number of votes. It does not update the cell statistics.
    ///
    /// Rows with an empty key are kept under `""` and counted in [`FileTally::blank_keys`].
    pub fn add_votes(&mut self, key: &str, votes: i64) {
        let key = key.trim();
        if key.is_empty() {
            self._blank_keys += 1;
        }
        let e = self._groups.entry(key.to_string()).or_insert(0);
        crate::add_to_total(e, key, votes);
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, i64)> {
        self._groups.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn cell_stats(&self) -> CellStats {
        self._cells
    }

    /// Number of rows without a group key.
    pub fn blank_keys(&self) -> u64 {
        self._blank_keys
    }

    pub fn is_empty(&self) -> bool {
        self._groups.is_empty()
    }
}
