// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The semantic columns that the aggregation needs to find in a result table.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ColumnRole {
    /// The party abbreviation (`SG_PARTIDO`).
    Party,
    /// The vote count to sum.
    Votes,
    /// The coalition name (`NM_COLIGACAO`). Optional.
    Coalition,
}

impl Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ColumnRole::Party => "party",
            ColumnRole::Votes => "votes",
            ColumnRole::Coalition => "coalition",
        };
        write!(f, "{}", s)
    }
}

/// Which vote total gets aggregated.
///
/// - Nominal counts the valid votes cast for named candidates. This is the
/// metric used for most of the reports.
///
/// - Legend counts the total of valid votes for the party legend
/// (`QT_TOTAL_VOTOS_LEG_VALIDOS`).
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum VoteMetric {
    Nominal,
    Legend,
}

impl Display for VoteMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoteMetric::Nominal => write!(f, "nominal"),
            VoteMetric::Legend => write!(f, "legend"),
        }
    }
}

pub const PARTY_KEYWORDS: [&str; 3] = ["SG_PARTIDO", "PARTIDO", "SIGLA"];
pub const VOTES_KEYWORDS: [&str; 4] = [
    "QT_VOTOS_NOMINAIS_VALIDOS",
    "QT_VOTOS",
    "VOTOS_NOMINAIS",
    "VOTOS",
];
pub const LEGEND_VOTES_KEYWORD: &str = "QT_TOTAL_VOTOS_LEG_VALIDOS";
pub const COALITION_KEYWORDS: [&str; 3] = ["NM_COLIGACAO", "COLIGACAO", "NM_COLIGA"];

/// The ordered keyword lists used to recognize the columns of a table.
///
/// Within a list, the first keyword is the preferred one. Later keywords
/// are only used as fallbacks.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct KeywordSets {
    pub party: Vec<String>,
    pub votes: Vec<String>,
    pub coalition: Vec<String>,
}

impl KeywordSets {
    pub fn for_metric(metric: VoteMetric) -> KeywordSets {
        let nominal: Vec<String> = VOTES_KEYWORDS.iter().map(|s| s.to_string()).collect();
        let votes = match metric {
            VoteMetric::Nominal => nominal,
            VoteMetric::Legend => {
                let mut v = vec![LEGEND_VOTES_KEYWORD.to_string()];
                v.extend(nominal);
                v
            }
        };
        KeywordSets {
            party: PARTY_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            votes,
            coalition: COALITION_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn keywords(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Party => &self.party,
            ColumnRole::Votes => &self.votes,
            ColumnRole::Coalition => &self.coalition,
        }
    }
}

impl Default for KeywordSets {
    fn default() -> Self {
        KeywordSets::for_metric(VoteMetric::Nominal)
    }
}

/// The content of a single vote cell, once the grouping separators are removed.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum VoteCell {
    Count(i64),
    /// Empty or whitespace only.
    Blank,
    /// Some text that is not an integer.
    Malformed,
}

impl VoteCell {
    /// The contribution of this cell to a total. Anything that is not a count is zero.
    pub fn votes(&self) -> i64 {
        match self {
            VoteCell::Count(n) => *n,
            VoteCell::Blank | VoteCell::Malformed => 0,
        }
    }
}

// ******** Output data structures *********

/// The names of the columns, as found in the header of a table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnRoles {
    pub party: String,
    pub votes: String,
    pub coalition: Option<String>,
}

/// Counters on the vote cells seen during an aggregation.
///
/// Blank and malformed cells count as zero votes. These counters make it
/// possible to tell them apart from legitimate zeros.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct CellStats {
    pub rows: u64,
    pub blank: u64,
    pub malformed: u64,
}

impl CellStats {
    pub fn record(&mut self, cell: VoteCell) {
        self.rows += 1;
        match cell {
            VoteCell::Count(_) => {}
            VoteCell::Blank => self.blank += 1,
            VoteCell::Malformed => self.malformed += 1,
        }
    }

    pub fn merge(&mut self, other: &CellStats) {
        self.rows += other.rows;
        self.blank += other.blank;
        self.malformed += other.malformed;
    }
}

/// The change for one party between two elections.
#[derive(PartialEq, Debug, Clone)]
pub struct PartyVariation {
    pub party: String,
    pub votes_before: i64,
    pub votes_after: i64,
    /// Percentage, relative to `votes_before`.
    pub variation_percent: f64,
}

/// Raised when the header of a table does not have a column for a mandatory role.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SchemaResolutionError {
    pub role: ColumnRole,
    pub keywords: Vec<String>,
    pub headers: Vec<String>,
}

impl Error for SchemaResolutionError {}

impl Display for SchemaResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "could not find the {} column: none of the keywords {:?} matches the headers {:?}",
            self.role, self.keywords, self.headers
        )
    }
}
