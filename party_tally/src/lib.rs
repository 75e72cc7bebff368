pub mod builder;
mod config;
pub mod manual;
pub mod stats;

use log::{debug, info, warn};

use std::collections::{BTreeMap, BTreeSet};

pub use crate::builder::FileTally;
pub use crate::config::*;

// **** Column resolution ****

/// Finds the column that best matches a list of keywords.
///
/// The keywords are tried in order. For each keyword, the headers are scanned in
/// their original order and the first one that contains the keyword (ignoring case
/// and surrounding whitespace) is returned as it appears in the header.
/// A keyword earlier in the list always wins over a column earlier in the table.
pub fn find_column_name<'a>(headers: &'a [String], keywords: &[String]) -> Option<&'a str> {
    let headers_upper: Vec<String> = headers.iter().map(|h| h.trim().to_uppercase()).collect();
    for kw in keywords.iter() {
        let kw_upper = kw.to_uppercase();
        for (idx, col) in headers_upper.iter().enumerate() {
            if col.contains(kw_upper.as_str()) {
                return Some(headers[idx].as_str());
            }
        }
    }
    None
}

impl ColumnRoles {
    /// Resolves all the roles from the header of a representative table.
    ///
    /// The party and votes roles are mandatory. The coalition role is only looked up
    /// when `with_coalition` is set, and it is not an error if it cannot be found.
    pub fn resolve(
        headers: &[String],
        keywords: &KeywordSets,
        with_coalition: bool,
    ) -> Result<ColumnRoles, SchemaResolutionError> {
        let required = |role: ColumnRole| -> Result<String, SchemaResolutionError> {
            find_column_name(headers, keywords.keywords(role))
                .map(|s| s.to_string())
                .ok_or_else(|| SchemaResolutionError {
                    role,
                    keywords: keywords.keywords(role).to_vec(),
                    headers: headers.to_vec(),
                })
        };
        let party = required(ColumnRole::Party)?;
        let votes = required(ColumnRole::Votes)?;
        let coalition = if with_coalition {
            find_column_name(headers, keywords.keywords(ColumnRole::Coalition)).map(|s| s.to_string())
        } else {
            None
        };
        debug!(
            "resolve: party: {:?} votes: {:?} coalition: {:?}",
            party, votes, coalition
        );
        Ok(ColumnRoles {
            party,
            votes,
            coalition,
        })
    }
}

// **** Vote counts ****

/// Reads a vote cell.
///
/// All the `.` and then all the `,` are removed: they are only thousands separators
/// and never a decimal mark. What is left must be an integer.
pub fn classify_vote_cell(token: &str) -> VoteCell {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return VoteCell::Blank;
    }
    let digits = trimmed.replace('.', "").replace(',', "");
    match digits.parse::<i64>() {
        Ok(n) => VoteCell::Count(n),
        Err(_) => VoteCell::Malformed,
    }
}

/// Parses a vote cell. Anything that cannot be read counts as zero votes.
///
/// ```
/// use party_tally::parse_vote_count;
///
/// assert_eq!(parse_vote_count("1.234,56"), 123456);
/// assert_eq!(parse_vote_count("abc"), 0);
/// ```
pub fn parse_vote_count(token: &str) -> i64 {
    classify_vote_cell(token).votes()
}

// **** Accumulation ****

/// Running totals of votes per group, across all the tables of an election.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoteAccumulator {
    totals: BTreeMap<String, i64>,
    cells: CellStats,
    blank_keys: u64,
    sources: u32,
}

// Totals saturate at the bounds of i64.
pub(crate) fn add_to_total(total: &mut i64, key: &str, votes: i64) {
    match total.checked_add(votes) {
        Some(t) => *total = t,
        None => {
            warn!("The total for {:?} overflows and is capped", key);
            *total = total.saturating_add(votes);
        }
    }
}

impl VoteAccumulator {
    pub fn new() -> VoteAccumulator {
        VoteAccumulator::default()
    }

    /// Folds the group sums of one table into the totals.
    pub fn merge(&mut self, file: &FileTally) {
        for (key, votes) in file.groups() {
            self.add(key, votes);
        }
        self.cells.merge(&file.cell_stats());
        self.blank_keys += file.blank_keys();
        self.sources += 1;
    }

    pub fn add(&mut self, key: &str, votes: i64) {
        let e = self.totals.entry(key.to_string()).or_insert(0);
        add_to_total(e, key, votes);
    }

    pub fn total(&self, key: &str) -> i64 {
        self.totals.get(key).cloned().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn cell_stats(&self) -> CellStats {
        self.cells
    }

    /// Number of merged rows that had no group key.
    pub fn blank_keys(&self) -> u64 {
        self.blank_keys
    }

    /// Number of tables merged so far.
    pub fn sources(&self) -> u32 {
        self.sources
    }

    /// The totals, from the largest to the smallest.
    ///
    /// Groups with the same total stay in the order of their keys.
    pub fn finalize(self) -> Vec<(String, i64)> {
        info!(
            "finalize: {} groups from {} sources",
            self.totals.len(),
            self.sources
        );
        sort_totals(self.totals.into_iter().collect())
    }
}

/// Sorts totals by decreasing number of votes. The sort is stable.
pub fn sort_totals(mut totals: Vec<(String, i64)>) -> Vec<(String, i64)> {
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals
}

// **** Comparison between two elections ****

/// Computes the relative change in votes for each party.
///
/// A party missing from one of the elections has zero votes there. Parties
/// without votes in the first election have no defined variation and are left
/// out. The output is ordered by party.
pub fn compute_variation(before: &[(String, i64)], after: &[(String, i64)]) -> Vec<PartyVariation> {
    let before_m: BTreeMap<&str, i64> = before.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let after_m: BTreeMap<&str, i64> = after.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let parties: BTreeSet<&str> = before_m.keys().chain(after_m.keys()).cloned().collect();

    let mut res: Vec<PartyVariation> = Vec::new();
    for party in parties {
        let votes_before = before_m.get(party).cloned().unwrap_or(0);
        let votes_after = after_m.get(party).cloned().unwrap_or(0);
        if votes_before <= 0 {
            debug!(
                "compute_variation: skipping {:?}: no votes in the first election",
                party
            );
            continue;
        }
        let variation_percent =
            (votes_after as f64 - votes_before as f64) / votes_before as f64 * 100.0;
        res.push(PartyVariation {
            party: party.to_string(),
            votes_before,
            votes_after,
            variation_percent,
        });
    }
    res
}

/// Scales a series so that its maximum is 1.
///
/// If the maximum is not positive, all the values are mapped to zero.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 && max.is_finite() {
        values.iter().map(|v| v / max).collect()
    } else {
        vec![0.0; values.len()]
    }
}

/// Keeps the first `max_items` entries and sums everything else under `others_label`.
///
/// ```
/// use party_tally::top_with_others;
///
/// let s = vec![("A".to_string(), 5), ("B".to_string(), 3), ("C".to_string(), 1)];
/// let top = top_with_others(&s, 1, "OUTROS");
/// assert_eq!(top, vec![("A".to_string(), 5), ("OUTROS".to_string(), 4)]);
/// ```
pub fn top_with_others<T>(entries: &[(String, T)], max_items: usize, others_label: &str) -> Vec<(String, T)>
where
    T: Copy + std::iter::Sum<T>,
{
    if entries.len() <= max_items {
        return entries.to_vec();
    }
    let mut res: Vec<(String, T)> = entries[..max_items].to_vec();
    let others: T = entries[max_items..].iter().map(|(_, v)| *v).sum();
    res.push((others_label.to_string(), others));
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn totals(entries: &[(&str, i64)]) -> Vec<(String, i64)> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn resolves_exact_columns() {
        let h = headers(&["ANO", "SG_PARTIDO", "QT_VOTOS_NOMINAIS_VALIDOS"]);
        let roles = ColumnRoles::resolve(&h, &KeywordSets::default(), false).unwrap();
        assert_eq!(roles.party, "SG_PARTIDO");
        assert_eq!(roles.votes, "QT_VOTOS_NOMINAIS_VALIDOS");
        assert_eq!(roles.coalition, None);
    }

    #[test]
    fn falls_back_to_later_keywords() {
        let h = headers(&["NR_PARTIDO", "NM_PARTIDO", "QT_VOTOS"]);
        let roles = ColumnRoles::resolve(&h, &KeywordSets::default(), false).unwrap();
        assert_eq!(roles.party, "NR_PARTIDO");
        assert_eq!(roles.votes, "QT_VOTOS");
    }

    #[test]
    fn keyword_priority_wins_over_column_order() {
        let h = headers(&["QT_VOTOS_LEGENDA", "QT_VOTOS_NOMINAIS_VALIDOS"]);
        let kw = KeywordSets::default();
        assert_eq!(
            find_column_name(&h, &kw.votes),
            Some("QT_VOTOS_NOMINAIS_VALIDOS")
        );
    }

    #[test]
    fn matching_ignores_case_and_padding() {
        let h = headers(&[" sg_partido ", "qt_votos"]);
        let kw = KeywordSets::default();
        // The header is returned as written in the table.
        assert_eq!(find_column_name(&h, &kw.party), Some(" sg_partido "));
        assert_eq!(find_column_name(&h, &kw.votes), Some("qt_votos"));
    }

    #[test]
    fn resolves_coalition_when_asked() {
        let h = headers(&["SG_PARTIDO", "NM_COLIGACAO", "QT_VOTOS_NOMINAIS_VALIDOS"]);
        let roles = ColumnRoles::resolve(&h, &KeywordSets::default(), true).unwrap();
        assert_eq!(roles.coalition, Some("NM_COLIGACAO".to_string()));

        let h2 = headers(&["SG_PARTIDO", "QT_VOTOS"]);
        let roles2 = ColumnRoles::resolve(&h2, &KeywordSets::default(), true).unwrap();
        assert_eq!(roles2.coalition, None);
    }

    #[test]
    fn legend_metric_prefers_legend_column() {
        let h = headers(&["SG_PARTIDO", "QT_VOTOS_NOMINAIS_VALIDOS", "QT_TOTAL_VOTOS_LEG_VALIDOS"]);
        let roles = ColumnRoles::resolve(&h, &KeywordSets::for_metric(VoteMetric::Legend), false)
            .unwrap();
        assert_eq!(roles.votes, "QT_TOTAL_VOTOS_LEG_VALIDOS");
    }

    #[test]
    fn missing_columns_report_keywords_and_headers() {
        let h = headers(&["ANO", "NM_MUNICIPIO"]);
        let err = ColumnRoles::resolve(&h, &KeywordSets::default(), false).unwrap_err();
        assert_eq!(err.role, ColumnRole::Party);
        assert_eq!(err.keywords, KeywordSets::default().party);
        assert_eq!(err.headers, h);

        let h2 = headers(&["SG_PARTIDO", "NM_MUNICIPIO"]);
        let err2 = ColumnRoles::resolve(&h2, &KeywordSets::default(), false).unwrap_err();
        assert_eq!(err2.role, ColumnRole::Votes);
        assert!(err2.to_string().contains("NM_MUNICIPIO"));
    }

    #[test]
    fn vote_cells() {
        assert_eq!(parse_vote_count("1.234,56"), 123456);
        assert_eq!(parse_vote_count("abc"), 0);
        assert_eq!(parse_vote_count(" 1.000 "), 1000);
        assert_eq!(parse_vote_count("12,5"), 125);
        assert_eq!(classify_vote_cell(""), VoteCell::Blank);
        assert_eq!(classify_vote_cell("  "), VoteCell::Blank);
        assert_eq!(classify_vote_cell("."), VoteCell::Malformed);
        assert_eq!(classify_vote_cell("-3"), VoteCell::Count(-3));
    }

    #[test]
    fn accumulates_across_files() {
        let mut a = FileTally::new();
        a.add_row("PT", "100");
        a.add_row("PSDB", "50");
        let mut b = FileTally::new();
        b.add_row("PT", "1.000");
        b.add_row("PSDB", "");

        let mut acc = VoteAccumulator::new();
        acc.merge(&a);
        acc.merge(&b);
        assert_eq!(acc.total("PT"), 1100);
        assert_eq!(acc.total("PSDB"), 50);
        assert_eq!(acc.sources(), 2);
        assert_eq!(acc.cell_stats().rows, 4);
        assert_eq!(acc.cell_stats().blank, 1);
        assert_eq!(acc.finalize(), totals(&[("PT", 1100), ("PSDB", 50)]));
    }

    #[test]
    fn group_keys_are_trimmed_not_case_folded() {
        let mut f = FileTally::new();
        f.add_row(" PT", "1");
        f.add_row("PT ", "2");
        f.add_row("pt", "4");
        let mut acc = VoteAccumulator::new();
        acc.merge(&f);
        assert_eq!(acc.total("PT"), 3);
        assert_eq!(acc.total("pt"), 4);
    }

    #[test]
    fn unreadable_cells_keep_the_group() {
        let mut f = FileTally::new();
        f.add_row("NOVO", "--");
        let mut acc = VoteAccumulator::new();
        acc.merge(&f);
        assert_eq!(acc.len(), 1);
        assert_eq!(acc.finalize(), totals(&[("NOVO", 0)]));
    }

    #[test]
    fn totals_saturate_across_files() {
        let mut a = FileTally::new();
        a.add_row("PT", "9.000.000.000.000.000.000");
        a.add_row("", "1");
        let mut b = FileTally::new();
        b.add_row("PT", "9.000.000.000.000.000.000");
        b.add_row(" ", "2");
        let mut acc = VoteAccumulator::new();
        acc.merge(&a);
        acc.merge(&b);
        assert_eq!(acc.total("PT"), i64::MAX);
        assert_eq!(acc.total(""), 3);
        assert_eq!(acc.blank_keys(), 2);
    }

    #[test]
    fn variation_with_extreme_totals() {
        let res = compute_variation(&totals(&[("PT", 1)]), &totals(&[("PT", i64::MIN)]));
        assert_eq!(res.len(), 1);
        assert!(res[0].variation_percent < 0.0);
    }

    #[test]
    fn finalize_sorts_descending() {
        let mut acc = VoteAccumulator::new();
        acc.add("A", 50);
        acc.add("B", 1100);
        assert_eq!(acc.finalize(), totals(&[("B", 1100), ("A", 50)]));
    }

    #[test]
    fn ties_follow_key_order() {
        let mut acc = VoteAccumulator::new();
        acc.add("C", 10);
        acc.add("A", 10);
        acc.add("B", 20);
        assert_eq!(acc.finalize(), totals(&[("B", 20), ("A", 10), ("C", 10)]));
    }

    #[test]
    fn variation_percent() {
        let res = compute_variation(&totals(&[("PT", 100)]), &totals(&[("PT", 150)]));
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].party, "PT");
        assert_eq!(res[0].variation_percent, 50.0);
    }

    #[test]
    fn variation_skips_zero_baseline() {
        let before = totals(&[("PT", 200), ("PSDB", 0), ("MDB", 80)]);
        let after = totals(&[("PT", 100), ("PSDB", 10), ("UNIAO", 500)]);
        let res = compute_variation(&before, &after);
        let parties: Vec<&str> = res.iter().map(|v| v.party.as_str()).collect();
        assert_eq!(parties, vec!["MDB", "PT"]);
        assert_eq!(res[0].votes_after, 0);
        assert_eq!(res[0].variation_percent, -100.0);
        assert_eq!(res[1].variation_percent, -50.0);
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize(&[1.0, 2.0, 4.0]), vec![0.25, 0.5, 1.0]);
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn top_entries_and_others() {
        let s = totals(&[("A", 5), ("B", 3), ("C", 2), ("D", 1)]);
        assert_eq!(top_with_others(&s, 4, "OUTROS"), s);
        assert_eq!(
            top_with_others(&s, 2, "OUTROS"),
            totals(&[("A", 5), ("B", 3), ("OUTROS", 3)])
        );
        let f = vec![("X".to_string(), -10.5), ("Y".to_string(), 2.0), ("Z".to_string(), 3.0)];
        let top = top_with_others(&f, 1, "OUTROS");
        assert_eq!(top[1], ("OUTROS".to_string(), 5.0));
    }
}
