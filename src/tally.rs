use log::{debug, info, warn};

use party_tally::stats::summarize_totals;
use party_tally::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use crate::args::Args;
use crate::tally::config_reader::*;

pub mod charts;
pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod report;

#[derive(Debug, Snafu)]
pub enum TallyError {
    #[snafu(display("Error opening the configuration file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration file {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Invalid configuration: {message}"))]
    InvalidConfig { message: String },
    #[snafu(display("Error reading the directory {path}"))]
    ReadingDirectory {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening the CSV file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("The CSV file {path} does not have a header"))]
    EmptyCsv { path: String },
    #[snafu(display("Line {line} of {path} has {found} fields, the header has {expected}"))]
    RaggedRow {
        path: String,
        line: u64,
        expected: usize,
        found: usize,
    },
    #[snafu(display("The CSV file {path} does not have the columns {columns:?}"))]
    MissingColumns { path: String, columns: Vec<String> },
    #[snafu(display("Cannot aggregate the files in {path}: {source}"))]
    SchemaResolution {
        source: SchemaResolutionError,
        path: String,
    },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading the reference summary {path}"))]
    OpeningSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error converting the summary to JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error rendering the chart {path}: {message}"))]
    RenderingChart { path: String, message: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TallyResult<T> = Result<T, TallyError>;

/// Counters collected while reading the files of one election.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct AggregationStats {
    pub files_read: u32,
    /// Files that could only be read with the permissive parser.
    pub files_degraded: u32,
    /// Files that could not be read at all.
    pub files_skipped: u32,
    pub cells: CellStats,
    /// Rows without a party, counted under the empty key.
    pub blank_parties: u64,
}

/// The totals for one election.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AggregatedVotes {
    /// The columns used, if any file was found.
    pub columns: Option<ColumnRoles>,
    /// Votes per party, from the largest to the smallest.
    pub parties: Vec<(String, i64)>,
    /// Votes per coalition, only when coalitions are tracked.
    pub coalitions: Option<Vec<(String, i64)>>,
    pub stats: AggregationStats,
}

impl AggregatedVotes {
    fn empty(track_coalitions: bool) -> AggregatedVotes {
        AggregatedVotes {
            coalitions: if track_coalitions { Some(vec![]) } else { None },
            ..Default::default()
        }
    }
}

/// Reads all the result files of a directory and sums the votes per party
/// (and per coalition, if requested).
///
/// The columns are found in the header of the first file. Failing to find them
/// stops the aggregation before any file is read. Problems with individual
/// files are not fatal: the file is read again with a permissive parser, or
/// skipped.
pub fn aggregate_directory(
    dir: &Path,
    keywords: &KeywordSets,
    track_coalitions: bool,
) -> TallyResult<AggregatedVotes> {
    let files = io_common::list_csv_files(dir)?;
    if files.is_empty() {
        warn!("No source file found in {}", dir.display());
        return Ok(AggregatedVotes::empty(track_coalitions));
    }

    let header = io_csv::read_header(&files[0])?;
    debug!("aggregate_directory: header: {:?}", header);
    let roles = ColumnRoles::resolve(&header, keywords, track_coalitions).context(
        SchemaResolutionSnafu {
            path: dir.display().to_string(),
        },
    )?;
    info!(
        "Using columns: party={:?} votes={:?} coalition={:?}",
        roles.party, roles.votes, roles.coalition
    );
    if track_coalitions && roles.coalition.is_none() {
        warn!(
            "No coalition column found in {} (keywords: {:?})",
            io_common::simplify_file_name(&files[0]),
            keywords.coalition
        );
    }

    let mut party_totals = VoteAccumulator::new();
    let mut coalition_totals = VoteAccumulator::new();
    let mut stats = AggregationStats::default();

    for path in files.iter() {
        match io_csv::read_tally_file(path, &roles) {
            Some(file_read) => {
                stats.files_read += 1;
                if file_read.degraded {
                    stats.files_degraded += 1;
                }
                party_totals.merge(&file_read.parties);
                if let Some(coalitions) = file_read.coalitions {
                    coalition_totals.merge(&coalitions);
                }
            }
            None => {
                stats.files_skipped += 1;
            }
        }
    }
    stats.cells = party_totals.cell_stats();
    stats.blank_parties = party_totals.blank_keys();
    if stats.blank_parties > 0 {
        warn!(
            "{} rows without a party in {} are counted under an empty name",
            stats.blank_parties,
            dir.display()
        );
    }
    if coalition_totals.blank_keys() > 0 {
        warn!(
            "{} rows without a coalition in {} are counted under an empty name",
            coalition_totals.blank_keys(),
            dir.display()
        );
    }
    if stats.cells.malformed > 0 {
        info!(
            "{} vote cells could not be read in {} and were counted as zero",
            stats.cells.malformed,
            dir.display()
        );
    }

    Ok(AggregatedVotes {
        columns: Some(roles),
        parties: party_totals.finalize(),
        coalitions: if track_coalitions {
            Some(coalition_totals.finalize())
        } else {
            None
        },
        stats,
    })
}

pub fn run_analysis(args: &Args) -> TallyResult<()> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => TallyConfig::default(),
    };
    let root_p: PathBuf = match &args.config {
        Some(path) => Path::new(path)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default(),
        None => PathBuf::new(),
    };
    let settings = validate_config(&config, &root_p, args)?;
    info!("settings: {:?}", settings);

    let before = aggregate_directory(
        &settings.before.directory,
        &settings.keywords,
        settings.before.track_coalitions,
    )?;
    let after = aggregate_directory(
        &settings.after.directory,
        &settings.keywords,
        settings.after.track_coalitions,
    )?;

    report::print_counts(&settings.before, &before);
    report::print_counts(&settings.after, &after);

    let variations = compute_variation(&before.parties, &after.parties);
    debug!("variations: {:?}", variations);

    if settings.render_charts {
        charts::render_all(&settings, &before, &after, &variations)?;
    }

    let variation_values: Vec<f64> = variations.iter().map(|v| v.variation_percent).collect();
    report::print_summary(
        &format!("Votos por partido – {}", settings.before.label),
        summarize_totals(&before.parties),
    );
    report::print_summary(
        &format!("Votos por partido – {}", settings.after.label),
        summarize_totals(&after.parties),
    );
    report::print_summary(
        &format!(
            "Variação percentual {} → {}",
            settings.before.label, settings.after.label
        ),
        party_tally::stats::summarize(&variation_values),
    );

    let summary_js = report::build_summary_js(&settings, &before, &after, &variations);
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;

    if let Some(out) = &args.out {
        report::write_summary(out, &pretty_js)?;
    }

    // The reference summary, if provided for comparison
    if let Some(reference_p) = &args.reference {
        report::check_reference(reference_p, &pretty_js)?;
    }

    Ok(())
}
