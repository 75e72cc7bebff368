// Console output and JSON summary of an analysis.

use party_tally::stats::{format_grouped, summarize, SeriesSummary};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JSValue};
use snafu::whatever;
use text_diff::print_diff;

use crate::tally::*;

/// The settings echoed in the summary.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub before: String,
    pub after: String,
    pub metric: String,
    #[serde(rename = "maxItems")]
    pub max_items: usize,
    #[serde(rename = "othersLabel")]
    pub others_label: String,
}

pub fn print_counts(source: &SourceSettings, votes: &AggregatedVotes) {
    println!("Partidos {} lidos: {}", source.label, votes.parties.len());
    if let Some(coalitions) = &votes.coalitions {
        println!("Coligações {} lidas: {}", source.label, coalitions.len());
    }
}

/// Prints the mean, the median and the standard deviation of a series.
pub fn print_summary(name: &str, summary: Option<SeriesSummary>) {
    match summary {
        Some(s) => {
            println!("{}", name);
            println!("   Média   : {}", format_grouped(s.mean));
            println!("   Mediana : {}", format_grouped(s.median));
            println!("   Desvio Padrão : {}", format_grouped(s.std_dev));
            println!("{}", "-".repeat(50));
        }
        None => {
            warn!("{}: no value, no statistics", name);
        }
    }
}

fn totals_to_json(totals: &[(String, i64)], key: &str) -> JSValue {
    let rows: Vec<JSValue> = totals
        .iter()
        .map(|(name, votes)| json!({ key: name, "votes": votes }))
        .collect();
    JSValue::Array(rows)
}

fn summary_to_json(summary: Option<SeriesSummary>) -> JSValue {
    match summary {
        Some(s) => json!({
            "count": s.count,
            "mean": s.mean,
            "median": s.median,
            "stdDev": s.std_dev
        }),
        None => JSValue::Null,
    }
}

fn election_to_json(source: &SourceSettings, votes: &AggregatedVotes) -> JSValue {
    let columns = votes.columns.as_ref().map(|c| {
        json!({
            "party": c.party,
            "votes": c.votes,
            "coalition": c.coalition
        })
    });
    let s = &votes.stats;
    json!({
        "label": source.label,
        "directory": source.directory.display().to_string(),
        "columns": columns,
        "files": {
            "read": s.files_read,
            "degraded": s.files_degraded,
            "skipped": s.files_skipped
        },
        "cells": {
            "rows": s.cells.rows,
            "blank": s.cells.blank,
            "malformed": s.cells.malformed,
            "blankParty": s.blank_parties
        },
        "parties": totals_to_json(&votes.parties, "party"),
        "coalitions": votes.coalitions.as_ref().map(|c| totals_to_json(c, "coalition"))
    })
}

pub fn build_summary_js(
    settings: &AnalysisSettings,
    before: &AggregatedVotes,
    after: &AggregatedVotes,
    variations: &[PartyVariation],
) -> JSValue {
    let c = OutputConfig {
        before: settings.before.label.clone(),
        after: settings.after.label.clone(),
        metric: settings.metric.to_string(),
        max_items: settings.max_items,
        others_label: settings.others_label.clone(),
    };
    let variation: Vec<JSValue> = variations
        .iter()
        .map(|v| {
            json!({
                "party": v.party,
                "votesBefore": v.votes_before,
                "votesAfter": v.votes_after,
                "variationPercent": v.variation_percent
            })
        })
        .collect();
    let percents: Vec<f64> = variations.iter().map(|v| v.variation_percent).collect();
    json!({
        "config": c,
        "elections": [election_to_json(&settings.before, before), election_to_json(&settings.after, after)],
        "variation": variation,
        "statistics": {
            "votesBefore": summary_to_json(party_tally::stats::summarize_totals(&before.parties)),
            "votesAfter": summary_to_json(party_tally::stats::summarize_totals(&after.parties)),
            "variationPercent": summary_to_json(summarize(&percents))
        }
    })
}

/// Writes the summary to a file, or to the standard output for `stdout`.
/// Nothing is written for an empty destination.
pub fn write_summary(out: &str, pretty_js: &str) -> TallyResult<()> {
    if out.is_empty() {
        debug!("write_summary: no destination");
        return Ok(());
    }
    if out == "stdout" {
        println!("{}", pretty_js);
        return Ok(());
    }
    fs::write(out, pretty_js).context(WritingSummarySnafu { path: out })?;
    info!("Summary written to {}", out);
    Ok(())
}

/// Compares the summary with a reference summary and prints the differences.
pub fn check_reference(reference_p: &str, pretty_js: &str) -> TallyResult<()> {
    let contents = fs::read_to_string(reference_p).context(OpeningSummarySnafu {
        path: reference_p,
    })?;
    let summary_ref: JSValue =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("check_reference: {:?}", summary_ref);
    let pretty_js_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_ref.as_str(), pretty_js, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("The summary matches the reference {}", reference_p);
    Ok(())
}
