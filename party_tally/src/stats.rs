//! Descriptive statistics over vote series.

use log::debug;

/// Summary of a numeric series.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation (no degree-of-freedom correction).
    pub std_dev: f64,
}

/// Computes the mean, the median and the standard deviation of a series.
///
/// Non-finite values (infinities, NaN) are dropped first. Returns `None` when
/// nothing is left.
///
/// ```
/// use party_tally::stats::summarize;
///
/// let s = summarize(&[1.0, 2.0, 3.0, 4.0]).unwrap();
/// assert_eq!(s.mean, 2.5);
/// assert_eq!(s.median, 2.5);
/// ```
pub fn summarize(values: &[f64]) -> Option<SeriesSummary> {
    let mut finite: Vec<f64> = values.iter().cloned().filter(|v| v.is_finite()).collect();
    if finite.len() < values.len() {
        debug!(
            "summarize: dropped {} non-finite values",
            values.len() - finite.len()
        );
    }
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(|a, b| a.total_cmp(b));

    let n = finite.len();
    let mean = finite.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        finite[n / 2]
    } else {
        (finite[n / 2 - 1] + finite[n / 2]) / 2.0
    };
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

    Some(SeriesSummary {
        count: n,
        mean,
        median,
        std_dev: variance.sqrt(),
    })
}

/// Summary of the vote totals of a sorted tally.
pub fn summarize_totals(totals: &[(String, i64)]) -> Option<SeriesSummary> {
    let values: Vec<f64> = totals.iter().map(|(_, v)| *v as f64).collect();
    summarize(&values)
}

/// Formats a number with two decimals and a `,` between groups of thousands.
///
/// ```
/// use party_tally::stats::format_grouped;
///
/// assert_eq!(format_grouped(1234567.891), "1,234,567.89");
/// assert_eq!(format_grouped(-12.5), "-12.50");
/// ```
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return format!("{}", value);
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, c) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}
