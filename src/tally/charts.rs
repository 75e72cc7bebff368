// Rendering of the bar charts and of the scatter panel.

use std::error::Error;
use std::ops::Range;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::tally::*;

const BAR_COLOR: RGBColor = RGBColor(31, 119, 180);
const ORANGE: RGBColor = RGBColor(255, 165, 0);
const DARK_GREEN: RGBColor = RGBColor(0, 128, 0);

const CHART_WIDTH: u32 = 1200;
const ROW_HEIGHT: u32 = 22;

type ChartResult = Result<(), Box<dyn Error>>;

fn as_f64_series(totals: &[(String, i64)]) -> Vec<(String, f64)> {
    totals.iter().map(|(k, v)| (k.clone(), *v as f64)).collect()
}

fn chart_error(path: &Path, e: Box<dyn Error>) -> TallyError {
    RenderingChartSnafu {
        path: path.display().to_string(),
        message: e.to_string(),
    }
    .build()
}

/// Renders all the charts of an analysis in the output directory.
pub fn render_all(
    settings: &AnalysisSettings,
    before: &AggregatedVotes,
    after: &AggregatedVotes,
    variations: &[PartyVariation],
) -> TallyResult<()> {
    let out = &settings.output_directory;
    fs::create_dir_all(out).map_err(|e| chart_error(out, Box::new(e)))?;

    for (source, votes) in [(&settings.before, before), (&settings.after, after)] {
        render_bars(
            settings,
            &format!("votos_{}.svg", source.label),
            &format!("Total de votos por partido – Eleições {}", source.label),
            "Número de votos",
            &as_f64_series(&votes.parties),
        )?;
        if let Some(coalitions) = &votes.coalitions {
            render_bars(
                settings,
                &format!("votos_colig_{}.svg", source.label),
                &format!("Total de votos por coligação – Eleições {}", source.label),
                "Número de votos",
                &as_f64_series(coalitions),
            )?;
        }
    }

    let mut by_variation: Vec<(String, f64)> = variations
        .iter()
        .map(|v| (v.party.clone(), v.variation_percent))
        .collect();
    by_variation.sort_by(|a, b| a.1.total_cmp(&b.1));
    render_bars(
        settings,
        "variacao_percentual.svg",
        &format!(
            "Variação percentual {} x {} (%)",
            settings.before.label, settings.after.label
        ),
        "Variação (%)",
        &by_variation,
    )?;

    if variations.is_empty() {
        warn!("No party has votes in both elections, the scatter panel is not rendered");
        return Ok(());
    }
    let path = out.join("dispersao.svg");
    draw_scatter_panel(
        &path,
        &settings.before.label,
        &settings.after.label,
        variations,
    )
    .map_err(|e| chart_error(&path, e))?;
    info!("Saved {}", path.display());
    Ok(())
}

// Draws one horizontal bar chart, truncated to the configured number of rows.
fn render_bars(
    settings: &AnalysisSettings,
    file_name: &str,
    title: &str,
    x_desc: &str,
    series: &[(String, f64)],
) -> TallyResult<()> {
    if series.is_empty() {
        warn!("Empty series, nothing to plot: {}", title);
        return Ok(());
    }
    if series.len() > settings.max_items {
        info!(
            "{}: {} categories, showing the top {} and {}",
            title,
            series.len(),
            settings.max_items,
            settings.others_label
        );
    }
    let shown = top_with_others(series, settings.max_items, &settings.others_label);
    let path = settings.output_directory.join(file_name);
    draw_bars(&path, title, x_desc, &shown).map_err(|e| chart_error(&path, e))?;
    info!("Saved {}", path.display());
    Ok(())
}

fn draw_bars(path: &Path, title: &str, x_desc: &str, series: &[(String, f64)]) -> ChartResult {
    let n = series.len();
    let height = (120 + ROW_HEIGHT * n as u32).max(400);
    let root = SVGBackend::new(path, (CHART_WIDTH, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let min = series.iter().map(|(_, v)| *v).fold(0.0, f64::min);
    let max = series.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let pad = ((max - min) * 0.05).max(1.0);
    let x_range = if min < 0.0 { min - pad } else { 0.0 }..(max + pad);
    let longest = series
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(4, 40) as u32;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(longest * 7 + 10)
        .build_cartesian_2d(x_range, (0..n as i32).into_segmented())?;

    // The first entry is drawn on top.
    let label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(row) => {
            let idx = n as i32 - 1 - *row;
            if idx >= 0 {
                series
                    .get(idx as usize)
                    .map(|(k, _)| k.clone())
                    .unwrap_or_default()
            } else {
                String::new()
            }
        }
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&label)
        .x_desc(x_desc)
        .draw()?;

    chart.draw_series(series.iter().enumerate().map(|(idx, (_, v))| {
        let row = (n - 1 - idx) as i32;
        Rectangle::new(
            [
                (0.0, SegmentValue::Exact(row)),
                (*v, SegmentValue::Exact(row + 1)),
            ],
            BAR_COLOR.filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

fn padded_range(values: &[f64]) -> Range<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let pad = if max > min {
        (max - min) * 0.08
    } else {
        max.abs().max(1.0) * 0.1
    };
    (min - pad)..(max + pad)
}

// Scatter plot of (xs, ys), every point labelled with its party.
fn draw_scatter(
    area: &DrawingArea<SVGBackend, Shift>,
    title: &str,
    (x_desc, y_desc): (&str, &str),
    names: &[&str],
    (xs, ys): (&[f64], &[f64]),
    color: RGBColor,
) -> ChartResult {
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(padded_range(xs), padded_range(ys))?;
    chart.configure_mesh().x_desc(x_desc).y_desc(y_desc).draw()?;

    chart.draw_series(xs.iter().zip(ys).zip(names).map(|((x, y), name)| {
        EmptyElement::at((*x, *y))
            + Circle::new((0, 0), 4, color.mix(0.7).filled())
            + Text::new(name.to_string(), (5, -12), ("sans-serif", 12).into_font())
    }))?;
    Ok(())
}

fn draw_scatter_panel(
    path: &Path,
    before_label: &str,
    after_label: &str,
    variations: &[PartyVariation],
) -> ChartResult {
    let root = SVGBackend::new(path, (1400, 1000)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 2));

    let names: Vec<&str> = variations.iter().map(|v| v.party.as_str()).collect();
    let before: Vec<f64> = variations.iter().map(|v| v.votes_before as f64).collect();
    let after: Vec<f64> = variations.iter().map(|v| v.votes_after as f64).collect();
    let percent: Vec<f64> = variations.iter().map(|v| v.variation_percent).collect();
    let before_desc = format!("Votos {}", before_label);
    let after_desc = format!("Votos {}", after_label);
    let before_scaled = normalize(&before);
    let after_scaled = normalize(&after);

    draw_scatter(
        &panels[0],
        &format!("{} x {}", before_desc, after_desc),
        (before_desc.as_str(), after_desc.as_str()),
        &names,
        (&before[..], &after[..]),
        BLUE,
    )?;
    draw_scatter(
        &panels[1],
        &format!("{} x Variação %", before_desc),
        (before_desc.as_str(), "Variação %"),
        &names,
        (&before[..], &percent[..]),
        ORANGE,
    )?;
    draw_scatter(
        &panels[2],
        &format!("{} x Variação %", after_desc),
        (after_desc.as_str(), "Variação %"),
        &names,
        (&after[..], &percent[..]),
        DARK_GREEN,
    )?;
    let before_scaled_desc = format!("{} (escala 0-1)", before_desc);
    let after_scaled_desc = format!("{} (escala 0-1)", after_desc);
    draw_scatter(
        &panels[3],
        &format!("Normalizado: {} x {}", before_desc, after_desc),
        (before_scaled_desc.as_str(), after_scaled_desc.as_str()),
        &names,
        (&before_scaled[..], &after_scaled[..]),
        RED,
    )?;

    root.present()?;
    Ok(())
}
