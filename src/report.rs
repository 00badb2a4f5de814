// src/report.rs
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::{self, Write};
use tracing::{debug, warn};

use crate::catalog::{Event, GlossaryEntry, Metric, MetricCatalog};
use crate::headers::Strategy;
use crate::series::{DateRange, SeriesSummary};
use crate::table::BalanceSheet;

const SPARK_BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 60;

/// Display toggles for the rendered dashboard.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub range: DateRange,
    pub descriptions: bool,
    pub sparklines: bool,
    pub events: bool,
    pub glossary: bool,
    pub conclusions: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            range: DateRange::default(),
            descriptions: true,
            sparklines: true,
            events: true,
            glossary: true,
            conclusions: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricSummary {
    pub row: String,
    pub name: String,
    pub summary: Option<SeriesSummary>,
}

/// Machine-readable counterpart of the Markdown dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub title: String,
    pub unit: String,
    pub header_strategy: Option<Strategy>,
    pub missing_headers: usize,
    pub range: DateRange,
    pub total_assets: Option<MetricSummary>,
    pub metrics: Vec<MetricSummary>,
    /// Catalogued rows absent from the table.
    pub missing_rows: Vec<String>,
    pub events: Vec<Event>,
}

/// Summarize one catalogued metric, or `None` when its row is absent or
/// the headers are not dates.
fn summarize_metric(sheet: &BalanceSheet, metric: &Metric, range: &DateRange) -> Option<MetricSummary> {
    let series = match sheet.series(&metric.row) {
        Ok(s) => s.filter(range),
        Err(e) => {
            debug!(row = %metric.row, "skipping metric: {e:#}");
            return None;
        }
    };
    Some(MetricSummary {
        row: metric.row.clone(),
        name: metric.name.clone(),
        summary: series.summary(),
    })
}

pub fn summarize(sheet: &BalanceSheet, catalog: &MetricCatalog, range: &DateRange) -> DashboardSummary {
    let total_assets = summarize_metric(sheet, &catalog.total_assets, range);
    let mut metrics = Vec::new();
    let mut missing_rows = Vec::new();
    if total_assets.is_none() {
        missing_rows.push(catalog.total_assets.row.clone());
    }
    for metric in &catalog.metrics {
        match summarize_metric(sheet, metric, range) {
            Some(m) => metrics.push(m),
            None => missing_rows.push(metric.row.clone()),
        }
    }

    DashboardSummary {
        title: catalog.title.clone(),
        unit: catalog.unit.clone(),
        header_strategy: sheet.headers.strategy(),
        missing_headers: sheet.headers.missing_count(),
        range: *range,
        total_assets,
        metrics,
        missing_rows,
        events: catalog.events_in(range).into_iter().cloned().collect(),
    }
}

/// Unicode block sparkline of `values`, at most `width` characters wide.
/// Longer inputs are bucketed and each bucket averaged.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }
    let buckets: Vec<f64> = if values.len() <= width {
        values.to_vec()
    } else {
        (0..width)
            .map(|i| {
                let lo = i * values.len() / width;
                let hi = ((i + 1) * values.len() / width).max(lo + 1);
                let chunk = &values[lo..hi];
                chunk.iter().sum::<f64>() / chunk.len() as f64
            })
            .collect()
    };

    let min = buckets.iter().copied().fold(f64::INFINITY, f64::min);
    let max = buckets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    buckets
        .iter()
        .map(|&v| {
            if span <= 0.0 {
                SPARK_BLOCKS[SPARK_BLOCKS.len() / 2]
            } else {
                let idx = ((v - min) / span * (SPARK_BLOCKS.len() - 1) as f64).round() as usize;
                SPARK_BLOCKS[idx.min(SPARK_BLOCKS.len() - 1)]
            }
        })
        .collect()
}

fn format_amount(v: f64) -> String {
    let rounded = v.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    if rounded < 0 {
        format!("-{out}")
    } else {
        out
    }
}

fn write_metric_section(
    out: &mut String,
    sheet: &BalanceSheet,
    metric: &Metric,
    catalog: &MetricCatalog,
    options: &ReportOptions,
) -> fmt::Result {
    let series = match sheet.series(&metric.row) {
        Ok(s) => s.filter(&options.range),
        Err(e) => {
            debug!(row = %metric.row, "skipping section: {e:#}");
            return Ok(());
        }
    };

    writeln!(out, "## {}\n", metric.name)?;
    match series.summary() {
        Some(s) => {
            writeln!(
                out,
                "{} → {} · {} observaciones · {}",
                s.first.date, s.last.date, s.observations, catalog.unit
            )?;
            writeln!(
                out,
                "Inicio {} · Último {} · Mínimo {} ({}) · Máximo {} ({})",
                format_amount(s.first.value),
                format_amount(s.last.value),
                format_amount(s.min.value),
                s.min.date,
                format_amount(s.max.value),
                s.max.date,
            )?;
            if let Some(pct) = s.change_pct {
                writeln!(out, "Variación {} ({:+.1} %)", format_amount(s.change), pct)?;
            }
            if options.sparklines {
                writeln!(out, "\n`{}`", sparkline(&series.values(), SPARK_WIDTH))?;
            }
        }
        None => writeln!(out, "_Sin datos en el periodo seleccionado._")?,
    }
    if options.descriptions && !metric.desc.is_empty() {
        writeln!(out, "\n> 🔎 **Explicación:** {}", metric.desc)?;
    }
    out.push('\n');
    Ok(())
}

/// Title plus a warning box, for a section that cannot be drawn.
fn write_notice(out: &mut String, title: &str, notice: &str) -> fmt::Result {
    writeln!(out, "## {title}\n")?;
    writeln!(out, "> ⚠️ {notice}\n")
}

fn write_events(out: &mut String, events: &[&Event]) -> fmt::Result {
    writeln!(out, "## Cronología de acontecimientos\n")?;
    if events.is_empty() {
        return writeln!(out, "_Ningún acontecimiento en el periodo seleccionado._\n");
    }
    for e in events {
        if e.desc.is_empty() {
            writeln!(out, "- **{}** {}", e.date, e.title)?;
        } else {
            writeln!(out, "- **{}** {}: {}", e.date, e.title, e.desc)?;
        }
    }
    out.push('\n');
    Ok(())
}

fn write_glossary(out: &mut String, glossary: &[GlossaryEntry]) -> fmt::Result {
    writeln!(out, "## Glosario\n")?;
    for g in glossary {
        writeln!(out, "- **{}**: {}", g.term, g.definition)?;
    }
    out.push('\n');
    Ok(())
}

fn write_dashboard(
    out: &mut String,
    sheet: &BalanceSheet,
    catalog: &MetricCatalog,
    options: &ReportOptions,
) -> fmt::Result {
    writeln!(out, "# {}\n", catalog.title)?;
    for line in &catalog.intro {
        writeln!(out, "- {line}")?;
    }
    if !catalog.intro.is_empty() {
        out.push('\n');
    }

    let total = &catalog.total_assets;
    if !sheet.contains(&total.row) {
        warn!(row = %total.row, "total assets row not found");
        write_notice(
            out,
            &total.name,
            &format!("No se encuentra la línea '{}' en los datos.", total.row),
        )?;
    } else if !sheet.headers.is_dates() {
        warn!(row = %total.row, "column headers are not dates; no series to draw");
        write_notice(
            out,
            &total.name,
            "Las columnas de la tabla no son fechas; no se pueden mostrar series.",
        )?;
    } else {
        write_metric_section(out, sheet, total, catalog, options)?;
    }

    for metric in &catalog.metrics {
        write_metric_section(out, sheet, metric, catalog, options)?;
    }

    if options.events {
        write_events(out, &catalog.events_in(&options.range))?;
    }
    if options.glossary && !catalog.glossary.is_empty() {
        write_glossary(out, &catalog.glossary)?;
    }
    if options.conclusions && !catalog.conclusions.is_empty() {
        writeln!(out, "---\n\n## 🔔 Conclusiones principales\n")?;
        for c in &catalog.conclusions {
            writeln!(out, "- {c}")?;
        }
        if !catalog.summary.is_empty() {
            writeln!(out, "\n**En resumen:** {}", catalog.summary)?;
        }
    }
    Ok(())
}

/// Render the whole dashboard as Markdown.
pub fn render_markdown(
    sheet: &BalanceSheet,
    catalog: &MetricCatalog,
    options: &ReportOptions,
) -> Result<String> {
    let mut out = String::new();
    write_dashboard(&mut out, sheet, catalog, options).context("rendering dashboard")?;
    Ok(out)
}
