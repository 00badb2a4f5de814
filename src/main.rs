use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ecb_dashboard::{
    catalog::{MetricCatalog, SearchMode},
    export,
    report::{self, ReportOptions},
    series::DateRange,
    BalanceSheet,
};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "ECB balance-sheet dashboard over a pivoted CSV of line items"
)]
struct Cli {
    /// Pivoted CSV: line items down, observation dates across.
    #[arg(long, env = "ECB_DATA", default_value = "pivoted_ecb_items_clean.csv")]
    data: PathBuf,
    /// YAML metric catalogue; the built-in one is used when absent.
    #[arg(long, env = "ECB_CATALOG")]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct RangeArgs {
    /// First date to include (YYYY-MM-DD or YYYYMMDD).
    #[arg(long)]
    from: Option<String>,
    /// Last date to include (YYYY-MM-DD or YYYYMMDD).
    #[arg(long)]
    to: Option<String>,
}

impl RangeArgs {
    fn range(&self) -> Result<DateRange> {
        DateRange::parse(self.from.as_deref(), self.to.as_deref())
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExportFormat {
    Csv,
    Parquet,
}

#[derive(Subcommand)]
enum Command {
    /// Show how the column headers were resolved.
    Headers,
    /// Render the dashboard.
    Report {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        no_descriptions: bool,
        #[arg(long)]
        no_sparklines: bool,
        #[arg(long)]
        no_events: bool,
        #[arg(long)]
        no_glossary: bool,
        #[arg(long)]
        no_conclusions: bool,
        /// Emit a JSON summary instead of Markdown.
        #[arg(long)]
        json: bool,
        /// Write to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Search catalogued metrics by name or description.
    Search {
        query: String,
        #[arg(long)]
        regex: bool,
    },
    /// Export line items to CSV or Parquet.
    Export {
        #[command(flatten)]
        range: RangeArgs,
        /// Line item to export (repeatable); all rows when omitted.
        #[arg(long = "item")]
        items: Vec<String>,
        /// Export only the catalogued metrics.
        #[arg(long, conflicts_with = "items")]
        catalogued: bool,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the glossary.
    Glossary,
    /// Print the events timeline.
    Timeline {
        #[command(flatten)]
        range: RangeArgs,
    },
}

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
}

fn load_catalog(path: Option<&Path>) -> Result<MetricCatalog> {
    match path {
        Some(p) => MetricCatalog::from_path(p),
        None => MetricCatalog::builtin(),
    }
}

fn open_output(out: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match out {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("creating {}", p.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    })
}

fn main() -> Result<()> {
    init_logging();
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let catalog_path = cli.catalog.as_deref();

    match cli.command {
        Command::Headers => {
            let sheet = BalanceSheet::from_path(&cli.data)?;
            match sheet.headers.strategy() {
                Some(s) => println!(
                    "{} columns resolved as dates ({}), {} missing",
                    sheet.headers.len(),
                    s,
                    sheet.headers.missing_count()
                ),
                None => println!("{} columns kept as labels", sheet.headers.len()),
            }
            if let Some((lo, hi)) = sheet.date_bounds() {
                println!("range {} → {}", lo, hi);
            }
            for (raw, resolved) in sheet.raw_headers.iter().zip(sheet.headers.display_labels()) {
                let shown = if resolved.is_empty() { "<missing>" } else { resolved.as_str() };
                println!("{raw}\t{shown}");
            }
        }

        Command::Report {
            range,
            no_descriptions,
            no_sparklines,
            no_events,
            no_glossary,
            no_conclusions,
            json,
            out,
        } => {
            let sheet = BalanceSheet::from_path(&cli.data)?;
            let catalog = load_catalog(catalog_path)?;
            let options = ReportOptions {
                range: range.range()?,
                descriptions: !no_descriptions,
                sparklines: !no_sparklines,
                events: !no_events,
                glossary: !no_glossary,
                conclusions: !no_conclusions,
            };
            let mut w = open_output(out.as_deref())?;
            if json {
                let summary = report::summarize(&sheet, &catalog, &options.range);
                serde_json::to_writer_pretty(&mut w, &summary).context("serializing summary")?;
                writeln!(w)?;
            } else {
                w.write_all(report::render_markdown(&sheet, &catalog, &options)?.as_bytes())?;
            }
            w.flush()?;
        }

        Command::Search { query, regex } => {
            let catalog = load_catalog(catalog_path)?;
            let mode = if regex { SearchMode::Regex } else { SearchMode::Plain };
            let hits = catalog.search(&query, mode)?;
            if hits.is_empty() {
                info!(%query, "no matching metrics");
            }
            for m in hits {
                println!("{}\t{}", m.name, m.row);
            }
        }

        Command::Export {
            range,
            items,
            catalogued,
            format,
            out,
        } => {
            let sheet = BalanceSheet::from_path(&cli.data)?;
            let range = range.range()?;
            let labels: Vec<String> = if catalogued {
                let catalog = load_catalog(catalog_path)?;
                std::iter::once(&catalog.total_assets)
                    .chain(catalog.metrics.iter())
                    .filter(|m| sheet.contains(&m.row))
                    .map(|m| m.row.clone())
                    .collect()
            } else {
                items
            };
            if catalogued && labels.is_empty() {
                bail!("none of the catalogued metrics are present in {}", cli.data.display());
            }
            match format {
                ExportFormat::Csv => {
                    let file = File::create(&out)
                        .with_context(|| format!("creating {}", out.display()))?;
                    let rows = export::write_csv(&sheet, &labels, &range, BufWriter::new(file))?;
                    info!(rows, path = %out.display(), "wrote CSV");
                }
                ExportFormat::Parquet => {
                    let bytes = export::write_parquet(&sheet, &labels, &range, &out)?;
                    info!(bytes, path = %out.display(), "wrote parquet");
                }
            }
        }

        Command::Glossary => {
            for g in &load_catalog(catalog_path)?.glossary {
                println!("{}: {}", g.term, g.definition);
            }
        }

        Command::Timeline { range } => {
            let catalog = load_catalog(catalog_path)?;
            for e in catalog.events_in(&range.range()?) {
                println!("{}\t{}\t{}", e.date, e.title, e.desc);
            }
        }
    }

    Ok(())
}
