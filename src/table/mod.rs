// src/table/mod.rs
pub mod utils;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::{collections::HashMap, fs::File, io::Read, path::Path};
use tracing::{debug, info, warn};

use crate::headers::{self, HeaderLabel, ResolvedHeaders};
use crate::series::TimeSeries;
use utils::{clean_str, parse_cell, Cell};

/// One row of the balance sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    /// Row label from the index column, e.g. "Banknotes in circulation".
    pub label: String,
    /// One value per column; `None` where the cell was empty or not a number.
    pub values: Vec<Option<f64>>,
}

/// A pivoted balance-sheet table: line items down, observation dates across.
#[derive(Debug, Clone)]
pub struct BalanceSheet {
    /// Title of the index column (first header cell), often empty.
    pub index_name: String,
    /// Header cells as they appeared in the file.
    pub raw_headers: Vec<String>,
    pub headers: ResolvedHeaders,
    items: Vec<LineItem>,
    by_label: HashMap<String, usize>,
}

impl BalanceSheet {
    #[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open CSV file: {:?}", path.as_ref()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to load balance sheet from {:?}", path.as_ref()))
    }

    /// Read a CSV whose first column is the row index and whose remaining
    /// header cells are the column labels to resolve.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let header_record = rdr.headers().context("reading CSV header row")?.clone();
        if header_record.is_empty() {
            bail!("CSV has no header row");
        }
        let index_name = clean_str(&header_record[0]);
        let raw_headers: Vec<String> = header_record.iter().skip(1).map(str::to_string).collect();

        let labels: Vec<HeaderLabel> = raw_headers.iter().map(|h| HeaderLabel::raw(h)).collect();
        let headers = headers::resolve(&labels);
        match headers.strategy() {
            Some(strategy) => {
                info!(columns = headers.len(), %strategy, "resolved column headers");
                let missing = headers.missing_count();
                if missing > 0 {
                    warn!(
                        missing,
                        columns = headers.len(),
                        "header parse left unparseable columns; they are skipped in series"
                    );
                }
            }
            None => warn!(
                columns = headers.len(),
                "column headers are not dates; keeping original labels"
            ),
        }

        let mut items: Vec<LineItem> = Vec::new();
        let mut by_label: HashMap<String, usize> = HashMap::new();
        let mut invalid_cells = 0usize;

        for (idx, result) in rdr.records().enumerate() {
            // header is line 1
            let record =
                result.with_context(|| format!("CSV parse error at record {}", idx + 2))?;
            let label = clean_str(record.get(0).unwrap_or_default());

            let values: Vec<Option<f64>> = record
                .iter()
                .skip(1)
                .map(|raw| match parse_cell(raw) {
                    Cell::Value(v) => Some(v),
                    Cell::Missing => None,
                    Cell::Invalid => {
                        invalid_cells += 1;
                        debug!(row = %label, cell = raw, "non-numeric cell treated as missing");
                        None
                    }
                })
                .collect();

            if by_label.contains_key(&label) {
                warn!(row = %label, "duplicate line item; keeping the first occurrence");
            } else {
                by_label.insert(label.clone(), items.len());
            }
            items.push(LineItem { label, values });
        }

        if invalid_cells > 0 {
            warn!(invalid_cells, "non-numeric cells treated as missing");
        }
        info!(rows = items.len(), "loaded balance sheet");

        Ok(Self {
            index_name,
            raw_headers,
            headers,
            items,
            by_label,
        })
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up a line item by its (trimmed) label.
    pub fn item(&self, label: &str) -> Option<&LineItem> {
        self.by_label
            .get(label.trim())
            .map(|&i| &self.items[i])
    }

    pub fn contains(&self, label: &str) -> bool {
        self.item(label).is_some()
    }

    /// Dated series for one line item. Columns with a missing date or a
    /// missing value are skipped.
    pub fn series(&self, label: &str) -> Result<TimeSeries> {
        let item = self
            .item(label)
            .with_context(|| format!("line item {:?} not found", label))?;
        let Some(dates) = self.headers.dates() else {
            bail!("column headers are not dates; cannot build a series for {:?}", label);
        };

        let points: Vec<(NaiveDate, f64)> = dates
            .iter()
            .zip(&item.values)
            .filter_map(|(d, v)| Some(((*d)?, (*v)?)))
            .collect();
        Ok(TimeSeries::new(item.label.clone(), points))
    }

    /// Earliest and latest resolved column dates.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.headers.dates()?;
        let mut it = dates.iter().flatten().copied();
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::Strategy;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
,19990108,19990115,19990122
Assets,697043,690527,
Banknotes in circulation,\"341,708\",335052,331316
Deposit facility,1284,n.a.,752
";

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn loads_pivoted_csv() -> Result<()> {
        let sheet = BalanceSheet::from_reader(Cursor::new(SAMPLE))?;
        assert_eq!(sheet.index_name, "");
        assert_eq!(sheet.headers.strategy(), Some(Strategy::Compact));
        assert_eq!(sheet.items().len(), 3);
        assert_eq!(
            sheet.date_bounds(),
            Some((ymd(1999, 1, 8), ymd(1999, 1, 22)))
        );

        let assets = sheet.item("Assets").unwrap();
        assert_eq!(assets.values, vec![Some(697043.0), Some(690527.0), None]);

        // thousands separators are not numbers
        let notes = sheet.item(" Banknotes in circulation ").unwrap();
        assert_eq!(notes.values[0], None);

        let deposit = sheet.item("Deposit facility").unwrap();
        assert_eq!(deposit.values, vec![Some(1284.0), None, Some(752.0)]);
        Ok(())
    }

    #[test]
    fn series_skips_missing_values() -> Result<()> {
        let sheet = BalanceSheet::from_reader(Cursor::new(SAMPLE))?;
        let s = sheet.series("Assets")?;
        assert_eq!(
            s.points(),
            &[(ymd(1999, 1, 8), 697043.0), (ymd(1999, 1, 15), 690527.0)]
        );
        assert!(sheet.series("Gold").is_err());
        Ok(())
    }

    #[test]
    fn non_date_headers_keep_labels() -> Result<()> {
        let csv = "item,Assets,Liabilities\nTotal,1,2\n";
        let sheet = BalanceSheet::from_reader(Cursor::new(csv))?;
        assert_eq!(sheet.index_name, "item");
        assert!(!sheet.headers.is_dates());
        assert_eq!(sheet.headers.display_labels(), vec!["Assets", "Liabilities"]);
        assert!(sheet.series("Total").is_err());
        assert_eq!(sheet.date_bounds(), None);
        Ok(())
    }

    #[test]
    fn numeric_headers_are_not_rewritten() -> Result<()> {
        let csv = ",007,1.50,1e3\nAssets,1,2,3\n";
        let sheet = BalanceSheet::from_reader(Cursor::new(csv))?;
        assert!(!sheet.headers.is_dates());
        assert_eq!(sheet.headers.display_labels(), vec!["007", "1.50", "1e3"]);

        let csv = ",0019990104,+19990111,19990118.0\nAssets,1,2,3\n";
        let sheet = BalanceSheet::from_reader(Cursor::new(csv))?;
        assert_eq!(sheet.headers.strategy(), None);
        assert_eq!(sheet.date_bounds(), None);
        Ok(())
    }

    #[test]
    fn duplicate_rows_resolve_to_first() -> Result<()> {
        let csv = ",1999-01-08\nAssets,1\nAssets,2\n";
        let sheet = BalanceSheet::from_reader(Cursor::new(csv))?;
        assert_eq!(sheet.headers.strategy(), Some(Strategy::Direct));
        assert_eq!(sheet.items().len(), 2);
        assert_eq!(sheet.item("Assets").unwrap().values, vec![Some(1.0)]);
        Ok(())
    }

    #[test]
    fn ragged_rows_are_an_error() {
        let csv = ",1999-01-08,1999-01-15\nAssets,1\n";
        let err = BalanceSheet::from_reader(Cursor::new(csv)).unwrap_err();
        assert!(format!("{:#}", err).contains("record 2"));
    }

    #[test]
    fn from_path_reads_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(SAMPLE.as_bytes())?;
        let sheet = BalanceSheet::from_path(tmp.path())?;
        assert!(sheet.contains("Deposit facility"));
        Ok(())
    }
}
