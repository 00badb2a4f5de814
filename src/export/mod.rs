//! Writing a slice of the balance sheet back out, either as a wide CSV shaped
//! like the input or as a long-format Parquet file.

pub mod csv_writer;
pub mod parquet_writer;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use crate::headers::ResolvedHeaders;
use crate::series::DateRange;
use crate::table::{BalanceSheet, LineItem};

pub use csv_writer::write_csv;
pub use parquet_writer::write_parquet;

/// A column picked for export: its position in the sheet and its title.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportColumn {
    pub index: usize,
    pub title: String,
    pub date: Option<NaiveDate>,
}

/// Resolve item labels to rows. An empty selection means every row.
pub fn select_items<'a>(sheet: &'a BalanceSheet, labels: &[String]) -> Result<Vec<&'a LineItem>> {
    if labels.is_empty() {
        return Ok(sheet.items().iter().collect());
    }
    labels
        .iter()
        .map(|l| {
            sheet
                .item(l)
                .with_context(|| format!("line item {:?} not found", l))
        })
        .collect()
}

/// Columns inside `range`.
///
/// With date headers, columns whose date could not be parsed are kept only
/// when the range is unbounded, under their raw title. With label headers
/// the range must be unbounded.
pub fn select_columns(sheet: &BalanceSheet, range: &DateRange) -> Result<Vec<ExportColumn>> {
    match &sheet.headers {
        ResolvedHeaders::Dates { dates, .. } => Ok(dates
            .iter()
            .enumerate()
            .filter_map(|(index, d)| match d {
                Some(d) if range.contains(*d) => Some(ExportColumn {
                    index,
                    title: d.format("%Y-%m-%d").to_string(),
                    date: Some(*d),
                }),
                None if range.is_unbounded() => Some(ExportColumn {
                    index,
                    title: sheet.raw_headers[index].clone(),
                    date: None,
                }),
                _ => None,
            })
            .collect()),
        ResolvedHeaders::Labels(labels) => {
            if !range.is_unbounded() {
                bail!("column headers are not dates; a date range cannot be applied");
            }
            Ok(labels
                .iter()
                .enumerate()
                .map(|(index, l)| ExportColumn {
                    index,
                    title: l.to_string(),
                    date: None,
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn columns_follow_the_range() -> Result<()> {
        let sheet = BalanceSheet::from_reader(Cursor::new(
            ",19990108,total,19990122\nAssets,1,2,3\n",
        ))?;
        let all = select_columns(&sheet, &DateRange::default())?;
        let titles: Vec<&str> = all.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["1999-01-08", "total", "1999-01-22"]);

        let later = select_columns(&sheet, &DateRange::parse(Some("1999-01-10"), None)?)?;
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].index, 2);
        Ok(())
    }

    #[test]
    fn label_headers_reject_ranges() -> Result<()> {
        let sheet = BalanceSheet::from_reader(Cursor::new(",a,b\nAssets,1,2\n"))?;
        assert_eq!(select_columns(&sheet, &DateRange::default())?.len(), 2);
        assert!(select_columns(&sheet, &DateRange::parse(Some("1999-01-01"), None)?).is_err());
        Ok(())
    }

    #[test]
    fn unknown_items_are_named_in_the_error() -> Result<()> {
        let sheet = BalanceSheet::from_reader(Cursor::new(",1999-01-08\nAssets,1\n"))?;
        assert_eq!(select_items(&sheet, &[])?.len(), 1);
        let err = select_items(&sheet, &["Gold".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Gold"));
        Ok(())
    }
}
