use anyhow::{bail, Context, Result};
use arrow::{
    array::{ArrayRef, Date32Array, Float64Array, StringArray},
    datatypes::{DataType, Date32Type, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    path::Path,
    sync::Arc,
};
use tracing::info;

use super::{select_columns, select_items};
use crate::series::DateRange;
use crate::table::BalanceSheet;

/// Long-format schema: one row per (item, date).
pub fn long_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("item", DataType::Utf8, false),
        Field::new("date", DataType::Date32, false),
        Field::new("value", DataType::Float64, true),
    ]))
}

/// Write the selected items within `range` to `output_path` as Parquet.
/// Columns without a resolved date are left out.
///
/// Returns the size of the written file in bytes.
#[tracing::instrument(level = "info", skip(sheet, labels, output_path), fields(path = %output_path.display()))]
pub fn write_parquet(
    sheet: &BalanceSheet,
    labels: &[String],
    range: &DateRange,
    output_path: &Path,
) -> Result<u64> {
    if !sheet.headers.is_dates() {
        bail!("column headers are not dates; Parquet export needs dated columns");
    }
    let items = select_items(sheet, labels)?;
    let columns: Vec<_> = select_columns(sheet, range)?
        .into_iter()
        .filter_map(|c| c.date.map(|d| (c.index, d)))
        .collect();

    let rows = items.len() * columns.len();
    let mut item_col: Vec<String> = Vec::with_capacity(rows);
    let mut date_col: Vec<i32> = Vec::with_capacity(rows);
    let mut value_col: Vec<Option<f64>> = Vec::with_capacity(rows);
    for item in &items {
        for &(index, date) in &columns {
            item_col.push(item.label.clone());
            date_col.push(Date32Type::from_naive_date(date));
            value_col.push(item.values[index]);
        }
    }

    let schema = long_schema();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(item_col)) as ArrayRef,
            Arc::new(Date32Array::from(date_col)) as ArrayRef,
            Arc::new(Float64Array::from(value_col)) as ArrayRef,
        ],
    )
    .context("building record batch")?;

    let file = File::create(output_path)
        .with_context(|| format!("creating file {}", output_path.display()))?;

    let props = WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
        .build();

    let mut writer =
        ArrowWriter::try_new(file, schema, Some(props)).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch to parquet")?;
    writer.close().context("closing parquet writer")?;

    let metadata = fs::metadata(output_path).context("getting file metadata")?;
    info!(rows, bytes = metadata.len(), "exported parquet");
    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};
    use chrono::NaiveDate;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn writes_long_format() -> Result<()> {
        let sheet = BalanceSheet::from_reader(Cursor::new(
            ",19990108,19990115,bad\nAssets,697043,,1\nDeposit facility,1284,987,2\n",
        ))?;
        let dir = tempdir()?;
        let path = dir.path().join("ecb.parquet");

        let bytes = write_parquet(&sheet, &[], &DateRange::default(), &path)?;
        assert!(bytes > 0);

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let mut total = 0;
        let mut nulls = 0;
        let mut dates = Vec::new();
        for batch in reader {
            let batch = batch?;
            assert_eq!(batch.schema().field(1).data_type(), &DataType::Date32);
            total += batch.num_rows();
            nulls += batch.column(2).null_count();
            let col = batch.column(1).as_primitive::<Date32Type>();
            dates.extend(col.values().iter().map(|&d| Date32Type::to_naive_date(d)));
        }
        // 2 items x 2 dated columns; the "bad" column has no date
        assert_eq!(total, 4);
        assert_eq!(nulls, 1);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(1999, 1, 8).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(1999, 1, 15).unwrap());
        Ok(())
    }

    #[test]
    fn label_headers_are_rejected() -> Result<()> {
        let sheet = BalanceSheet::from_reader(Cursor::new(",a,b\nAssets,1,2\n"))?;
        let dir = tempdir()?;
        let path = dir.path().join("x.parquet");
        assert!(write_parquet(&sheet, &[], &DateRange::default(), &path).is_err());
        assert!(!path.exists());
        Ok(())
    }
}
