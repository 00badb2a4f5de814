use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::headers::date_parser::{parse_compact, parse_hyphenated};

/// Inclusive date window. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                bail!("date range start {} is after end {}", s, e);
            }
        }
        Ok(Self { start, end })
    }

    /// Build a range from optional `YYYY-MM-DD` / `YYYYMMDD` bounds.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Self::new(
            start.map(parse_bound).transpose()?,
            end.map(parse_bound).transpose()?,
        )
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

fn parse_bound(s: &str) -> Result<NaiveDate> {
    match parse_hyphenated(s).or_else(|| parse_compact(s)) {
        Some(d) => Ok(d),
        None => bail!("invalid date {:?}: expected YYYY-MM-DD or YYYYMMDD", s),
    }
}

/// The dated values of one line item, in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub label: String,
    points: Vec<(NaiveDate, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub date: NaiveDate,
    pub value: f64,
}

impl From<(NaiveDate, f64)> for Point {
    fn from((date, value): (NaiveDate, f64)) -> Self {
        Self { date, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub observations: usize,
    pub first: Point,
    pub last: Point,
    pub min: Point,
    pub max: Point,
    pub change: f64,
    /// `None` when the first value is zero.
    pub change_pct: Option<f64>,
}

impl TimeSeries {
    pub fn new(label: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|&(_, v)| v).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn filter(&self, range: &DateRange) -> TimeSeries {
        TimeSeries {
            label: self.label.clone(),
            points: self
                .points
                .iter()
                .copied()
                .filter(|&(d, _)| range.contains(d))
                .collect(),
        }
    }

    pub fn summary(&self) -> Option<SeriesSummary> {
        let first = *self.points.first()?;
        let last = *self.points.last()?;
        // ties keep the earliest point
        let min = self
            .points
            .iter()
            .copied()
            .fold(first, |acc, p| if p.1 < acc.1 { p } else { acc });
        let max = self
            .points
            .iter()
            .copied()
            .fold(first, |acc, p| if p.1 > acc.1 { p } else { acc });

        let change = last.1 - first.1;
        let change_pct = (first.1 != 0.0).then(|| change / first.1.abs() * 100.0);

        Some(SeriesSummary {
            observations: self.points.len(),
            first: first.into(),
            last: last.into(),
            min: min.into(),
            max: max.into(),
            change,
            change_pct,
        })
    }
}
