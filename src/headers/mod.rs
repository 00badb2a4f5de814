//! Column-header date resolution.
//!
//! The pivoted balance-sheet tables label their columns with observation
//! dates, but depending on how the file was produced those labels arrive as
//! ISO strings, compact `YYYYMMDD` numbers or already-typed dates. [`resolve`]
//! normalizes them with an ordered chain of strategies:
//!
//! 1. [`Strategy::Direct`]: every label parses under a common inferred format.
//!    All-or-nothing.
//! 2. [`Strategy::Compact`]: `YYYYMMDD`, failures become missing entries.
//! 3. [`Strategy::Hyphenated`]: `YYYY-MM-DD`, failures become missing entries.
//!
//! A fallback strategy is accepted as soon as one label parses. When nothing
//! parses the labels are handed back untouched as [`ResolvedHeaders::Labels`].

pub mod date_parser;

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// One column identifier as read from the input table.
///
/// `Integer` and `Float` are for callers that already hold typed headers;
/// the fallback strategies see them through their `Display` form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HeaderLabel {
    Date(NaiveDate),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl HeaderLabel {
    /// A header cell exactly as read from a file. CSV headers are text; the
    /// strategies decide whether that text is a date.
    pub fn raw(cell: &str) -> Self {
        HeaderLabel::Text(cell.to_string())
    }
}

impl fmt::Display for HeaderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderLabel::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            HeaderLabel::Integer(i) => write!(f, "{}", i),
            HeaderLabel::Float(x) => write!(f, "{}", x),
            HeaderLabel::Text(s) => f.write_str(s),
        }
    }
}

/// Which step of the fallback chain produced the dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Direct,
    Compact,
    Hyphenated,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Direct => "direct",
            Strategy::Compact => "compact (YYYYMMDD)",
            Strategy::Hyphenated => "hyphenated (YYYY-MM-DD)",
        })
    }
}

/// Output of [`resolve`]; always the same length and order as the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "headers", rename_all = "snake_case")]
pub enum ResolvedHeaders {
    /// `None` marks a missing entry. Only fallback strategies produce them.
    Dates {
        strategy: Strategy,
        dates: Vec<Option<NaiveDate>>,
    },
    /// Nothing parsed; the original labels.
    Labels(Vec<HeaderLabel>),
}

impl ResolvedHeaders {
    pub fn len(&self) -> usize {
        match self {
            ResolvedHeaders::Dates { dates, .. } => dates.len(),
            ResolvedHeaders::Labels(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_dates(&self) -> bool {
        matches!(self, ResolvedHeaders::Dates { .. })
    }

    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            ResolvedHeaders::Dates { strategy, .. } => Some(*strategy),
            ResolvedHeaders::Labels(_) => None,
        }
    }

    pub fn dates(&self) -> Option<&[Option<NaiveDate>]> {
        match self {
            ResolvedHeaders::Dates { dates, .. } => Some(dates),
            ResolvedHeaders::Labels(_) => None,
        }
    }

    /// Number of entries a fallback strategy could not parse.
    pub fn missing_count(&self) -> usize {
        self.dates()
            .map(|d| d.iter().filter(|x| x.is_none()).count())
            .unwrap_or(0)
    }

    /// Back to labels: dates become [`HeaderLabel::Date`], missing entries
    /// become empty text.
    pub fn to_labels(&self) -> Vec<HeaderLabel> {
        match self {
            ResolvedHeaders::Dates { dates, .. } => dates
                .iter()
                .map(|d| match d {
                    Some(d) => HeaderLabel::Date(*d),
                    None => HeaderLabel::Text(String::new()),
                })
                .collect(),
            ResolvedHeaders::Labels(labels) => labels.clone(),
        }
    }

    /// Column titles for display and export.
    pub fn display_labels(&self) -> Vec<String> {
        self.to_labels().iter().map(ToString::to_string).collect()
    }
}

/// Resolve a sequence of header labels into dates, falling back through the
/// strategies in order. Never fails: if nothing parses the input is returned
/// unchanged.
pub fn resolve(headers: &[HeaderLabel]) -> ResolvedHeaders {
    if let Some(dates) = parse_direct(headers) {
        return ResolvedHeaders::Dates {
            strategy: Strategy::Direct,
            dates: dates.into_iter().map(Some).collect(),
        };
    }

    let fallbacks: [(Strategy, fn(&str) -> Option<NaiveDate>); 2] = [
        (Strategy::Compact, date_parser::parse_compact),
        (Strategy::Hyphenated, date_parser::parse_hyphenated),
    ];
    for (strategy, parse) in fallbacks {
        let dates: Vec<Option<NaiveDate>> =
            headers.iter().map(|h| parse(&h.to_string())).collect();
        if dates.iter().any(Option::is_some) {
            return ResolvedHeaders::Dates { strategy, dates };
        }
    }

    ResolvedHeaders::Labels(headers.to_vec())
}

/// All-or-nothing parse: typed dates pass through, every text label must
/// share one inferred format, numbers never qualify.
fn parse_direct(headers: &[HeaderLabel]) -> Option<Vec<NaiveDate>> {
    let mut texts: Vec<&str> = Vec::new();
    for h in headers {
        match h {
            HeaderLabel::Date(_) => {}
            HeaderLabel::Text(s) => texts.push(s.trim()),
            HeaderLabel::Integer(_) | HeaderLabel::Float(_) => return None,
        }
    }

    let format = if texts.is_empty() {
        None
    } else {
        Some(date_parser::infer_common_format(texts.iter().copied())?)
    };

    headers
        .iter()
        .map(|h| match (h, format) {
            (HeaderLabel::Date(d), _) => Some(*d),
            (HeaderLabel::Text(s), Some(fmt)) => fmt.parse(s.trim()),
            _ => None,
        })
        .collect()
}
