use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Candidate formats for direct parsing, tried in order.
///
/// Date-time patterns come first so that `"1999-01-04 00:00:00"` is not
/// rejected by the shorter date-only pattern.
pub const DIRECT_FORMATS: &[DirectFormat] = &[
    DirectFormat::Rfc3339,
    DirectFormat::DateTime("%Y-%m-%dT%H:%M:%S"),
    DirectFormat::DateTime("%Y-%m-%d %H:%M:%S"),
    DirectFormat::DateTime("%Y/%m/%d %H:%M:%S"),
    DirectFormat::Date("%Y-%m-%d"),
    DirectFormat::Date("%Y/%m/%d"),
    DirectFormat::Date("%Y.%m.%d"),
    // European before US: the source data is ECB
    DirectFormat::Date("%d/%m/%Y"),
    DirectFormat::Date("%d.%m.%Y"),
    DirectFormat::Date("%m/%d/%Y"),
    DirectFormat::Date("%d %B %Y"),
    DirectFormat::Date("%B %d, %Y"),
    DirectFormat::Date("%d %b %Y"),
    DirectFormat::Date("%b %d, %Y"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectFormat {
    Rfc3339,
    DateTime(&'static str),
    Date(&'static str),
}

impl DirectFormat {
    /// Parse `s` with this format, keeping only the calendar date.
    pub fn parse(&self, s: &str) -> Option<NaiveDate> {
        match self {
            DirectFormat::Rfc3339 => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive()),
            DirectFormat::DateTime(fmt) => NaiveDateTime::parse_from_str(s, fmt)
                .ok()
                .map(|dt| dt.date()),
            DirectFormat::Date(fmt) => NaiveDate::parse_from_str(s, fmt).ok(),
        }
    }
}

/// Pick the first format in [`DIRECT_FORMATS`] that parses every one of
/// `values`. Formats are eliminated as soon as one value fails.
pub fn infer_common_format<'a, I>(values: I) -> Option<DirectFormat>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    DIRECT_FORMATS
        .iter()
        .copied()
        .find(|fmt| values.clone().into_iter().all(|v| fmt.parse(v).is_some()))
}

/// Fast parse of `"YYYYMMDD"` (exactly eight ASCII digits).
pub fn parse_compact(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse `"YYYY-MM-DD"`.
pub fn parse_hyphenated(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn compact_accepts_only_eight_digits() {
        assert_eq!(parse_compact("19990104"), Some(ymd(1999, 1, 4)));
        assert_eq!(parse_compact(" 20240229 "), Some(ymd(2024, 2, 29)));
        assert_eq!(parse_compact("1999014"), None);
        assert_eq!(parse_compact("1999-01-04"), None);
        assert_eq!(parse_compact("19991304"), None);
        assert_eq!(parse_compact("20230229"), None);
    }

    #[test]
    fn hyphenated_parses_iso_dates() {
        assert_eq!(parse_hyphenated("1999-01-04"), Some(ymd(1999, 1, 4)));
        assert_eq!(parse_hyphenated("19990104"), None);
        assert_eq!(parse_hyphenated("Assets"), None);
    }

    #[test]
    fn common_format_is_found_by_elimination() {
        // "13/02/2020" rules out month-first, leaving day-first
        let values = ["01/02/2020", "13/02/2020"];
        let fmt = infer_common_format(values.iter().copied()).unwrap();
        assert_eq!(fmt, DirectFormat::Date("%d/%m/%Y"));

        let values = ["1999-01-04 00:00:00", "1999-01-11 00:00:00"];
        let fmt = infer_common_format(values.iter().copied()).unwrap();
        assert_eq!(fmt.parse(values[1]), Some(ymd(1999, 1, 11)));

        let values = ["1999-01-04", "04/01/1999"];
        assert!(infer_common_format(values.iter().copied()).is_none());
    }

    #[test]
    fn rfc3339_keeps_the_calendar_date() {
        assert_eq!(
            DirectFormat::Rfc3339.parse("2008-10-15T00:00:00+02:00"),
            Some(ymd(2008, 10, 15))
        );
    }
}
