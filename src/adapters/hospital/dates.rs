//! Date and number extraction from scraped text
//!
//! Sites mix AD dates (`2024/02/23`, `2024-02-23`) with ROC-calendar dates
//! (`113/02/23`, year + 1911), sometimes several in one table cell.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Offset between the ROC calendar and the AD calendar
pub const ROC_YEAR_OFFSET: i32 = 1911;

/// A date found in text, with its byte span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateMatch {
    pub start: usize,
    pub end: usize,
    pub date: NaiveDate,
}

fn date_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(\d{4})[/-](\d{1,2})[/-](\d{1,2})|(\d{3})/(\d{1,2})/(\d{1,2})").ok()
        })
        .as_ref()
}

fn int_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()
}

/// Every AD or ROC date in `text`, in order. Impossible dates are dropped.
pub fn find_dates(text: &str) -> Vec<DateMatch> {
    let Some(pattern) = date_pattern() else {
        return Vec::new();
    };

    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let (year, month, day) = if let Some(year) = caps.get(1) {
                (year.as_str().parse::<i32>().ok()?, caps.get(2)?, caps.get(3)?)
            } else {
                let roc_year = caps.get(4)?.as_str().parse::<i32>().ok()?;
                (roc_year + ROC_YEAR_OFFSET, caps.get(5)?, caps.get(6)?)
            };
            let date = NaiveDate::from_ymd_opt(
                year,
                month.as_str().parse().ok()?,
                day.as_str().parse().ok()?,
            )?;
            Some(DateMatch {
                start: whole.start(),
                end: whole.end(),
                date,
            })
        })
        .collect()
}

/// The first date in `text`
pub fn parse_session_date(text: &str) -> Option<NaiveDate> {
    find_dates(text).first().map(|m| m.date)
}

/// Split `text` into one block per embedded date.
///
/// Each block runs from its date to the start of the next date; text before
/// the first date is discarded.
pub fn split_date_blocks(text: &str) -> Vec<(NaiveDate, &str)> {
    let matches = find_dates(text);
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let end = matches.get(i + 1).map_or(text.len(), |next| next.start);
            (m.date, &text[m.start..end])
        })
        .collect()
}

/// The first run of digits in `text`
pub fn first_int(text: &str) -> Option<i32> {
    int_pattern()?.find(text)?.as_str().parse().ok()
}
