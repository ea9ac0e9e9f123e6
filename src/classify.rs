//! Month/year classification of the listing page.
//!
//! Listing pages come in two shapes: `Deaths_in_<Month>_<Year>` (scoped to a
//! month) and `Deaths_in_<Year>` (a whole year, sectioned by day). The
//! classification is derived from the configured URL alone and decides which
//! heading text opens the part of the page that gets watched.

use crate::models::PageClassification;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

/// English month names as they appear in listing-page headings.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

static MONTH_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Deaths_in_([A-Za-z]+)_(\d{4})").expect("valid static regex"));
static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Deaths_in_(\d{4})").expect("valid static regex"));
static DAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}$").expect("valid static regex"));

/// 1-based month number for an exact English month name.
pub fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
}

/// Extract `(month, year)` from a listing-page identifier.
///
/// The month-qualified pattern is tried first. An unknown month word still
/// yields the year, so the page is then treated like a year page.
///
/// # Arguments
///
/// * `page` - Page URL or title, e.g. `.../wiki/Deaths_in_December_2025`
///
/// # Returns
///
/// The month (1..=12) and year found, each `None` when absent.
pub fn parse_page_date(page: &str) -> (Option<u32>, Option<i32>) {
    if let Some(caps) = MONTH_YEAR_RE.captures(page) {
        let year = caps[2].parse().ok();
        if year.is_some() {
            return (month_number(&caps[1]), year);
        }
    }
    if let Some(caps) = YEAR_RE.captures(page) {
        return (None, caps[1].parse().ok());
    }
    (None, None)
}

/// Classify `page` against `today`.
///
/// A page is current when its year is today's year and, if it names a
/// month, that month is today's month.
#[instrument(level = "debug", skip_all, fields(%page, %today))]
pub fn classify(page: &str, today: NaiveDate) -> PageClassification {
    let (month, year) = parse_page_date(page);
    let is_current = match year {
        Some(y) if y == today.year() => month.is_none_or(|m| m == today.month()),
        _ => false,
    };
    debug!(?month, ?year, is_current, "Classified listing page");
    PageClassification {
        month,
        year,
        is_current,
    }
}

impl PageClassification {
    /// Whether a heading with `text` opens the watched part of the page.
    ///
    /// Current pages are sectioned by month name; everything else by day
    /// of month.
    pub fn starts_section(&self, text: &str) -> bool {
        if self.is_current {
            month_number(text).is_some()
        } else {
            DAY_RE.is_match(text)
        }
    }
}
