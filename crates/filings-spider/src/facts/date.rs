use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

/// Canonical filing date format, e.g. `03Jun2020`.
pub const FILING_DATE_FORMAT: &str = "%d%b%Y";

lazy_static! {
    static ref DATE_TOKEN: Regex =
        Regex::new(r"^(\d{2}[A-Za-z]{3}\d{4})").expect("valid filing date pattern");
}

/// The filing date a stored file name starts with, in canonical form.
///
/// `03Jun2020_1145_report.xlsx` gives `03Jun2020`. A token of the right shape that is not a real
/// date is returned as is; a name without one gives its first `_`-delimited segment.
pub fn normalize_filing_date(file_name: &str) -> String {
    match DATE_TOKEN.captures(file_name) {
        Some(caps) => {
            let token = &caps[1];
            match parse_filing_date(token) {
                Some(date) => date.format(FILING_DATE_FORMAT).to_string(),
                None => token.to_string(),
            }
        }
        None => file_name
            .split('_')
            .next()
            .unwrap_or(file_name)
            .to_string(),
    }
}

pub fn parse_filing_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, FILING_DATE_FORMAT).ok()
}

/// Sort key of a filing date; unparsable dates are the oldest possible.
pub fn sort_key(date: &str) -> NaiveDate {
    parse_filing_date(date).unwrap_or(NaiveDate::MIN)
}
