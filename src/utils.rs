use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Full date layouts tried in order. Month-first US dates come after ISO.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y %b %d",
    "%Y %B %d",
    "%d %b %Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Cell values read as missing, the default NA strings of tabular readers.
/// Matched exactly, without trimming.
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Parses a `publish_time` value into a calendar date.
///
/// Accepts ISO dates, date-times (the time part is dropped), bare years
/// (`2020` → January 1st) and year-months (`2020-03`, `2020 Mar` → the 1st).
/// Returns `None` for empty or unrecognised input.
///
/// # Arguments
///
/// * `value` - The raw cell content
pub fn parse_publish_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    {
        return Some(date);
    }

    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return Some(datetime.date());
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }

    parse_partial_date(value)
}

/// Handles `YYYY`, `YYYY-MM` and `YYYY Mon` values.
fn parse_partial_date(value: &str) -> Option<NaiveDate> {
    if is_year(value) {
        return NaiveDate::from_ymd_opt(value.parse().ok()?, 1, 1);
    }

    if let Some((year, month)) = value.split_once('-') {
        if is_year(year) && (1..=2).contains(&month.len()) {
            let month = month.parse::<u32>().ok()?;
            return NaiveDate::from_ymd_opt(year.parse().ok()?, month, 1);
        }
        return None;
    }

    let with_day = format!("{value} 1");
    NaiveDate::parse_from_str(&with_day, "%Y %b %d")
        .or_else(|_| NaiveDate::parse_from_str(&with_day, "%Y %B %d"))
        .ok()
}

fn is_year(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Whether a raw cell is one of the [`NA_VALUES`].
pub fn is_na_marker(value: &str) -> bool {
    NA_VALUES.contains(&value)
}

/// Maps an empty or NA-marker cell to `None`.
pub fn non_empty(value: &str) -> Option<String> {
    if is_na_marker(value) {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[rstest]
    #[case("2020-03-01", ymd(2020, 3, 1))]
    #[case(" 2020-03-01 ", ymd(2020, 3, 1))]
    #[case("2020/03/01", ymd(2020, 3, 1))]
    #[case("03/01/2020", ymd(2020, 3, 1))]
    #[case("2020 Mar 1", ymd(2020, 3, 1))]
    #[case("2020 March 1", ymd(2020, 3, 1))]
    #[case("1 Mar 2020", ymd(2020, 3, 1))]
    #[case("March 1, 2020", ymd(2020, 3, 1))]
    #[case("2020-03-01 12:30:00", ymd(2020, 3, 1))]
    #[case("2020-03-01T12:30:00", ymd(2020, 3, 1))]
    #[case("2020-03-01 12:30", ymd(2020, 3, 1))]
    #[case("2020-03-01T12:30", ymd(2020, 3, 1))]
    #[case("2020-03-01T12:30:00Z", ymd(2020, 3, 1))]
    #[case("2020-03-01T12:30:00+02:00", ymd(2020, 3, 1))]
    #[case("2020", ymd(2020, 1, 1))]
    #[case("2020-03", ymd(2020, 3, 1))]
    #[case("2020-3", ymd(2020, 3, 1))]
    #[case("2020 Mar", ymd(2020, 3, 1))]
    #[case("", None)]
    #[case("   ", None)]
    #[case("bad-date", None)]
    #[case("2020-13", None)]
    #[case("2020-02-30", None)]
    #[case("20", None)]
    #[case("unknown", None)]
    fn test_parse_publish_date(#[case] input: &str, #[case] expected: Option<NaiveDate>) {
        assert_eq!(parse_publish_date(input), expected);
    }

    #[rstest]
    #[case("", None)]
    #[case("Vaccine", Some("Vaccine".to_string()))]
    #[case(" ", Some(" ".to_string()))]
    #[case("NA", None)]
    #[case("NaN", None)]
    #[case("null", None)]
    #[case("Nancy", Some("Nancy".to_string()))]
    fn test_non_empty(#[case] input: &str, #[case] expected: Option<String>) {
        assert_eq!(non_empty(input), expected);
    }

    #[rstest]
    #[case("", true)]
    #[case("NA", true)]
    #[case("N/A", true)]
    #[case("n/a", true)]
    #[case("nan", true)]
    #[case("NULL", true)]
    #[case("None", true)]
    #[case("<NA>", true)]
    #[case("#N/A", true)]
    #[case(" NA", false)]
    #[case("na", false)]
    #[case("Nature", false)]
    fn test_is_na_marker(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_na_marker(input), expected);
    }
}
