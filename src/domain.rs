use crate::constants;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// An admissions record exactly as it appears in the source CSV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAdmission {
    pub patient_id: String,
    pub admission_date: String,
    pub discharge_date: String,
    pub diagnosis: String,
    pub department: String,
}

/// An admissions record with normalized date fields.
/// This is the shape that crosses the storage seam; a `None` discharge date
/// means the patient is still admitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admission {
    pub patient_id: String,
    pub admission_date: Option<NaiveDate>,
    pub discharge_date: Option<NaiveDate>,
    pub diagnosis: String,
    pub department: String,
}

/// Outcome of coercing one raw date field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCoercion {
    Parsed(NaiveDate),
    Missing,
    Invalid,
}

impl DateCoercion {
    pub fn into_option(self) -> Option<NaiveDate> {
        match self {
            DateCoercion::Parsed(date) => Some(date),
            DateCoercion::Missing | DateCoercion::Invalid => None,
        }
    }
}

/// Parse a raw date field against the accepted formats, falling back to the
/// datetime formats and taking the date part. Unparseable values coerce to
/// `Invalid` rather than failing the record.
pub fn coerce_date(raw: &str) -> DateCoercion {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DateCoercion::Missing;
    }
    for format in constants::DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return DateCoercion::Parsed(date);
        }
    }
    for format in constants::DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return DateCoercion::Parsed(datetime.date());
        }
    }
    DateCoercion::Invalid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(coerce_date("2024-04-01"), DateCoercion::Parsed(date(2024, 4, 1)));
    }

    #[test]
    fn parses_slashed_and_us_dates() {
        assert_eq!(coerce_date("2024/04/01"), DateCoercion::Parsed(date(2024, 4, 1)));
        assert_eq!(coerce_date("04/15/2024"), DateCoercion::Parsed(date(2024, 4, 15)));
    }

    #[test]
    fn takes_date_part_of_datetimes() {
        assert_eq!(
            coerce_date("2024-04-01 13:45:00"),
            DateCoercion::Parsed(date(2024, 4, 1))
        );
        assert_eq!(
            coerce_date("2024-04-01T13:45:00"),
            DateCoercion::Parsed(date(2024, 4, 1))
        );
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(coerce_date("  2024-04-01  "), DateCoercion::Parsed(date(2024, 4, 1)));
    }

    #[test]
    fn empty_is_missing_not_invalid() {
        assert_eq!(coerce_date(""), DateCoercion::Missing);
        assert_eq!(coerce_date("   "), DateCoercion::Missing);
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(coerce_date("not-a-date"), DateCoercion::Invalid);
        assert_eq!(coerce_date("2024-13-45"), DateCoercion::Invalid);
    }
}
