//! Cell value coercion
//!
//! Conversions from raw cells to the primitive shapes FHIR elements need.
//! Failures are [`TabulaError::Coercion`] and only ever affect one field.

use crate::domain::{CellValue, Result, TabulaError, TypeTag};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// Output format for FHIR `date` and `dateTime` elements
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

// Last serial that still lands in year 9999
const MAX_DATE_SERIAL: f64 = 2_958_465.0;

/// Convert a spreadsheet date serial (days since 1899-12-30) to a date
pub fn date_from_serial(serial: f64) -> Result<NaiveDate> {
    if !serial.is_finite() || !(0.0..=MAX_DATE_SERIAL).contains(&serial) {
        return Err(TabulaError::Coercion(format!(
            "date serial out of range: {serial}"
        )));
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .ok_or_else(|| TabulaError::Coercion("invalid serial epoch".to_string()))?;
    epoch
        .checked_add_signed(Duration::days(serial.floor() as i64))
        .ok_or_else(|| TabulaError::Coercion(format!("date serial out of range: {serial}")))
}

/// Parse a textual date in one of the accepted formats
pub fn parse_date_text(text: &str) -> Result<NaiveDate> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date);
        }
    }

    Err(TabulaError::Coercion(format!("unrecognised date '{text}'")))
}

/// Coerce a cell to a calendar date
///
/// Numbers are only treated as date serials when the column is declared as
/// a date column.
pub fn to_date(value: &CellValue, source_type: TypeTag) -> Result<NaiveDate> {
    match value {
        CellValue::Date(dt) => Ok(dt.date()),
        CellValue::Number(n) if source_type == TypeTag::Date => date_from_serial(*n),
        CellValue::Number(n) => Err(TabulaError::Coercion(format!(
            "number {n} in a {source_type:?} column is not a date"
        ))),
        CellValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) if source_type == TypeTag::Date => date_from_serial(n),
            _ => parse_date_text(s),
        },
        CellValue::Bool(_) | CellValue::Null => Err(TabulaError::Coercion(format!(
            "value '{value}' is not a date"
        ))),
    }
}

/// Coerce a cell to a `YYYY-MM-DD` string
pub fn to_date_string(value: &CellValue, source_type: TypeTag) -> Result<String> {
    to_date(value, source_type).map(|d| d.format(DATE_FORMAT).to_string())
}

/// Parse a boolean spelled `true/false/yes/no/1/0` (case-insensitive)
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Coerce a cell to a number
pub fn to_number(value: &CellValue) -> Result<f64> {
    match value {
        CellValue::Number(n) => Ok(*n),
        CellValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| TabulaError::Coercion(format!("'{s}' is not a number"))),
        other => Err(TabulaError::Coercion(format!("'{other}' is not a number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test_case("2020-01-05", ymd(2020, 1, 5); "iso date")]
    #[test_case("2020-01-05T10:30:00Z", ymd(2020, 1, 5); "rfc3339")]
    #[test_case("2020-01-05T10:30:00+02:00", ymd(2020, 1, 5); "rfc3339 offset")]
    #[test_case("2020-01-05T10:30:00", ymd(2020, 1, 5); "naive datetime")]
    #[test_case("2020-01-05T10:30:00.250", ymd(2020, 1, 5); "fractional seconds")]
    #[test_case("2020-01-05 10:30:00", ymd(2020, 1, 5); "space separated")]
    #[test_case("2020/01/05", ymd(2020, 1, 5); "slashes")]
    #[test_case("01/05/2020", ymd(2020, 1, 5); "us order")]
    #[test_case("05.01.2020", ymd(2020, 1, 5); "dotted")]
    fn test_parse_date_text(input: &str, expected: NaiveDate) {
        assert_eq!(parse_date_text(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_date_text_rejects_garbage() {
        assert!(matches!(
            parse_date_text("not a date"),
            Err(TabulaError::Coercion(_))
        ));
        assert!(parse_date_text("2020-13-45").is_err());
    }

    #[test]
    fn test_date_serial() {
        assert_eq!(date_from_serial(43835.0).unwrap(), ymd(2020, 1, 5));
        assert_eq!(date_from_serial(43835.75).unwrap(), ymd(2020, 1, 5));
        assert_eq!(date_from_serial(1.0).unwrap(), ymd(1899, 12, 31));
        assert!(date_from_serial(-1.0).is_err());
        assert!(date_from_serial(f64::NAN).is_err());
    }

    #[test]
    fn test_number_only_a_date_in_date_columns() {
        let cell = CellValue::Number(43835.0);
        assert_eq!(to_date_string(&cell, TypeTag::Date).unwrap(), "2020-01-05");
        assert!(to_date(&cell, TypeTag::Number).is_err());
    }

    #[test]
    fn test_date_cell_and_text_serial() {
        let dt = ymd(2021, 3, 4).and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(
            to_date_string(&CellValue::Date(dt), TypeTag::Text).unwrap(),
            "2021-03-04"
        );
        assert_eq!(
            to_date_string(&CellValue::from("43835"), TypeTag::Date).unwrap(),
            "2020-01-05"
        );
        assert!(to_date(&CellValue::Bool(true), TypeTag::Date).is_err());
    }

    #[test_case("true", Some(true))]
    #[test_case("YES", Some(true))]
    #[test_case("1", Some(true))]
    #[test_case(" False ", Some(false))]
    #[test_case("no", Some(false))]
    #[test_case("0", Some(false))]
    #[test_case("maybe", None)]
    fn test_parse_bool(input: &str, expected: Option<bool>) {
        assert_eq!(parse_bool(input), expected);
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&CellValue::Number(3.5)).unwrap(), 3.5);
        assert_eq!(to_number(&CellValue::from(" 42 ")).unwrap(), 42.0);
        assert!(to_number(&CellValue::from("abc")).is_err());
        assert!(to_number(&CellValue::Bool(true)).is_err());
    }
}
