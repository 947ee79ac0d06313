//! Decoder for detection keys of the form `YYYYMMDD_HHMMSS`.

use anyhow::{Result, bail, ensure};
use chrono::NaiveDateTime;

const KEY_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Decodes a fixed-width `YYYYMMDD_HHMMSS` key into the local wall-clock time
/// it was written at.
///
/// # Errors
///
/// Returns an error for keys of the wrong shape, with non-digit characters,
/// or naming an impossible calendar date or time.
pub fn parse_timestamp_key(key: &str) -> Result<NaiveDateTime> {
    let Some((date, time)) = key.split_once('_') else {
        bail!("timestamp key '{key}' has no '_' separator");
    };
    ensure!(
        date.len() == 8 && time.len() == 6,
        "timestamp key '{key}' is not fixed-width YYYYMMDD_HHMMSS"
    );
    ensure!(
        date.bytes().chain(time.bytes()).all(|b| b.is_ascii_digit()),
        "timestamp key '{key}' contains non-digit characters"
    );

    Ok(NaiveDateTime::parse_from_str(key, KEY_FORMAT)?)
}

/// Encodes a wall-clock time the way the ingestion pipeline keys detections.
pub fn format_timestamp_key(at: &NaiveDateTime) -> String {
    at.format(KEY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Timelike};

    #[test]
    fn test_parse_valid_key() {
        let at = parse_timestamp_key("20241016_143022").unwrap();
        assert_eq!(
            at,
            NaiveDate::from_ymd_opt(2024, 10, 16)
                .unwrap()
                .and_hms_opt(14, 30, 22)
                .unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for key in [
            "",
            "20241016",
            "20241016143022",
            "2024101_143022",
            "20241016_1430",
            "2024a016_143022",
            "20241016_14302x",
            "+2024101_143022",
            "20241301_000000",
            "20240230_120000",
            "20240101_246000",
        ] {
            assert!(parse_timestamp_key(key).is_err(), "accepted {key:?}");
        }
    }

    #[test]
    fn test_round_trip_keeps_day_and_hour() {
        for key in ["20240101_000000", "20240229_235959", "19991231_120000"] {
            let at = parse_timestamp_key(key).unwrap();
            let again = parse_timestamp_key(&format_timestamp_key(&at)).unwrap();
            assert_eq!(again.date(), at.date());
            assert_eq!(again.hour(), at.hour());
            assert_eq!(format_timestamp_key(&at), key);
        }
    }

    #[test]
    fn test_leap_day_is_valid() {
        let at = parse_timestamp_key("20240229_080000").unwrap();
        assert_eq!(at.month(), 2);
        assert_eq!(at.day(), 29);
    }
}
