/*
Copyright 2021 Jakub Lewandowski

This file is part of MONET Geospatial Accessors (monet-rs).

MONET Geospatial Accessors (monet-rs) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

MONET Geospatial Accessors (monet-rs) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with MONET Geospatial Accessors (monet-rs). If not, see https://www.gnu.org/licenses/.
*/

//! Sub-module decoding time values stored as numbers or text.

use crate::{errors::DataError, Float};
use chrono::{Duration, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y%m%d_%H%M%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Parses timestamps written in one of the common text layouts.
/// Trailing `Z` or `UTC` markers and fractional seconds are accepted.
pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text
        .trim()
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim();

    let trimmed = match trimmed.split_once('.') {
        Some((head, frac)) if frac.chars().all(|c| c.is_ascii_digit()) => head,
        _ => trimmed,
    };

    for fmt in DATETIME_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn unit_seconds(unit: &str) -> Option<Float> {
    match unit.to_lowercase().as_str() {
        "seconds" | "second" | "secs" | "sec" | "s" => Some(1.0),
        "minutes" | "minute" | "mins" | "min" => Some(60.0),
        "hours" | "hour" | "hrs" | "hr" | "h" => Some(3600.0),
        "days" | "day" | "d" => Some(86_400.0),
        _ => None,
    }
}

/// Decodes numeric times stored with CF-style `units`
/// (`"<unit> since <reference date>"`) into timestamps.
pub fn decode_cf_time(values: &[Float], units: &str) -> Result<Vec<NaiveDateTime>, DataError> {
    let (unit, reference) = units
        .split_once(" since ")
        .ok_or_else(|| DataError::Time(format!("units '{}' have no reference date", units)))?;

    let scale = unit_seconds(unit.trim())
        .ok_or_else(|| DataError::Time(format!("unknown time unit '{}'", unit)))?;

    let reference = parse_datetime(reference)
        .ok_or_else(|| DataError::Time(format!("cannot parse reference date '{}'", reference)))?;

    values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                return Err(DataError::Time(format!("non-finite time value {}", v)));
            }
            let out_of_range = || DataError::Time(format!("time value {} {} is out of range", v, unit.trim()));

            let millis = (v * scale * 1000.0).round();
            if millis.abs() >= i64::MAX as Float {
                return Err(out_of_range());
            }
            reference
                .checked_add_signed(Duration::milliseconds(millis as i64))
                .ok_or_else(out_of_range)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{decode_cf_time, parse_datetime};
    use chrono::NaiveDate;

    #[test]
    fn cf_units_are_decoded() {
        let times = decode_cf_time(&[0.0, 1.5, 24.0], "hours since 2019-07-01 00:00:00").unwrap();

        let base = NaiveDate::from_ymd(2019, 7, 1);
        assert_eq!(times[0], base.and_hms(0, 0, 0));
        assert_eq!(times[1], base.and_hms(1, 30, 0));
        assert_eq!(times[2], NaiveDate::from_ymd(2019, 7, 2).and_hms(0, 0, 0));

        let days = decode_cf_time(&[2.0], "days since 2000-01-01").unwrap();
        assert_eq!(days[0], NaiveDate::from_ymd(2000, 1, 3).and_hms(0, 0, 0));

        assert!(decode_cf_time(&[1.0], "fortnights since 2000-01-01").is_err());
        assert!(decode_cf_time(&[1.0], "hours").is_err());
    }

    #[test]
    fn overflowing_times_are_errors() {
        assert!(decode_cf_time(&[1e13], "days since 2000-01-01").is_err());
        assert!(decode_cf_time(&[-1e13], "days since 2000-01-01").is_err());
        assert!(decode_cf_time(&[1e30], "seconds since 2000-01-01").is_err());
        assert!(decode_cf_time(&[1e8], "days since 2000-01-01").is_err());

        let late = decode_cf_time(&[36_500.0], "days since 2000-01-01").unwrap();
        assert_eq!(late[0], NaiveDate::from_ymd(2099, 12, 7).and_hms(0, 0, 0));
    }

    #[test]
    fn text_layouts_are_parsed() {
        let expected = NaiveDate::from_ymd(2021, 3, 4).and_hms(5, 6, 7);

        assert_eq!(parse_datetime("2021-03-04 05:06:07"), Some(expected));
        assert_eq!(parse_datetime("2021-03-04T05:06:07Z"), Some(expected));
        assert_eq!(parse_datetime("2021-03-04T05:06:07.000"), Some(expected));
        assert_eq!(parse_datetime("20210304_050607"), Some(expected));
        assert!(parse_datetime("Houston").is_none());
    }
}
