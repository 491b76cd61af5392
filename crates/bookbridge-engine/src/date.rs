//! Serial date packing and unpacking.
//!
//! A packed date is a floating-point day number relative to the book's date
//! system epoch (1899-12-30 for the 1900 system, 1904-01-01 for the 1904
//! system), with the time of day as a fraction. Unpacking rounds the fraction
//! to the nearest millisecond, which is exact over the supported range: the
//! largest representable serial (year 9999) times the millisecond scale stays
//! below 2^53.

use chrono::{Datelike, NaiveDate};

const MS_PER_DAY: i64 = 86_400_000;

/// A calendar date and time of day, the unpacked form of a serial date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    /// Calendar year (1900-9999, or 1904-9999 in the 1904 system)
    pub year: i32,
    /// Month of year, 1-12
    pub month: u32,
    /// Day of month, 1-31
    pub day: u32,
    /// Hour of day, 0-23
    pub hour: u32,
    /// Minute, 0-59
    pub minute: u32,
    /// Second, 0-59
    pub second: u32,
    /// Millisecond, 0-999
    pub millisecond: u32,
}

impl DateParts {
    /// Create date parts at midnight
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
            millisecond: 0,
        }
    }

    /// Set the time of day
    pub fn with_time(mut self, hour: u32, minute: u32, second: u32, millisecond: u32) -> Self {
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        self.millisecond = millisecond;
        self
    }
}

/// Day number of the epoch for the given date system.
fn epoch_days(date_1904: bool) -> i32 {
    let epoch = if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30).unwrap()
    };
    epoch.num_days_from_ce()
}

/// Pack calendar parts into a serial date.
pub(crate) fn pack(date_1904: bool, parts: &DateParts) -> Result<f64, String> {
    let min_year = if date_1904 { 1904 } else { 1900 };
    if parts.year < min_year || parts.year > 9999 {
        return Err(format!(
            "year {} outside supported range {}-9999",
            parts.year, min_year
        ));
    }
    if parts.hour > 23 || parts.minute > 59 || parts.second > 59 || parts.millisecond > 999 {
        return Err(format!(
            "invalid time of day {:02}:{:02}:{:02}.{:03}",
            parts.hour, parts.minute, parts.second, parts.millisecond
        ));
    }
    let date = NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day).ok_or(format!(
        "invalid calendar date {:04}-{:02}-{:02}",
        parts.year, parts.month, parts.day
    ))?;

    let days = i64::from(date.num_days_from_ce() - epoch_days(date_1904));
    let ms_of_day = i64::from(parts.millisecond)
        + 1_000 * (i64::from(parts.second) + 60 * (i64::from(parts.minute) + 60 * i64::from(parts.hour)));
    Ok(days as f64 + ms_of_day as f64 / MS_PER_DAY as f64)
}

/// Unpack a serial date into calendar parts.
pub(crate) fn unpack(date_1904: bool, value: f64) -> Result<DateParts, String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("serial date {} is not a valid day number", value));
    }
    let total_ms = (value * MS_PER_DAY as f64).round() as i64;
    let days = total_ms.div_euclid(MS_PER_DAY);
    let ms_of_day = total_ms.rem_euclid(MS_PER_DAY);

    let day_num = i32::try_from(i64::from(epoch_days(date_1904)) + days)
        .map_err(|_| format!("serial date {} out of range", value))?;
    let date = NaiveDate::from_num_days_from_ce_opt(day_num)
        .ok_or(format!("serial date {} out of range", value))?;
    if date.year() > 9999 {
        return Err(format!("serial date {} past year 9999", value));
    }

    Ok(DateParts {
        year: date.year(),
        month: date.month(),
        day: date.day(),
        hour: (ms_of_day / 3_600_000) as u32,
        minute: (ms_of_day / 60_000 % 60) as u32,
        second: (ms_of_day / 1_000 % 60) as u32,
        millisecond: (ms_of_day % 1_000) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pack_epoch_1900() {
        // 1899-12-30 is day zero of the 1900 system
        assert_eq!(pack(false, &DateParts::new(1900, 1, 1)).unwrap(), 2.0);
    }

    #[test]
    fn test_pack_epoch_1904() {
        assert_eq!(pack(true, &DateParts::new(1904, 1, 1)).unwrap(), 0.0);
    }

    #[test]
    fn test_pack_with_time() {
        let noon = DateParts::new(1900, 1, 1).with_time(12, 0, 0, 0);
        assert_eq!(pack(false, &noon).unwrap(), 2.5);
    }

    #[test]
    fn test_unpack_fraction() {
        let parts = unpack(false, 2.5).unwrap();
        assert_eq!(parts, DateParts::new(1900, 1, 1).with_time(12, 0, 0, 0));
    }

    #[test]
    fn test_pack_rejects_year_before_epoch() {
        assert!(pack(false, &DateParts::new(1899, 12, 31)).is_err());
        assert!(pack(true, &DateParts::new(1903, 6, 1)).is_err());
    }

    #[test]
    fn test_pack_rejects_bad_calendar_date() {
        assert!(pack(false, &DateParts::new(2023, 2, 30)).is_err());
        assert!(pack(false, &DateParts::new(2023, 13, 1)).is_err());
        assert!(pack(false, &DateParts::new(2023, 0, 1)).is_err());
    }

    #[test]
    fn test_pack_rejects_bad_time() {
        assert!(pack(false, &DateParts::new(2023, 1, 1).with_time(24, 0, 0, 0)).is_err());
        assert!(pack(false, &DateParts::new(2023, 1, 1).with_time(0, 60, 0, 0)).is_err());
        assert!(pack(false, &DateParts::new(2023, 1, 1).with_time(0, 0, 0, 1000)).is_err());
    }

    #[test]
    fn test_unpack_rejects_bad_serial() {
        assert!(unpack(false, -1.0).is_err());
        assert!(unpack(false, f64::NAN).is_err());
        assert!(unpack(false, f64::INFINITY).is_err());
        // Day number past year 9999
        assert!(unpack(false, 4_000_000.0).is_err());
    }

    #[test]
    fn test_leap_day() {
        let leap = DateParts::new(2024, 2, 29);
        let serial = pack(false, &leap).unwrap();
        assert_eq!(unpack(false, serial).unwrap(), leap);
    }

    #[test]
    fn test_systems_disagree_on_same_date() {
        let date = DateParts::new(2020, 6, 15);
        let v1900 = pack(false, &date).unwrap();
        let v1904 = pack(true, &date).unwrap();
        // The 1904 epoch lies 1462 days after the 1900 one
        assert_eq!(v1900 - v1904, 1462.0);
    }

    proptest! {
        #[test]
        fn prop_roundtrip_1900(
            year in 1900i32..=9999,
            month in 1u32..=12,
            day in 1u32..=28,
            hour in 0u32..24,
            minute in 0u32..60,
            second in 0u32..60,
            millisecond in 0u32..1000,
        ) {
            let parts = DateParts::new(year, month, day)
                .with_time(hour, minute, second, millisecond);
            let serial = pack(false, &parts).unwrap();
            prop_assert_eq!(unpack(false, serial).unwrap(), parts);
        }

        #[test]
        fn prop_roundtrip_1904(
            year in 1904i32..=9999,
            month in 1u32..=12,
            day in 1u32..=28,
            hour in 0u32..24,
            minute in 0u32..60,
            second in 0u32..60,
            millisecond in 0u32..1000,
        ) {
            let parts = DateParts::new(year, month, day)
                .with_time(hour, minute, second, millisecond);
            let serial = pack(true, &parts).unwrap();
            prop_assert_eq!(unpack(true, serial).unwrap(), parts);
        }
    }
}
