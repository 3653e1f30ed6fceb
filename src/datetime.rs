//! Calendar time as kept by the RTC, and the BCD codec its registers use.

use std::fmt;

use crate::{Error, Result};

/// Encode `0..=99` as two BCD digits.
pub fn bcd_encode(value: u8) -> Result<u8> {
    if value > 99 {
        return Err(Error::InvalidArgument("BCD value out of range"))
    }
    Ok((value / 10) << 4 | value % 10)
}

/// Decode two BCD digits; either nibble above 9 is invalid.
pub fn bcd_decode(bcd: u8) -> Result<u8> {
    let (tens, ones) = (bcd >> 4, bcd & 0x0f);
    if tens > 9 || ones > 9 {
        return Err(Error::InvalidData("invalid BCD digit"))
    }
    Ok(tens * 10 + ones)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Sunday = 0,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Self::Sunday, Self::Monday, Self::Tuesday, Self::Wednesday,
        Self::Thursday, Self::Friday, Self::Saturday,
    ];

    pub fn from_index(index: u8) -> Option<Weekday> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

// Days since 1970-01-01 in the proleptic Gregorian calendar.
fn days_from_civil(year: u16, month: u8, day: u8) -> i64 {
    let year = year as i64 - (month <= 2) as i64;
    let era = year.div_euclid(400);
    let year_of_era = year - era * 400;
    let month = month as i64;
    let day_of_year = (153 * (month + (if month > 2 { -3 } else { 9 })) + 2) / 5 + day as i64 - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146097 + day_of_era - 719468
}

fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let days = days + 719468;
    let era = days.div_euclid(146097);
    let day_of_era = days - era * 146097;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36524 - day_of_era / 146096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let mp = (5 * day_of_year + 2) / 153;
    let day = (day_of_year - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = year_of_era + era * 400 + (month <= 2) as i64;
    (year, month, day)
}

/// A valid calendar date and 24-hour time of day, without a time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl DateTime {
    /// Earliest and latest years representable by the RTC (two digits plus a century bit).
    pub const MIN_YEAR: u16 = 2000;
    pub const MAX_YEAR: u16 = 2199;

    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8)
            -> Result<DateTime> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return Err(Error::InvalidArgument("year out of range"))
        }
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidArgument("month out of range"))
        }
        if day < 1 || day > days_in_month(year, month) {
            return Err(Error::InvalidArgument("day out of range"))
        }
        if hour > 23 || minute > 59 || second > 59 {
            return Err(Error::InvalidArgument("time of day out of range"))
        }
        Ok(DateTime { year, month, day, hour, minute, second })
    }

    pub fn year(&self) -> u16 { self.year }
    pub fn month(&self) -> u8 { self.month }
    pub fn day(&self) -> u8 { self.day }
    pub fn hour(&self) -> u8 { self.hour }
    pub fn minute(&self) -> u8 { self.minute }
    pub fn second(&self) -> u8 { self.second }

    pub fn weekday(&self) -> Weekday {
        // 1970-01-01 was a Thursday
        let index = (days_from_civil(self.year, self.month, self.day) + 4).rem_euclid(7);
        Weekday::ALL[index as usize]
    }

    pub fn unix_timestamp(&self) -> i64 {
        days_from_civil(self.year, self.month, self.day) * 86400 +
            self.hour as i64 * 3600 + self.minute as i64 * 60 + self.second as i64
    }

    pub fn from_unix_timestamp(timestamp: i64) -> Result<DateTime> {
        let (year, month, day) = civil_from_days(timestamp.div_euclid(86400));
        let seconds = timestamp.rem_euclid(86400);
        let year = u16::try_from(year).map_err(|_| Error::InvalidArgument("year out of range"))?;
        DateTime::new(year, month, day,
            (seconds / 3600) as u8, (seconds / 60 % 60) as u8, (seconds % 60) as u8)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second)
    }
}
