use crate::error::{ProjectorError, Result};
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar day in the compact `YYMMDD` form, e.g. "230421" for 21 April 2023.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    date: NaiveDate,
}

const COMPACT_FORMAT: &str = "%y%m%d";
const EXCEL_DATE_FORMAT: &str = "%y-%m-%d";

impl Timestamp {
    pub fn parse(timestamp: &str) -> Result<Self> {
        if timestamp.len() != 6 {
            return Err(ProjectorError::InvalidTimestamp(format!(
                "'{}' is not in the YYMMDD format",
                timestamp
            )));
        }
        let date = NaiveDate::parse_from_str(timestamp, COMPACT_FORMAT)
            .map_err(|e| ProjectorError::InvalidTimestamp(format!("'{}': {}", timestamp, e)))?;
        Ok(Self { date })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Today's date, unless `forced_today` pins it (test harnesses need a fixed "today").
    pub fn today(forced_today: Option<&str>) -> Result<Self> {
        match forced_today {
            Some(ts) => Self::parse(ts),
            None => Ok(Self::from_date(Local::now().date_naive())),
        }
    }

    pub fn as_date(&self) -> NaiveDate {
        self.date
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Month acronym plus day, e.g. "APR14". Used as report column headers.
    pub fn to_snapshot(&self) -> String {
        self.date.format("%b%d").to_string().to_uppercase()
    }

    /// Reads a snapshot like "FEB02", borrowing the year from `self`.
    pub fn from_snapshot(&self, snapshot: &str) -> Result<Self> {
        let with_year = format!("{}{}", snapshot, self.year());
        let date = NaiveDate::parse_from_str(&with_year, "%b%d%Y")
            .map_err(|e| ProjectorError::InvalidTimestamp(format!("'{}': {}", snapshot, e)))?;
        Ok(Self { date })
    }

    pub fn to_excel_date(&self) -> String {
        self.date.format(EXCEL_DATE_FORMAT).to_string()
    }

    pub fn from_excel_date(excel_date: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(excel_date, EXCEL_DATE_FORMAT)
            .map_err(|e| ProjectorError::InvalidTimestamp(format!("'{}': {}", excel_date, e)))?;
        Ok(Self { date })
    }

    /// Spreadsheet day serial (days since 1899-12-30). Only 2000-01-01 through
    /// 2099-12-31 are accepted.
    pub fn from_excel_int(days: i64) -> Result<Self> {
        let zero = excel_zero();
        let min = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(zero);
        let max = NaiveDate::from_ymd_opt(2099, 12, 31).unwrap_or(zero);
        let min_days = (min - zero).num_days();
        let max_days = (max - zero).num_days();
        if days < min_days || days > max_days {
            return Err(ProjectorError::InvalidTimestamp(format!(
                "Bad input '{}': should be an int between {} and {} to represent a date between January 1st 2000 and December 31 2099",
                days, min_days, max_days
            )));
        }
        Ok(Self {
            date: zero + Duration::days(days),
        })
    }

    pub fn to_excel_int(&self) -> i64 {
        (self.date - excel_zero()).num_days()
    }
}

fn excel_zero() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format(COMPACT_FORMAT))
    }
}

impl TryFrom<String> for Timestamp {
    type Error = ProjectorError;

    fn try_from(value: String) -> Result<Self> {
        Timestamp::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> String {
        ts.to_string()
    }
}
