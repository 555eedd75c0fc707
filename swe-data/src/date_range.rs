use crate::error::{DataError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used for configuration and remote date constants: "YYYY-MM-DD"
pub const YEAR_FORMAT: &str = "%Y-%m-%d";

/// A half-open window of calendar dates, `[start, end)`.
///
/// No ordering is enforced at construction; an inverted window is simply
/// empty.
#[derive(Clone, Eq, PartialEq, Copy, Debug, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange { start, end }
    }

    /// Parse both ends from "YYYY-MM-DD" strings.
    pub fn parse(start: &str, end: &str) -> Result<DateRange> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), YEAR_FORMAT)
                .map_err(|e| DataError::DateParse(format!("{s:?}: {e}")))
        };
        Ok(DateRange::new(parse(start)?, parse(end)?))
    }

    /// True when `start >= end`.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// First day of every calendar month that starts inside the window.
    pub fn months(&self) -> MonthStarts {
        let first = if self.start.day() == 1 {
            Some(self.start)
        } else {
            self.start
                .with_day(1)
                .and_then(|d| d.checked_add_months(Months::new(1)))
        };
        MonthStarts {
            next: first,
            end: self.end,
        }
    }

    pub fn month_count(&self) -> usize {
        self.months().count()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(YEAR_FORMAT),
            self.end.format(YEAR_FORMAT)
        )
    }
}

/// Iterator over month starts produced by [`DateRange::months`].
#[derive(Clone, Debug)]
pub struct MonthStarts {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for MonthStarts {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|d| *d < self.end)?;
        self.next = current.checked_add_months(Months::new(1));
        Some(current)
    }
}
