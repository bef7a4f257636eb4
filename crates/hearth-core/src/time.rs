//! Reference month handling for statement imports

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Month an imported statement is attributed to, sent as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceMonth {
    year: i32,
    month: u32,
}

impl ReferenceMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
            return Err(CoreError::InvalidReferenceMonth {
                value: format!("{}-{:02}", year, month),
            });
        }
        Ok(Self { year, month })
    }

    /// Month of the current year, the default when only a month is picked
    pub fn in_current_year(month: u32) -> Result<Self, CoreError> {
        Self::new(Local::now().year(), month)
    }

    /// Month containing today
    pub fn current() -> Self {
        let today = Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Whether `date` falls in this month
    pub fn contains(&self, date: &NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::str::FromStr for ReferenceMonth {
    type Err = CoreError;

    /// Accepts `YYYY-MM`, or a bare month number for the current year
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidReferenceMonth { value: s.to_string() };
        let trimmed = s.trim();

        if let Some((year, month)) = trimmed.split_once('-') {
            if year.len() != 4 || month.len() != 2 {
                return Err(invalid());
            }
            let year = year.parse::<i32>().map_err(|_| invalid())?;
            let month = month.parse::<u32>().map_err(|_| invalid())?;
            return Self::new(year, month).map_err(|_| invalid());
        }

        let month = trimmed.parse::<u32>().map_err(|_| invalid())?;
        Self::in_current_year(month).map_err(|_| invalid())
    }
}

impl std::fmt::Display for ReferenceMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for ReferenceMonth {
    type Error = CoreError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReferenceMonth> for String {
    fn from(value: ReferenceMonth) -> Self {
        value.to_string()
    }
}
