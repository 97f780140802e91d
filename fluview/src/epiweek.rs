//! Epiweeks (`YYYYWW`) and the inclusive ranges the Epidata endpoints are queried with.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FluviewError, FluviewResult};

/// Name of the query parameter holding a range of epiweeks.
pub const EPIWEEKS_PARAM: &str = "epiweeks";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epiweek {
    year: u16,
    week: u8,
}

impl Epiweek {
    pub fn new(year: u16, week: u8) -> FluviewResult<Self> {
        if !(1000..=9999).contains(&year) || !(1..=53).contains(&week) {
            return Err(FluviewError::InvalidEpiweek(format!("{year}{week:02}")));
        }
        Ok(Self { year, week })
    }
}

impl FromStr for Epiweek {
    type Err = FluviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        let invalid = || FluviewError::InvalidEpiweek(s.to_string());
        if value.len() != 6 || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year = value[..4].parse::<u16>().map_err(|_| invalid())?;
        let week = value[4..].parse::<u8>().map_err(|_| invalid())?;
        Self::new(year, week).map_err(|_| invalid())
    }
}

impl Display for Epiweek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.week)
    }
}

/// Inclusive range of epiweeks with `start <= end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Epiweek,
    pub end: Epiweek,
}

impl TimeRange {
    pub fn new(start: Epiweek, end: Epiweek) -> FluviewResult<Self> {
        if start > end {
            return Err(FluviewError::InvalidTimeRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> FluviewResult<Self> {
        Self::new(start.parse()?, end.parse()?)
    }

    /// Range expression understood by the Epidata API, e.g. `202001-202052`.
    pub fn to_param(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}
