use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar position of an observation or a forecast step.
///
/// No range validation is performed: callers supply sane months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: i32,
}

impl YearMonth {
    pub fn new(year: i32, month: i32) -> Self {
        Self { year, month }
    }

    /// One month later; December rolls over into January of the next year.
    /// `None` when the year would overflow.
    pub fn next(self) -> Option<Self> {
        if self.month >= 12 {
            Some(Self::new(self.year.checked_add(1)?, 1))
        } else {
            Some(Self::new(self.year, self.month + 1))
        }
    }

    /// The `steps` positions after `self`. `self` is not included.
    /// Ends early if the calendar runs past `i32::MAX`.
    pub fn following(self, steps: usize) -> impl Iterator<Item = YearMonth> {
        std::iter::successors(self.next(), |ym| ym.next()).take(steps)
    }

    /// Parse `YYYY-MM` or `YYYY-MM-DD`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d"))
            .ok()?;
        Some(Self::new(date.year(), date.month() as i32))
    }
}

/// One step of a rolled-forward forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub month: i32,
    pub predicted: f64,
}
