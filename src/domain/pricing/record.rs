use super::calendar::YearMonth;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single flat observation, as read from a batch extract or a request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub town: String,
    pub flat_type: String,
    pub year: i32,
    pub month: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_commence_date: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_lease: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_area_sqm: Option<f64>,
}

impl RawRecord {
    pub fn new(town: impl Into<String>, flat_type: impl Into<String>, year: i32, month: i32) -> Self {
        Self {
            town: town.into(),
            flat_type: flat_type.into(),
            year,
            month,
            lease_commence_date: None,
            remaining_lease: None,
            floor_area_sqm: None,
        }
    }

    pub fn with_lease(mut self, commence_year: i32, remaining: impl Into<String>) -> Self {
        self.lease_commence_date = Some(commence_year);
        self.remaining_lease = Some(remaining.into());
        self
    }

    pub fn with_floor_area(mut self, sqm: f64) -> Self {
        self.floor_area_sqm = Some(sqm);
        self
    }

    pub fn period(&self) -> YearMonth {
        YearMonth::new(self.year, self.month)
    }

    /// Same flat, observed at another calendar position.
    pub fn at(&self, period: YearMonth) -> Self {
        Self {
            year: period.year,
            month: period.month,
            ..self.clone()
        }
    }
}

/// A raw record paired with its observed price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub record: RawRecord,
    pub label: f64,
}

/// Rows successfully read from a batch source, plus how many were rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<LabeledRecord>,
    pub skipped: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Which observed price a model is trained to predict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    #[default]
    MonthlyRent,
    ResalePrice,
}

impl TargetKind {
    /// CSV column holding the label.
    pub fn column(self) -> &'static str {
        match self {
            TargetKind::MonthlyRent => "monthly_rent",
            TargetKind::ResalePrice => "resale_price",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for TargetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "monthly_rent" | "rent" | "rental" => Ok(TargetKind::MonthlyRent),
            "resale_price" | "resale" | "sale" => Ok(TargetKind::ResalePrice),
            _ => anyhow::bail!(
                "Invalid TARGET: {}. Must be 'monthly-rent' or 'resale-price'",
                s
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_without_lease_fields() {
        let body = r#"{"town":"TAMPINES","flat_type":"3-ROOM","year":2025,"month":5}"#;
        let record: RawRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record, RawRecord::new("TAMPINES", "3-ROOM", 2025, 5));
    }

    #[test]
    fn test_at_moves_only_the_period() {
        let record = RawRecord::new("BEDOK", "4 ROOM", 2023, 11).with_lease(1985, "61 years");
        let moved = record.at(YearMonth::new(2024, 2));
        assert_eq!(moved.year, 2024);
        assert_eq!(moved.month, 2);
        assert_eq!(moved.town, "BEDOK");
        assert_eq!(moved.lease_commence_date, Some(1985));
    }

    #[test]
    fn test_target_kind_parsing() {
        assert_eq!(
            "monthly-rent".parse::<TargetKind>().unwrap(),
            TargetKind::MonthlyRent
        );
        assert_eq!(
            "RESALE_PRICE".parse::<TargetKind>().unwrap(),
            TargetKind::ResalePrice
        );
        assert!("price".parse::<TargetKind>().is_err());
    }
}
