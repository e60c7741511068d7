use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric features that may follow the categorical blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericFeature {
    Year,
    Month,
    /// Reference year minus lease commencement year. Not clamped.
    LeaseAge,
    /// First integer found in the free-text remaining lease.
    RemainingLeaseYears,
    FloorAreaSqm,
}

impl NumericFeature {
    pub const ALL: [NumericFeature; 5] = [
        NumericFeature::Year,
        NumericFeature::Month,
        NumericFeature::LeaseAge,
        NumericFeature::RemainingLeaseYears,
        NumericFeature::FloorAreaSqm,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericFeature::Year => "year",
            NumericFeature::Month => "month",
            NumericFeature::LeaseAge => "lease_age",
            NumericFeature::RemainingLeaseYears => "remaining_lease_years",
            NumericFeature::FloorAreaSqm => "floor_area_sqm",
        }
    }

    /// Raw record field the feature is derived from.
    pub fn source_field(self) -> &'static str {
        match self {
            NumericFeature::Year => "year",
            NumericFeature::Month => "month",
            NumericFeature::LeaseAge => "lease_commence_date",
            NumericFeature::RemainingLeaseYears => "remaining_lease",
            NumericFeature::FloorAreaSqm => "floor_area_sqm",
        }
    }
}

impl fmt::Display for NumericFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NumericFeature {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        NumericFeature::ALL
            .into_iter()
            .find(|f| f.name() == key)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown feature: {}. Must be one of year, month, lease_age, remaining_lease_years, floor_area_sqm",
                    s
                )
            })
    }
}

/// Ordered numeric feature list stored with every artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    numeric: Vec<NumericFeature>,
}

impl FeatureSchema {
    /// Build a schema, dropping repeated features while keeping first-seen order.
    pub fn new(numeric: impl IntoIterator<Item = NumericFeature>) -> Self {
        let mut ordered = Vec::new();
        for feature in numeric {
            if !ordered.contains(&feature) {
                ordered.push(feature);
            }
        }
        Self { numeric: ordered }
    }

    /// town, flat_type, year, month
    pub fn rental() -> Self {
        Self::new([NumericFeature::Year, NumericFeature::Month])
    }

    /// Rental features plus lease age and remaining lease.
    pub fn extended() -> Self {
        Self::new([
            NumericFeature::Year,
            NumericFeature::Month,
            NumericFeature::LeaseAge,
            NumericFeature::RemainingLeaseYears,
        ])
    }

    pub fn numeric(&self) -> &[NumericFeature] {
        &self.numeric
    }

    pub fn requires(&self, feature: NumericFeature) -> bool {
        self.numeric.contains(&feature)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::rental()
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.numeric.iter().map(|n| n.name()).collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for FeatureSchema {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rental" => return Ok(Self::rental()),
            "extended" => return Ok(Self::extended()),
            _ => {}
        }

        let features = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(NumericFeature::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        if features.is_empty() {
            anyhow::bail!("Feature schema must name at least one numeric feature");
        }
        Ok(Self::new(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_is_rental() {
        let schema = FeatureSchema::default();
        assert_eq!(
            schema.numeric(),
            &[NumericFeature::Year, NumericFeature::Month]
        );
        assert_eq!(schema.to_string(), "year,month");
    }

    #[test]
    fn test_parse_feature_list_keeps_order_and_dedupes() {
        let schema: FeatureSchema = "lease-age, year ,year,remaining_lease_years".parse().unwrap();
        assert_eq!(
            schema.numeric(),
            &[
                NumericFeature::LeaseAge,
                NumericFeature::Year,
                NumericFeature::RemainingLeaseYears
            ]
        );
    }

    #[test]
    fn test_parse_presets_and_errors() {
        assert_eq!(
            "extended".parse::<FeatureSchema>().unwrap(),
            FeatureSchema::extended()
        );
        assert!("".parse::<FeatureSchema>().is_err());
        assert!("year,storey".parse::<FeatureSchema>().is_err());
    }
}
