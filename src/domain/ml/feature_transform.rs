//! Categorical encoding and numeric derivation for pricing records.
//!
//! A [`FittedTransform`] one-hot encodes `town` and `flat_type` against the
//! vocabulary seen at fit time, then appends the numeric features named by
//! the [`FeatureSchema`], standard-scaled with train-partition statistics.
//!
//! Unseen categories encode as an all-zero block. Derived values that cannot
//! be computed (a remaining lease without any digits) are emitted as `NaN`
//! and left for the model's imputer.

use super::feature_registry::{FeatureSchema, NumericFeature};
use crate::domain::errors::FeatureError;
use crate::domain::pricing::record::RawRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeSet;

static LEASE_YEARS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Extract the year count from text such as `"61 years 04 months"`.
pub fn parse_remaining_lease_years(text: &str) -> Option<f64> {
    LEASE_YEARS_PATTERN
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Years elapsed since the lease commenced. Negative for future commencement dates.
///
/// Computed in `f64` so any pair of `i32` years is representable.
pub fn lease_age(reference_year: i32, lease_commence_date: i32) -> f64 {
    f64::from(reference_year) - f64::from(lease_commence_date)
}

fn normalize_category(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Options applied to every categorical block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderOptions {
    /// Drop the first (alphabetically smallest) category of each block.
    pub drop_first: bool,
}

/// Fixed-width numeric representation of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of cells carrying the missing-value signal.
    pub fn missing_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_nan()).count()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Sorted vocabulary for one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBlock {
    categories: Vec<String>,
    drop_first: bool,
}

impl CategoryBlock {
    fn fit<'a>(values: impl IntoIterator<Item = &'a str>, drop_first: bool) -> Self {
        let categories: BTreeSet<String> = values.into_iter().map(normalize_category).collect();
        Self {
            categories: categories.into_iter().collect(),
            drop_first,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    fn width(&self) -> usize {
        if self.drop_first {
            self.categories.len().saturating_sub(1)
        } else {
            self.categories.len()
        }
    }

    fn encode_into(&self, value: &str, out: &mut Vec<f64>) {
        let start = out.len();
        out.resize(start + self.width(), 0.0);

        let key = normalize_category(value);
        let Ok(index) = self.categories.binary_search_by(|c| c.as_str().cmp(&key)) else {
            return;
        };
        let offset = if self.drop_first {
            match index.checked_sub(1) {
                Some(offset) => offset,
                None => return,
            }
        } else {
            index
        };
        out[start + offset] = 1.0;
    }

    fn column_names(&self, field: &'static str) -> impl Iterator<Item = String> + '_ {
        self.categories
            .iter()
            .skip(usize::from(self.drop_first))
            .map(move |c| format!("{}={}", field, c))
    }
}

/// Standard-scaling parameters for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaler {
    pub mean: f64,
    pub scale: f64,
}

impl ColumnScaler {
    fn fit(values: &[f64]) -> Self {
        let present: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if present.is_empty() {
            return Self {
                mean: 0.0,
                scale: 1.0,
            };
        }

        let mean = present.iter().mean();
        let std_dev = present.iter().population_std_dev();
        let scale = if std_dev.is_finite() && std_dev > 0.0 {
            std_dev
        } else {
            1.0
        };
        Self { mean, scale }
    }

    fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// Encoder state learned from the training partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransform {
    schema: FeatureSchema,
    reference_year: i32,
    town: CategoryBlock,
    flat_type: CategoryBlock,
    scalers: Vec<ColumnScaler>,
}

impl FittedTransform {
    /// Learn vocabularies and scaling statistics.
    ///
    /// `reference_year` anchors `lease_age` and is stored with the fitted state,
    /// so the same artifact always produces the same vectors.
    pub fn fit<'a>(
        records: impl IntoIterator<Item = &'a RawRecord>,
        schema: &FeatureSchema,
        options: EncoderOptions,
        reference_year: i32,
    ) -> Result<Self, FeatureError> {
        let records: Vec<&RawRecord> = records.into_iter().collect();
        if records.is_empty() {
            return Err(FeatureError::EmptyFit);
        }
        for record in &records {
            check_categoricals(record)?;
        }

        let town = CategoryBlock::fit(records.iter().map(|r| r.town.as_str()), options.drop_first);
        let flat_type = CategoryBlock::fit(
            records.iter().map(|r| r.flat_type.as_str()),
            options.drop_first,
        );

        let mut scalers = Vec::with_capacity(schema.numeric().len());
        for &feature in schema.numeric() {
            let column = records
                .iter()
                .map(|r| raw_numeric(feature, r, reference_year))
                .collect::<Result<Vec<f64>, _>>()?;
            scalers.push(ColumnScaler::fit(&column));
        }

        Ok(Self {
            schema: schema.clone(),
            reference_year,
            town,
            flat_type,
            scalers,
        })
    }

    pub fn transform(&self, record: &RawRecord) -> Result<FeatureVector, FeatureError> {
        check_categoricals(record)?;

        let mut values = Vec::with_capacity(self.width());
        self.town.encode_into(&record.town, &mut values);
        self.flat_type.encode_into(&record.flat_type, &mut values);

        for (&feature, scaler) in self.schema.numeric().iter().zip(&self.scalers) {
            let raw = raw_numeric(feature, record, self.reference_year)?;
            values.push(scaler.apply(raw));
        }

        Ok(FeatureVector(values))
    }

    pub fn width(&self) -> usize {
        self.town.width() + self.flat_type.width() + self.scalers.len()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    pub fn towns(&self) -> &[String] {
        self.town.categories()
    }

    pub fn flat_types(&self) -> &[String] {
        self.flat_type.categories()
    }

    /// Column labels in vector order, e.g. `town=BEDOK`, `year`.
    pub fn feature_names(&self) -> Vec<String> {
        self.town
            .column_names("town")
            .chain(self.flat_type.column_names("flat_type"))
            .chain(self.schema.numeric().iter().map(|f| f.name().to_string()))
            .collect()
    }
}

/// Transform handle that may not have been fitted yet. Transforming through an
/// unfitted handle is a typed `FeatureError::NotFitted` rather than a panic.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FeatureTransform {
    #[default]
    Unfitted,
    Fitted(FittedTransform),
}

impl FeatureTransform {
    pub fn fit<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a RawRecord>,
        schema: &FeatureSchema,
        options: EncoderOptions,
        reference_year: i32,
    ) -> Result<(), FeatureError> {
        *self = FeatureTransform::Fitted(FittedTransform::fit(records, schema, options, reference_year)?);
        Ok(())
    }

    pub fn transform(&self, record: &RawRecord) -> Result<FeatureVector, FeatureError> {
        match self {
            FeatureTransform::Unfitted => Err(FeatureError::NotFitted),
            FeatureTransform::Fitted(fitted) => fitted.transform(record),
        }
    }

    pub fn fitted(&self) -> Option<&FittedTransform> {
        match self {
            FeatureTransform::Unfitted => None,
            FeatureTransform::Fitted(fitted) => Some(fitted),
        }
    }
}

impl From<FittedTransform> for FeatureTransform {
    fn from(fitted: FittedTransform) -> Self {
        FeatureTransform::Fitted(fitted)
    }
}

fn check_categoricals(record: &RawRecord) -> Result<(), FeatureError> {
    if record.town.trim().is_empty() {
        return Err(FeatureError::MissingField { field: "town" });
    }
    if record.flat_type.trim().is_empty() {
        return Err(FeatureError::MissingField { field: "flat_type" });
    }
    Ok(())
}

fn raw_numeric(
    feature: NumericFeature,
    record: &RawRecord,
    reference_year: i32,
) -> Result<f64, FeatureError> {
    let missing = || FeatureError::MissingField {
        field: feature.source_field(),
    };

    match feature {
        NumericFeature::Year => Ok(f64::from(record.year)),
        NumericFeature::Month => Ok(f64::from(record.month)),
        NumericFeature::LeaseAge => record
            .lease_commence_date
            .map(|commenced| lease_age(reference_year, commenced))
            .ok_or_else(missing),
        NumericFeature::RemainingLeaseYears => record
            .remaining_lease
            .as_deref()
            .map(|text| parse_remaining_lease_years(text).unwrap_or(f64::NAN))
            .ok_or_else(missing),
        NumericFeature::FloorAreaSqm => record.floor_area_sqm.ok_or_else(missing),
    }
}
