use crate::domain::errors::TrainingError;
use crate::domain::pricing::calendar::YearMonth;
use crate::domain::pricing::record::{Dataset, LabeledRecord, RawRecord, TargetKind};
use crate::domain::repositories::DatasetSource;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Columns understood by the loader. Unknown columns are ignored and every
/// known one is optional at the header level; row validity is decided in
/// [`parse_row`].
#[derive(Debug, Default, Deserialize)]
struct CsvRow {
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    flat_type: Option<String>,
    #[serde(default)]
    year: Option<String>,
    /// Either an integer month or, in resale extracts, a `YYYY-MM` date.
    #[serde(default)]
    month: Option<String>,
    #[serde(default)]
    rent_approval_date: Option<String>,
    #[serde(default)]
    monthly_rent: Option<String>,
    #[serde(default)]
    resale_price: Option<String>,
    #[serde(default)]
    lease_commence_date: Option<String>,
    #[serde(default)]
    remaining_lease: Option<String>,
    #[serde(default)]
    floor_area_sqm: Option<String>,
}

/// Why a row was rejected. Only used for debug logging.
#[derive(Debug, PartialEq, Eq)]
enum RowRejection {
    MissingCategory(&'static str),
    BadPeriod,
    BadLabel,
    BadNumber(&'static str),
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_whole_number(text: &str) -> Option<i32> {
    text.parse::<i32>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|v| {
                v.fract() == 0.0 && *v >= f64::from(i32::MIN) && *v <= f64::from(i32::MAX)
            })
            .map(|v| v as i32)
    })
}

fn parse_period(row: &CsvRow) -> Option<YearMonth> {
    if let (Some(year), Some(month)) = (present(&row.year), present(&row.month)) {
        if let (Ok(year), Some(month)) = (year.parse::<i32>(), parse_whole_number(month)) {
            return Some(YearMonth::new(year, month));
        }
    }
    present(&row.rent_approval_date)
        .or_else(|| present(&row.month))
        .and_then(YearMonth::parse)
}

fn parse_row(row: &CsvRow, target: TargetKind) -> Result<LabeledRecord, RowRejection> {
    let town = present(&row.town).ok_or(RowRejection::MissingCategory("town"))?;
    let flat_type = present(&row.flat_type).ok_or(RowRejection::MissingCategory("flat_type"))?;
    let period = parse_period(row).ok_or(RowRejection::BadPeriod)?;

    let label_text = match target {
        TargetKind::MonthlyRent => present(&row.monthly_rent),
        TargetKind::ResalePrice => present(&row.resale_price),
    };
    let label = label_text
        .and_then(|text| text.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or(RowRejection::BadLabel)?;

    let mut record = RawRecord::new(town, flat_type, period.year, period.month);

    if let Some(text) = present(&row.lease_commence_date) {
        record.lease_commence_date = Some(
            parse_whole_number(text).ok_or(RowRejection::BadNumber("lease_commence_date"))?,
        );
    }
    if let Some(text) = present(&row.floor_area_sqm) {
        let area = text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(RowRejection::BadNumber("floor_area_sqm"))?;
        record.floor_area_sqm = Some(area);
    }
    record.remaining_lease = present(&row.remaining_lease).map(str::to_string);

    Ok(LabeledRecord { record, label })
}

/// Read labeled rows from any CSV reader. Malformed rows are skipped and counted;
/// only I/O failures abort.
pub fn read_dataset<R: Read>(reader: R, target: TargetKind) -> Result<Dataset, TrainingError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut dataset = Dataset::default();

    for (index, result) in rdr.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = match result {
            Ok(row) => row,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return Err(TrainingError::Source {
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                debug!("Skipping unreadable CSV line {}: {}", line, e);
                dataset.skipped += 1;
                continue;
            }
        };

        match parse_row(&row, target) {
            Ok(record) => dataset.records.push(record),
            Err(reason) => {
                debug!("Skipping CSV line {}: {:?}", line, reason);
                dataset.skipped += 1;
            }
        }
    }

    if dataset.skipped > 0 {
        warn!(
            "Skipped {} malformed rows ({} usable)",
            dataset.skipped,
            dataset.len()
        );
    }
    Ok(dataset)
}

/// Training rows from a CSV extract on disk.
pub struct CsvDatasetSource {
    path: PathBuf,
}

impl CsvDatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for CsvDatasetSource {
    fn load(&self, target: TargetKind) -> Result<Dataset, TrainingError> {
        let file = File::open(&self.path).map_err(|e| TrainingError::Source {
            reason: format!("{:?}: {}", self.path, e),
        })?;
        let dataset = read_dataset(BufReader::new(file), target)?;
        info!(
            "Loaded {} {} rows from {:?} ({} skipped)",
            dataset.len(),
            target,
            self.path,
            dataset.skipped
        );
        Ok(dataset)
    }
}
