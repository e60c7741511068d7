use rentcast::application::ml::{ModelServer, PricePredictor, Trainer, TrainerConfig};
use rentcast::domain::ml::estimator::ModelParams;
use rentcast::domain::ml::feature_registry::FeatureSchema;
use rentcast::domain::ml::feature_transform::{EncoderOptions, FittedTransform};
use rentcast::domain::pricing::record::{Dataset, LabeledRecord, RawRecord};
use rentcast::domain::repositories::ArtifactStore;
use rentcast::infrastructure::{CsvDatasetSource, FsArtifactStore, InMemoryArtifactStore};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rentcast-pipeline-{}", Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Small deterministic jitter in [-10, 10].
fn noise(i: usize) -> f64 {
    ((i * 37) % 21) as f64 - 10.0
}

/// 200 Tampines 3-room rows around 2500, plus Bedok 4-room rows around 3200.
fn tampines_dataset() -> Dataset {
    let mut records = Vec::new();
    for i in 0..200 {
        records.push(LabeledRecord {
            record: RawRecord::new("TAMPINES", "3-ROOM", 2023, 6),
            label: 2500.0 + noise(i),
        });
    }
    for i in 0..100 {
        records.push(LabeledRecord {
            record: RawRecord::new("BEDOK", "4-ROOM", 2023, 1 + (i % 12) as i32),
            label: 3200.0 + noise(i),
        });
    }
    Dataset { records, skipped: 0 }
}

fn forest_config() -> TrainerConfig {
    TrainerConfig {
        model: ModelParams {
            n_trees: 20,
            ..ModelParams::default()
        },
        reference_year: Some(2025),
        ..TrainerConfig::default()
    }
}

#[test]
fn test_constant_segment_predicts_its_rent() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let trainer = Trainer::new(forest_config(), store.clone());
    let artifact = trainer.train(&tampines_dataset()).unwrap();

    assert_eq!(artifact.summary.train_rows, 240);
    assert_eq!(artifact.summary.eval_rows, 60);

    let server = ModelServer::new(store);
    let predicted = server
        .predict(&RawRecord::new("TAMPINES", "3-ROOM", 2023, 6))
        .unwrap();
    assert!((predicted - 2500.0).abs() < 25.0, "predicted {}", predicted);
}

#[test]
fn test_unknown_town_predicts_finite_value() {
    let store = Arc::new(InMemoryArtifactStore::new());
    Trainer::new(forest_config(), store.clone())
        .train(&tampines_dataset())
        .unwrap();

    let server = ModelServer::new(store);
    let predicted = server
        .predict(&RawRecord::new("UNKNOWN_TOWN", "3-ROOM", 2023, 6))
        .unwrap();
    assert!(predicted.is_finite());

    let lowercase = server
        .predict(&RawRecord::new(" tampines ", "3-room", 2023, 6))
        .unwrap();
    let canonical = server
        .predict(&RawRecord::new("TAMPINES", "3-ROOM", 2023, 6))
        .unwrap();
    assert_eq!(lowercase, canonical);
}

#[test]
fn test_transform_is_deterministic() {
    let dataset = tampines_dataset();
    let fitted = FittedTransform::fit(
        dataset.records.iter().map(|r| &r.record),
        &FeatureSchema::rental(),
        EncoderOptions::default(),
        2025,
    )
    .unwrap();

    let record = RawRecord::new("BEDOK", "4-ROOM", 2024, 3);
    assert_eq!(fitted.transform(&record).unwrap(), fitted.transform(&record).unwrap());

    let unseen = fitted
        .transform(&RawRecord::new("PUNGGOL", "EXECUTIVE", 2024, 3))
        .unwrap();
    let indicators = fitted.towns().len() + fitted.flat_types().len();
    assert!(unseen.as_slice()[..indicators].iter().all(|&v| v == 0.0));
}

#[test]
fn test_file_round_trip_preserves_predictions() {
    let dir = scratch_dir();
    let path = dir.join("models").join("rent_model.json");
    let store = Arc::new(FsArtifactStore::new(&path));

    let artifact = Trainer::new(forest_config(), store.clone())
        .train(&tampines_dataset())
        .unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded.encoder, artifact.encoder);
    assert_eq!(loaded.summary, artifact.summary);
    for record in [
        RawRecord::new("TAMPINES", "3-ROOM", 2023, 6),
        RawRecord::new("BEDOK", "4-ROOM", 2024, 11),
        RawRecord::new("UNKNOWN_TOWN", "2-ROOM", 2030, 1),
    ] {
        assert_eq!(loaded.predict(&record).unwrap(), artifact.predict(&record).unwrap());
    }

    // Only the published artifact remains; no temp files.
    let entries: Vec<_> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("rent_model.json")]);

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_csv_with_bad_rents_reports_skipped_rows() {
    let dir = scratch_dir();
    let csv_path = dir.join("rentals.csv");
    let mut csv = String::from("rent_approval_date,town,block,flat_type,monthly_rent\n");
    for i in 0..100 {
        let rent = if i % 10 == 0 {
            "NA".to_string()
        } else {
            format!("{}", 2000 + (i % 7) * 50)
        };
        let town = ["BEDOK", "TAMPINES", "YISHUN"][i % 3];
        csv.push_str(&format!("2022-{:02},{},{},4-ROOM,{}\n", 1 + i % 12, town, 100 + i, rent));
    }
    fs::write(&csv_path, csv).unwrap();

    let store = Arc::new(FsArtifactStore::new(dir.join("rent_model.json")));
    let trainer = Trainer::new(forest_config(), store.clone());
    let artifact = trainer.train_from(&CsvDatasetSource::new(&csv_path)).unwrap();

    assert_eq!(artifact.summary.rows_read, 100);
    assert_eq!(artifact.summary.rows_skipped, 10);
    assert_eq!(artifact.summary.train_rows + artifact.summary.eval_rows, 90);
    assert!(store.load().is_ok());

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_extended_schema_handles_future_lease_and_unparseable_text() {
    let config = TrainerConfig {
        schema: FeatureSchema::extended(),
        ..forest_config()
    };
    let store = Arc::new(InMemoryArtifactStore::new());
    let records = (0..60)
        .map(|i| LabeledRecord {
            record: RawRecord::new("CLEMENTI", "5-ROOM", 2022, 1 + i % 12)
                .with_lease(1980 + i, format!("{} years 02 months", 99 - (2025 - 1980 - i)))
                .with_floor_area(110.0 + f64::from(i % 5)),
            label: 600_000.0 + 2_000.0 * f64::from(i),
        })
        .collect();
    Trainer::new(config, store.clone())
        .train(&Dataset { records, skipped: 0 })
        .unwrap();

    let server = ModelServer::new(store);
    // Lease starting after the reference year gives a negative age, which is kept.
    let future = RawRecord::new("CLEMENTI", "5-ROOM", 2026, 3)
        .with_lease(2030, "unknown")
        .with_floor_area(112.0);
    assert!(server.predict(&future).unwrap().is_finite());

    // Lease fields are required by the extended schema.
    let bare = RawRecord::new("CLEMENTI", "5-ROOM", 2026, 3);
    assert!(server.predict(&bare).unwrap_err().is_client_error());
}

#[test]
fn test_twelve_month_forecast_calendar() {
    let store = Arc::new(InMemoryArtifactStore::new());
    Trainer::new(forest_config(), store.clone())
        .train(&tampines_dataset())
        .unwrap();
    let server = ModelServer::new(store);

    for start_month in 1..=12 {
        let record = RawRecord::new("TAMPINES", "3-ROOM", 2023, start_month);
        let points = server.forecast(&record, 12).unwrap();
        assert_eq!(points.len(), 12);
        for (k, point) in points.iter().enumerate() {
            let k = k as i32 + 1;
            assert_eq!(point.month, (start_month - 1 + k) % 12 + 1);
            assert_eq!(point.year, 2023 + (start_month - 1 + k) / 12);
            assert!(point.predicted.is_finite());
        }

        let series = server.predict_series(&record, 12).unwrap();
        let from_points: Vec<f64> = points.iter().map(|p| p.predicted).collect();
        assert_eq!(series, from_points);
    }
}
