use rentcast::application::ml::{ModelServer, PricePredictor, Trainer, TrainerConfig};
use rentcast::domain::ml::estimator::ModelParams;
use rentcast::domain::pricing::record::{Dataset, LabeledRecord, RawRecord};
use rentcast::infrastructure::InMemoryArtifactStore;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn store_with_artifact(load_delay: Duration) -> Arc<InMemoryArtifactStore> {
    let store = Arc::new(InMemoryArtifactStore::new().with_load_delay(load_delay));
    let config = TrainerConfig {
        model: ModelParams {
            n_trees: 5,
            ..ModelParams::default()
        },
        test_fraction: 0.0,
        ..TrainerConfig::default()
    };
    let records = (0..24)
        .map(|i| LabeledRecord {
            record: RawRecord::new(if i % 2 == 0 { "BEDOK" } else { "YISHUN" }, "3-ROOM", 2023, 1 + i % 12),
            label: if i % 2 == 0 { 2300.0 } else { 2100.0 },
        })
        .collect();
    Trainer::new(config, store.clone())
        .train(&Dataset { records, skipped: 0 })
        .unwrap();
    store
}

/// Two callers racing on a cold server must share one artifact load.
#[test]
fn test_concurrent_first_predictions_load_once() {
    let store = store_with_artifact(Duration::from_millis(200));
    assert_eq!(store.load_count(), 0);

    let server = Arc::new(ModelServer::new(store.clone()));
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let server = server.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                server.predict(&RawRecord::new("BEDOK", "3-ROOM", 2023, 6))
            })
        })
        .collect();

    let results: Vec<f64> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked").expect("prediction failed"))
        .collect();

    assert_eq!(store.load_count(), 1);
    assert_eq!(results[0], results[1]);
}

#[test]
fn test_many_threads_after_preload_never_reload() {
    let store = store_with_artifact(Duration::ZERO);
    let server = Arc::new(ModelServer::new(store.clone()));
    server.preload().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let server = server.clone();
            thread::spawn(move || {
                server
                    .predict_series(&RawRecord::new("YISHUN", "3-ROOM", 2023, 1 + t), 12)
                    .unwrap()
                    .len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 12);
    }
    assert_eq!(store.load_count(), 1);
}
