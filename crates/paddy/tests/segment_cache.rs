//! End-to-end segment training and caching through `YieldService`.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use paddy::data::DatasetLoadError;
use paddy::model::TrainTestSplit;
use paddy::{
    ModelCache, NotFoundReason, SegmentError, SegmentKey, SegmentTrainer, Table, YieldService,
};

use common::{fast_config, synthetic_table, tiny_loader};

fn key(region: &str, soil: &str) -> SegmentKey {
    SegmentKey::new(region, soil).unwrap()
}

fn synthetic_service(rows_per_segment: usize) -> YieldService {
    YieldService::new(
        &fast_config(),
        move || -> Result<Table, DatasetLoadError> { Ok(synthetic_table(rows_per_segment, 7)) },
        None,
    )
}

#[test]
fn three_row_segment_trains_and_caches() {
    let service = YieldService::new(&fast_config(), tiny_loader, None);
    let model = service.get_or_train(&key("Punjab", "Loam")).unwrap();

    assert_eq!(model.sample_count(), 3);
    assert_eq!(model.predictions().len(), 1);
    assert!(model.train_score().is_finite());
    assert!(model.test_score().is_finite());
    let total: f64 = model.feature_importance().iter().map(|f| f.importance).sum();
    assert_abs_diff_eq!(total, 1.0, epsilon = 1e-6);

    let again = service.get_or_train(&key("Punjab", "Loam")).unwrap();
    assert!(Arc::ptr_eq(&model, &again));
    assert_eq!(service.stats().cached_models, 1);
}

#[test]
fn unknown_region_is_not_found_and_not_cached() {
    let service = YieldService::new(&fast_config(), tiny_loader, None);
    let err = service.get_or_train(&key("Atlantis", "Loam")).unwrap_err();
    assert!(matches!(
        err,
        SegmentError::NotFound {
            reason: NotFoundReason::NoMatchingRows,
            ..
        }
    ));
    assert_eq!(service.stats().cached_models, 0);

    let err = service.get_or_train(&key("Kerala", "Clay")).unwrap_err();
    assert_eq!(
        err.not_found_reason(),
        Some(&NotFoundReason::InsufficientRows { rows: 1 })
    );
    assert!(service.cache().is_empty());
}

#[test]
fn key_matching_is_exact() {
    let service = YieldService::new(&fast_config(), tiny_loader, None);
    assert!(service.get_or_train(&key("punjab", "Loam")).unwrap_err().is_not_found());
    assert!(service.get_or_train(&key("Punjab", "Loam ")).unwrap_err().is_not_found());
}

#[test]
fn concurrent_first_requests_share_one_entry() {
    let service = synthetic_service(40);
    let n_threads = 8;
    let barrier = Barrier::new(n_threads);

    let models: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..n_threads)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    service.get_or_train(&key("Punjab", "Loam")).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(models.iter().all(|m| Arc::ptr_eq(m, &models[0])));
    assert_eq!(service.cache().len(), 1);
}

#[test]
fn concurrent_misses_run_training_once() {
    let table = synthetic_table(20, 3);
    let trainer = SegmentTrainer::default();
    let cache = ModelCache::new();
    let calls = AtomicUsize::new(0);
    let k = key("Kerala", "Clay");
    let barrier = Barrier::new(6);

    thread::scope(|s| {
        for _ in 0..6 {
            s.spawn(|| {
                barrier.wait();
                cache
                    .get_or_try_insert_with(&k, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        trainer.train(&table, &k)
                    })
                    .unwrap()
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn distinct_keys_get_distinct_entries() {
    let service = synthetic_service(15);
    let a = service.get_or_train(&key("Punjab", "Loam")).unwrap();
    let b = service.get_or_train(&key("Odisha", "Clay")).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(service.cache().keys(), vec![key("Odisha", "Clay"), key("Punjab", "Loam")]);
}

#[test]
fn segment_encoding_uses_only_segment_categories() {
    let service = synthetic_service(12);
    let model = service.get_or_train(&key("Odisha", "Loam")).unwrap();
    assert_eq!(
        model.feature_columns(),
        &[
            "Rainfall",
            "Fertilizer",
            "State_Odisha",
            "Soil_Loam",
            "Season_Kharif",
            "Season_Rabi",
        ]
    );
}

#[test]
fn importances_are_a_distribution_over_encoded_columns() {
    let service = synthetic_service(40);
    let model = service.get_or_train(&key("Punjab", "Clay")).unwrap();

    let weights = model.feature_importance();
    assert_eq!(weights.len(), model.feature_columns().len());
    for (w, name) in weights.iter().zip(model.feature_columns()) {
        assert_eq!(&w.feature, name);
        assert!(w.importance >= 0.0);
    }
    let total: f64 = weights.iter().map(|w| w.importance).sum();
    assert_abs_diff_eq!(total, 1.0, epsilon = 1e-6);

    // Constant indicator columns can never split.
    let state = weights.iter().find(|w| w.feature == "State_Punjab").unwrap();
    assert_eq!(state.importance, 0.0);
}

#[test]
fn insights_project_the_cached_model() {
    let service = synthetic_service(40);
    let k = key("Kerala", "Loam");
    let insights = service.insights(&k).unwrap();
    let model = service.get_or_train(&k).unwrap();

    let preds = model.predictions();
    let lo = preds.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = preds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(insights.yield_range, Some((lo, hi)));
    assert_abs_diff_eq!(
        insights.average_yield.unwrap(),
        preds.iter().sum::<f64>() / preds.len() as f64,
        epsilon = 1e-12
    );
    assert_eq!(insights.confidence, model.test_score());
    assert_eq!(insights.sample_size, 40);

    assert_eq!(insights.key_factors.len(), 3);
    for pair in insights.key_factors.windows(2) {
        assert!(pair[0].importance >= pair[1].importance);
    }
    for factor in &insights.key_factors {
        assert!(model.feature_importance().contains(factor));
    }
    assert_eq!(service.cache().len(), 1);
}

#[test]
fn held_out_predictions_match_rescoring() {
    let table = synthetic_table(30, 11);
    let trainer = SegmentTrainer::default();
    let k = key("Punjab", "Loam");
    let model = trainer.train(&table, &k).unwrap();

    let rows = trainer.matching_rows(&table, &k).unwrap();
    let segment = table.take_rows(&rows).unwrap();
    let split = TrainTestSplit::for_segment(rows.len(), trainer.split_seed());
    let held_out = segment.take_rows(&split.test).unwrap();

    let rescored = model.predict_table(&held_out).unwrap();
    assert_eq!(rescored.len(), model.predictions().len());
    for (a, b) in rescored.iter().zip(model.predictions()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
    }
    assert_eq!(
        model.test_targets(),
        held_out.target().unwrap().as_numeric().unwrap()
    );
}

#[test]
fn training_is_reproducible_across_services() {
    let a = synthetic_service(25).get_or_train(&key("Odisha", "Loam")).unwrap();
    let b = synthetic_service(25).get_or_train(&key("Odisha", "Loam")).unwrap();
    assert_eq!(a.predictions(), b.predictions());
    assert_eq!(a.feature_importance(), b.feature_importance());
    assert_eq!(a.test_score(), b.test_score());
}

#[test]
fn forest_learns_the_signal() {
    let service = synthetic_service(60);
    let model = service.get_or_train(&key("Punjab", "Loam")).unwrap();
    assert!(model.train_score() > 0.8, "train r2 = {}", model.train_score());
    assert!(model.eval().train.rmse < 0.5);

    let top = model.top_features(2);
    assert!(top.iter().any(|f| f.feature == "Rainfall"));
}

#[test]
fn prediction_report_lists_top_five() {
    let service = synthetic_service(20);
    let report = service.predict(&key("Kerala", "Clay")).unwrap();
    assert_eq!(report.region, "Kerala");
    assert_eq!(report.feature_importance.len(), 5);
    assert_eq!(report.sample_count, 20);
    assert_eq!(report.predictions.len(), 2);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["eval"]["test"]["rmse"].is_number());
    let stamp = json["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok(), "timestamp = {stamp}");
}

#[test]
fn two_row_segment_holds_out_one_row() {
    let table = Table::builder()
        .categorical("State", vec!["Punjab", "Punjab"])
        .categorical("Soil", vec!["Loam", "Loam"])
        .numeric("Rainfall", vec![900.0, 1200.0])
        .numeric("Yield", vec![2.9, 3.3])
        .build()
        .unwrap();
    let model = SegmentTrainer::default().train(&table, &key("Punjab", "Loam")).unwrap();
    assert_eq!(model.sample_count(), 2);
    assert_eq!(model.predictions().len(), 1);
    assert!(model.test_score().is_finite());
}

#[test]
fn tied_importances_keep_encoded_column_order() {
    let table = Table::builder()
        .categorical("State", vec!["Punjab"; 4])
        .categorical("Soil", vec!["Loam"; 4])
        .numeric("Rainfall", vec![800.0, 950.0, 1100.0, 1300.0])
        .numeric("Fertilizer", vec![90.0, 60.0, 150.0, 120.0])
        .numeric("Yield", vec![3.0; 4])
        .build()
        .unwrap();
    let service = YieldService::new(
        &fast_config(),
        move || -> Result<Table, DatasetLoadError> { Ok(table.clone()) },
        None,
    );
    let k = key("Punjab", "Loam");
    let model = service.get_or_train(&k).unwrap();

    assert_eq!(
        model.feature_columns(),
        &["Rainfall", "Fertilizer", "State_Punjab", "Soil_Loam"]
    );
    for weight in model.feature_importance() {
        assert_abs_diff_eq!(weight.importance, 0.25, epsilon = 1e-12);
    }

    let insights = service.insights(&k).unwrap();
    let names: Vec<&str> = insights.key_factors.iter().map(|f| f.feature.as_str()).collect();
    assert_eq!(names, vec!["Rainfall", "Fertilizer", "State_Punjab"]);
}
