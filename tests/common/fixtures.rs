//! Fitted artifact fixtures and request records.

use housing_serve::compute::{Regressor, StandardScaler, TreeModel};
use housing_serve::features::{FEATURE_COLUMNS, FEATURE_COUNT};
use serde_json::{json, Value};

/// Standardization parameters close to those fitted on the housing corpus.
pub fn housing_scaler() -> StandardScaler {
    let mean = vec![
        -119.57, 35.63, 28.64, 2635.76, 537.87, 1425.48, 499.54, 3.87, 0.44, 0.32, 0.0002, 0.11,
        0.13,
    ];
    let scale = vec![
        2.0, 2.14, 12.59, 2181.56, 421.38, 1132.43, 382.32, 1.9, 0.5, 0.47, 0.016, 0.31, 0.33,
    ];
    StandardScaler::new(mean, scale)
        .unwrap()
        .with_feature_names(&FEATURE_COLUMNS)
}

/// Linear model over scaled features, predicting median house value in dollars.
pub fn linear_model() -> Regressor {
    let coefficients = vec![
        -53_000.0, // longitude
        -54_000.0, // latitude
        13_500.0,  // housing_median_age
        12_000.0,  // total_rooms
        4_000.0,   // total_bedrooms
        -9_000.0,  // population
        5_000.0,   // households
        77_000.0,  // median_income
        4_500.0,   // <1H OCEAN
        -20_000.0, // INLAND
        2_500.0,   // ISLAND
        1_000.0,   // NEAR BAY
        3_000.0,   // NEAR OCEAN
    ];
    assert_eq!(coefficients.len(), FEATURE_COUNT);
    Regressor::linear(coefficients, 206_855.8)
}

/// Two-level tree: split on scaled median income, then on the INLAND slot.
pub fn tree_model() -> Regressor {
    Regressor::DecisionTree(TreeModel {
        n_features: FEATURE_COUNT,
        children_left: vec![1, 3, 5, -1, -1, -1, -1],
        children_right: vec![2, 4, 6, -1, -1, -1, -1],
        feature: vec![7, 9, 9, -2, -2, -2, -2],
        threshold: vec![0.0, 0.5, 0.5, -2.0, -2.0, -2.0, -2.0],
        value: vec![
            206_855.8, 160_000.0, 260_000.0, 180_000.0, 120_000.0, 290_000.0, 210_000.0,
        ],
    })
}

/// The reference INLAND request.
pub fn inland_record() -> Value {
    json!({
        "longitude": -118.0,
        "latitude": 34.0,
        "housing_median_age": 41.0,
        "total_rooms": 6000,
        "total_bedrooms": 1200,
        "population": 1000,
        "households": 500,
        "median_income": 5.5,
        "ocean_proximity": "INLAND"
    })
}

/// The reference request with `ocean_proximity` replaced.
pub fn record_with_proximity(proximity: &str) -> Value {
    let mut record = inland_record();
    record["ocean_proximity"] = json!(proximity);
    record
}

/// Three distinct, well-formed records.
pub fn batch_of_three() -> Vec<Value> {
    let mut second = record_with_proximity("NEAR BAY");
    second["median_income"] = json!(8.3);
    second["longitude"] = json!(-122.23);
    second["latitude"] = json!(37.88);

    let mut third = record_with_proximity("<1H OCEAN");
    third["median_income"] = json!(2.1);
    third["housing_median_age"] = json!(12);

    vec![inland_record(), second, third]
}
