//! Shared helpers for the integration tests

#![allow(dead_code)]

use laser_predictor::prelude::*;
use laser_predictor::schema;
use std::path::PathBuf;

pub fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/sample_treatments.csv")
}

pub fn sample_dataset() -> Dataset {
    DatasetLoader::default().load(&sample_path()).unwrap()
}

pub fn fit_sample(forest: &ForestConfig) -> FittedPipeline {
    FittedPipeline::fit(&sample_dataset(), &PreprocessingConfig::default(), forest).unwrap()
}

/// The reference patient used across the tests
pub fn scenario(laser_type: &str) -> TreatmentRequest {
    TreatmentRequest::new()
        .with(schema::AGE, 60.0)
        .with(schema::FREQUENCY, 3.0)
        .with(schema::PENETRATION_DEPTH, 2.0)
        .with(schema::LASER_RADIUS, 0.8)
        .with(schema::POWER_MW, 400.0)
        .with(schema::INTENSITY, "Low-Level")
        .with(schema::LASER_TYPE, laser_type)
}
