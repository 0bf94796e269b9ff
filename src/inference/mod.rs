//! Inference module
//!
//! - [`FittedPipeline`]: preprocessing and model fitted together
//! - [`ModelCache`]: fit-once, `Arc`-shared holder of the pipeline
//! - [`InferenceEngine`]: request entry point with single and batch prediction

mod cache;
mod config;
mod engine;
mod pipeline;

pub use cache::{shared_cache, CacheState, ModelCache};
pub use config::{InferenceConfig, InitPolicy};
pub use engine::{InferenceEngine, InferenceStats};
pub use pipeline::{FittedPipeline, Prediction};
