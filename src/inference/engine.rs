//! Inference entry point
//!
//! Applies the cached pipeline to raw requests. Requests never mutate the
//! fitted artifacts, so a failing request leaves the cache Ready.

use crate::error::Result;
use crate::record::TreatmentRequest;
use super::cache::{CacheState, ModelCache};
use super::config::InferenceConfig;
use super::pipeline::{FittedPipeline, Prediction};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Inference statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceStats {
    pub total_requests: u64,
    pub error_count: u64,
    pub avg_latency_ms: f64,
}

/// Serves predictions from a shared [`ModelCache`]
#[derive(Debug)]
pub struct InferenceEngine {
    config: InferenceConfig,
    cache: Arc<ModelCache>,
    total_requests: AtomicU64,
    error_count: AtomicU64,
    total_latency_us: AtomicU64,
}

impl InferenceEngine {
    /// Create a new inference engine
    pub fn new(config: InferenceConfig, cache: Arc<ModelCache>) -> Self {
        Self {
            config,
            cache,
            total_requests: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
        }
    }

    /// Fit the cached pipeline now instead of on the first request
    pub fn initialize(&self) -> Result<Arc<FittedPipeline>> {
        self.cache.initialize()
    }

    /// Predict every available target for one raw request
    pub fn predict(&self, request: &TreatmentRequest) -> Result<Prediction> {
        let start = Instant::now();
        debug!(request = ?request, "Prediction request");

        let result = self
            .pipeline()
            .and_then(|pipeline| pipeline.predict(request));
        self.record(start, 1, &result);

        result
    }

    /// Predict several requests against the same fitted pipeline.
    ///
    /// Chunks of `batch_size` requests run in parallel; output order matches
    /// input order.
    pub fn predict_batch(&self, requests: &[TreatmentRequest]) -> Result<Vec<Prediction>> {
        let start = Instant::now();
        debug!(batch = requests.len(), "Batch prediction request");

        let result = self.pipeline().and_then(|pipeline| {
            let chunks = requests
                .par_chunks(self.config.batch_size.max(1))
                .map(|chunk| pipeline.predict_batch(chunk))
                .collect::<Result<Vec<_>>>()?;
            Ok(chunks.into_iter().flatten().collect::<Vec<_>>())
        });
        self.record(start, requests.len() as u64, &result);

        result
    }

    pub fn state(&self) -> CacheState {
        self.cache.state()
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    /// Get the current configuration
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Get inference statistics snapshot
    pub fn stats(&self) -> InferenceStats {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let latency_us = self.total_latency_us.load(Ordering::Relaxed);
        InferenceStats {
            total_requests,
            error_count: self.error_count.load(Ordering::Relaxed),
            avg_latency_ms: if total_requests > 0 {
                latency_us as f64 / total_requests as f64 / 1000.0
            } else {
                0.0
            },
        }
    }

    fn pipeline(&self) -> Result<Arc<FittedPipeline>> {
        self.cache.get_or_initialize(self.config.init_policy)
    }

    fn record<T>(&self, start: Instant, n: u64, result: &Result<T>) {
        self.total_requests.fetch_add(n, Ordering::Relaxed);
        self.total_latency_us
            .fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);
        if let Err(e) = result {
            self.error_count.fetch_add(n, Ordering::Relaxed);
            warn!(error = %e, request_error = e.is_request_error(), "Prediction failed");
        }
    }
}
