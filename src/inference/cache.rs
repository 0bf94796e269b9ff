//! Fit-once model cache
//!
//! The cache moves through `Unfit -> Fitting -> Ready`. Concurrent first
//! callers block on the same initialization and the trainer runs at most once
//! per successful fit. A failed fit returns the cache to `Unfit`.

use crate::config::PredictorConfig;
use crate::dataset::DatasetLoader;
use crate::error::{PredictorError, Result};
use super::config::InitPolicy;
use super::pipeline::FittedPipeline;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Lifecycle of the cached artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheState {
    Unfit,
    Fitting,
    Ready,
}

const UNFIT: u8 = 0;
const FITTING: u8 = 1;

type Trainer = Box<dyn Fn() -> Result<FittedPipeline> + Send + Sync>;

/// Process-wide holder of the fitted pipeline
pub struct ModelCache {
    cell: OnceCell<Arc<FittedPipeline>>,
    trainer: Trainer,
    state: AtomicU8,
    fit_attempts: AtomicUsize,
}

impl fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCache")
            .field("state", &self.state())
            .field("fit_attempts", &self.fit_attempts())
            .finish()
    }
}

impl ModelCache {
    /// Create a cache around a trainer closure
    pub fn new<F>(trainer: F) -> Self
    where
        F: Fn() -> Result<FittedPipeline> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            trainer: Box::new(trainer),
            state: AtomicU8::new(UNFIT),
            fit_attempts: AtomicUsize::new(0),
        }
    }

    /// Cache that loads the configured data source and fits on it
    pub fn from_config(config: PredictorConfig) -> Self {
        Self::new(move || {
            let path = config.data_path.as_ref().ok_or_else(|| {
                PredictorError::Configuration("no training data path configured".to_string())
            })?;
            let loader = DatasetLoader::new(config.schema.clone(), config.schema_mode);
            let dataset = loader.load(path)?;
            FittedPipeline::fit(&dataset, &config.preprocessing, &config.forest)
        })
    }

    /// Cache that is Ready from the start
    pub fn ready(pipeline: FittedPipeline) -> Self {
        let cache = Self::new(|| {
            Err(PredictorError::TrainingError("pre-fitted cache cannot refit".to_string()))
        });
        // A freshly created cell is always empty
        let _ = cache.cell.set(Arc::new(pipeline));
        cache
    }

    /// Fit the pipeline unless it is already Ready.
    ///
    /// Callers racing on an Unfit cache wait for the single in-flight fit and
    /// share its result.
    pub fn initialize(&self) -> Result<Arc<FittedPipeline>> {
        self.cell
            .get_or_try_init(|| {
                self.state.store(FITTING, Ordering::SeqCst);
                self.fit_attempts.fetch_add(1, Ordering::SeqCst);
                info!("Fitting model");

                match (self.trainer)() {
                    Ok(pipeline) => Ok(Arc::new(pipeline)),
                    Err(e) => {
                        warn!(error = %e, "Model fit failed, cache stays unfit");
                        self.state.store(UNFIT, Ordering::SeqCst);
                        Err(e)
                    }
                }
            })
            .map(Arc::clone)
    }

    /// The fitted pipeline if Ready, without fitting
    pub fn get(&self) -> Option<Arc<FittedPipeline>> {
        self.cell.get().cloned()
    }

    /// The fitted pipeline under `policy`: Lazy fits on demand, Eager
    /// fails with `NotReady`
    pub fn get_or_initialize(&self, policy: InitPolicy) -> Result<Arc<FittedPipeline>> {
        if let Some(pipeline) = self.get() {
            return Ok(pipeline);
        }
        match policy {
            InitPolicy::Lazy => self.initialize(),
            InitPolicy::Eager => Err(PredictorError::NotReady),
        }
    }

    pub fn state(&self) -> CacheState {
        if self.cell.get().is_some() {
            return CacheState::Ready;
        }
        match self.state.load(Ordering::SeqCst) {
            FITTING => CacheState::Fitting,
            _ => CacheState::Unfit,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == CacheState::Ready
    }

    /// Number of times the trainer has been invoked
    pub fn fit_attempts(&self) -> usize {
        self.fit_attempts.load(Ordering::SeqCst)
    }
}

static SHARED: OnceCell<Arc<ModelCache>> = OnceCell::new();

/// The process-wide cache. The first caller's configuration wins; later
/// configurations are ignored.
pub fn shared_cache(config: &PredictorConfig) -> Arc<ModelCache> {
    Arc::clone(SHARED.get_or_init(|| Arc::new(ModelCache::from_config(config.clone()))))
}
