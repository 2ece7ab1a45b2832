pub mod analysis;
pub mod config;
pub mod error;
pub mod model;

use analysis::{WsiEngine, WsiOutcome};
use config::schema::EngineConfig;
use error::VentoError;
use model::GridLayer;
use rayon::prelude::*;
use std::collections::BTreeMap;

pub use analysis::{CandidateSite, SuitabilityLevel};
pub use error::ErrorCategory;
pub use model::{GeoTransform, WsiGrid};

/// Main API entry point: compute the wind suitability index for one set of
/// criterion layers under one configuration.
///
/// The configuration is validated before anything is computed. Layers are
/// keyed by criterion name.
pub fn compute_wsi(
    layers: &BTreeMap<String, GridLayer>,
    config: &EngineConfig,
) -> Result<WsiOutcome, VentoError> {
    WsiEngine::new(config.clone())?.run(layers)
}

/// Evaluate the same layers under several configurations in parallel.
///
/// Results come back in the order of `configs`; one failing configuration
/// does not affect the others.
pub fn compute_many(
    layers: &BTreeMap<String, GridLayer>,
    configs: &[EngineConfig],
) -> Vec<Result<WsiOutcome, VentoError>> {
    configs
        .par_iter()
        .map(|config| compute_wsi(layers, config))
        .collect()
}
