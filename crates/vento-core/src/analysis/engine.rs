use crate::analysis::normalize::{ensure_finite, normalize};
use crate::analysis::outcome::{CriterionSummary, WsiOutcome};
use crate::analysis::quality::{check_layer, QualityWarning};
use crate::analysis::statistics::{LayerStats, WsiStatistics};
use crate::analysis::{overlay, sites, suitability, viability};
use crate::config::schema::EngineConfig;
use crate::config::validate_config;
use crate::error::VentoError;
use crate::model::GridLayer;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs the full suitability pipeline for one validated configuration.
#[derive(Debug, Clone)]
pub struct WsiEngine {
    config: EngineConfig,
}

impl WsiEngine {
    /// Validate `config` up front; a rejected configuration never computes.
    pub fn new(config: EngineConfig) -> Result<Self, VentoError> {
        validate_config(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalize, overlay, classify, assess and extract sites.
    ///
    /// `layers` maps each criterion name to its raw grid. All input checks
    /// run before any normalization, so a bad layer fails without partial
    /// work.
    pub fn run(&self, layers: &BTreeMap<String, GridLayer>) -> Result<WsiOutcome, VentoError> {
        let config = &self.config;
        let started = Instant::now();
        info!(config = %config.name, criteria = config.criteria.len(), "computing WSI");

        let (criteria, warnings) = self.check_inputs(layers)?;
        for w in &warnings {
            warn!(criterion = %w.criterion, "{}", w.message);
        }

        let mut normalized = BTreeMap::new();
        for spec in &config.criteria {
            let layer = &layers[&spec.name];
            let scores = normalize(layer, spec)?;
            debug!(
                criterion = %spec.name,
                method = %spec.normalization_method,
                direction = %spec.direction,
                "normalized"
            );
            normalized.insert(spec.name.clone(), scores);
        }

        let wsi = overlay::combine(&normalized, &config.weights)?;
        let cell_area = config.cell_area.unwrap_or_else(|| wsi.cell_area());

        let classes = suitability::classify_grid(&wsi);
        let class_breakdown = suitability::class_breakdown(&classes);
        let viability =
            viability::assess(&wsi, config.viability_threshold).with_cell_area(cell_area);
        let statistics = WsiStatistics::from_grid(&wsi);
        let extraction = sites::extract(&wsi, &config.selection, cell_area)?;

        let processing_time_seconds = started.elapsed().as_secs_f64();
        info!(
            valid_cells = statistics.valid_cells,
            viability_pct = viability.viability_percentage,
            sites = extraction.sites.len(),
            seconds = processing_time_seconds,
            "WSI computed"
        );

        Ok(WsiOutcome {
            config_name: config.name.clone(),
            wsi,
            classes,
            class_breakdown,
            viability,
            statistics,
            effective_threshold: extraction.effective_threshold,
            sites: extraction.sites,
            criteria,
            warnings,
            processing_time_seconds,
        })
    }

    fn check_inputs(
        &self,
        layers: &BTreeMap<String, GridLayer>,
    ) -> Result<(Vec<CriterionSummary>, Vec<QualityWarning>), VentoError> {
        let config = &self.config;

        for spec in &config.criteria {
            if !layers.contains_key(&spec.name) {
                return Err(VentoError::Config(format!(
                    "no input layer for criterion '{}'",
                    spec.name
                )));
            }
        }
        if let Some(extra) = layers.keys().find(|k| config.criterion(k).is_none()) {
            return Err(VentoError::Config(format!(
                "input layer '{}' has no matching criterion",
                extra
            )));
        }

        // validate_config guarantees at least one criterion
        let ref_name = &config.criteria[0].name;
        let reference = &layers[ref_name];
        for spec in &config.criteria[1..] {
            if let Some(reason) = reference.alignment_issue(&layers[&spec.name]) {
                return Err(VentoError::Misaligned {
                    criterion: spec.name.clone(),
                    reference: ref_name.clone(),
                    reason,
                });
            }
        }
        if config.cell_area.is_none() {
            let area = reference.cell_area();
            if !area.is_finite() || area <= 0.0 {
                return Err(VentoError::data(
                    ref_name,
                    format!(
                        "grid transform gives a cell area of {}; set cell_area in the configuration",
                        area
                    ),
                ));
            }
        }

        let mut summaries = Vec::with_capacity(config.criteria.len());
        let mut warnings = Vec::new();
        for spec in &config.criteria {
            let layer = &layers[&spec.name];
            if layer.valid_count() == 0 {
                return Err(VentoError::data(&spec.name, "layer has no valid cells"));
            }
            if let Some(min) = config.min_valid_coverage {
                if layer.coverage() < min {
                    return Err(VentoError::data(
                        &spec.name,
                        format!(
                            "valid coverage {:.1}% is below the required {:.1}%",
                            layer.coverage() * 100.0,
                            min * 100.0
                        ),
                    ));
                }
            }
            ensure_finite(layer, &spec.name)?;

            let raw_stats = LayerStats::collect(layer)
                .ok_or_else(|| VentoError::data(&spec.name, "layer has no valid cells"))?;
            summaries.push(CriterionSummary {
                name: spec.name.clone(),
                direction: spec.direction,
                method: spec.normalization_method,
                weight: config.weights.get(&spec.name).unwrap_or(0.0),
                raw_stats,
            });
            warnings.extend(check_layer(spec, layer));
        }

        Ok((summaries, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::suitability::SuitabilityLevel;
    use crate::config::builtin::load_preset;
    use crate::config::schema::{CriterionSpec, Direction, SiteSelection, WeightConfig};
    use crate::error::ErrorCategory;
    use crate::model::GeoTransform;
    use approx::assert_abs_diff_eq;

    fn config() -> EngineConfig {
        EngineConfig {
            name: "test".into(),
            description: None,
            version: "1.0".into(),
            criteria: vec![
                CriterionSpec::new("wind", Direction::HigherIsBetter),
                CriterionSpec::new("slope", Direction::LowerIsBetter),
            ],
            weights: [("wind", 0.5), ("slope", 0.5)].into_iter().collect(),
            viability_threshold: 0.5,
            selection: SiteSelection {
                top_percentage: 100.0,
                min_wsi: 0.5,
                min_area: 0.0,
                max_sites: None,
            },
            cell_area: None,
            min_valid_coverage: None,
        }
    }

    fn inputs(wind: GridLayer, slope: GridLayer) -> BTreeMap<String, GridLayer> {
        BTreeMap::from([("wind".to_string(), wind), ("slope".to_string(), slope)])
    }

    fn uniform_slope(width: usize, height: usize) -> GridLayer {
        GridLayer::new(width, height, vec![3.0; width * height]).unwrap()
    }

    #[test]
    fn test_run_produces_consistent_outcome() {
        let wind = GridLayer::from_rows(&[vec![2.0, 6.0, 10.0], vec![2.0, 6.0, 10.0]]).unwrap();
        let slope = uniform_slope(3, 2);
        let engine = WsiEngine::new(config()).unwrap();
        let out = engine.run(&inputs(wind, slope)).unwrap();

        // wind scores 0 / 0.5 / 1, slope is degenerate at 0.5
        assert_abs_diff_eq!(out.wsi.get(0, 0).unwrap(), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(out.wsi.get(0, 1).unwrap(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(out.wsi.get(1, 2).unwrap(), 0.75, epsilon = 1e-12);

        assert_eq!(out.class_at(0, 0), Some(SuitabilityLevel::Fair));
        assert_eq!(out.class_at(1, 2), Some(SuitabilityLevel::High));
        assert_eq!(out.class_at(9, 9), None);

        assert_eq!(out.viability.suitable_cell_count, 4);
        assert_eq!(out.statistics.valid_cells, 6);
        assert_eq!(out.sites.len(), 1);
        assert_eq!(out.sites[0].cell_count, 4);
        assert_eq!(out.effective_threshold, Some(0.5));
        assert_eq!(out.criteria.len(), 2);
        assert_eq!(out.criteria[0].name, "wind");
        assert_eq!(out.criteria[0].raw_stats.max, 10.0);
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut cfg = config();
        cfg.weights = WeightConfig::from_iter([("wind", 0.7), ("slope", 0.7)]);
        let err = WsiEngine::new(cfg).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_missing_layer_is_config_error() {
        let engine = WsiEngine::new(config()).unwrap();
        let layers = BTreeMap::from([("wind".to_string(), uniform_slope(2, 2))]);
        let err = engine.run(&layers).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(err.to_string().contains("slope"));
    }

    #[test]
    fn test_unknown_layer_is_config_error() {
        let engine = WsiEngine::new(config()).unwrap();
        let mut layers = inputs(uniform_slope(2, 2), uniform_slope(2, 2));
        layers.insert("roads".to_string(), uniform_slope(2, 2));
        let err = engine.run(&layers).unwrap_err();
        assert!(err.to_string().contains("roads"));
    }

    #[test]
    fn test_misaligned_layers_rejected() {
        let engine = WsiEngine::new(config()).unwrap();
        let err = engine
            .run(&inputs(uniform_slope(2, 2), uniform_slope(3, 2)))
            .unwrap_err();
        assert!(matches!(err, VentoError::Misaligned { .. }));

        let shifted = uniform_slope(2, 2).with_transform(GeoTransform::new(5.0, 0.0, 1.0, -1.0));
        let err = engine
            .run(&inputs(uniform_slope(2, 2), shifted))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_low_coverage_warns_and_min_coverage_fails() {
        let sparse =
            GridLayer::with_mask(4, 1, vec![1.0, 2.0, 3.0, 4.0], vec![true, false, false, false])
                .unwrap();
        let engine = WsiEngine::new(config()).unwrap();
        let out = engine
            .run(&inputs(sparse.clone(), uniform_slope(4, 1)))
            .unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].criterion, "wind");
        assert_eq!(out.statistics.valid_cells, 1);

        let mut cfg = config();
        cfg.min_valid_coverage = Some(0.5);
        let engine = WsiEngine::new(cfg).unwrap();
        let err = engine.run(&inputs(sparse, uniform_slope(4, 1))).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_cell_area_override() {
        let mut cfg = config();
        cfg.cell_area = Some(900.0);
        let engine = WsiEngine::new(cfg).unwrap();
        let wind = GridLayer::new(2, 1, vec![1.0, 9.0]).unwrap();
        let out = engine.run(&inputs(wind, uniform_slope(2, 1))).unwrap();
        assert_eq!(out.viability.total_area, 1800.0);
        assert_eq!(out.sites[0].area, 900.0);
    }

    #[test]
    fn test_degenerate_transform_is_data_error() {
        let flat = GeoTransform::new(0.0, 0.0, 0.0, 0.0);
        let wind = GridLayer::new(2, 1, vec![1.0, 9.0])
            .unwrap()
            .with_transform(flat);
        let slope = uniform_slope(2, 1).with_transform(flat);
        let engine = WsiEngine::new(config()).unwrap();
        let err = engine.run(&inputs(wind.clone(), slope.clone())).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Data);
        assert!(err.to_string().contains("wind"));

        // an explicit cell area makes the transform's area irrelevant
        let mut cfg = config();
        cfg.cell_area = Some(25.0);
        let out = WsiEngine::new(cfg).unwrap().run(&inputs(wind, slope)).unwrap();
        assert_eq!(out.viability.total_area, 50.0);
    }

    #[test]
    fn test_processing_time_is_recorded() {
        let engine = WsiEngine::new(config()).unwrap();
        let out = engine
            .run(&inputs(uniform_slope(2, 2), uniform_slope(2, 2)))
            .unwrap();
        assert!(out.processing_time_seconds >= 0.0);
        assert!(out.processing_time_seconds.is_finite());
    }

    #[test]
    fn test_preset_runs() {
        let engine = WsiEngine::new(load_preset("default").unwrap()).unwrap();
        let names: Vec<String> = engine.config().criteria.iter().map(|c| c.name.clone()).collect();
        let layers: BTreeMap<String, GridLayer> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let values = (0..16).map(|v| (v * (i + 1)) as f64).collect();
                (name, GridLayer::new(4, 4, values).unwrap())
            })
            .collect();
        let out = engine.run(&layers).unwrap();
        assert_eq!(out.config_name, engine.config().name);
        assert_eq!(out.statistics.valid_cells, 16);
    }
}
