use crate::config::schema::CriterionSpec;
use crate::model::GridLayer;
use serde::{Deserialize, Serialize};

/// Layers with less valid coverage than this get a warning.
pub const LOW_COVERAGE_WARNING: f64 = 0.5;

/// A non-fatal data quality observation about one input layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityWarning {
    pub criterion: String,
    pub message: String,
}

impl QualityWarning {
    fn new(criterion: &str, message: String) -> Self {
        Self {
            criterion: criterion.to_string(),
            message,
        }
    }
}

/// Inspect a raw layer for implausible values and sparse coverage.
pub fn check_layer(spec: &CriterionSpec, layer: &GridLayer) -> Vec<QualityWarning> {
    let mut warnings = Vec::new();

    if let Some(range) = spec.plausible_range {
        let mut count = 0usize;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (_, v) in layer.iter_valid() {
            if v.is_finite() && !range.contains(v) {
                count += 1;
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        if count > 0 {
            let unit = spec.unit.as_deref().map(|u| format!(" {u}")).unwrap_or_default();
            warnings.push(QualityWarning::new(
                &spec.name,
                format!(
                    "{} cells outside plausible range {}{} (observed {} to {})",
                    count, range, unit, lo, hi
                ),
            ));
        }
    }

    let coverage = layer.coverage();
    if coverage < LOW_COVERAGE_WARNING {
        warnings.push(QualityWarning::new(
            &spec.name,
            format!("only {:.1}% of cells are valid", coverage * 100.0),
        ));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Direction;

    #[test]
    fn test_clean_layer_has_no_warnings() {
        let spec = CriterionSpec::new("wind", Direction::HigherIsBetter).with_plausible_range(0.0, 50.0);
        let layer = GridLayer::new(3, 1, vec![4.0, 7.5, 12.0]).unwrap();
        assert!(check_layer(&spec, &layer).is_empty());
    }

    #[test]
    fn test_implausible_values_reported() {
        let mut spec =
            CriterionSpec::new("wind", Direction::HigherIsBetter).with_plausible_range(0.0, 50.0);
        spec.unit = Some("m/s".into());
        let layer = GridLayer::new(4, 1, vec![4.0, 75.0, -2.0, 12.0]).unwrap();
        let warnings = check_layer(&spec, &layer);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].criterion, "wind");
        assert!(warnings[0].message.starts_with("2 cells"));
        assert!(warnings[0].message.contains("m/s"));
        assert!(warnings[0].message.contains("-2 to 75"));
    }

    #[test]
    fn test_invalid_cells_ignored_for_plausibility() {
        let spec = CriterionSpec::new("slope", Direction::LowerIsBetter).with_plausible_range(0.0, 90.0);
        let layer =
            GridLayer::with_mask(3, 1, vec![5.0, 500.0, 10.0], vec![true, false, true]).unwrap();
        assert!(check_layer(&spec, &layer).is_empty());
    }

    #[test]
    fn test_low_coverage_reported() {
        let spec = CriterionSpec::new("grid_distance", Direction::LowerIsBetter);
        let layer =
            GridLayer::with_mask(4, 1, vec![1.0; 4], vec![true, false, false, false]).unwrap();
        let warnings = check_layer(&spec, &layer);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("25.0%"));
    }
}
