pub mod builtin;
pub mod schema;

use crate::error::VentoError;
use schema::{CriterionSpec, EngineConfig, NormalizationMethod, SiteSelection, ValueRange, WeightConfig};
use std::collections::BTreeSet;
use std::path::Path;

/// Weights may deviate from a total of 1.0 by at most this much.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Load an engine configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<EngineConfig, VentoError> {
    let content = std::fs::read_to_string(path).map_err(|e| VentoError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse an engine configuration from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<EngineConfig, VentoError> {
    let config: EngineConfig = serde_json::from_str(json).map_err(|e| VentoError::ConfigLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse an engine configuration from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<EngineConfig, VentoError> {
    let config: EngineConfig = serde_json::from_str(json)
        .map_err(|e| VentoError::Config(format!("malformed configuration: {e}")))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate a whole configuration. Nothing is computed unless every field
/// passes.
pub fn validate_config(config: &EngineConfig) -> Result<(), VentoError> {
    if config.criteria.is_empty() {
        return Err(VentoError::Config("criteria must not be empty".into()));
    }

    let mut seen = BTreeSet::new();
    for criterion in &config.criteria {
        validate_criterion(criterion)?;
        if !seen.insert(criterion.name.as_str()) {
            return Err(VentoError::Config(format!(
                "criterion '{}' is defined more than once",
                criterion.name
            )));
        }
    }

    validate_weights(&config.weights, seen.iter().copied())?;

    if !(0.0..=1.0).contains(&config.viability_threshold) {
        return Err(VentoError::Config(format!(
            "viability_threshold must be within [0, 1], got {}",
            config.viability_threshold
        )));
    }

    validate_selection(&config.selection)?;

    if let Some(area) = config.cell_area {
        if !area.is_finite() || area <= 0.0 {
            return Err(VentoError::Config(format!(
                "cell_area must be a positive number, got {}",
                area
            )));
        }
    }

    if let Some(coverage) = config.min_valid_coverage {
        if !(0.0..=1.0).contains(&coverage) {
            return Err(VentoError::Config(format!(
                "min_valid_coverage must be within [0, 1], got {}",
                coverage
            )));
        }
    }

    Ok(())
}

fn validate_criterion(criterion: &CriterionSpec) -> Result<(), VentoError> {
    if criterion.name.trim().is_empty() {
        return Err(VentoError::Config("criterion name must not be empty".into()));
    }

    if criterion.normalization_method == NormalizationMethod::CustomRange
        && criterion.range.is_none()
    {
        return Err(VentoError::Config(format!(
            "criterion '{}' uses custom_range but has no range bounds",
            criterion.name
        )));
    }

    if let Some(range) = &criterion.range {
        validate_range(&criterion.name, "range", range)?;
    }
    if let Some(range) = &criterion.plausible_range {
        validate_range(&criterion.name, "plausible_range", range)?;
    }

    Ok(())
}

fn validate_range(criterion: &str, field: &str, range: &ValueRange) -> Result<(), VentoError> {
    if !range.min.is_finite() || !range.max.is_finite() {
        return Err(VentoError::Config(format!(
            "criterion '{}' has a non-finite {} {}",
            criterion, field, range
        )));
    }
    if range.min > range.max {
        return Err(VentoError::Config(format!(
            "criterion '{}' has {} with min > max {}",
            criterion, field, range
        )));
    }
    Ok(())
}

/// Check that `weights` covers exactly `criteria`, with finite non-negative
/// values summing to 1.
pub fn validate_weights<'a>(
    weights: &WeightConfig,
    criteria: impl IntoIterator<Item = &'a str>,
) -> Result<(), VentoError> {
    for (name, w) in weights.iter() {
        if !w.is_finite() || w < 0.0 {
            return Err(VentoError::Config(format!(
                "weight for '{}' must be a non-negative number, got {}",
                name, w
            )));
        }
    }

    let expected: BTreeSet<&str> = criteria.into_iter().collect();
    let given: BTreeSet<&str> = weights.names().collect();

    if let Some(missing) = expected.difference(&given).next() {
        return Err(VentoError::Config(format!(
            "criterion '{}' has no weight",
            missing
        )));
    }
    if let Some(extra) = given.difference(&expected).next() {
        return Err(VentoError::Config(format!(
            "weight given for unknown criterion '{}'",
            extra
        )));
    }

    let total = weights.total();
    if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(VentoError::Config(format!(
            "weights must sum to 1.0, got {}",
            total
        )));
    }

    Ok(())
}

/// Check site-selection parameters. A `top_percentage` of exactly 0 is legal
/// and selects nothing.
pub fn validate_selection(selection: &SiteSelection) -> Result<(), VentoError> {
    if !(0.0..=100.0).contains(&selection.top_percentage) {
        return Err(VentoError::Config(format!(
            "top_percentage must be within [0, 100], got {}",
            selection.top_percentage
        )));
    }
    if !(0.0..=1.0).contains(&selection.min_wsi) {
        return Err(VentoError::Config(format!(
            "min_wsi must be within [0, 1], got {}",
            selection.min_wsi
        )));
    }
    if !selection.min_area.is_finite() || selection.min_area < 0.0 {
        return Err(VentoError::Config(format!(
            "min_area must be a non-negative number, got {}",
            selection.min_area
        )));
    }
    if selection.max_sites == Some(0) {
        return Err(VentoError::Config("max_sites must be at least 1".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    const VALID: &str = r#"{
        "name": "Test",
        "version": "1.0",
        "criteria": [
            { "name": "wind", "direction": "higher_is_better" },
            { "name": "slope", "direction": "lower_is_better", "normalization_method": "z_score" }
        ],
        "weights": { "wind": 0.7, "slope": 0.3 }
    }"#;

    fn with(field: &str, value: &str) -> String {
        let mut doc: serde_json::Value = serde_json::from_str(VALID).unwrap();
        doc[field] = serde_json::from_str(value).unwrap();
        doc.to_string()
    }

    #[test]
    fn test_parse_valid_config() {
        let config = parse_config_str(VALID).unwrap();
        assert_eq!(config.name, "Test");
        assert_eq!(config.criteria.len(), 2);
        assert_eq!(config.viability_threshold, 0.5);
        assert_eq!(config.selection.top_percentage, 15.0);
        assert_eq!(
            config.criterion("slope").unwrap().normalization_method,
            NormalizationMethod::ZScore
        );
    }

    #[test]
    fn test_weights_not_summing_to_one_rejected() {
        let json = with("weights", r#"{ "wind": 0.6, "slope": 0.3 }"#);
        let err = parse_config_str(&json).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_weights_within_tolerance_accepted() {
        let json = with("weights", r#"{ "wind": 0.7000001, "slope": 0.3 }"#);
        assert!(parse_config_str(&json).is_ok());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let json = with("weights", r#"{ "wind": 1.2, "slope": -0.2 }"#);
        let err = parse_config_str(&json).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_missing_weight_rejected() {
        let json = with("weights", r#"{ "wind": 1.0 }"#);
        let err = parse_config_str(&json).unwrap_err();
        assert!(err.to_string().contains("'slope' has no weight"));
    }

    #[test]
    fn test_extra_weight_rejected() {
        let json = with("weights", r#"{ "wind": 0.5, "slope": 0.3, "roads": 0.2 }"#);
        let err = parse_config_str(&json).unwrap_err();
        assert!(err.to_string().contains("unknown criterion 'roads'"));
    }

    #[test]
    fn test_unknown_method_rejected() {
        let json = with(
            "criteria",
            r#"[
                { "name": "wind", "direction": "higher_is_better", "normalization_method": "log" },
                { "name": "slope", "direction": "lower_is_better" }
            ]"#,
        );
        let err = parse_config_str(&json).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_custom_range_without_bounds_rejected() {
        let json = with(
            "criteria",
            r#"[
                { "name": "wind", "direction": "higher_is_better", "normalization_method": "custom_range" },
                { "name": "slope", "direction": "lower_is_better" }
            ]"#,
        );
        let err = parse_config_str(&json).unwrap_err();
        assert!(err.to_string().contains("custom_range"));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let json = with(
            "criteria",
            r#"[
                { "name": "wind", "direction": "higher_is_better", "range": { "min": 10, "max": 2 } },
                { "name": "slope", "direction": "lower_is_better" }
            ]"#,
        );
        assert!(parse_config_str(&json).is_err());
    }

    #[test]
    fn test_duplicate_criterion_rejected() {
        let json = with(
            "criteria",
            r#"[
                { "name": "wind", "direction": "higher_is_better" },
                { "name": "wind", "direction": "lower_is_better" }
            ]"#,
        );
        let err = parse_config_str(&json).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_top_percentage_bounds() {
        for bad in ["-5", "100.5"] {
            let json = with("selection", &format!(r#"{{ "top_percentage": {bad} }}"#));
            let err = parse_config_str(&json).unwrap_err();
            assert!(err.to_string().contains("top_percentage"), "{bad}");
        }
        for ok in ["0", "100", "15"] {
            let json = with("selection", &format!(r#"{{ "top_percentage": {ok} }}"#));
            assert!(parse_config_str(&json).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_viability_threshold_out_of_range_rejected() {
        let json = with("viability_threshold", "1.5");
        assert!(parse_config_str(&json).is_err());
    }

    #[test]
    fn test_non_positive_cell_area_rejected() {
        let json = with("cell_area", "0");
        assert!(parse_config_str(&json).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, VALID).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.weights.len(), 2);
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, VentoError::ConfigLoad { .. }));
    }
}
