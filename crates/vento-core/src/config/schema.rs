use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which end of a criterion's value range is desirable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::HigherIsBetter => write!(f, "higher_is_better"),
            Direction::LowerIsBetter => write!(f, "lower_is_better"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    #[default]
    MinMax,
    ZScore,
    CustomRange,
}

impl fmt::Display for NormalizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationMethod::MinMax => write!(f, "min_max"),
            NormalizationMethod::ZScore => write!(f, "z_score"),
            NormalizationMethod::CustomRange => write!(f, "custom_range"),
        }
    }
}

/// A closed numeric interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// How one input raster is turned into a [0, 1] score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub direction: Direction,
    #[serde(default)]
    pub normalization_method: NormalizationMethod,
    /// Fixed scaling bounds. Required for `custom_range`, optional override
    /// for `min_max`, ignored by `z_score`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ValueRange>,
    /// Values outside this interval are reported as data-quality warnings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plausible_range: Option<ValueRange>,
    /// Unit for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl CriterionSpec {
    pub fn new(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            description: None,
            direction,
            normalization_method: NormalizationMethod::MinMax,
            range: None,
            plausible_range: None,
            unit: None,
        }
    }

    pub fn with_method(mut self, method: NormalizationMethod) -> Self {
        self.normalization_method = method;
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some(ValueRange::new(min, max));
        self
    }

    pub fn with_plausible_range(mut self, min: f64, max: f64) -> Self {
        self.plausible_range = Some(ValueRange::new(min, max));
        self
    }
}

/// Criterion name -> weight. Iteration order is sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightConfig(BTreeMap<String, f64>);

impl WeightConfig {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for WeightConfig {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

fn default_top_percentage() -> f64 {
    15.0
}

fn default_viability_threshold() -> f64 {
    0.5
}

/// Parameters for extracting candidate sites from the WSI grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSelection {
    /// Share of valid area, in percent, eligible for sites.
    #[serde(default = "default_top_percentage")]
    pub top_percentage: f64,
    /// Absolute WSI floor for site cells.
    #[serde(default)]
    pub min_wsi: f64,
    /// Smallest region area kept, in squared map units.
    #[serde(default)]
    pub min_area: f64,
    /// Keep at most this many ranked sites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sites: Option<usize>,
}

impl Default for SiteSelection {
    fn default() -> Self {
        Self {
            top_percentage: default_top_percentage(),
            min_wsi: 0.0,
            min_area: 0.0,
            max_sites: None,
        }
    }
}

/// A complete engine configuration: criteria, weights and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub criteria: Vec<CriterionSpec>,
    pub weights: WeightConfig,
    /// WSI value at or above which a cell counts as viable.
    #[serde(default = "default_viability_threshold")]
    pub viability_threshold: f64,
    #[serde(default)]
    pub selection: SiteSelection,
    /// Overrides the cell area derived from the grid transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_area: Option<f64>,
    /// Minimum fraction of valid cells each input layer must have.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_valid_coverage: Option<f64>,
}

impl EngineConfig {
    pub fn criterion(&self, name: &str) -> Option<&CriterionSpec> {
        self.criteria.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criterion_defaults_to_min_max() {
        let json = r#"{ "name": "wind", "direction": "higher_is_better" }"#;
        let spec: CriterionSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.normalization_method, NormalizationMethod::MinMax);
        assert!(spec.range.is_none());
    }

    #[test]
    fn test_weights_iterate_sorted() {
        let weights: WeightConfig = [("wind", 0.6), ("grid", 0.2), ("slope", 0.2)]
            .into_iter()
            .collect();
        let names: Vec<&str> = weights.names().collect();
        assert_eq!(names, vec!["grid", "slope", "wind"]);
        assert!((weights.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_selection_defaults() {
        let sel: SiteSelection = serde_json::from_str("{}").unwrap();
        assert_eq!(sel.top_percentage, 15.0);
        assert_eq!(sel.min_wsi, 0.0);
        assert!(sel.max_sites.is_none());
    }
}
