use crate::analysis::quality::QualityWarning;
use crate::analysis::sites::CandidateSite;
use crate::analysis::statistics::{LayerStats, WsiStatistics};
use crate::analysis::suitability::{ClassShare, SuitabilityLevel};
use crate::analysis::viability::ViabilityResult;
use crate::config::schema::{Direction, NormalizationMethod};
use crate::model::WsiGrid;
use ndarray::Array2;
use serde::Serialize;

/// How one criterion entered the composite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionSummary {
    /// Criterion name as configured.
    pub name: String,
    pub direction: Direction,
    pub method: NormalizationMethod,
    /// Weight applied in the overlay.
    pub weight: f64,
    /// Statistics of the raw input values.
    pub raw_stats: LayerStats,
}

/// Everything a single engine run produces.
///
/// The per-cell grids are not serialized; write them out separately with
/// the grid interchange format when needed.
#[derive(Debug, Clone, Serialize)]
pub struct WsiOutcome {
    /// Name of the configuration that was applied.
    pub config_name: String,
    /// Composite suitability grid.
    #[serde(skip_serializing)]
    pub wsi: WsiGrid,
    /// Per-cell suitability class, `None` where the WSI is invalid.
    #[serde(skip_serializing)]
    pub classes: Array2<Option<SuitabilityLevel>>,
    /// Cell counts per suitability class.
    pub class_breakdown: Vec<ClassShare>,
    pub viability: ViabilityResult,
    pub statistics: WsiStatistics,
    /// Threshold used for site extraction, if any cell qualified.
    pub effective_threshold: Option<f64>,
    /// Candidate sites, best first.
    pub sites: Vec<CandidateSite>,
    pub criteria: Vec<CriterionSummary>,
    /// Non-fatal data quality findings.
    pub warnings: Vec<QualityWarning>,
    /// Wall-clock duration of the run.
    pub processing_time_seconds: f64,
}

impl WsiOutcome {
    /// Class of the cell at `(row, col)`, if it has a valid WSI.
    pub fn class_at(&self, row: usize, col: usize) -> Option<SuitabilityLevel> {
        self.classes.get((row, col)).copied().flatten()
    }
}
