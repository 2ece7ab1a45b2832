use crate::model::WsiGrid;
use serde::{Deserialize, Serialize};

/// Share of valid area meeting the viability threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViabilityResult {
    pub threshold: f64,
    pub suitable_cell_count: usize,
    pub total_valid_cell_count: usize,
    /// 100 * suitable / total, or 0 when there are no valid cells.
    pub viability_percentage: f64,
    /// Area of suitable cells, in squared map units.
    pub suitable_area: f64,
    /// Area of all valid cells, in squared map units.
    pub total_area: f64,
}

impl ViabilityResult {
    /// Recompute the area figures for a different cell area.
    pub fn with_cell_area(mut self, cell_area: f64) -> Self {
        self.suitable_area = self.suitable_cell_count as f64 * cell_area;
        self.total_area = self.total_valid_cell_count as f64 * cell_area;
        self
    }
}

/// Count valid cells with `WSI >= threshold`.
pub fn assess(wsi: &WsiGrid, threshold: f64) -> ViabilityResult {
    let mut suitable = 0usize;
    let mut total = 0usize;
    for (_, v) in wsi.iter_valid() {
        total += 1;
        if v >= threshold {
            suitable += 1;
        }
    }

    let viability_percentage = if total == 0 {
        0.0
    } else {
        suitable as f64 / total as f64 * 100.0
    };

    ViabilityResult {
        threshold,
        suitable_cell_count: suitable,
        total_valid_cell_count: total,
        viability_percentage,
        suitable_area: 0.0,
        total_area: 0.0,
    }
    .with_cell_area(wsi.cell_area())
}
