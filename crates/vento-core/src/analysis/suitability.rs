use crate::model::WsiGrid;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal suitability bands over the WSI range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuitabilityLevel {
    Poor,
    Fair,
    Good,
    High,
    Excellent,
}

impl SuitabilityLevel {
    pub const ALL: [SuitabilityLevel; 5] = [
        SuitabilityLevel::Poor,
        SuitabilityLevel::Fair,
        SuitabilityLevel::Good,
        SuitabilityLevel::High,
        SuitabilityLevel::Excellent,
    ];

    /// Map a WSI value to its band. Band edges belong to the higher band.
    pub fn classify(wsi: f64) -> Self {
        if wsi >= 0.8 {
            SuitabilityLevel::Excellent
        } else if wsi >= 0.6 {
            SuitabilityLevel::High
        } else if wsi >= 0.4 {
            SuitabilityLevel::Good
        } else if wsi >= 0.2 {
            SuitabilityLevel::Fair
        } else {
            SuitabilityLevel::Poor
        }
    }

    /// Lower (inclusive) and upper bound of the band. Only the top band
    /// includes its upper bound.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            SuitabilityLevel::Poor => (0.0, 0.2),
            SuitabilityLevel::Fair => (0.2, 0.4),
            SuitabilityLevel::Good => (0.4, 0.6),
            SuitabilityLevel::High => (0.6, 0.8),
            SuitabilityLevel::Excellent => (0.8, 1.0),
        }
    }
}

impl fmt::Display for SuitabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuitabilityLevel::Poor => write!(f, "Poor"),
            SuitabilityLevel::Fair => write!(f, "Fair"),
            SuitabilityLevel::Good => write!(f, "Good"),
            SuitabilityLevel::High => write!(f, "High"),
            SuitabilityLevel::Excellent => write!(f, "Excellent"),
        }
    }
}

/// Classify a single WSI value.
pub fn classify(wsi: f64) -> SuitabilityLevel {
    SuitabilityLevel::classify(wsi)
}

/// Per-cell classification, `None` for invalid cells.
pub fn classify_grid(wsi: &WsiGrid) -> Array2<Option<SuitabilityLevel>> {
    Zip::from(wsi.values())
        .and(wsi.valid_mask())
        .map_collect(|&v, &ok| ok.then(|| SuitabilityLevel::classify(v)))
}

/// Cell count of one band and its share of classified cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassShare {
    pub level: SuitabilityLevel,
    pub cell_count: usize,
    pub percentage: f64,
}

/// One entry per band, from Poor to Excellent.
pub fn class_breakdown(classes: &Array2<Option<SuitabilityLevel>>) -> Vec<ClassShare> {
    let mut counts = [0usize; 5];
    for level in classes.iter().flatten() {
        counts[*level as usize] += 1;
    }
    let total: usize = counts.iter().sum();

    SuitabilityLevel::ALL
        .iter()
        .zip(counts)
        .map(|(level, cell_count)| ClassShare {
            level: *level,
            cell_count,
            percentage: if total == 0 {
                0.0
            } else {
                cell_count as f64 / total as f64 * 100.0
            },
        })
        .collect()
}
