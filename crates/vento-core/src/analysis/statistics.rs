use crate::model::{GridLayer, WsiGrid};
use serde::{Deserialize, Serialize};

/// Summary statistics over the valid cells of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl LayerStats {
    /// Single full pass over the valid cells (Welford accumulation).
    /// Returns `None` when the layer has no valid cells.
    pub fn collect(layer: &GridLayer) -> Option<Self> {
        let mut count = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut mean = 0.0;
        let mut m2 = 0.0;

        for (_, v) in layer.iter_valid() {
            count += 1;
            min = min.min(v);
            max = max.max(v);
            let delta = v - mean;
            mean += delta / count as f64;
            m2 += delta * (v - mean);
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            count,
            min,
            max,
            mean,
            std_dev: (m2 / count as f64).max(0.0).sqrt(),
        })
    }
}

/// Descriptive statistics of a computed WSI grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsiStatistics {
    pub total_cells: usize,
    pub valid_cells: usize,
    /// Share of cells without a WSI value, in percent.
    pub nodata_percentage: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl WsiStatistics {
    /// All moments are reported as 0 when no cell is valid.
    pub fn from_grid(wsi: &WsiGrid) -> Self {
        let total_cells = wsi.len();
        let stats = LayerStats::collect(wsi.as_layer());
        let valid_cells = stats.map(|s| s.count).unwrap_or(0);
        let nodata_percentage = if total_cells == 0 {
            0.0
        } else {
            (total_cells - valid_cells) as f64 / total_cells as f64 * 100.0
        };

        match stats {
            Some(s) => Self {
                total_cells,
                valid_cells,
                nodata_percentage,
                mean: s.mean,
                std_dev: s.std_dev,
                min: s.min,
                max: s.max,
            },
            None => Self {
                total_cells,
                valid_cells,
                nodata_percentage,
                mean: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_collect_matches_population_moments() {
        let layer = GridLayer::new(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let s = LayerStats::collect(&layer).unwrap();
        assert_eq!(s.count, 5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 5.0);
        assert_abs_diff_eq!(s.mean, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.std_dev, 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_collect_skips_invalid_cells() {
        let layer = GridLayer::with_mask(3, 1, vec![1.0, 1000.0, 3.0], vec![true, false, true])
            .unwrap();
        let s = LayerStats::collect(&layer).unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.max, 3.0);
    }

    #[test]
    fn test_collect_empty_is_none() {
        let layer = GridLayer::with_mask(2, 1, vec![1.0, 2.0], vec![false, false]).unwrap();
        assert!(LayerStats::collect(&layer).is_none());
    }

    #[test]
    fn test_wsi_statistics_without_valid_cells() {
        let layer = GridLayer::with_mask(2, 2, vec![0.0; 4], vec![false; 4]).unwrap();
        let stats = WsiStatistics::from_grid(&WsiGrid::from_layer(layer));
        assert_eq!(stats.valid_cells, 0);
        assert_eq!(stats.nodata_percentage, 100.0);
        assert_eq!(stats.mean, 0.0);
    }

    #[test]
    fn test_wsi_statistics_nodata_share() {
        let layer = GridLayer::with_mask(
            4,
            1,
            vec![0.2, 0.4, 0.0, 0.6],
            vec![true, true, false, true],
        )
        .unwrap();
        let stats = WsiStatistics::from_grid(&WsiGrid::from_layer(layer));
        assert_eq!(stats.total_cells, 4);
        assert_eq!(stats.valid_cells, 3);
        assert_eq!(stats.nodata_percentage, 25.0);
        assert_abs_diff_eq!(stats.mean, 0.4, epsilon = 1e-12);
        assert_eq!(stats.min, 0.2);
        assert_eq!(stats.max, 0.6);
    }
}
