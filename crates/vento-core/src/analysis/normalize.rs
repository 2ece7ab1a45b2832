use crate::analysis::statistics::LayerStats;
use crate::config::schema::{CriterionSpec, Direction, NormalizationMethod};
use crate::error::VentoError;
use crate::model::GridLayer;
use ndarray::Array2;

/// Score assigned to every valid cell of a criterion without spread.
pub const DEGENERATE_SCORE: f64 = 0.5;

/// Per-cell mapping derived from the first statistics pass.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scale {
    /// No spread to scale over; every cell gets [`DEGENERATE_SCORE`].
    Constant,
    Linear {
        lo: f64,
        hi: f64,
        direction: Direction,
    },
    ZScore {
        mean: f64,
        std_dev: f64,
        sign: f64,
        z_lo: f64,
        z_hi: f64,
    },
}

impl Scale {
    fn linear(lo: f64, hi: f64, direction: Direction) -> Self {
        if hi == lo {
            Scale::Constant
        } else {
            Scale::Linear { lo, hi, direction }
        }
    }

    fn z_score(stats: &LayerStats, direction: Direction) -> Self {
        if stats.std_dev == 0.0 {
            return Scale::Constant;
        }
        let sign = match direction {
            Direction::HigherIsBetter => 1.0,
            Direction::LowerIsBetter => -1.0,
        };
        let z = |v: f64| sign * ((v - stats.mean) / stats.std_dev);
        let (a, b) = (z(stats.min), z(stats.max));
        let (z_lo, z_hi) = if a <= b { (a, b) } else { (b, a) };
        if z_hi == z_lo {
            return Scale::Constant;
        }
        Scale::ZScore {
            mean: stats.mean,
            std_dev: stats.std_dev,
            sign,
            z_lo,
            z_hi,
        }
    }

    fn apply(&self, v: f64) -> f64 {
        let raw = match *self {
            Scale::Constant => DEGENERATE_SCORE,
            Scale::Linear { lo, hi, direction } => match direction {
                Direction::HigherIsBetter => (v - lo) / (hi - lo),
                Direction::LowerIsBetter => (hi - v) / (hi - lo),
            },
            Scale::ZScore {
                mean,
                std_dev,
                sign,
                z_lo,
                z_hi,
            } => {
                let z = sign * ((v - mean) / std_dev);
                (z - z_lo) / (z_hi - z_lo)
            }
        };
        raw.clamp(0.0, 1.0)
    }
}

/// Rescale a criterion layer onto [0, 1] according to its spec.
///
/// Two passes: statistics over all valid cells first, then the per-cell
/// formula. Invalid cells stay invalid.
pub fn normalize(layer: &GridLayer, spec: &CriterionSpec) -> Result<GridLayer, VentoError> {
    ensure_finite(layer, &spec.name)?;

    let stats = LayerStats::collect(layer)
        .ok_or_else(|| VentoError::data(&spec.name, "layer has no valid cells"))?;

    let scale = match spec.normalization_method {
        NormalizationMethod::MinMax => match spec.range {
            Some(range) => Scale::linear(range.min, range.max, spec.direction),
            None => Scale::linear(stats.min, stats.max, spec.direction),
        },
        NormalizationMethod::CustomRange => {
            let range = spec.range.ok_or_else(|| {
                VentoError::Config(format!(
                    "criterion '{}' uses custom_range but has no range bounds",
                    spec.name
                ))
            })?;
            Scale::linear(range.min, range.max, spec.direction)
        }
        NormalizationMethod::ZScore => Scale::z_score(&stats, spec.direction),
    };

    let mut values = Array2::zeros(layer.values().raw_dim());
    for ((row, col), v) in layer.iter_valid() {
        let score = scale.apply(v);
        if score.is_nan() {
            return Err(VentoError::compute(
                &spec.name,
                format!("value {} at cell ({}, {}) scaled to NaN", v, row, col),
            ));
        }
        values[[row, col]] = score;
    }

    Ok(layer.derive(values, layer.valid_mask().clone()))
}

/// Reject layers that hold NaN or infinite values in cells marked valid.
pub fn ensure_finite(layer: &GridLayer, criterion: &str) -> Result<(), VentoError> {
    if let Some(((row, col), v)) = layer.iter_valid().find(|(_, v)| !v.is_finite()) {
        return Err(VentoError::compute(
            criterion,
            format!(
                "cell ({}, {}) is marked valid but holds {}; mask it or replace it",
                row, col, v
            ),
        ));
    }
    Ok(())
}
