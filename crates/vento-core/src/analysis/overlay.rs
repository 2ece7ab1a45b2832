use crate::config::schema::WeightConfig;
use crate::config::validate_weights;
use crate::error::VentoError;
use crate::model::{GridLayer, WsiGrid};
use ndarray::{Array2, Zip};
use std::collections::BTreeMap;

/// Combine normalized layers into the composite WSI grid.
///
/// A cell is valid only when it is valid in every layer. Terms are summed in
/// name order so repeated runs produce bit-identical output.
pub fn combine(
    normalized: &BTreeMap<String, GridLayer>,
    weights: &WeightConfig,
) -> Result<WsiGrid, VentoError> {
    let (ref_name, reference) = normalized
        .iter()
        .next()
        .ok_or_else(|| VentoError::Config("no layers to combine".into()))?;

    validate_weights(weights, normalized.keys().map(|k| k.as_str()))?;

    for (name, layer) in normalized {
        if let Some(reason) = reference.alignment_issue(layer) {
            return Err(VentoError::Misaligned {
                criterion: name.clone(),
                reference: ref_name.clone(),
                reason,
            });
        }
        if let Some(((row, col), v)) = layer
            .iter_valid()
            .find(|(_, v)| !(0.0..=1.0).contains(v))
        {
            return Err(VentoError::data(
                name,
                format!(
                    "cell ({}, {}) holds {} which is not a normalized score",
                    row, col, v
                ),
            ));
        }
    }

    let dim = reference.values().raw_dim();
    let mut values = Array2::<f64>::zeros(dim);
    let mut valid = Array2::from_elem(dim, true);

    for (name, layer) in normalized {
        let weight = weights
            .get(name)
            .ok_or_else(|| VentoError::Config(format!("criterion '{}' has no weight", name)))?;
        Zip::from(&mut values)
            .and(&mut valid)
            .and(layer.values())
            .and(layer.valid_mask())
            .for_each(|acc, ok, &score, &layer_ok| {
                if layer_ok {
                    *acc += weight * score;
                } else {
                    *ok = false;
                }
            });
    }

    // Rounding in the sum can overshoot the unit interval by an ulp.
    Zip::from(&mut values).and(&valid).for_each(|v, &ok| {
        *v = if ok { v.clamp(0.0, 1.0) } else { 0.0 };
    });

    Ok(WsiGrid::from_layer(reference.derive(values, valid)))
}
