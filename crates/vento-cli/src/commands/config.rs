use std::path::Path;
use vento_core::analysis::SuitabilityLevel;
use vento_core::config::builtin;
use vento_core::config::schema::{EngineConfig, NormalizationMethod};
use vento_core::error::VentoError;

pub fn list() -> Result<(), VentoError> {
    println!("Available predefined configurations:\n");
    for name in builtin::PRESETS {
        let config = builtin::load_preset(name)?;
        println!("  {:<10} {} (v{})", name, config.name, config.version);
        if let Some(ref desc) = config.description {
            println!("             {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn explain(preset: &str) -> Result<(), VentoError> {
    let config = builtin::load_preset(preset)?;
    print_explanation(&config);
    Ok(())
}

fn print_explanation(config: &EngineConfig) {
    println!("{} (version {})\n", config.name, config.version);

    if let Some(ref desc) = config.description {
        println!("{}\n", desc);
    }

    println!(
        "Each cell's suitability is the weighted sum of {} normalized criteria:\n",
        config.criteria.len()
    );

    let max_name_len = config
        .criteria
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(10)
        .max("Criterion".len());

    println!(
        "  {:<width$}  {:<8}  {:<18}  {:<12}  Unit",
        "Criterion",
        "Weight",
        "Direction",
        "Scaling",
        width = max_name_len
    );
    println!("  {}", "-".repeat(max_name_len + 50));
    for c in &config.criteria {
        let weight = config.weights.get(&c.name).unwrap_or(0.0);
        let scaling = match (c.normalization_method, c.range) {
            (NormalizationMethod::ZScore, _) => "z-score".to_string(),
            (_, Some(r)) => r.to_string(),
            (_, None) => "observed".to_string(),
        };
        println!(
            "  {:<width$}  {:<8.2}  {:<18}  {:<12}  {}",
            c.name,
            weight,
            c.direction.to_string(),
            scaling,
            c.unit.as_deref().unwrap_or("-"),
            width = max_name_len
        );
    }
    println!();

    println!("Suitability classes:\n");
    for level in SuitabilityLevel::ALL {
        let (lo, hi) = level.bounds();
        let upper = if level == SuitabilityLevel::Excellent {
            "]"
        } else {
            ")"
        };
        println!("  {:<10} [{:.1}, {:.1}{}", level.to_string(), lo, hi, upper);
    }
    println!();

    let sel = &config.selection;
    println!(
        "Cells with WSI >= {} count as viable.",
        config.viability_threshold
    );
    println!(
        "Candidate sites are 4-connected regions in the top {}% of valid cells",
        sel.top_percentage
    );
    print!("with WSI >= {}", sel.min_wsi);
    if sel.min_area > 0.0 {
        print!(" and an area of at least {}", sel.min_area);
    }
    println!(", ranked by mean WSI.");
    if let Some(max) = sel.max_sites {
        println!("At most {} sites are reported.", max);
    }
    println!();
}

pub fn schema() -> Result<(), VentoError> {
    print!(
        r#"JSON Configuration Schema
=========================

A configuration file describes which criterion grids go into the wind
suitability index, how each one is scaled to [0, 1], and how the result is
turned into candidate sites. Run it with `vento compute -c FILE`.

Top-level fields:

  name                (string, required)  Human-readable name
  description         (string, optional)  What this configuration is for
  version             (string, required)  Version identifier (e.g., "2025.1")
  criteria            (array, required)   Criterion definitions (see below)
  weights             (object, required)  Map of criterion name -> weight.
                                          Every criterion needs a weight,
                                          weights must be >= 0 and sum to 1.
  viability_threshold (number, optional)  WSI at or above which a cell is
                                          viable. Default: 0.5
  selection           (object, optional)  Candidate site rules (see below)
  cell_area           (number, optional)  Area of one cell. Default: taken
                                          from the grid transform.
  min_valid_coverage  (number, optional)  Fraction of valid cells each input
                                          grid must have, in [0, 1].

Each entry in "criteria":

  name                  (string, required)  Must match a --layer NAME
  description           (string, optional)
  direction             (string, required)  "higher_is_better" or
                                            "lower_is_better"
  normalization_method  (string, optional)  "min_max" (default), "z_score"
                                            or "custom_range"
  range                 (object, optional)  {{ "min": .., "max": .. }}.
                                            Required for custom_range; for
                                            min_max it replaces the observed
                                            range. Values outside are clamped.
  plausible_range       (object, optional)  Values outside produce warnings
  unit                  (string, optional)  Unit for display

"selection":

  top_percentage  (number, optional)  Share of valid cells, 0-100, eligible
                                      for sites. Default: 15
  min_wsi         (number, optional)  WSI floor for site cells. Default: 0
  min_area        (number, optional)  Smallest site area kept. Default: 0
  max_sites       (number, optional)  Keep at most this many sites

Example:

{{
  "name": "Coastal ridge study",
  "version": "1.0",
  "criteria": [
    {{
      "name": "wind",
      "direction": "higher_is_better",
      "plausible_range": {{ "min": 0, "max": 50 }},
      "unit": "m/s"
    }},
    {{
      "name": "slope",
      "direction": "lower_is_better",
      "normalization_method": "custom_range",
      "range": {{ "min": 0, "max": 25 }},
      "unit": "degrees"
    }}
  ],
  "weights": {{ "wind": 0.7, "slope": 0.3 }},
  "selection": {{ "top_percentage": 10, "min_wsi": 0.6, "min_area": 250000 }}
}}
"#
    );
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), VentoError> {
    let config = vento_core::config::load_config(file)?;

    println!(
        "Configuration '{}' (v{}) is valid.",
        config.name, config.version
    );
    println!(
        "  Criteria: {}",
        config
            .criteria
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Things that are legal but probably unintended
    let mut warnings = Vec::new();
    for c in &config.criteria {
        if config.weights.get(&c.name) == Some(0.0) {
            warnings.push(format!("criterion '{}' has weight 0", c.name));
        }
        if c.normalization_method == NormalizationMethod::ZScore && c.range.is_some() {
            warnings.push(format!(
                "criterion '{}' uses z_score; its range is ignored",
                c.name
            ));
        }
    }
    if config.selection.top_percentage == 0.0 {
        warnings.push("top_percentage is 0; no sites will be selected".to_string());
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
