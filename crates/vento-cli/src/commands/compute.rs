use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use vento_core::config::builtin;
use vento_core::config::schema::EngineConfig;
use vento_core::error::VentoError;
use vento_core::model::GridLayer;

use crate::output;

pub fn run(
    layer_args: Vec<String>,
    config_file: Option<PathBuf>,
    preset: Option<String>,
    output_format: &str,
    wsi_out: Option<PathBuf>,
    max_table_sites: usize,
) -> Result<(), VentoError> {
    let config: EngineConfig = match (config_file, preset) {
        (Some(path), _) => vento_core::config::load_config(&path)?,
        (None, Some(name)) => builtin::load_preset(&name)?,
        (None, None) => builtin::load_preset("default")?,
    };

    let mut layers = BTreeMap::new();
    for arg in &layer_args {
        let (name, path) = parse_layer_arg(arg)?;
        if layers.contains_key(name) {
            return Err(VentoError::Config(format!(
                "layer '{}' given more than once",
                name
            )));
        }
        let layer = load_layer(Path::new(path))?;
        tracing::debug!(
            criterion = name,
            width = layer.width(),
            height = layer.height(),
            "loaded layer"
        );
        layers.insert(name.to_string(), layer);
    }

    let outcome = vento_core::compute_wsi(&layers, &config)?;

    if let Some(path) = wsi_out {
        let json = serde_json::to_string(&outcome.wsi)?;
        std::fs::write(&path, json)?;
        tracing::info!(path = %path.display(), "wrote WSI grid");
    }

    match output_format {
        "json" => output::json::print(&outcome)?,
        _ => output::table::print(&outcome, max_table_sites),
    }

    Ok(())
}

fn parse_layer_arg(arg: &str) -> Result<(&str, &str), VentoError> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name, path)),
        _ => Err(VentoError::Config(format!(
            "expected --layer NAME=FILE, got '{}'",
            arg
        ))),
    }
}

fn load_layer(path: &Path) -> Result<GridLayer, VentoError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| VentoError::InvalidGrid(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layer_arg() {
        assert_eq!(
            parse_layer_arg("wind=data/wind.json").unwrap(),
            ("wind", "data/wind.json")
        );
        assert!(parse_layer_arg("wind").is_err());
        assert!(parse_layer_arg("=wind.json").is_err());
        assert!(parse_layer_arg("wind=").is_err());
    }
}
