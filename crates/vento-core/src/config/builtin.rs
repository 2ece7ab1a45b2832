use crate::config::parse_config_str;
use crate::config::schema::EngineConfig;
use crate::error::VentoError;

const DEFAULT_JSON: &str = include_str!("../../../../presets/default.json");
const BALANCED_JSON: &str = include_str!("../../../../presets/balanced.json");

/// Available predefined configurations.
pub const PRESETS: &[&str] = &["default", "balanced"];

/// Load a predefined configuration by name.
pub fn load_preset(name: &str) -> Result<EngineConfig, VentoError> {
    match name {
        "default" => parse_config_str(DEFAULT_JSON),
        "balanced" => parse_config_str(BALANCED_JSON),
        _ => Err(VentoError::Config(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}
