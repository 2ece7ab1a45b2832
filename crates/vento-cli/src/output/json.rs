use vento_core::analysis::WsiOutcome;
use vento_core::error::VentoError;

pub fn print(outcome: &WsiOutcome) -> Result<(), VentoError> {
    let json = serde_json::to_string_pretty(outcome)?;
    println!("{json}");
    Ok(())
}
