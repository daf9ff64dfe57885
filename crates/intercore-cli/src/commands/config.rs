//! `intercore config`: print the effective core configuration.

use intercore_core::CoreConfig;

use super::print_json;

pub fn show(config: &CoreConfig) -> Result<(), String> {
    let value = serde_json::to_value(config).map_err(|e| e.to_string())?;
    print_json(&value);
    Ok(())
}
