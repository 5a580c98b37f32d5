use crate::agronomy::schema::AgronomyConfig;
use crate::error::PatabaError;

pub(crate) const DEFAULT_JSON: &str = include_str!("../../../../agronomy/default.json");

/// Available predefined agronomy configs.
pub const PRESETS: &[&str] = &["default"];

/// Load a predefined agronomy config by name.
pub fn load_preset(name: &str) -> Result<AgronomyConfig, PatabaError> {
    match name {
        "default" => super::parse_config_str(DEFAULT_JSON),
        _ => Err(PatabaError::ConfigInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Nutrient;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_default_preset() {
        let config = load_preset("default").unwrap();
        let n = config.breakpoints[&Nutrient::Nitrogen];
        assert_eq!(n.low, dec!(110));
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load_preset("xyz").is_err());
    }
}
