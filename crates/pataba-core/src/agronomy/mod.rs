pub mod builtin;
pub mod schema;

use crate::error::PatabaError;
use crate::model::{Nutrient, Rating, Season, SoilClass, Variety};
use rust_decimal::Decimal;
use schema::{AgronomyConfig, StageSplit};
use std::path::Path;

/// Load an agronomy config from a JSON file.
pub fn load_config(path: &Path) -> Result<AgronomyConfig, PatabaError> {
    let content = std::fs::read_to_string(path).map_err(|e| PatabaError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse an agronomy config from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<AgronomyConfig, PatabaError> {
    let config: AgronomyConfig = serde_json::from_str(json).map_err(|e| PatabaError::ConfigLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse an agronomy config from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<AgronomyConfig, PatabaError> {
    let config: AgronomyConfig = serde_json::from_str(json).map_err(PatabaError::Json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a config is complete and internally consistent.
///
/// The target table must cover every reachable key so that lookups never
/// need a fallback.
pub fn validate_config(config: &AgronomyConfig) -> Result<(), PatabaError> {
    for nutrient in Nutrient::ALL {
        let bp = config.breakpoints.get(&nutrient).ok_or_else(|| {
            PatabaError::ConfigInvalid(format!("missing breakpoints for {nutrient}"))
        })?;
        if bp.low.is_sign_negative() || bp.low >= bp.mid {
            return Err(PatabaError::ConfigInvalid(format!(
                "breakpoints for {nutrient} must satisfy 0 <= low < mid (got low={}, mid={})",
                bp.low, bp.mid
            )));
        }
    }

    for variety in Variety::ALL {
        for soil in SoilClass::ALL {
            for season in Season::ALL {
                let cell = config
                    .targets
                    .get(&variety)
                    .and_then(|by_soil| by_soil.get(&soil))
                    .and_then(|by_season| by_season.get(&season))
                    .ok_or_else(|| {
                        PatabaError::ConfigInvalid(format!(
                            "target table has no entry for {variety}/{soil}/{season}"
                        ))
                    })?;
                for nutrient in Nutrient::ALL {
                    for rating in Rating::LEVELS {
                        let kg = cell
                            .get(&nutrient)
                            .and_then(|by_rating| by_rating.get(&rating))
                            .ok_or_else(|| {
                                PatabaError::ConfigInvalid(format!(
                                    "target table has no {} value for {variety}/{soil}/{season} rating {rating}",
                                    nutrient.symbol()
                                ))
                            })?;
                        if kg.is_sign_negative() {
                            return Err(PatabaError::ConfigInvalid(format!(
                                "negative target {kg} for {variety}/{soil}/{season} {} {rating}",
                                nutrient.symbol()
                            )));
                        }
                    }
                }
            }
        }
    }

    validate_split("balanced", &config.stage_splits.balanced)?;
    validate_split("n_only", &config.stage_splits.n_only)?;
    validate_split("k_only", &config.stage_splits.k_only)?;

    if config.defaults.area_ha <= Decimal::ZERO {
        return Err(PatabaError::ConfigInvalid(format!(
            "default area must be positive (got {})",
            config.defaults.area_ha
        )));
    }

    let bands = &config.ph_bands;
    if bands.strongly_acidic_below > bands.acidic_below || bands.acidic_below >= bands.alkaline_above
    {
        return Err(PatabaError::ConfigInvalid(
            "pH bands must satisfy strongly_acidic_below <= acidic_below < alkaline_above".into(),
        ));
    }

    Ok(())
}

fn validate_split(role: &str, split: &StageSplit) -> Result<(), PatabaError> {
    if split.is_empty() {
        return Err(PatabaError::ConfigInvalid(format!(
            "stage split '{role}' must name at least one stage"
        )));
    }
    if let Some((stage, fraction)) = split.iter().find(|(_, f)| f.is_sign_negative()) {
        return Err(PatabaError::ConfigInvalid(format!(
            "stage split '{role}' has negative fraction {fraction} at {stage}"
        )));
    }
    let sum: Decimal = split.values().sum();
    if sum != Decimal::ONE {
        return Err(PatabaError::ConfigInvalid(format!(
            "stage split '{role}' fractions must sum to 1 (got {sum})"
        )));
    }
    Ok(())
}
