use pataba_core::agronomy::schema::{Breakpoints, StageSplit};
use pataba_core::agronomy::{self, builtin};
use pataba_core::error::PatabaError;
use pataba_core::model::{Nutrient, Rating, Season, SoilClass, Variety};
use std::path::Path;

pub fn list() -> Result<(), PatabaError> {
    println!("Available agronomy presets:\n");
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

pub fn show(preset: &str) -> Result<(), PatabaError> {
    let config = builtin::load_preset(preset)?;

    println!("{} (version {})\n", config.name, config.version);
    if let Some(ref desc) = config.description {
        println!("{}\n", desc);
    }

    println!("Breakpoints (ppm, High above the Medium bound):");
    println!("{BREAKPOINT_HEADER}");
    for nutrient in Nutrient::ALL {
        if let Some(bp) = config.breakpoints.get(&nutrient) {
            println!("{}", breakpoint_row(nutrient, bp));
        }
    }
    println!();

    println!("Targets (kg/ha, low / medium / high):");
    for variety in Variety::ALL {
        for soil in SoilClass::ALL {
            for season in Season::ALL {
                let Some(cell) = config
                    .targets
                    .get(&variety)
                    .and_then(|s| s.get(&soil))
                    .and_then(|s| s.get(&season))
                else {
                    continue;
                };
                let mut parts = Vec::new();
                for nutrient in Nutrient::ALL {
                    let levels: Vec<String> = Rating::LEVELS
                        .iter()
                        .map(|r| {
                            cell.get(&nutrient)
                                .and_then(|by_rating| by_rating.get(r))
                                .map(|kg| kg.to_string())
                                .unwrap_or_else(|| "-".into())
                        })
                        .collect();
                    parts.push(format!("{} {}", nutrient.symbol(), levels.join("/")));
                }
                println!(
                    "  {:<7} {:<9} {:<4} {}",
                    variety.to_string(),
                    soil.to_string(),
                    season.to_string(),
                    parts.join("  ")
                );
            }
        }
    }
    println!();

    println!("Stage splits:");
    print_split("balanced", &config.stage_splits.balanced);
    print_split("N-only", &config.stage_splits.n_only);
    print_split("K-only", &config.stage_splits.k_only);
    println!();

    let d = &config.defaults;
    println!(
        "Defaults: {} rice, {} soil, {} season, {} ha\n",
        d.variety, d.soil_class, d.season, d.area_ha
    );

    let ph = &config.ph_bands;
    println!(
        "pH bands: strongly acidic < {}, acidic < {}, alkaline > {}\n",
        ph.strongly_acidic_below, ph.acidic_below, ph.alkaline_above
    );

    Ok(())
}

const BREAKPOINT_HEADER: &str = "  Nutrient  Low if <=  Medium if <=";

fn breakpoint_row(nutrient: Nutrient, bp: &Breakpoints) -> String {
    format!("  {:<8}  {:>9}  {:>12}", nutrient.symbol(), bp.low, bp.mid)
}

fn print_split(role: &str, split: &StageSplit) {
    let parts: Vec<String> = split
        .iter()
        .map(|(stage, fraction)| format!("{stage} {fraction}"))
        .collect();
    println!("  {:<9} {}", role, parts.join(", "));
}

pub fn validate(file: &Path) -> Result<(), PatabaError> {
    let config = agronomy::load_config(file)?;

    println!("Config '{}' (v{}) is valid.", config.name, config.version);
    let cells: usize = config
        .targets
        .values()
        .flat_map(|by_soil| by_soil.values())
        .map(|by_season| by_season.len())
        .sum();
    println!("  Target cells: {}", cells);
    println!(
        "  Default area: {} ha, pH neutral band: {} to {}",
        config.defaults.area_ha, config.ph_bands.acidic_below, config.ph_bands.alkaline_above
    );

    Ok(())
}
