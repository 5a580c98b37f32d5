use pataba_core::catalog::{self, Product};
use pataba_core::error::PatabaError;
use pataba_core::parsing;
use pataba_core::schedule::render_free_text;
use std::path::PathBuf;

use crate::output;

pub fn run(input_file: PathBuf, catalog: Option<PathBuf>, output_format: &str) -> Result<(), PatabaError> {
    let raw = std::fs::read_to_string(&input_file)?;

    let products: Vec<Product> = match &catalog {
        Some(path) => catalog::load_catalog(path)?.products,
        None => Vec::new(),
    };

    let schedule = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => parsing::parse_with_catalog(&value, &products),
        Err(_) => parsing::parse_str(&raw, &products),
    };

    let Some(schedule) = schedule else {
        eprintln!("No plan could be recovered from {}", input_file.display());
        return Ok(());
    };

    match output_format {
        "json" => output::json::print(&schedule)?,
        "text" => {
            for line in render_free_text(&schedule) {
                println!("{line}");
            }
        }
        _ => output::table::print_schedule(&schedule),
    }

    Ok(())
}
