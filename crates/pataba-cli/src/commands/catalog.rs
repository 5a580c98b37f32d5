use pataba_core::catalog;
use pataba_core::error::PatabaError;
use serde::Serialize;
use std::path::PathBuf;

use crate::output;

#[derive(Serialize)]
struct CatalogReport<'a> {
    currency: &'a str,
    products: &'a [catalog::Product],
    selection: &'a catalog::Selection,
}

pub fn run(file: PathBuf, active_only: bool, output_format: &str) -> Result<(), PatabaError> {
    let catalog = catalog::load_catalog(&file)?;
    let products = if active_only {
        catalog.active_products()
    } else {
        catalog.products.clone()
    };
    let selection = catalog::select(&products);

    match output_format {
        "json" => output::json::print(&CatalogReport {
            currency: &catalog.currency,
            products: &products,
            selection: &selection,
        })?,
        _ => output::table::print_catalog(&catalog, &products, &selection),
    }

    Ok(())
}
