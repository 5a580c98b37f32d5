use pataba_core::agronomy::{self, builtin};
use pataba_core::allocate::AllocationPolicy;
use pataba_core::catalog;
use pataba_core::error::PatabaError;
use pataba_core::{RecommendOptions, RecommendationRequest};
use std::path::PathBuf;

use crate::output;

pub struct Args {
    pub request: RecommendationRequest,
    pub catalog: PathBuf,
    pub config: Option<PathBuf>,
    pub preset: String,
    pub partial: bool,
    pub active_only: bool,
    pub output: String,
    pub verbose: bool,
}

pub fn run(args: Args) -> Result<(), PatabaError> {
    let config = match &args.config {
        Some(path) => agronomy::load_config(path)?,
        None => builtin::load_preset(&args.preset)?,
    };
    tracing::debug!(config = %config.name, version = %config.version, "agronomy config loaded");

    let catalog = catalog::load_catalog(&args.catalog)?;
    tracing::debug!(products = catalog.products.len(), "catalog loaded");

    let options = RecommendOptions {
        policy: if args.partial {
            AllocationPolicy::Partial
        } else {
            AllocationPolicy::AllOrNothing
        },
        active_only: args.active_only,
    };

    let recommendation = pataba_core::recommend(&args.request, &config, &catalog, &options)?;

    match args.output.as_str() {
        "json" => output::json::print(&recommendation)?,
        _ => output::table::print_recommendation(&recommendation, &catalog.currency, args.verbose),
    }

    Ok(())
}
