pub mod agronomy;
pub mod allocate;
pub mod catalog;
pub mod classify;
pub mod error;
pub mod model;
pub mod outcome;
pub mod parsing;
pub mod schedule;

use rust_decimal::Decimal;

use agronomy::schema::AgronomyConfig;
use allocate::{AllocationStrategy, ThreePhaseHeuristic};
use catalog::Catalog;
use error::PatabaError;
use model::{f64_to_decimal, round2, Npk, Nutrient};
use schedule::{narrative, project, ScheduleBuilder, ScheduleSource};

pub use outcome::{Recommendation, RecommendOptions, RecommendationRequest};

/// Main API entry point: turn a soil reading into a priced, staged
/// fertilizer plan using the default three-phase allocation.
pub fn recommend(
    request: &RecommendationRequest,
    config: &AgronomyConfig,
    catalog: &Catalog,
    options: &RecommendOptions,
) -> Result<Recommendation, PatabaError> {
    recommend_with(
        request,
        config,
        catalog,
        options,
        &ThreePhaseHeuristic::new(options.policy),
    )
}

/// Like [`recommend`], with a caller-supplied allocation strategy.
pub fn recommend_with(
    request: &RecommendationRequest,
    config: &AgronomyConfig,
    catalog: &Catalog,
    options: &RecommendOptions,
    strategy: &dyn AllocationStrategy,
) -> Result<Recommendation, PatabaError> {
    validate_request(request)?;

    let variety = request.variety.unwrap_or(config.defaults.variety);
    let soil_class = request.soil_class.unwrap_or(config.defaults.soil_class);
    let season = request.season.unwrap_or(config.defaults.season);
    let area_ha = match request.area_ha {
        Some(area) => f64_to_decimal(area)
            .ok_or_else(|| PatabaError::InvalidInput(format!("area {area} is not a number")))?,
        None => config.defaults.area_ha,
    };
    if area_ha <= Decimal::ZERO {
        return Err(PatabaError::InvalidInput(format!(
            "area must be positive, got {area_ha} ha"
        )));
    }

    // Classify and look up the per-hectare target
    let ratings = classify::classify_reading(&request.reading(), &config.breakpoints);
    let target_per_ha = classify::lookup(&config.targets, variety, soil_class, season, &ratings)?;
    let target_kg = Npk::new(
        round2(target_per_ha.n * area_ha),
        round2(target_per_ha.p * area_ha),
        round2(target_per_ha.k * area_ha),
    );

    // Select and allocate
    let products = if options.active_only {
        catalog.active_products()
    } else {
        catalog.products.clone()
    };
    let selection = catalog::select(&products);
    let allocation = strategy.allocate(&target_kg, &selection)?;

    // Stage the plan
    let title = format!(
        "Fertilizer plan: {variety} rice, {soil_class} soil, {season} season, {area_ha} ha"
    );
    let schedule = ScheduleBuilder::new(&config.stage_splits, &catalog.currency)
        .with_title(title)
        .build(ScheduleSource::Allocation(&allocation));
    let plan = schedule
        .as_ref()
        .map(|s| project(s, &products, &catalog.currency));
    let narrative = schedule.as_ref().map(narrative);

    let ph_class = request
        .ph
        .map(|ph| classify::classify_ph(ph, &config.ph_bands));

    tracing::info!(
        %variety,
        %soil_class,
        %season,
        %area_ha,
        rating_n = %ratings.n,
        rating_p = %ratings.p,
        rating_k = %ratings.k,
        rows = allocation.rows.len(),
        total_cost = %allocation.total_cost,
        strategy = strategy.name(),
        "recommendation computed"
    );

    Ok(Recommendation {
        variety,
        soil_class,
        season,
        area_ha,
        ratings,
        ph_advisory: ph_class.map(|c| c.advisory().to_string()),
        ph_class,
        target_per_ha,
        target_kg,
        selection,
        strategy: strategy.name().to_string(),
        allocation,
        schedule,
        plan,
        narrative,
    })
}

/// Reject readings that are not numbers at all. Zero ppm is allowed and
/// rated N/A by the classifier; negative ppm is rejected here.
fn validate_request(request: &RecommendationRequest) -> Result<(), PatabaError> {
    for nutrient in Nutrient::ALL {
        let ppm = request.reading().ppm(nutrient);
        if !ppm.is_finite() {
            return Err(PatabaError::InvalidInput(format!(
                "{nutrient} reading is not a finite number"
            )));
        }
        if ppm < 0.0 {
            return Err(PatabaError::InvalidInput(format!(
                "{nutrient} reading {ppm} ppm is negative"
            )));
        }
    }
    if let Some(ph) = request.ph {
        if !ph.is_finite() {
            return Err(PatabaError::InvalidInput("pH reading is not a finite number".into()));
        }
    }
    Ok(())
}
