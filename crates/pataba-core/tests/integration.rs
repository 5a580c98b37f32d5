//! End-to-end tests for recommend() and the plan parser.
//!
//! Catalogs are built from JSON documents the way the admin app stores
//! them, so these tests also cover extraction and selection.

use pataba_core::agronomy::{builtin::load_preset, load_config};
use pataba_core::allocate::{AllocationPolicy, AllocationResult, AllocationStrategy};
use pataba_core::catalog::{parse_catalog_str, Catalog, ProductRole, Selection};
use pataba_core::error::PatabaError;
use pataba_core::model::{Npk, Nutrient, Rating, Season, SoilClass, Stage, Variety};
use pataba_core::parsing::{parse, parse_with_catalog};
use pataba_core::schedule::{project, render_free_text, DaBreakdown, ScheduleBuilder, ScheduleSource};
use pataba_core::{recommend, recommend_with, RecommendOptions, RecommendationRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn catalog(items: Value) -> Catalog {
    parse_catalog_str(&json!({ "currency": "PHP", "items": items }).to_string()).unwrap()
}

fn full_catalog() -> Catalog {
    catalog(json!({
        "14-14-14": { "label": "Complete", "pricePerBag": "1400", "bagKg": 50, "npk": { "N": 14, "P": 14, "K": 14 } },
        "46-0-0": { "label": "Urea", "pricePerBag": 1500, "npk": "46-0-0" },
        "0-0-60": { "label": "Muriate of Potash", "pricePerBag": "1,700", "npk": { "K": 60 } },
        "18-46-0": { "label": "DAP", "pricePerBag": 1800, "npk": { "N": 18, "P": 46 } }
    }))
}

/// hybrid / light / wet with N medium, P low, K low: 100 / 70 / 100 kg/ha.
fn request() -> RecommendationRequest {
    RecommendationRequest {
        n: 150.0,
        p: 5.0,
        k: 50.0,
        ph: Some(6.2),
        area_ha: Some(1.0),
        variety: Some(Variety::Hybrid),
        soil_class: Some(SoilClass::Light),
        season: Some(Season::Wet),
    }
}

fn run(request: &RecommendationRequest, catalog: &Catalog) -> Result<pataba_core::Recommendation, PatabaError> {
    let config = load_preset("default").unwrap();
    recommend(request, &config, catalog, &RecommendOptions::default())
}

// ---------------------------------------------------------------------------
// Recommendation pipeline
// ---------------------------------------------------------------------------

#[test]
fn complete_fertilizer_gives_three_rows() {
    let rec = run(&request(), &full_catalog()).unwrap();

    assert_eq!(rec.ratings.n, Rating::Medium);
    assert_eq!(rec.ratings.p, Rating::Low);
    assert_eq!(rec.ratings.k, Rating::Low);
    assert_eq!(rec.target_kg, Npk::new(dec!(100), dec!(70), dec!(100)));

    let allocation = &rec.allocation;
    assert_eq!(allocation.rows.len(), 3);
    assert_eq!(allocation.row(ProductRole::Balanced).unwrap().bags, dec!(10));
    // 30 kg N left / 23 kg per bag = 1.304 -> 1.31
    assert_eq!(allocation.row(ProductRole::NOnly).unwrap().bags, dec!(1.31));
    assert_eq!(allocation.row(ProductRole::KOnly).unwrap().bags, dec!(1));
    // 14000 + 1965 + 1700
    assert_eq!(allocation.total_cost, dec!(17665));
    assert!(allocation.unmet.is_empty());
    assert_eq!(rec.strategy, "three-phase");
}

#[test]
fn complete_fertilizer_schedule_stages() {
    let rec = run(&request(), &full_catalog()).unwrap();
    let schedule = rec.schedule.as_ref().unwrap();

    let basal = schedule.stage(Stage::Basal).unwrap();
    assert_eq!(basal["14-14-14"], dec!(5));
    assert_eq!(basal["0-0-60"], dec!(1));
    let after30 = schedule.stage(Stage::After30Dat).unwrap();
    assert_eq!(after30["14-14-14"], dec!(2.5));
    assert_eq!(after30["46-0-0"], dec!(0.66));
    assert_eq!(schedule.stage(Stage::TopDress).unwrap()["46-0-0"], dec!(0.65));
    assert!(schedule.stage(Stage::Organic).is_none());

    assert_eq!(schedule.total("46-0-0"), Some(dec!(1.31)));
    assert_eq!(schedule.total_cost_text(), "PHP 17,665.00");
    assert!(schedule.title().contains("hybrid"));

    let plan = rec.plan.as_ref().unwrap();
    assert_eq!(plan.cost, "PHP 17,665.00");
    assert!(plan
        .details
        .contains(&"10 bag(s) - Complete (14-14-14) | PHP 1,400.00/bag | Subtotal: PHP 14,000.00".to_string()));

    let narrative = rec.narrative.as_ref().unwrap();
    assert!(narrative.contains("Plano sa pagpapataba"));
}

#[test]
fn dap_is_not_a_balanced_product() {
    let catalog = catalog(json!({
        "46-0-0": { "pricePerBag": 1500, "npk": "46-0-0" },
        "0-0-60": { "pricePerBag": 1700, "npk": "0-0-60" },
        "18-46-0": { "pricePerBag": 1800, "npk": "18-46-0" }
    }));
    let err = run(&request(), &catalog).unwrap_err();
    assert!(matches!(
        err,
        PatabaError::CatalogInsufficient {
            nutrient: Nutrient::Phosphorus,
            category: "balanced"
        }
    ));
}

#[test]
fn defaults_fill_missing_request_fields() {
    let req = RecommendationRequest {
        n: 50.0,
        p: 5.0,
        k: 50.0,
        ph: None,
        area_ha: None,
        variety: None,
        soil_class: None,
        season: None,
    };
    let rec = run(&req, &full_catalog()).unwrap();
    assert_eq!(rec.variety, Variety::Inbred);
    assert_eq!(rec.soil_class, SoilClass::MedHeavy);
    assert_eq!(rec.season, Season::Wet);
    assert_eq!(rec.area_ha, dec!(1));
    // inbred / medHeavy / wet, all low
    assert_eq!(rec.target_kg, Npk::new(dec!(90), dec!(60), dec!(70)));
    assert!(rec.ph_class.is_none());
}

#[test]
fn area_scales_target() {
    let mut req = request();
    req.area_ha = Some(2.5);
    let rec = run(&req, &full_catalog()).unwrap();
    assert_eq!(rec.target_kg, Npk::new(dec!(250), dec!(175), dec!(250)));
    assert_eq!(rec.allocation.row(ProductRole::Balanced).unwrap().bags, dec!(25));
}

#[test]
fn invalid_requests_rejected() {
    let catalog = full_catalog();

    let mut req = request();
    req.n = f64::NAN;
    assert!(matches!(run(&req, &catalog), Err(PatabaError::InvalidInput(_))));

    let mut req = request();
    req.k = -1.0;
    assert!(matches!(run(&req, &catalog), Err(PatabaError::InvalidInput(_))));

    let mut req = request();
    req.area_ha = Some(0.0);
    assert!(matches!(run(&req, &catalog), Err(PatabaError::InvalidInput(_))));

    let mut req = request();
    req.ph = Some(f64::INFINITY);
    assert!(matches!(run(&req, &catalog), Err(PatabaError::InvalidInput(_))));
}

#[test]
fn zero_reading_asks_for_a_reread() {
    let mut req = request();
    req.p = 0.0;
    let err = run(&req, &full_catalog()).unwrap_err();
    assert!(matches!(err, PatabaError::InvalidInput(_)));
    assert!(err.to_string().contains("re-read"));
}

#[test]
fn ph_advisory_reported() {
    let mut req = request();
    req.ph = Some(4.8);
    let rec = run(&req, &full_catalog()).unwrap();
    assert!(rec.ph_class.is_some());
    assert!(rec.ph_advisory.as_deref().unwrap().contains("lime"));
}

#[test]
fn missing_k_product_all_or_nothing() {
    let catalog = catalog(json!({
        "14-14-14": { "pricePerBag": 1400, "npk": "14-14-14" },
        "46-0-0": { "pricePerBag": 1500, "npk": "46-0-0" }
    }));
    let rec = run(&request(), &catalog).unwrap();
    assert!(rec.allocation.is_empty());
    assert!(!rec.has_plan());
    assert!(rec.plan.is_none());
    assert_eq!(rec.allocation.missing_roles, vec![ProductRole::KOnly]);
    assert_eq!(rec.allocation.unmet.len(), 3);
}

#[test]
fn missing_k_product_partial() {
    let catalog = catalog(json!({
        "14-14-14": { "pricePerBag": 1400, "npk": "14-14-14" },
        "46-0-0": { "pricePerBag": 1500, "npk": "46-0-0" }
    }));
    let config = load_preset("default").unwrap();
    let options = RecommendOptions {
        policy: AllocationPolicy::Partial,
        active_only: false,
    };
    let rec = recommend(&request(), &config, &catalog, &options).unwrap();
    assert_eq!(rec.allocation.rows.len(), 2);
    assert_eq!(rec.allocation.unmet, vec![Nutrient::Potassium]);
    assert!(rec.has_plan());
}

#[test]
fn active_only_skips_inactive_products() {
    let catalog = catalog(json!({
        "14-14-14": { "pricePerBag": 1400, "npk": "14-14-14", "active": false },
        "16-16-16": { "pricePerBag": 2000, "npk": "16-16-16" },
        "46-0-0": { "pricePerBag": 1500, "npk": "46-0-0" },
        "0-0-60": { "pricePerBag": 1700, "npk": "0-0-60" }
    }));
    assert_eq!(catalog.products.len(), 4);

    let rec = run(&request(), &catalog).unwrap();
    assert_eq!(rec.selection.balanced.as_ref().unwrap().code, "14-14-14");

    let config = load_preset("default").unwrap();
    let options = RecommendOptions {
        policy: AllocationPolicy::AllOrNothing,
        active_only: true,
    };
    let rec = recommend(&request(), &config, &catalog, &options).unwrap();
    assert_eq!(rec.selection.balanced.as_ref().unwrap().code, "16-16-16");
}

#[test]
fn cost_monotonic_in_reading_deficit() {
    // Lower ppm never rates higher, so it never costs less.
    let catalog = full_catalog();
    let mut previous: Option<Decimal> = None;
    for ppm in [300.0, 200.0, 150.0, 100.0, 60.0, 20.0] {
        let mut req = request();
        req.n = ppm;
        req.k = ppm;
        let cost = run(&req, &catalog).unwrap().allocation.total_cost;
        if let Some(prev) = previous {
            assert!(cost >= prev, "cost dropped from {prev} to {cost} at {ppm} ppm");
        }
        previous = Some(cost);
    }
}

#[test]
fn custom_config_from_file() {
    let mut json: Value = serde_json::from_str(&serde_json::to_string(&load_preset("default").unwrap()).unwrap()).unwrap();
    json["name"] = json!("two-hectare");
    json["defaults"]["area_ha"] = json!("2");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agronomy.json");
    std::fs::write(&path, json.to_string()).unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.name, "two-hectare");

    let mut req = request();
    req.area_ha = None;
    let rec = recommend(&req, &config, &full_catalog(), &RecommendOptions::default()).unwrap();
    assert_eq!(rec.area_ha, dec!(2));
    assert_eq!(rec.target_kg.p, dec!(140));
}

struct EmptyPlan;

impl AllocationStrategy for EmptyPlan {
    fn allocate(&self, target: &Npk, _selection: &Selection) -> Result<AllocationResult, PatabaError> {
        Ok(AllocationResult::empty(*target))
    }

    fn name(&self) -> &str {
        "nothing"
    }
}

#[test]
fn custom_strategy_is_used() {
    let config = load_preset("default").unwrap();
    let rec = recommend_with(
        &request(),
        &config,
        &full_catalog(),
        &RecommendOptions::default(),
        &EmptyPlan,
    )
    .unwrap();
    assert_eq!(rec.strategy, "nothing");
    assert!(!rec.has_plan());
}

// ---------------------------------------------------------------------------
// Round trip: build -> project -> parse
// ---------------------------------------------------------------------------

fn assert_totals_close(left: &pataba_core::schedule::ScheduleModel, right: &pataba_core::schedule::ScheduleModel) {
    assert_eq!(
        left.totals_by_product().keys().collect::<Vec<_>>(),
        right.totals_by_product().keys().collect::<Vec<_>>()
    );
    for (code, bags) in left.totals_by_product() {
        let parsed = right.total(code).unwrap();
        assert!((parsed - *bags).abs() <= dec!(0.01), "{code}: {bags} vs {parsed}");
    }
}

#[test]
fn projection_parses_back_to_same_totals() {
    let catalog = full_catalog();
    for (n, p, k) in [(150.0, 5.0, 50.0), (50.0, 15.0, 120.0), (250.0, 25.0, 200.0)] {
        let mut req = request();
        req.n = n;
        req.p = p;
        req.k = k;
        let rec = run(&req, &catalog).unwrap();
        let schedule = rec.schedule.as_ref().unwrap();
        let record = serde_json::to_value(rec.plan.as_ref().unwrap()).unwrap();

        let parsed = parse_with_catalog(&record, &catalog.products).unwrap();
        assert_totals_close(schedule, &parsed);
        assert_eq!(parsed.total_cost_text(), schedule.total_cost_text());

        // Display names carry the code, so no catalog is needed.
        let parsed = parse(&record).unwrap();
        assert_totals_close(schedule, &parsed);
    }
}

#[test]
fn projection_parses_back_with_word_codes() {
    let catalog = catalog(json!({
        "complete": { "label": "Complete 14-14-14", "pricePerBag": 1400, "npk": "14-14-14" },
        "urea": { "label": "Urea", "pricePerBag": 1500, "npk": "46-0-0" },
        "mop": { "label": "Muriate of Potash", "pricePerBag": 1700, "npk": "0-0-60" }
    }));
    let rec = run(&request(), &catalog).unwrap();
    let schedule = rec.schedule.as_ref().unwrap();
    assert_eq!(
        schedule.codes().collect::<Vec<_>>(),
        vec!["complete", "mop", "urea"]
    );
    let record = serde_json::to_value(rec.plan.as_ref().unwrap()).unwrap();

    let parsed = parse_with_catalog(&record, &catalog.products).unwrap();
    assert_totals_close(schedule, &parsed);
}

#[test]
fn free_text_render_keeps_stages() {
    let rec = run(&request(), &full_catalog()).unwrap();
    let schedule = rec.schedule.as_ref().unwrap();
    let record = json!({ "name": schedule.title(), "details": render_free_text(schedule) });

    let parsed = parse(&record).unwrap();
    assert_eq!(parsed.stage_amounts(), schedule.stage_amounts());
    assert_eq!(parsed.title(), schedule.title());
}

#[test]
fn da_breakdown_builds_schedule() {
    let config = load_preset("default").unwrap();
    let record = json!({
        "name": "Barangay demo plot",
        "daSchedule": {
            "organic": { "Organic Fertilizer": 10 },
            "saPagtanim": [{ "code": "14-14-14", "bags": 4 }],
            "ika30Araw": { "46-0-0": "1" },
            "topDress": [{ "code": "46-0-0", "bags": 1 }]
        },
        "daCost": "15,200"
    });
    let breakdown = DaBreakdown::from_value(&record).unwrap();
    let schedule = ScheduleBuilder::new(&config.stage_splits, "PHP")
        .build(ScheduleSource::DaBreakdown(&breakdown))
        .unwrap();

    assert_eq!(schedule.title(), "Barangay demo plot");
    assert_eq!(schedule.total_cost_text(), "PHP 15,200.00");
    assert_eq!(schedule.total("46-0-0"), Some(dec!(2)));
    assert_eq!(schedule.stage(Stage::Organic).unwrap()["Organic Fertilizer"], dec!(10));

    let plan = project(&schedule, &[], "PHP");
    assert_eq!(plan.cost, "PHP 15,200.00");
    assert!(plan.details.contains(&"10 bag(s) - Organic Fertilizer".to_string()));
}

// ---------------------------------------------------------------------------
// Parser robustness
// ---------------------------------------------------------------------------

#[test]
fn legacy_records_parse() {
    let records = [
        json!({ "details": ["Basal:", "14-14-14 - 4 bags", "Top dress:", "Urea 46-0-0: 2 sako"] }),
        json!({ "daSchedule": [{ "stage": "Basal", "items": [{ "code": "14-14-14", "bags": 4 }] }] }),
        json!({ "14-14-14": 4, "46-0-0": 2, "cost": 8600 }),
        json!(json!({ "basal": { "14-14-14": 4 } }).to_string()),
    ];
    for record in &records {
        let model = parse(record).unwrap_or_else(|| panic!("no plan from {record}"));
        assert_eq!(model.total("14-14-14"), Some(dec!(4)), "record {record}");
    }
}

#[test]
fn garbage_never_panics() {
    let inputs = [
        Value::Null,
        json!(true),
        json!(""),
        json!("   "),
        json!("[1, 2"),
        json!({ "details": null }),
        json!({ "details": [null, 3, {}] }),
        json!({ "daSchedule": "{\"basal\": 5}" }),
        json!([[], {}, [[]]]),
        json!({ "14-14-14": -3 }),
        json!({ "14-14-14": "lots" }),
    ];
    for input in &inputs {
        assert!(parse(input).is_none(), "unexpected plan from {input}");
    }
}

#[test]
fn huge_amounts_never_panic() {
    const MAX: &str = "79228162514264337593543950335";
    let inputs = [
        json!([format!("X: {MAX} bags"), format!("X: {MAX} bags")]),
        json!({ "details": [format!("{MAX} bag(s) - X"), format!("{MAX} bag(s) - X")] }),
        json!({ "basal": { "X": MAX }, "topDress": { "X": MAX } }),
        json!({ "daSchedule": [{ "stage": "Basal", "items": [{ "code": "X", "bags": MAX }, { "code": "X", "bags": MAX }] }] }),
    ];
    for input in &inputs {
        let model = parse(input).unwrap_or_else(|| panic!("no plan from {input}"));
        assert_eq!(model.total("X"), Some(Decimal::MAX), "input {input}");
        let stage_sum = model
            .stage_amounts()
            .values()
            .filter_map(|amounts| amounts.get("X"))
            .fold(Decimal::ZERO, |acc, bags| acc + *bags);
        assert_eq!(stage_sum, Decimal::MAX, "input {input}");
        project(&model, &full_catalog().products, "PHP");
    }
}
