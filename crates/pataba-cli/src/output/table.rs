use pataba_core::catalog::{Catalog, Product, ProductRole, Selection};
use pataba_core::model::Nutrient;
use pataba_core::schedule::plan::format_bags;
use pataba_core::schedule::{format_money, ScheduleModel};
use pataba_core::Recommendation;

pub fn print_recommendation(rec: &Recommendation, currency: &str, verbose: bool) {
    println!("=== Recommendation ===\n");
    println!(
        "  {} rice, {} soil, {} season, {} ha",
        rec.variety, rec.soil_class, rec.season, rec.area_ha
    );
    println!();

    println!("  Nutrient  Rating   Target kg/ha  Target kg  Supplied kg");
    println!("  {}", "-".repeat(55));
    for nutrient in Nutrient::ALL {
        println!(
            "  {:<8}  {:<7}  {:>12}  {:>9}  {:>11}",
            nutrient.symbol(),
            rec.ratings.get(nutrient).to_string(),
            rec.target_per_ha.get(nutrient),
            rec.target_kg.get(nutrient),
            rec.allocation.supplied_kg.get(nutrient),
        );
    }
    println!();

    if let (Some(class), Some(advisory)) = (rec.ph_class, rec.ph_advisory.as_deref()) {
        println!("  pH: {class}. {advisory}\n");
    }

    if rec.allocation.is_empty() {
        println!("  No plan: nothing to buy for this reading and catalog.");
    } else {
        println!("  Products ({}):", rec.strategy);
        for row in &rec.allocation.rows {
            println!(
                "    {:<8} {:>6} bag(s)  {:<32} {:>16}",
                row.role.to_string(),
                format_bags(row.bags),
                row.product.display_name(),
                format_money(currency, row.subtotal),
            );
        }
        println!("    Total: {}", format_money(currency, rec.allocation.total_cost));
    }

    if !rec.allocation.missing_roles.is_empty() {
        let roles: Vec<String> = rec.allocation.missing_roles.iter().map(|r| r.to_string()).collect();
        println!("\n  No catalog product for: {}", roles.join(", "));
    }
    if !rec.allocation.unmet.is_empty() {
        let unmet: Vec<&str> = rec.allocation.unmet.iter().map(|n| n.symbol()).collect();
        println!("  Targets not met: {}", unmet.join(", "));
    }
    println!();

    if let Some(schedule) = &rec.schedule {
        print_schedule(schedule);
    }

    if verbose {
        if let Some(narrative) = &rec.narrative {
            println!("{narrative}\n");
        }
    }
}

pub fn print_schedule(schedule: &ScheduleModel) {
    println!("=== {} ===\n", schedule.title());
    if !schedule.total_cost_text().is_empty() {
        println!("  Cost: {}\n", schedule.total_cost_text());
    }

    for (stage, amounts) in schedule.stage_amounts() {
        println!("  {stage} ({}):", stage.tagalog());
        let width = amounts.keys().map(|c| c.len()).max().unwrap_or(10);
        for (code, bags) in amounts {
            println!("    {:<width$}  {} bag(s)", code, format_bags(*bags), width = width);
        }
        println!();
    }

    println!("  Totals:");
    for (code, bags) in schedule.totals_by_product() {
        println!("    {code}: {} bag(s)", format_bags(*bags));
    }
    println!();
}

pub fn print_catalog(catalog: &Catalog, products: &[Product], selection: &Selection) {
    println!("=== Price catalog ({}) ===\n", catalog.currency);

    if products.is_empty() {
        println!("  No products.\n");
        return;
    }

    let width = products
        .iter()
        .map(|p| p.display_name().len())
        .max()
        .unwrap_or(20);

    println!(
        "  {:<width$}  {:>16}  {:>6}  {:<10}  {:<8}  Active",
        "Product",
        "Price/bag",
        "kg",
        "N-P-K %",
        "Role",
        width = width
    );
    println!("  {}", "-".repeat(width + 58));
    for product in products {
        let pct = &product.nutrient_percent;
        let role = ProductRole::of(product)
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "  {:<width$}  {:>16}  {:>6}  {:<10}  {:<8}  {}",
            product.display_name(),
            format_money(&catalog.currency, product.price_per_bag),
            product.bag_weight_kg,
            format!("{}-{}-{}", pct.n, pct.p, pct.k),
            role,
            if product.active { "yes" } else { "no" },
            width = width
        );
    }
    println!();

    println!("  Cheapest per role:");
    for role in ProductRole::ALL {
        match selection.get(role) {
            Some(product) => {
                let per_kg = product
                    .cost_per_kg(role.defining_nutrient())
                    .map(|c| format!("{}/kg {}", format_money(&catalog.currency, c), role.defining_nutrient().symbol()))
                    .unwrap_or_default();
                println!("    {:<8} {}  ({})", role.to_string(), product.display_name(), per_kg);
            }
            None => println!("    {:<8} none", role.to_string()),
        }
    }
    println!();
}
