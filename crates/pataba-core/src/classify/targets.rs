use crate::agronomy::schema::TargetTable;
use crate::error::PatabaError;
use crate::model::{Npk, Nutrient, Rating, Ratings, Season, SoilClass, Variety};
use rust_decimal::Decimal;

/// Look up the kg/ha of N, P and K required for a field.
///
/// A `NotAvailable` rating is an invalid reading and is reported as
/// `InvalidInput`. A key missing from the table is a configuration error;
/// validated configs never produce one.
pub fn lookup(
    targets: &TargetTable,
    variety: Variety,
    soil: SoilClass,
    season: Season,
    ratings: &Ratings,
) -> Result<Npk, PatabaError> {
    let cell = targets
        .get(&variety)
        .and_then(|by_soil| by_soil.get(&soil))
        .and_then(|by_season| by_season.get(&season))
        .ok_or_else(|| {
            PatabaError::Configuration(format!(
                "target table has no entry for {variety}/{soil}/{season}"
            ))
        })?;

    let kg_for = |nutrient: Nutrient| -> Result<Decimal, PatabaError> {
        let rating = ratings.get(nutrient);
        if rating == Rating::NotAvailable {
            return Err(PatabaError::InvalidInput(format!(
                "no valid {nutrient} reading; check that the sensor is seated and re-read"
            )));
        }
        cell.get(&nutrient)
            .and_then(|by_rating| by_rating.get(&rating))
            .copied()
            .ok_or_else(|| {
                PatabaError::Configuration(format!(
                    "target table has no {} value for {variety}/{soil}/{season} rating {rating}",
                    nutrient.symbol()
                ))
            })
    };

    Ok(Npk::new(
        kg_for(Nutrient::Nitrogen)?,
        kg_for(Nutrient::Phosphorus)?,
        kg_for(Nutrient::Potassium)?,
    ))
}
