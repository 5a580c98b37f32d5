use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use rust_decimal::Decimal;

use super::{Product, DEFAULT_BAG_WEIGHT_KG};
use crate::error::PatabaError;
use crate::model::{f64_to_decimal, Npk};
use crate::parsing::values::{normalize_key, parse_amount};

/// Parse the first worksheet of a price sheet export into products.
///
/// The first non-empty row is the header. Recognized columns (any order,
/// case-insensitive): code, label, price, bag_kg, n, p, k, active.
pub fn parse_price_sheet(bytes: &[u8]) -> Result<Vec<Product>, PatabaError> {
    let cursor = Cursor::new(bytes);
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
        .map_err(|e| PatabaError::CatalogLoad(format!("failed to open xlsx: {e}")))?;

    let sheet = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PatabaError::CatalogLoad("workbook has no worksheets".into()))?
        .map_err(|e| PatabaError::CatalogLoad(format!("failed to read worksheet: {e}")))?;

    products_from_rows(sheet.rows())
}

#[derive(Debug, Default)]
struct Columns {
    code: Option<usize>,
    label: Option<usize>,
    price: Option<usize>,
    bag_kg: Option<usize>,
    n: Option<usize>,
    p: Option<usize>,
    k: Option<usize>,
    active: Option<usize>,
}

impl Columns {
    fn from_header(row: &[Data]) -> Columns {
        let mut cols = Columns::default();
        for (i, cell) in row.iter().enumerate() {
            let Some(name) = cell_as_string(cell) else {
                continue;
            };
            match normalize_key(&name).as_str() {
                "code" | "productcode" => cols.code = Some(i),
                "label" | "name" | "product" => cols.label = Some(i),
                "price" | "priceperbag" => cols.price = Some(i),
                "bagkg" | "bagweight" | "bagweightkg" => cols.bag_kg = Some(i),
                "n" | "nitrogen" => cols.n = Some(i),
                "p" | "phosphorus" => cols.p = Some(i),
                "k" | "potassium" => cols.k = Some(i),
                "active" => cols.active = Some(i),
                _ => {}
            }
        }
        cols
    }
}

fn products_from_rows<'a>(
    mut rows: impl Iterator<Item = &'a [Data]>,
) -> Result<Vec<Product>, PatabaError> {
    let header = rows
        .by_ref()
        .find(|row| row.iter().any(|c| cell_as_string(c).is_some()))
        .ok_or_else(|| PatabaError::CatalogLoad("price sheet is empty".into()))?;
    let cols = Columns::from_header(header);

    let (Some(code_col), Some(price_col)) = (cols.code, cols.price) else {
        return Err(PatabaError::CatalogLoad(
            "price sheet needs 'code' and 'price' columns".into(),
        ));
    };

    let mut products = Vec::new();
    for row in rows {
        let Some(code) = row.get(code_col).and_then(cell_as_string) else {
            continue;
        };
        let price = match row.get(price_col).and_then(cell_as_decimal) {
            Some(p) if !p.is_sign_negative() => p,
            _ => {
                tracing::warn!(code = %code, "price sheet row has no valid price; skipped");
                continue;
            }
        };

        let cell = |col: Option<usize>| col.and_then(|i| row.get(i)).and_then(cell_as_decimal);
        let pct = |col: Option<usize>| {
            cell(col)
                .map(|v| v.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
                .unwrap_or(Decimal::ZERO)
        };

        let active = match cols.active.and_then(|i| row.get(i)) {
            Some(Data::Bool(b)) => *b,
            Some(Data::Int(i)) => *i != 0,
            Some(Data::Float(f)) => *f != 0.0,
            Some(Data::String(s)) => {
                !matches!(s.trim().to_lowercase().as_str(), "false" | "no" | "0")
            }
            _ => true,
        };

        products.push(Product {
            label: cols
                .label
                .and_then(|i| row.get(i))
                .and_then(cell_as_string)
                .unwrap_or_else(|| code.clone()),
            code,
            price_per_bag: price,
            bag_weight_kg: cell(cols.bag_kg)
                .filter(|w| *w > Decimal::ZERO)
                .unwrap_or(DEFAULT_BAG_WEIGHT_KG),
            nutrient_percent: Npk::new(pct(cols.n), pct(cols.p), pct(cols.k)),
            active,
        });
    }

    Ok(products)
}

fn cell_as_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Empty => None,
        _ => Some(format!("{cell}")),
    }
}

fn cell_as_decimal(cell: &Data) -> Option<Decimal> {
    match cell {
        Data::Float(f) => f64_to_decimal(*f),
        Data::Int(i) => Some(Decimal::from(*i)),
        Data::String(s) => parse_amount(s),
        _ => None,
    }
}
