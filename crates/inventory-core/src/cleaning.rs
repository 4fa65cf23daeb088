use polars::prelude::{Column, DataFrame, DataType, NamedFrom, Series};
use tracing::info;

use crate::error::{PipelineError, Result};

/// Text columns whose surrounding whitespace is stripped.
pub const TRIMMED_COLUMNS: [&str; 2] = ["VendorName", "Description"];

/// Cleans the raw vendor summary and appends the derived ratios.
///
/// Order matters: nulls are zero-filled first, then whitespace is trimmed,
/// then `GrossProfit`, `ProfitMargin`, `StockTurnover` and
/// `SalesToPurchaseRatio` are computed. A ratio whose denominator is zero is
/// null, and those nulls are left in place. A denominator that was null before
/// the fill is therefore indistinguishable from a real zero.
pub fn clean_vendor_summary(df: &DataFrame) -> Result<DataFrame> {
    info!("Cleaning vendor summary data");

    let mut columns = df
        .get_columns()
        .iter()
        .map(fill_null_with_zero)
        .collect::<Result<Vec<Column>>>()?;

    for name in TRIMMED_COLUMNS {
        let trimmed = trim_text(find_column(&columns, name)?)?;
        upsert_column(&mut columns, trimmed);
    }

    let sales_dollars = numeric_values(&columns, "TotalSalesDollars")?;
    let purchase_dollars = numeric_values(&columns, "TotalPurchaseDollars")?;
    let sales_quantity = numeric_values(&columns, "TotalSalesQuantity")?;
    let purchase_quantity = numeric_values(&columns, "TotalPurchaseQuantity")?;

    let gross_profit: Vec<Option<f64>> = sales_dollars
        .iter()
        .zip(&purchase_dollars)
        .map(|(sales, purchases)| match (sales, purchases) {
            (Some(sales), Some(purchases)) => Some(sales - purchases),
            _ => None,
        })
        .collect();
    let profit_margin = guarded_ratio(&gross_profit, &sales_dollars, 100.0);
    let stock_turnover = guarded_ratio(&sales_quantity, &purchase_quantity, 1.0);
    let sales_to_purchase = guarded_ratio(&sales_dollars, &purchase_dollars, 1.0);

    for (name, values) in [
        ("GrossProfit", gross_profit),
        ("ProfitMargin", profit_margin),
        ("StockTurnover", stock_turnover),
        ("SalesToPurchaseRatio", sales_to_purchase),
    ] {
        upsert_column(&mut columns, Series::new(name.into(), values).into());
    }

    let cleaned = DataFrame::new(columns)?;
    info!("Data cleaning completed");
    info!("\n{}", cleaned.head(Some(5)));
    Ok(cleaned)
}

/// `numerator / denominator * scale`, or null where the denominator is zero
/// or either side is missing.
pub fn guarded_ratio(
    numerator: &[Option<f64>],
    denominator: &[Option<f64>],
    scale: f64,
) -> Vec<Option<f64>> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(num, den)| match (num, den) {
            (Some(num), Some(den)) if *den != 0.0 => Some(num / den * scale),
            _ => None,
        })
        .collect()
}

/// Replaces nulls with zero: `0` for numeric columns, `"0"` for text.
pub fn fill_null_with_zero(column: &Column) -> Result<Column> {
    if column.null_count() == 0 {
        return Ok(column.clone());
    }

    let name = column.name().as_str();
    let dtype = column.dtype();
    let series = if dtype.is_integer() || dtype == &DataType::Boolean {
        let cast = column.cast(&DataType::Int64)?;
        let values: Vec<i64> = cast.i64()?.into_iter().map(|v| v.unwrap_or(0)).collect();
        Series::new(name.into(), values)
    } else if dtype.is_float() {
        let cast = column.cast(&DataType::Float64)?;
        let values: Vec<f64> = cast.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect();
        Series::new(name.into(), values)
    } else if dtype == &DataType::String {
        let values: Vec<&str> = column.str()?.into_iter().map(|v| v.unwrap_or("0")).collect();
        Series::new(name.into(), values)
    } else {
        return Err(PipelineError::Validation(format!(
            "cannot zero-fill column {name} of type {dtype}"
        )));
    };

    Ok(series.into())
}

fn trim_text(column: &Column) -> Result<Column> {
    if column.dtype() != &DataType::String {
        return Ok(column.clone());
    }
    let values: Vec<Option<&str>> = column.str()?.into_iter().map(|v| v.map(str::trim)).collect();
    Ok(Series::new(column.name().clone(), values).into())
}

fn find_column<'a>(columns: &'a [Column], name: &str) -> Result<&'a Column> {
    columns
        .iter()
        .find(|column| column.name().as_str() == name)
        .ok_or_else(|| PipelineError::Validation(format!("vendor summary is missing column {name}")))
}

fn numeric_values(columns: &[Column], name: &str) -> Result<Vec<Option<f64>>> {
    let cast = find_column(columns, name)?.cast(&DataType::Float64)?;
    let values = cast.f64()?.into_iter().collect();
    Ok(values)
}

fn upsert_column(columns: &mut Vec<Column>, column: Column) {
    match columns.iter().position(|existing| existing.name() == column.name()) {
        Some(idx) => columns[idx] = column,
        None => columns.push(column),
    }
}
