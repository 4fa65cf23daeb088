use std::time::Instant;

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{error, info};

use crate::cleaning::clean_vendor_summary;
use crate::db::DbPool;
use crate::error::Result;
use crate::tables;

/// Destination table of the vendor summary.
pub const SUMMARY_TABLE: &str = "vendor_sales_summary";

/// One row per purchase group (vendor, brand, description, purchase price),
/// with sales and freight left-joined in. `AvgSalesPrice` is computed in
/// floating point and is NULL when the summed quantity is zero.
pub const VENDOR_SUMMARY_SQL: &str = r#"
WITH FreightSummary AS (
    SELECT
        VendorNumber,
        SUM(Freight) AS FreightCost
    FROM vendor_invoice
    GROUP BY VendorNumber
),

PurchaseSummary AS (
    SELECT
        p.VendorNumber,
        p.VendorName,
        p.Brand,
        p.Description,
        p.PurchasePrice,
        pp.Price AS ActualPrice,
        pp.Volume,
        SUM(p.Quantity) AS TotalPurchaseQuantity,
        SUM(p.Dollars) AS TotalPurchaseDollars
    FROM purchases p
    JOIN purchase_prices pp
        ON p.Brand = pp.Brand
    WHERE p.PurchasePrice > 0
    GROUP BY
        p.VendorNumber,
        p.VendorName,
        p.Brand,
        p.Description,
        p.PurchasePrice,
        pp.Price,
        pp.Volume
),

SalesSummary AS (
    SELECT
        VendorNo,
        Brand,
        SUM(SalesQuantity) AS TotalSalesQuantity,
        SUM(SalesDollars) AS TotalSalesDollars,
        CAST(SUM(SalesDollars) AS REAL) / NULLIF(SUM(SalesQuantity), 0) AS AvgSalesPrice,
        SUM(ExciseTax) AS TotalExciseTax
    FROM sales
    GROUP BY VendorNo, Brand
)

SELECT
    ps.VendorNumber,
    ps.VendorName,
    ps.Brand,
    ps.Description,
    ps.PurchasePrice,
    ps.ActualPrice,
    ps.Volume,
    ps.TotalPurchaseQuantity,
    ps.TotalPurchaseDollars,

    ss.TotalSalesQuantity,
    ss.TotalSalesDollars,
    ss.AvgSalesPrice,
    ss.TotalExciseTax,

    fs.FreightCost

FROM PurchaseSummary ps

LEFT JOIN SalesSummary ss
    ON ps.VendorNumber = ss.VendorNo
   AND ps.Brand = ss.Brand

LEFT JOIN FreightSummary fs
    ON ps.VendorNumber = fs.VendorNumber

ORDER BY
    ps.TotalPurchaseDollars DESC,
    ps.VendorNumber,
    ps.Brand,
    ps.Description,
    ps.PurchasePrice
"#;

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub table: &'static str,
    pub rows: u64,
    pub elapsed_secs: f64,
}

/// Runs the aggregation query and returns the raw, uncleaned result.
pub async fn create_vendor_summary(pool: &DbPool) -> Result<DataFrame> {
    info!("Running vendor summary SQL query");
    let summary = tables::read_query(pool, VENDOR_SUMMARY_SQL).await?;

    info!(rows = summary.height(), "Vendor summary query executed successfully");
    info!("\n{}", summary.head(Some(5)));
    Ok(summary)
}

/// Rebuilds `vendor_sales_summary` from the loaded base tables.
///
/// Any failure is logged and returned; nothing is written unless the query and
/// cleaning both succeed, and the write itself is a single transaction.
pub async fn run(pool: &DbPool) -> Result<SummaryReport> {
    let started = Instant::now();
    info!("Starting vendor summary pipeline");

    match build_and_write(pool).await {
        Ok(rows) => {
            let elapsed = started.elapsed().as_secs_f64();
            info!("Pipeline completed successfully in {elapsed:.2} seconds");
            Ok(SummaryReport {
                table: SUMMARY_TABLE,
                rows,
                elapsed_secs: elapsed,
            })
        }
        Err(err) => {
            error!(error = ?err, "Pipeline failed due to error: {err}");
            Err(err)
        }
    }
}

async fn build_and_write(pool: &DbPool) -> Result<u64> {
    let summary = create_vendor_summary(pool).await?;
    let cleaned = clean_vendor_summary(&summary)?;

    info!("Ingesting data into {SUMMARY_TABLE} table");
    tables::write_frame(pool, SUMMARY_TABLE, &cleaned).await
}
