use std::path::PathBuf;

use anyhow::Result;
use inventory_core::db::{self, DbPool};
use inventory_core::loader::{self, LoadReport};
use inventory_core::summary::{self, SUMMARY_TABLE};
use inventory_core::tables;
use polars::prelude::{DataFrame, DataType};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("pipeline")
}

async fn loaded_pool() -> Result<(DbPool, LoadReport)> {
    let pool = db::connect_in_memory().await?;
    let report = loader::load_directory(&pool, &fixture_dir()).await?;
    Ok((pool, report))
}

fn f64_at(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
    let cast = df
        .column(column)
        .and_then(|c| c.cast(&DataType::Float64))
        .expect("numeric column");
    cast.f64().expect("f64 column").get(row)
}

#[tokio::test]
async fn loads_all_base_tables_from_csv() -> Result<()> {
    let (pool, report) = loaded_pool().await?;

    assert_eq!(report.loaded(), 4);
    assert_eq!(report.failed(), 0);
    for table in ["purchase_prices", "purchases", "sales", "vendor_invoice"] {
        assert!(tables::table_exists(&pool, table).await?, "{table} missing");
    }
    assert_eq!(tables::row_count(&pool, "purchases").await?, 4);
    Ok(())
}

#[tokio::test]
async fn missing_purchase_price_is_stored_as_null() -> Result<()> {
    let (pool, _) = loaded_pool().await?;

    let missing: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE PurchasePrice IS NULL")
            .fetch_one(&pool)
            .await?;
    assert_eq!(missing, 1);

    let text_prices: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE typeof(PurchasePrice) = 'text'")
            .fetch_one(&pool)
            .await?;
    assert_eq!(text_prices, 0);
    Ok(())
}

#[tokio::test]
async fn summary_from_loaded_csv_matches_hand_computed_totals() -> Result<()> {
    let (pool, _) = loaded_pool().await?;

    let report = summary::run(&pool).await?;
    assert_eq!(report.rows, 2);
    let df = tables::read_table(&pool, SUMMARY_TABLE).await?;

    // vendor 1 / brand 100: $1000 for 100 units bought, $1200 for 80 sold
    assert_eq!(f64_at(&df, "VendorNumber", 0), Some(1.0));
    assert_eq!(f64_at(&df, "Brand", 0), Some(100.0));
    assert_eq!(f64_at(&df, "TotalPurchaseDollars", 0), Some(1000.0));
    assert_eq!(f64_at(&df, "TotalPurchaseQuantity", 0), Some(100.0));
    assert_eq!(f64_at(&df, "TotalSalesDollars", 0), Some(1200.0));
    assert_eq!(f64_at(&df, "TotalSalesQuantity", 0), Some(80.0));
    assert_eq!(f64_at(&df, "GrossProfit", 0), Some(200.0));
    assert_eq!(f64_at(&df, "StockTurnover", 0), Some(0.8));
    assert_eq!(f64_at(&df, "SalesToPurchaseRatio", 0), Some(1.2));
    assert_eq!(f64_at(&df, "AvgSalesPrice", 0), Some(15.0));
    assert_eq!(f64_at(&df, "FreightCost", 0), Some(15.0));
    assert_eq!(f64_at(&df, "ActualPrice", 0), Some(14.99));

    assert_eq!(f64_at(&df, "Brand", 1), Some(200.0));
    assert_eq!(f64_at(&df, "TotalSalesDollars", 1), Some(0.0));
    assert_eq!(f64_at(&df, "GrossProfit", 1), Some(-50.0));
    assert_eq!(f64_at(&df, "ProfitMargin", 1), None);
    Ok(())
}

#[tokio::test]
async fn rows_with_missing_purchase_price_are_left_out_of_summary() -> Result<()> {
    let (pool, _) = loaded_pool().await?;
    summary::run(&pool).await?;
    let df = tables::read_table(&pool, SUMMARY_TABLE).await?;

    let brands: Vec<Option<f64>> = (0..df.height()).map(|row| f64_at(&df, "Brand", row)).collect();
    assert!(!brands.contains(&Some(101.0)), "brand 101 has no purchase price: {brands:?}");
    Ok(())
}
