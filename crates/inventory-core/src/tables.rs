//! Moves `DataFrame`s in and out of SQLite tables.
//!
//! Writing always replaces: the target table is dropped and recreated inside a
//! single transaction, so a failed write leaves the previous table untouched.

use polars::prelude::{Column, DataFrame, DataType, NamedFrom, Series};
use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{Column as _, Executor, QueryBuilder, Row, Statement, TypeInfo, ValueRef};

use crate::db::DbPool;
use crate::error::{PipelineError, Result};

/// Upper bound on bound parameters in one SQLite statement.
pub const SQLITE_MAX_PARAMETERS: usize = 32766;

/// Quotes a table or column name for direct interpolation into SQL.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

enum ColumnValues {
    Integer(Vec<Option<i64>>),
    Real(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    fn from_column(column: &Column) -> Result<Self> {
        let dtype = column.dtype();
        let values = if dtype.is_integer() || dtype == &DataType::Boolean {
            let cast = column.cast(&DataType::Int64)?;
            ColumnValues::Integer(cast.i64()?.into_iter().collect())
        } else if dtype.is_float() {
            let cast = column.cast(&DataType::Float64)?;
            ColumnValues::Real(cast.f64()?.into_iter().collect())
        } else {
            let cast = column.cast(&DataType::String)?;
            ColumnValues::Text(
                cast.str()?
                    .into_iter()
                    .map(|value| value.map(str::to_string))
                    .collect(),
            )
        };
        Ok(values)
    }

    fn sql_type(&self) -> &'static str {
        match self {
            ColumnValues::Integer(_) => "INTEGER",
            ColumnValues::Real(_) => "REAL",
            ColumnValues::Text(_) => "TEXT",
        }
    }
}

/// Replaces `table` with the contents of `df` and returns the number of rows
/// inserted.
pub async fn write_frame(pool: &DbPool, table: &str, df: &DataFrame) -> Result<u64> {
    if df.width() == 0 {
        return Err(PipelineError::Validation(format!(
            "cannot write table {table} without columns"
        )));
    }

    let columns = df
        .get_columns()
        .iter()
        .map(|column| Ok((column.name().to_string(), ColumnValues::from_column(column)?)))
        .collect::<Result<Vec<_>>>()?;

    let table_ident = quote_identifier(table);
    let column_defs = columns
        .iter()
        .map(|(name, values)| format!("{} {}", quote_identifier(name), values.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");

    let mut tx = pool.begin().await?;
    sqlx::query(&format!("DROP TABLE IF EXISTS {table_ident}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!("CREATE TABLE {table_ident} ({column_defs})"))
        .execute(&mut *tx)
        .await?;

    let height = df.height();
    let chunk_rows = (SQLITE_MAX_PARAMETERS / columns.len()).max(1);
    let mut written = 0;
    for start in (0..height).step_by(chunk_rows) {
        let end = (start + chunk_rows).min(height);
        let mut insert = QueryBuilder::<Sqlite>::new(format!("INSERT INTO {table_ident} "));
        insert.push_values(start..end, |mut row_values, row| {
            for (_, values) in &columns {
                match values {
                    ColumnValues::Integer(v) => row_values.push_bind(v[row]),
                    ColumnValues::Real(v) => row_values.push_bind(v[row]),
                    ColumnValues::Text(v) => row_values.push_bind(v[row].as_deref()),
                };
            }
        });
        written += insert.build().execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}

/// Runs `sql` and collects the result set into a `DataFrame`.
///
/// Column names come from the prepared statement, so an empty result still
/// carries its schema. Column dtypes follow the storage classes actually
/// returned: any TEXT makes a String column, otherwise any REAL makes Float64,
/// otherwise INTEGER gives Int64. All-NULL columns are Float64.
pub async fn read_query(pool: &DbPool, sql: &str) -> Result<DataFrame> {
    let statement = pool.prepare(sql).await?;
    let names: Vec<String> = statement
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();
    let rows = statement.query().fetch_all(pool).await?;

    let mut cells: Vec<Vec<Cell>> = names
        .iter()
        .map(|_| Vec::with_capacity(rows.len()))
        .collect();
    for row in &rows {
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(read_cell(row, idx)?);
        }
    }

    let columns: Vec<Column> = names
        .iter()
        .zip(cells)
        .map(|(name, column)| build_column(name, column))
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Reads a whole table in insertion order.
pub async fn read_table(pool: &DbPool, table: &str) -> Result<DataFrame> {
    let sql = format!("SELECT * FROM {} ORDER BY rowid", quote_identifier(table));
    read_query(pool, &sql).await
}

pub async fn table_exists(pool: &DbPool, table: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

pub async fn row_count(pool: &DbPool, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(count)
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

fn read_cell(row: &SqliteRow, idx: usize) -> Result<Cell> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Cell::Null);
    }
    let storage = raw.type_info().name().to_ascii_uppercase();

    let cell = if storage.contains("INT") || storage.contains("BOOL") {
        Cell::Integer(row.try_get_unchecked::<i64, _>(idx)?)
    } else if ["REAL", "FLOA", "DOUB", "NUMERIC"]
        .iter()
        .any(|marker| storage.contains(marker))
    {
        Cell::Real(row.try_get_unchecked::<f64, _>(idx)?)
    } else if storage.contains("BLOB") {
        let bytes: Vec<u8> = row.try_get_unchecked(idx)?;
        Cell::Text(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        Cell::Text(row.try_get_unchecked::<String, _>(idx)?)
    };
    Ok(cell)
}

fn build_column(name: &str, cells: Vec<Cell>) -> Column {
    let has_text = cells.iter().any(|cell| matches!(cell, Cell::Text(_)));
    let has_real = cells.iter().any(|cell| matches!(cell, Cell::Real(_)));
    let has_integer = cells.iter().any(|cell| matches!(cell, Cell::Integer(_)));

    let series = if has_text {
        let values: Vec<Option<String>> = cells
            .into_iter()
            .map(|cell| match cell {
                Cell::Null => None,
                Cell::Integer(v) => Some(v.to_string()),
                Cell::Real(v) => Some(v.to_string()),
                Cell::Text(v) => Some(v),
            })
            .collect();
        let refs: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
        Series::new(name.into(), refs)
    } else if has_integer && !has_real {
        let values: Vec<Option<i64>> = cells
            .into_iter()
            .map(|cell| match cell {
                Cell::Integer(v) => Some(v),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values)
    } else {
        let values: Vec<Option<f64>> = cells
            .into_iter()
            .map(|cell| match cell {
                Cell::Integer(v) => Some(v as f64),
                Cell::Real(v) => Some(v),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values)
    };

    series.into()
}

#[cfg(test)]
mod tests {
    use polars::prelude::DataType;

    use super::{build_column, quote_identifier, Cell};

    #[test]
    fn quotes_embedded_quotes() {
        assert_eq!(quote_identifier("vendor\"s"), "\"vendor\"\"s\"");
        assert_eq!(quote_identifier("sales"), "\"sales\"");
    }

    #[test]
    fn mixed_numeric_cells_widen_to_float() {
        let column = build_column("x", vec![Cell::Integer(1), Cell::Real(2.5), Cell::Null]);
        assert_eq!(column.dtype(), &DataType::Float64);
        assert_eq!(column.null_count(), 1);
    }

    #[test]
    fn all_null_cells_are_float() {
        let column = build_column("x", vec![Cell::Null, Cell::Null]);
        assert_eq!(column.dtype(), &DataType::Float64);
    }

    #[test]
    fn text_wins_over_numbers() {
        let column = build_column("x", vec![Cell::Integer(7), Cell::Text("a".into())]);
        let values = column.str().unwrap();
        assert_eq!(values.get(0), Some("7"));
        assert_eq!(values.get(1), Some("a"));
    }
}
