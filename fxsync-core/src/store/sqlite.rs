//! SQLite implementation of the rate store.
//!
//! Layout per table: `exchange_date DATE` (text, `YYYY-MM-DD`) followed by one
//! `FLOAT` column per currency code. Identifiers are validated by the domain
//! types and always double-quoted.

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::fs;
use std::path::{Path, PathBuf};

use super::{RateStore, StoreError};
use crate::domain::{ColumnSet, CurrencyCode, RateRow, RowBatch, TableId, DATE_COLUMN, DATE_FORMAT};

pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn require_table(&self, table: &TableId) -> Result<(), StoreError> {
        if self.table_exists(table)? {
            Ok(())
        } else {
            Err(StoreError::TableNotFound(table.to_string()))
        }
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn column_list(columns: &ColumnSet) -> Vec<String> {
    std::iter::once(quote(DATE_COLUMN))
        .chain(columns.currencies().iter().map(|c| quote(c.as_str())))
        .collect()
}

fn parse_date(table: &TableId, value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| StoreError::InvalidDate {
        table: table.to_string(),
        value: value.to_string(),
    })
}

impl RateStore for SqliteStore {
    fn table_exists(&self, table: &TableId) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn create_table(&self, table: &TableId, columns: &ColumnSet) -> Result<(), StoreError> {
        if self.table_exists(table)? {
            return Err(StoreError::TableAlreadyExists(table.to_string()));
        }

        let mut defs = vec![format!("{} DATE", quote(DATE_COLUMN))];
        defs.extend(
            columns
                .currencies()
                .iter()
                .map(|c| format!("{} FLOAT", quote(c.as_str()))),
        );
        let sql = format!("CREATE TABLE {} ({})", quote(table.as_str()), defs.join(", "));
        self.conn.execute(&sql, [])?;

        tracing::debug!(table = %table, columns = columns.len(), "created rate table");
        Ok(())
    }

    fn table_columns(&self, table: &TableId) -> Result<ColumnSet, StoreError> {
        self.require_table(table)?;

        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote(table.as_str())))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut currencies = Vec::with_capacity(names.len());
        for name in names.into_iter().filter(|n| n != DATE_COLUMN) {
            let code = CurrencyCode::new(&name).map_err(|_| StoreError::UnexpectedColumn {
                table: table.to_string(),
                column: name.clone(),
            })?;
            currencies.push(code);
        }
        Ok(ColumnSet::new(currencies))
    }

    fn max_exchange_date(&self, table: &TableId) -> Result<Option<NaiveDate>, StoreError> {
        let sql = format!(
            "SELECT max({}) FROM {}",
            quote(DATE_COLUMN),
            quote(table.as_str())
        );
        let raw: Option<String> = self.conn.query_row(&sql, [], |row| row.get(0))?;
        raw.map(|text| parse_date(table, &text)).transpose()
    }

    fn append_rows(&self, table: &TableId, batch: &RowBatch) -> Result<usize, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let columns = column_list(batch.columns());
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(table.as_str()),
            columns.join(", "),
            placeholders.join(", ")
        );

        // One transaction per batch: either every row lands or none does.
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in batch.rows() {
                let mut values = Vec::with_capacity(row.values.len() + 1);
                values.push(Value::Text(row.date_text()));
                values.extend(row.values.iter().map(|v| match v {
                    Some(rate) => Value::Real(*rate),
                    None => Value::Null,
                }));
                stmt.execute(params_from_iter(values.iter()))?;
            }
        }
        tx.commit()?;

        Ok(batch.len())
    }

    fn read_table(&self, table: &TableId) -> Result<RowBatch, StoreError> {
        let columns = self.table_columns(table)?;
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            column_list(&columns).join(", "),
            quote(table.as_str()),
            quote(DATE_COLUMN)
        );

        let width = columns.len();
        let mut batch = RowBatch::new(columns);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let date_text: String = row.get(0)?;
            let date = parse_date(table, &date_text)?;
            let values = (1..=width)
                .map(|i| row.get::<_, Option<f64>>(i))
                .collect::<Result<Vec<_>, _>>()?;
            batch.push(RateRow { date, values })?;
        }
        Ok(batch)
    }

    fn row_count(&self, table: &TableId) -> Result<usize, StoreError> {
        self.require_table(table)?;
        let sql = format!("SELECT count(*) FROM {}", quote(table.as_str()));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    fn cols(codes: &[&str]) -> ColumnSet {
        ColumnSet::new(codes.iter().map(|c| code(c)).collect())
    }

    fn table() -> TableId {
        TableId::for_prefix("dollar").unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn batch(columns: ColumnSet, rows: &[(u32, Vec<Option<f64>>)]) -> RowBatch {
        let mut batch = RowBatch::new(columns);
        for (d, values) in rows {
            batch
                .push(RateRow {
                    date: date(*d),
                    values: values.clone(),
                })
                .unwrap();
        }
        batch
    }

    #[test]
    fn create_then_describe() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(!store.table_exists(&table()).unwrap());

        store.create_table(&table(), &cols(&["brl", "eur", "1inch"])).unwrap();

        assert!(store.table_exists(&table()).unwrap());
        assert_eq!(store.table_columns(&table()).unwrap(), cols(&["brl", "eur", "1inch"]));
        assert_eq!(store.row_count(&table()).unwrap(), 0);
    }

    #[test]
    fn create_twice_reports_existing_table() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_table(&table(), &cols(&["eur"])).unwrap();
        let err = store.create_table(&table(), &cols(&["eur"])).unwrap_err();
        assert!(matches!(err, StoreError::TableAlreadyExists(_)));
    }

    #[test]
    fn max_date_of_empty_table_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_table(&table(), &cols(&["eur"])).unwrap();
        assert_eq!(store.max_exchange_date(&table()).unwrap(), None);
    }

    #[test]
    fn max_date_of_missing_table_is_an_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.max_exchange_date(&table()).is_err());
        assert!(matches!(
            store.table_columns(&table()).unwrap_err(),
            StoreError::TableNotFound(_)
        ));
    }

    #[test]
    fn append_and_read_back_in_date_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_table(&table(), &cols(&["eur", "jpy"])).unwrap();

        let written = store
            .append_rows(
                &table(),
                &batch(
                    cols(&["eur", "jpy"]),
                    &[(3, vec![Some(0.91), None]), (1, vec![Some(0.9), Some(151.0)])],
                ),
            )
            .unwrap();
        assert_eq!(written, 2);

        let back = store.read_table(&table()).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.rows()[0].date, date(1));
        assert_eq!(back.rows()[0].values, vec![Some(0.9), Some(151.0)]);
        assert_eq!(back.rows()[1].values, vec![Some(0.91), None]);
        assert_eq!(store.max_exchange_date(&table()).unwrap(), Some(date(3)));
    }

    #[test]
    fn append_subset_of_columns_leaves_others_null() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_table(&table(), &cols(&["eur", "gbp"])).unwrap();
        store
            .append_rows(&table(), &batch(cols(&["gbp"]), &[(2, vec![Some(0.8)])]))
            .unwrap();

        let back = store.read_table(&table()).unwrap();
        assert_eq!(back.rows()[0].values, vec![None, Some(0.8)]);
    }

    #[test]
    fn append_is_atomic_per_batch() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_table(&table(), &cols(&["eur"])).unwrap();
        // Second column does not exist: the insert statement fails to prepare.
        let bad = batch(cols(&["eur", "zzz"]), &[(1, vec![Some(1.0), Some(2.0)])]);
        assert!(store.append_rows(&table(), &bad).is_err());
        assert_eq!(store.row_count(&table()).unwrap(), 0);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/db/rates.db");
        let store = SqliteStore::open(&path).unwrap();
        store.create_table(&table(), &cols(&["eur"])).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), Some(path.as_path()));
    }
}
