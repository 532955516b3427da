// SQLite-backed expense store

use crate::model::{Category, ExpenseRecord, ISO_DATE};
use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{params, types::Type, Connection};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Default store file, created in the working directory on first use.
pub const DB_FILE: &str = "finance.db";

/// Storage-level failures. Fatal for the operation in progress; no retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open store at '{path}': {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },

    #[error("storage unavailable: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Outcome of a single insert. A duplicate is a normal result, not an error,
/// so callers can tell the user the record already existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    DuplicateSkipped,
}

/// Outcome of a batch insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    pub inserted: usize,
    pub skipped: usize,
}

/// Owner of the persisted expense collection. Holds one long-lived
/// connection behind a mutex; the deployment model assumes a single writer
/// per store file, and the UNIQUE index on the dedup hash makes the
/// duplicate check atomic regardless.
pub struct ExpenseStore {
    conn: Mutex<Connection>,
}

impl ExpenseStore {
    /// Open (or create) the store file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        init(&conn)?;
        Ok(ExpenseStore {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init(&conn)?;
        Ok(ExpenseStore {
            conn: Mutex::new(conn),
        })
    }

    /// Insert one record; an identical (date, amount, category, note) tuple
    /// already in the store yields `DuplicateSkipped` and no mutation.
    pub fn add(&self, record: &ExpenseRecord) -> Result<AddOutcome, StoreError> {
        let conn = self.conn.lock();
        let outcome = insert_record(&conn, record)?;
        debug!(?outcome, date = %record.date_string(), "add expense");
        Ok(outcome)
    }

    /// Insert a batch with the same per-record semantics as `add`, inside a
    /// single transaction: either the whole batch lands (duplicates skipped)
    /// or, on a storage failure, none of it does.
    pub fn add_batch(&self, records: &[ExpenseRecord]) -> Result<BatchOutcome, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let mut outcome = BatchOutcome::default();
        for record in records {
            match insert_record(&tx, record)? {
                AddOutcome::Inserted => outcome.inserted += 1,
                AddOutcome::DuplicateSkipped => outcome.skipped += 1,
            }
        }

        tx.commit()?;
        debug!(
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            "batch insert"
        );
        Ok(outcome)
    }

    /// Full re-read, newest date first. Ties are broken by row id ascending,
    /// which is insertion order.
    pub fn list(&self) -> Result<Vec<ExpenseRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT date, amount, category, note FROM expenses
             ORDER BY date DESC, id ASC",
        )?;

        let records = stmt
            .query_map([], |row| {
                let date_str: String = row.get(0)?;
                let category_str: String = row.get(2)?;

                let date = NaiveDate::parse_from_str(&date_str, ISO_DATE).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
                })?;
                let category: Category = category_str.parse().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                })?;

                Ok(ExpenseRecord {
                    date,
                    amount: row.get(1)?,
                    category,
                    note: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Remove every row matching the full tuple (zero or one under the
    /// dedup invariant). Returns the number removed; deleting a tuple that
    /// is not present is not an error.
    pub fn delete(&self, record: &ExpenseRecord) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM expenses
             WHERE date = ?1 AND amount = ?2 AND category = ?3 AND note = ?4",
            params![
                record.date_string(),
                record.amount,
                record.category.as_str(),
                record.note
            ],
        )?;
        debug!(removed, date = %record.date_string(), "delete expense");
        Ok(removed)
    }

    /// Remove all records unconditionally. Returns the number removed.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM expenses", [])?;
        debug!(removed, "clear store");
        Ok(removed)
    }

    /// Current row count.
    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Idempotent schema setup; safe to run on every open.
fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dedup_hash TEXT UNIQUE NOT NULL,
            date TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)",
        [],
    )?;

    Ok(())
}

/// Insert or skip. The UNIQUE index on dedup_hash is the duplicate check;
/// a constraint violation means the tuple already exists.
fn insert_record(conn: &Connection, record: &ExpenseRecord) -> Result<AddOutcome, StoreError> {
    let result = conn.execute(
        "INSERT INTO expenses (dedup_hash, date, amount, category, note)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.dedup_hash(),
            record.date_string(),
            record.amount,
            record.category.as_str(),
            record.note
        ],
    );

    match result {
        Ok(_) => Ok(AddOutcome::Inserted),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(AddOutcome::DuplicateSkipped)
        }
        Err(e) => Err(e.into()),
    }
}
