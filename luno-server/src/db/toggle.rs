//! Insert-if-absent over the storage layer's uniqueness constraints.
//!
//! Toggle operations never lock: a duplicate insert is swallowed by
//! `INSERT OR IGNORE` and reported as [`InsertOutcome::AlreadyPresent`], and a
//! dangling reference is reported as [`InsertOutcome::MissingReference`]
//! instead of an error.

use anyhow::{Context, Result};
use rusqlite::{ffi, Connection, Params};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
    /// A foreign key pointed at a row that does not exist
    MissingReference,
}

/// Run a single-row insert and classify the result.
///
/// `sql` should use `INSERT OR IGNORE` when the row is keyed by a uniqueness
/// constraint; foreign-key failures are never ignored by SQLite and come back
/// as `MissingReference`.
pub fn insert_if_absent<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<InsertOutcome> {
    match conn.execute(sql, params) {
        Ok(0) => Ok(InsertOutcome::AlreadyPresent),
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            Ok(InsertOutcome::MissingReference)
        }
        Err(e) => Err(e).context("Failed to insert row"),
    }
}
