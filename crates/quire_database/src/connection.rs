//! Database connection utilities.

use crate::PersistenceResult;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use quire_error::{PersistenceError, PersistenceErrorKind};

/// Open a SQLite database and enable foreign key enforcement.
///
/// `path` is a filesystem path or `:memory:`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the pragmas fail.
#[tracing::instrument]
pub fn establish_connection(path: &str) -> PersistenceResult<SqliteConnection> {
    let mut conn = SqliteConnection::establish(path)?;

    conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        .map_err(|e| {
            PersistenceError::new(PersistenceErrorKind::Connection(format!(
                "Failed to configure connection: {}",
                e
            )))
        })?;

    tracing::debug!("Opened database");
    Ok(conn)
}
