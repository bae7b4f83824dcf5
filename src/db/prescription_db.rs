//! Prescription store: a separate database from the clinic store.
//!
//! Prescriptions live in their own storage realm: string ids, JSON
//! documents, and no foreign keys into the clinic tables. The database has
//! its own schema_version table and migration numbering.

use std::path::Path;

use rusqlite::Connection;

use super::sqlite::{apply_migrations, configure_pragmas};
use super::DatabaseError;

/// Open (or create) the prescription store and run migrations.
pub fn open_prescription_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_prescription_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory prescription store (for testing).
pub fn open_memory_prescription_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_prescription_migrations(&conn)?;
    Ok(conn)
}

fn run_prescription_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let migrations: Vec<(i64, &str)> = vec![(
        1,
        include_str!("../../resources/prescription_migrations/001_prescriptions.sql"),
    )];
    apply_migrations(conn, &migrations, "prescriptions")
}
