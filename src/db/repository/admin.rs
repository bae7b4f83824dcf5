use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::Admin;

pub fn insert_admin(conn: &Connection, username: &str, password_hash: &str) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO admins (username, password_hash) VALUES (?1, ?2)",
        params![username, password_hash],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_admin_by_username(conn: &Connection, username: &str) -> Result<Option<Admin>, DatabaseError> {
    let admin = conn
        .query_row(
            "SELECT id, username, password_hash FROM admins WHERE username = ?1",
            params![username],
            |row| {
                Ok(Admin {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(admin)
}
