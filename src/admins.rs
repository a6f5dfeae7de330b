use rusqlite::Connection;

use crate::auth::Principal;
use crate::error::{Result, WargaError};
use crate::models::Admin;

pub fn list_admins(conn: &Connection) -> Result<Vec<Admin>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, full_name FROM users WHERE role = 'admin' ORDER BY username ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Admin {
                id: row.get(0)?,
                username: row.get(1)?,
                full_name: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_admins(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT count(*) FROM users WHERE role = 'admin'", [], |r| r.get(0))?)
}

pub fn add_admin(conn: &Connection, username: &str, full_name: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, role, full_name) VALUES (?1, 'admin', ?2)",
        rusqlite::params![username, full_name],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            WargaError::Other(format!("Username {username} is already taken"))
        }
        other => other.into(),
    })?;
    let id = conn.last_insert_rowid();
    tracing::info!(admin_id = id, username, "added admin");
    Ok(id)
}

/// Remove another administrator. Acting admins cannot remove themselves.
pub fn delete_admin(conn: &Connection, actor: &Principal, id: i64) -> Result<()> {
    if actor.user_id == id {
        return Err(WargaError::SelfDeletion);
    }
    let deleted = conn.execute("DELETE FROM users WHERE id = ?1 AND role = 'admin'", [id])?;
    if deleted == 0 {
        return Err(WargaError::NotFound(format!("Admin {id}")));
    }
    tracing::info!(admin_id = id, by = %actor.username, "deleted admin");
    Ok(())
}
