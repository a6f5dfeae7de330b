use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::{Result, WargaError};
use crate::models::Resident;

pub const DEFAULT_OCCUPANCY: &str = "dihuni";

/// Fields an admin supplies when registering or editing a resident.
#[derive(Debug, Clone)]
pub struct ResidentForm {
    pub username: String,
    pub full_name: String,
    pub house_number: Option<String>,
    pub phone: Option<String>,
    pub occupancy_status: Option<String>,
}

const RESIDENT_COLUMNS: &str =
    "id, username, full_name, house_number, phone, COALESCE(occupancy_status, 'dihuni')";

fn resident_from_row(row: &Row<'_>) -> rusqlite::Result<Resident> {
    Ok(Resident {
        id: row.get(0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
        house_number: row.get(3)?,
        phone: row.get(4)?,
        occupancy_status: row.get(5)?,
    })
}

/// Residents whose name or house number contains `search`.
pub fn list_residents(conn: &Connection, search: &str) -> Result<Vec<Resident>> {
    let pattern = format!("%{}%", search.trim());
    let sql = format!(
        "SELECT {RESIDENT_COLUMNS} FROM users \
         WHERE role = 'resident' AND (full_name LIKE ?1 OR COALESCE(house_number, '') LIKE ?1) \
         ORDER BY house_number ASC, full_name ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([&pattern], resident_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every resident, ordered by house number.
pub fn residents_by_house(conn: &Connection) -> Result<Vec<Resident>> {
    list_residents(conn, "")
}

pub fn count_residents(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT count(*) FROM users WHERE role = 'resident'",
        [],
        |r| r.get(0),
    )?)
}

pub fn get_resident(conn: &Connection, id: i64) -> Result<Resident> {
    let sql = format!("SELECT {RESIDENT_COLUMNS} FROM users WHERE id = ?1 AND role = 'resident'");
    conn.query_row(&sql, [id], resident_from_row)
        .optional()?
        .ok_or_else(|| WargaError::NotFound(format!("Resident {id}")))
}

pub fn find_resident(conn: &Connection, username: &str) -> Result<Resident> {
    let sql =
        format!("SELECT {RESIDENT_COLUMNS} FROM users WHERE username = ?1 AND role = 'resident'");
    conn.query_row(&sql, [username], resident_from_row)
        .optional()?
        .ok_or_else(|| WargaError::NotFound(format!("Resident {username}")))
}

fn username_taken(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub fn add_resident(conn: &Connection, form: &ResidentForm) -> Result<i64> {
    let occupancy = form
        .occupancy_status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_OCCUPANCY);
    conn.execute(
        "INSERT INTO users (username, role, full_name, house_number, phone, occupancy_status) \
         VALUES (?1, 'resident', ?2, ?3, ?4, ?5)",
        rusqlite::params![form.username, form.full_name, form.house_number, form.phone, occupancy],
    )
    .map_err(|e| {
        if username_taken(&e) {
            WargaError::Other(format!("Username {} is already taken", form.username))
        } else {
            e.into()
        }
    })?;
    let id = conn.last_insert_rowid();
    tracing::info!(resident_id = id, username = %form.username, "added resident");
    Ok(id)
}

pub fn update_resident(conn: &Connection, id: i64, form: &ResidentForm) -> Result<()> {
    let occupancy = form
        .occupancy_status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_OCCUPANCY);
    let updated = conn
        .execute(
            "UPDATE users SET username = ?1, full_name = ?2, house_number = ?3, phone = ?4, occupancy_status = ?5 \
             WHERE id = ?6 AND role = 'resident'",
            rusqlite::params![form.username, form.full_name, form.house_number, form.phone, occupancy, id],
        )
        .map_err(|e| {
            if username_taken(&e) {
                WargaError::Other(format!("Username {} is already taken", form.username))
            } else {
                e.into()
            }
        })?;
    if updated == 0 {
        return Err(WargaError::NotFound(format!("Resident {id}")));
    }
    tracing::info!(resident_id = id, "updated resident");
    Ok(())
}

pub fn delete_resident(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM users WHERE id = ?1 AND role = 'resident'", [id])?;
    if deleted == 0 {
        return Err(WargaError::NotFound(format!("Resident {id}")));
    }
    tracing::info!(resident_id = id, "deleted resident");
    Ok(())
}

#[cfg(test)]
pub(crate) fn form(username: &str, full_name: &str, house: &str) -> ResidentForm {
    ResidentForm {
        username: username.to_string(),
        full_name: full_name.to_string(),
        house_number: Some(house.to_string()),
        phone: None,
        occupancy_status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_add_and_list_ordered_by_house() {
        let (_dir, conn) = test_db();
        add_resident(&conn, &form("citra", "Citra", "B-01")).unwrap();
        add_resident(&conn, &form("adi", "Adi", "A-02")).unwrap();
        add_resident(&conn, &form("bayu", "Bayu", "A-01")).unwrap();
        let names: Vec<String> = residents_by_house(&conn)
            .unwrap()
            .into_iter()
            .map(|r| r.full_name)
            .collect();
        assert_eq!(names, vec!["Bayu", "Adi", "Citra"]);
        assert_eq!(count_residents(&conn).unwrap(), 3);
    }

    #[test]
    fn test_occupancy_defaults_to_dihuni() {
        let (_dir, conn) = test_db();
        let id = add_resident(&conn, &form("adi", "Adi", "A-02")).unwrap();
        assert_eq!(get_resident(&conn, id).unwrap().occupancy_status, "dihuni");
    }

    #[test]
    fn test_search_matches_name_or_house() {
        let (_dir, conn) = test_db();
        add_resident(&conn, &form("adi", "Adi Nugroho", "A-02")).unwrap();
        add_resident(&conn, &form("bayu", "Bayu", "C-07")).unwrap();
        assert_eq!(list_residents(&conn, "nugroho").unwrap().len(), 1);
        assert_eq!(list_residents(&conn, "C-0").unwrap()[0].username, "bayu");
        assert!(list_residents(&conn, "zzz").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (_dir, conn) = test_db();
        add_resident(&conn, &form("adi", "Adi", "A-02")).unwrap();
        let err = add_resident(&conn, &form("adi", "Adi Lain", "A-03")).unwrap_err();
        assert!(err.to_string().contains("already taken"), "got: {err}");
    }

    #[test]
    fn test_update_and_delete() {
        let (_dir, conn) = test_db();
        let id = add_resident(&conn, &form("adi", "Adi", "A-02")).unwrap();
        let mut edited = form("adi", "Adi Saputra", "A-03");
        edited.occupancy_status = Some("kosong".to_string());
        update_resident(&conn, id, &edited).unwrap();
        let r = get_resident(&conn, id).unwrap();
        assert_eq!(r.full_name, "Adi Saputra");
        assert_eq!(r.house_number.as_deref(), Some("A-03"));
        assert_eq!(r.occupancy_status, "kosong");

        delete_resident(&conn, id).unwrap();
        assert!(matches!(get_resident(&conn, id), Err(WargaError::NotFound(_))));
        assert!(matches!(delete_resident(&conn, id), Err(WargaError::NotFound(_))));
    }

    #[test]
    fn test_admins_are_not_residents() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO users (username, role, full_name) VALUES ('admin', 'admin', 'Pengurus')",
            [],
        )
        .unwrap();
        let admin_id = conn.last_insert_rowid();
        assert!(residents_by_house(&conn).unwrap().is_empty());
        assert!(delete_resident(&conn, admin_id).is_err());
        assert!(find_resident(&conn, "admin").is_err());
    }
}
