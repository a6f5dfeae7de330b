use rusqlite::Connection;

use crate::error::{Result, WargaError};
use crate::models::Announcement;

/// Category filter value that disables filtering.
pub const ALL_CATEGORIES: &str = "all";

pub fn list_announcements(conn: &Connection, category: &str) -> Result<Vec<Announcement>> {
    let mut sql = String::from(
        "SELECT id, title, content, category, COALESCE(date_created, '') FROM announcements",
    );
    let mut params: Vec<&str> = Vec::new();
    if category != ALL_CATEGORIES {
        sql.push_str(" WHERE category = ?1");
        params.push(category);
    }
    sql.push_str(" ORDER BY date_created DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(Announcement {
                id: row.get(0)?,
                title: row.get(1)?,
                content: row.get(2)?,
                category: row.get(3)?,
                date_created: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn create_announcement(conn: &Connection, title: &str, content: &str, category: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO announcements (title, content, category) VALUES (?1, ?2, ?3)",
        rusqlite::params![title, content, category],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(announcement_id = id, category, "created announcement");
    Ok(id)
}

pub fn delete_announcement(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM announcements WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(WargaError::NotFound(format!("Announcement {id}")));
    }
    tracing::info!(announcement_id = id, "deleted announcement");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_list_newest_first_with_category_filter() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO announcements (title, content, category, date_created) VALUES ('Kerja bakti', 'Minggu pagi', 'kegiatan', '2024-05-01 08:00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO announcements (title, content, category, date_created) VALUES ('Iuran naik', 'Mulai Juni', 'keuangan', '2024-05-10 08:00:00')",
            [],
        )
        .unwrap();
        create_announcement(&conn, "Rapat warga", "Sabtu malam", "kegiatan").unwrap();

        let all = list_announcements(&conn, ALL_CATEGORIES).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].title, "Rapat warga");
        assert_eq!(all[2].title, "Kerja bakti");

        let kegiatan = list_announcements(&conn, "kegiatan").unwrap();
        assert_eq!(kegiatan.len(), 2);
        assert!(kegiatan.iter().all(|a| a.category == "kegiatan"));
        assert!(list_announcements(&conn, "lainnya").unwrap().is_empty());
    }

    #[test]
    fn test_delete_announcement() {
        let (_dir, conn) = test_db();
        let id = create_announcement(&conn, "Info", "Isi", "umum").unwrap();
        delete_announcement(&conn, id).unwrap();
        assert!(list_announcements(&conn, ALL_CATEGORIES).unwrap().is_empty());
        assert!(matches!(delete_announcement(&conn, id), Err(WargaError::NotFound(_))));
    }
}
