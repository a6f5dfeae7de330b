use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;

/// Storage format for every timestamp column.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL CHECK (role IN ('admin', 'resident')),
    full_name TEXT NOT NULL,
    house_number TEXT,
    phone TEXT,
    occupancy_status TEXT DEFAULT 'dihuni',
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS payments (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    month_paid_for TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved', 'rejected')),
    proof_image TEXT,
    housing_amount INTEGER NOT NULL DEFAULT 0,
    social_amount INTEGER NOT NULL DEFAULT 0,
    rt_amount INTEGER NOT NULL DEFAULT 0,
    amount INTEGER NOT NULL DEFAULT 0,
    submitted_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS mutations (
    id INTEGER PRIMARY KEY,
    type TEXT NOT NULL CHECK (type IN ('in', 'out')),
    amount INTEGER NOT NULL,
    description TEXT NOT NULL,
    category TEXT,
    fund_type TEXT,
    date TEXT NOT NULL,
    proof_image TEXT,
    payment_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (payment_id) REFERENCES payments(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_mutations_date ON mutations(date);
CREATE INDEX IF NOT EXISTS idx_payments_user ON payments(user_id, status);

CREATE TABLE IF NOT EXISTS announcements (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'umum',
    date_created TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

// (key, default monthly amount in rupiah)
const DEFAULT_DUES: &[(&str, &str)] = &[
    ("housing_dues", "50000"),
    ("social_dues", "20000"),
    ("rt_dues", "10000"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    for (key, value) in DEFAULT_DUES {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, value],
        )?;
    }
    Ok(())
}

pub fn get_metadata(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| row.get(0))
        .optional()
        .ok()
        .flatten()
}

pub fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

/// Parse a stored timestamp. Accepts the storage format, ISO `T`-separated
/// timestamps and bare dates (read as midnight).
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["users", "payments", "mutations", "announcements", "settings", "metadata"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        conn.execute("UPDATE settings SET value = '75000' WHERE key = 'housing_dues'", [])
            .unwrap();
        init_db(&conn).unwrap();
        let value: String = conn
            .query_row("SELECT value FROM settings WHERE key = 'housing_dues'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(value, "75000", "re-running init must not reset dues");
    }

    #[test]
    fn test_init_db_seeds_dues() {
        let (_dir, conn) = test_db();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM settings WHERE key LIKE '%_dues'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_metadata_roundtrip() {
        let (_dir, conn) = test_db();
        assert_eq!(get_metadata(&conn, "community_name"), None);
        set_metadata(&conn, "community_name", "Griya Asri").unwrap();
        set_metadata(&conn, "community_name", "Griya Asri RT 05").unwrap();
        assert_eq!(get_metadata(&conn, "community_name").as_deref(), Some("Griya Asri RT 05"));
    }

    #[test]
    fn test_mutation_type_is_checked() {
        let (_dir, conn) = test_db();
        let result = conn.execute(
            "INSERT INTO mutations (type, amount, description, date) VALUES ('sideways', 1, 'x', '2024-01-01')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let full = parse_datetime("2024-03-05 14:30:00").unwrap();
        assert_eq!(format_datetime(&full), "2024-03-05 14:30:00");
        let iso = parse_datetime("2024-03-05T14:30:00").unwrap();
        assert_eq!(iso, full);
        let bare = parse_datetime("2024-03-05").unwrap();
        assert_eq!(format_datetime(&bare), "2024-03-05 00:00:00");
        assert!(parse_datetime("05/03/2024").is_none());
        assert!(parse_datetime("").is_none());
    }
}
