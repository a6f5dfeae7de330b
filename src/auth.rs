use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, WargaError};
use crate::models::Role;

/// The user a command acts on behalf of.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn find_principal(conn: &Connection, username: &str) -> Result<Principal> {
    let row: Option<(i64, String, String, String)> = conn
        .query_row(
            "SELECT id, username, full_name, role FROM users WHERE username = ?1",
            [username],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;
    let (user_id, username, full_name, role) =
        row.ok_or_else(|| WargaError::UnknownUser(username.to_string()))?;
    let role = Role::parse(&role)
        .ok_or_else(|| WargaError::Other(format!("User {username} has an unknown role: {role}")))?;
    Ok(Principal {
        user_id,
        username,
        full_name,
        role,
    })
}

pub fn require_admin(principal: &Principal) -> Result<()> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(WargaError::Forbidden(format!(
            "{} is not an administrator",
            principal.username
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_find_principal_resolves_role() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO users (username, role, full_name) VALUES ('pak_rt', 'admin', 'Pak RT')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO users (username, role, full_name, house_number) VALUES ('budi', 'resident', 'Budi', 'A-01')",
            [],
        )
        .unwrap();

        let admin = find_principal(&conn, "pak_rt").unwrap();
        assert!(admin.is_admin());
        assert!(require_admin(&admin).is_ok());

        let resident = find_principal(&conn, "budi").unwrap();
        assert_eq!(resident.role, Role::Resident);
        assert_eq!(resident.full_name, "Budi");
        let err = require_admin(&resident).unwrap_err();
        assert!(matches!(err, WargaError::Forbidden(_)));
    }

    #[test]
    fn test_unknown_user() {
        let (_dir, conn) = test_db();
        let err = find_principal(&conn, "ghost").unwrap_err();
        assert!(matches!(err, WargaError::UnknownUser(ref u) if u == "ghost"));
    }
}
