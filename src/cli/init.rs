use std::path::PathBuf;

use crate::admins::{add_admin, count_admins};
use crate::db::{get_connection, init_db, set_metadata};
use crate::error::Result;
use crate::settings::{db_path, load_settings, save_settings, shellexpand_path};
use crate::storage::uploads_dir;

pub const DEFAULT_ADMIN: &str = "admin";

pub fn run(data_dir: Option<String>, community: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(uploads_dir(&resolved))?;
    std::fs::create_dir_all(resolved.join("exports"))?;
    std::fs::create_dir_all(resolved.join("backups"))?;

    let conn = get_connection(&db_path(&resolved))?;
    init_db(&conn)?;

    if count_admins(&conn)? == 0 {
        add_admin(&conn, DEFAULT_ADMIN, "Administrator")?;
        println!("Created administrator '{DEFAULT_ADMIN}'.");
    }
    if let Some(name) = community.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        set_metadata(&conn, "community_name", name)?;
    }
    if settings.user_name.is_empty() {
        settings.user_name = DEFAULT_ADMIN.to_string();
    }
    save_settings(&settings)?;

    println!("Initialized warga at {}", resolved.display());
    println!("Acting as: {}", settings.user_name);
    Ok(())
}
