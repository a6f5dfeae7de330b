use crate::auth::find_principal;
use crate::error::Result;
use crate::settings::{get_data_dir, load_settings, save_settings};

use super::open_db;

pub fn run(username: &str) -> Result<()> {
    let conn = open_db(&get_data_dir())?;
    let principal = find_principal(&conn, username.trim())?;

    let mut settings = load_settings();
    settings.user_name = principal.username.clone();
    save_settings(&settings)?;

    println!(
        "Acting as {} ({}, {})",
        principal.username,
        principal.full_name,
        principal.role.as_str()
    );
    Ok(())
}
