use crate::admins::count_admins;
use crate::auth::find_principal;
use crate::db::{get_connection, get_metadata};
use crate::error::Result;
use crate::fmt::{format_bytes, rupiah};
use crate::funds::{summarize, Period};
use crate::ledger::{count_mutations, list_mutations};
use crate::payments::count_pending;
use crate::residents::count_residents;
use crate::settings::{db_path, load_settings};

pub fn run(as_user: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db = db_path(&data_dir);
    let user = as_user.unwrap_or(&settings.user_name);

    println!("User:       {}", if user.is_empty() { "(not set)" } else { user });
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db.display());

    if db.exists() {
        let size = std::fs::metadata(&db)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db)?;

        if !user.is_empty() {
            let role = match find_principal(&conn, user) {
                Ok(p) => p.role.as_str().to_string(),
                Err(_) => "(unknown user)".to_string(),
            };
            println!("Role:       {role}");
        }
        let community = get_metadata(&conn, "community_name");
        println!("Community:  {}", community.as_deref().unwrap_or("(not set)"));

        let balance = summarize(&list_mutations(&conn, &Period::All)?, &Period::All).total.balance;

        println!();
        println!("Residents:         {}", count_residents(&conn)?);
        println!("Admins:            {}", count_admins(&conn)?);
        println!("Pending payments:  {}", count_pending(&conn)?);
        println!("Mutations:         {}", count_mutations(&conn)?);
        println!("Total balance:     {}", rupiah(balance));
    } else {
        println!();
        println!("Database not found. Run `warga init` to set up.");
    }

    Ok(())
}
