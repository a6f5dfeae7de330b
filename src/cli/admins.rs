use comfy_table::{Cell, Table};

use crate::admins::{add_admin, delete_admin, list_admins};
use crate::error::Result;

use super::Session;

pub fn list(as_user: Option<&str>) -> Result<()> {
    let session = Session::admin(as_user)?;
    let admins = list_admins(&session.conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Username", "Name"]);
    for a in &admins {
        let username = if a.id == session.principal.user_id {
            format!("{} (you)", a.username)
        } else {
            a.username.clone()
        };
        table.add_row(vec![Cell::new(a.id), Cell::new(username), Cell::new(&a.full_name)]);
    }
    println!("Administrators\n{table}");
    Ok(())
}

pub fn add(as_user: Option<&str>, username: &str, full_name: &str) -> Result<()> {
    let session = Session::admin(as_user)?;
    let id = add_admin(&session.conn, username, full_name)?;
    println!("Added administrator {id}: {username}");
    Ok(())
}

pub fn delete(as_user: Option<&str>, id: i64) -> Result<()> {
    let session = Session::admin(as_user)?;
    delete_admin(&session.conn, &session.principal, id)?;
    println!("Deleted administrator {id}");
    Ok(())
}
