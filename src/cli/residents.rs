use chrono::Datelike;
use comfy_table::{Cell, Table};

use crate::arrears::{resolve_status, PaidMonths};
use crate::error::Result;
use crate::models::Resident;
use crate::payments::approved_months;
use crate::residents::{
    add_resident, delete_resident, find_resident, get_resident, list_residents, update_resident,
    ResidentForm,
};

use super::{today, Session};

/// Fields given on `residents update`; `None` keeps the stored value.
pub struct ResidentChanges {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub house_number: Option<String>,
    pub phone: Option<String>,
    pub occupancy_status: Option<String>,
}

impl ResidentChanges {
    fn apply(self, current: Resident) -> ResidentForm {
        ResidentForm {
            username: self.username.unwrap_or(current.username),
            full_name: self.full_name.unwrap_or(current.full_name),
            house_number: self.house_number.or(current.house_number),
            phone: self.phone.or(current.phone),
            occupancy_status: Some(self.occupancy_status.unwrap_or(current.occupancy_status)),
        }
    }
}

pub fn list(as_user: Option<&str>, search: &str) -> Result<()> {
    let session = Session::admin(as_user)?;
    let residents = list_residents(&session.conn, search)?;
    if residents.is_empty() {
        println!("No residents found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "House", "Name", "Username", "Phone", "Occupancy"]);
    for r in &residents {
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(r.house_number.as_deref().unwrap_or("-")),
            Cell::new(&r.full_name),
            Cell::new(&r.username),
            Cell::new(r.phone.as_deref().unwrap_or("")),
            Cell::new(&r.occupancy_status),
        ]);
    }
    println!("Residents ({})\n{table}", residents.len());
    Ok(())
}

pub fn add(as_user: Option<&str>, form: ResidentForm) -> Result<()> {
    let session = Session::admin(as_user)?;
    let id = add_resident(&session.conn, &form)?;
    println!("Added resident {id}: {} ({})", form.full_name, form.username);
    Ok(())
}

/// `key` is a resident ID or a username.
pub fn show(as_user: Option<&str>, key: &str) -> Result<()> {
    let session = Session::admin(as_user)?;
    let today = today();
    let resident = match key.trim().parse::<i64>() {
        Ok(id) => get_resident(&session.conn, id)?,
        Err(_) => find_resident(&session.conn, key.trim())?,
    };
    let approved = approved_months(&session.conn, Some(resident.id), today.year())?;
    let statuses = resolve_status(&PaidMonths::from_payments(&approved), today);

    println!("Name:       {}", resident.full_name);
    println!("Username:   {}", resident.username);
    println!("House:      {}", resident.house_number.as_deref().unwrap_or("-"));
    println!("Phone:      {}", resident.phone.as_deref().unwrap_or("-"));
    println!("Occupancy:  {}", resident.occupancy_status);
    let labels: Vec<&str> = statuses.iter().map(|s| s.label()).collect();
    println!("Dues:       {}", labels.join(", "));
    Ok(())
}

pub fn update(as_user: Option<&str>, id: i64, changes: ResidentChanges) -> Result<()> {
    let session = Session::admin(as_user)?;
    let current = get_resident(&session.conn, id)?;
    update_resident(&session.conn, id, &changes.apply(current))?;
    println!("Updated resident {id}");
    Ok(())
}

pub fn delete(as_user: Option<&str>, id: i64) -> Result<()> {
    let session = Session::admin(as_user)?;
    delete_resident(&session.conn, id)?;
    println!("Deleted resident {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_keep_unset_fields() {
        let current = Resident {
            id: 4,
            username: "sari".to_string(),
            full_name: "Sari".to_string(),
            house_number: Some("B-2".to_string()),
            phone: Some("0812".to_string()),
            occupancy_status: "kontrak".to_string(),
        };
        let changes = ResidentChanges {
            username: None,
            full_name: Some("Sari Dewi".to_string()),
            house_number: None,
            phone: None,
            occupancy_status: None,
        };
        let form = changes.apply(current);
        assert_eq!(form.username, "sari");
        assert_eq!(form.full_name, "Sari Dewi");
        assert_eq!(form.house_number.as_deref(), Some("B-2"));
        assert_eq!(form.occupancy_status.as_deref(), Some("kontrak"));
    }
}
