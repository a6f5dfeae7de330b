use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::error::{Result, WargaError};
use crate::fmt::rupiah;
use crate::models::{Payment, PaymentStatus};
use crate::payments::{
    approve_payment, get_payment, list_payments, parse_months, payments_for_user, reject_payment,
    submit_payment,
};
use crate::storage::store_proof;

use super::Session;

fn status_cell(status: PaymentStatus) -> Cell {
    let label = status.as_str();
    Cell::new(match status {
        PaymentStatus::Pending => label.yellow(),
        PaymentStatus::Approved => label.green(),
        PaymentStatus::Rejected => label.red(),
    })
}

fn payments_table(payments: &[Payment], with_resident: bool) -> Table {
    let mut table = Table::new();
    let mut header = vec!["ID", "Submitted"];
    if with_resident {
        header.push("Resident");
    }
    header.extend(["Months", "Amount", "Status", "Proof"]);
    table.set_header(header);

    for p in payments {
        let mut cells = vec![Cell::new(p.id), Cell::new(&p.submitted_at)];
        if with_resident {
            cells.push(Cell::new(p.resident_name.as_deref().unwrap_or("?")));
        }
        cells.extend([
            Cell::new(&p.month_paid_for),
            Cell::new(rupiah(p.amount)).set_alignment(CellAlignment::Right),
            status_cell(p.status),
            Cell::new(p.proof_image.as_deref().unwrap_or("")),
        ]);
        table.add_row(cells);
    }
    table
}

pub fn submit(as_user: Option<&str>, months: &str, proof: Option<&str>) -> Result<()> {
    let session = Session::open(as_user)?;
    if session.principal.is_admin() {
        return Err(WargaError::Forbidden(
            "dues are submitted by residents; use --as <resident>".to_string(),
        ));
    }
    let months = parse_months(months)?;
    let proof_image = match proof {
        Some(path) => Some(store_proof(&session.data_dir, Path::new(path))?),
        None => None,
    };
    let id = submit_payment(&session.conn, session.principal.user_id, &months, proof_image.as_deref())?;
    let payment = get_payment(&session.conn, id)?;
    println!(
        "Submitted payment {id} for {} ({}). Waiting for approval.",
        payment.month_paid_for,
        rupiah(payment.amount)
    );
    Ok(())
}

pub fn mine(as_user: Option<&str>) -> Result<()> {
    let session = Session::open(as_user)?;
    let payments = payments_for_user(&session.conn, session.principal.user_id)?;
    if payments.is_empty() {
        println!("No payments submitted yet.");
        return Ok(());
    }
    println!("Payments for {}\n{}", session.principal.full_name, payments_table(&payments, false));
    Ok(())
}

pub fn list(as_user: Option<&str>, status: Option<&str>) -> Result<()> {
    let session = Session::admin(as_user)?;
    let status = match status {
        Some(raw) => Some(PaymentStatus::parse(raw).ok_or_else(|| {
            WargaError::Other(format!("Unknown status: {raw} (expected pending, approved or rejected)"))
        })?),
        None => None,
    };
    let payments = list_payments(&session.conn, status)?;
    if payments.is_empty() {
        println!("No payments found.");
        return Ok(());
    }
    println!("Payments\n{}", payments_table(&payments, true));
    Ok(())
}

pub fn approve(as_user: Option<&str>, id: i64) -> Result<()> {
    let session = Session::admin(as_user)?;
    let created = approve_payment(&session.conn, id)?;
    let payment = get_payment(&session.conn, id)?;
    println!(
        "Approved payment {id} ({}): {} posted across {} fund(s).",
        payment.month_paid_for,
        rupiah(payment.amount),
        created.len()
    );
    Ok(())
}

pub fn reject(as_user: Option<&str>, id: i64) -> Result<()> {
    let session = Session::admin(as_user)?;
    reject_payment(&session.conn, id)?;
    println!("Rejected payment {id}");
    Ok(())
}
