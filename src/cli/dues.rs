use comfy_table::{Cell, CellAlignment, Table};

use crate::dues::{get_rates, monthly_total, update_rates};
use crate::error::Result;
use crate::fmt::rupiah;
use crate::ledger::parse_amount;
use crate::models::FundType;

use super::Session;

pub fn show(as_user: Option<&str>) -> Result<()> {
    let session = Session::admin(as_user)?;
    let rates = get_rates(&session.conn)?;

    let mut table = Table::new();
    table.set_header(vec!["Fund", "Monthly dues"]);
    for fund in FundType::ALL {
        table.add_row(vec![
            Cell::new(fund.label()),
            Cell::new(rupiah(*rates.get(fund))).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(rupiah(monthly_total(&rates))).set_alignment(CellAlignment::Right),
    ]);
    println!("Dues\n{table}");
    Ok(())
}

pub fn set(as_user: Option<&str>, housing: Option<&str>, social: Option<&str>, rt: Option<&str>) -> Result<()> {
    let session = Session::admin(as_user)?;
    let mut rates = get_rates(&session.conn)?;
    for (fund, raw) in [(FundType::Housing, housing), (FundType::Social, social), (FundType::Rt, rt)] {
        if let Some(raw) = raw {
            *rates.get_mut(fund) = parse_amount(raw)?;
        }
    }
    update_rates(&session.conn, &rates)?;
    println!("Monthly dues now {} per household.", rupiah(monthly_total(&rates)));
    Ok(())
}
