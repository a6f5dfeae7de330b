use chrono::Datelike;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::month_abbr;
use crate::reports::{get_payment_matrix, PaymentMatrix};

use super::{today, Session};

fn matrix_table(matrix: &PaymentMatrix) -> Table {
    let mut table = Table::new();
    let mut header = vec!["House".to_string(), "Resident".to_string()];
    header.extend((1..=12).map(|m| month_abbr(m).to_string()));
    header.push("Paid".to_string());
    table.set_header(header);

    for row in &matrix.rows {
        let mut cells = vec![
            Cell::new(row.resident.house_number.as_deref().unwrap_or("-")),
            Cell::new(&row.resident.full_name),
        ];
        cells.extend(row.months.iter().map(|paid| {
            if *paid {
                Cell::new("✓".green())
            } else {
                Cell::new("·".dimmed())
            }
        }));
        cells.push(Cell::new(format!("{}/12", row.paid_count())));
        table.add_row(cells);
    }
    table
}

pub fn run(as_user: Option<&str>, year: Option<i32>) -> Result<()> {
    let session = Session::admin(as_user)?;
    let year = year.unwrap_or_else(|| today().year());
    let matrix = get_payment_matrix(&session.conn, year)?;

    if matrix.rows.is_empty() {
        println!("No residents registered.");
        return Ok(());
    }
    println!("Payment Matrix {year}\n{}", matrix_table(&matrix));
    Ok(())
}
