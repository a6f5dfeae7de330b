use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::error::Result;
use crate::fmt::{month_name, rupiah};
use crate::funds::{FundBalance, FundSummary, Period};
use crate::grouping::LedgerRow;
use crate::models::{FundType, MutationKind, MULTIPLE_FUNDS};
use crate::reports;

use super::{parse_period, today, Session};

fn amount_cell(val: i64) -> Cell {
    Cell::new(rupiah(val)).set_alignment(CellAlignment::Right)
}

fn balance_row(label: String, b: &FundBalance) -> Vec<Cell> {
    vec![
        Cell::new(label),
        amount_cell(b.initial),
        amount_cell(b.inflow),
        amount_cell(b.outflow),
        amount_cell(b.balance),
    ]
}

pub(crate) fn summary_table(summary: &FundSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Fund", "Opening", "In", "Out", "Balance"]);
    for fund in FundType::ALL {
        table.add_row(balance_row(fund.label().to_string(), summary.fund(fund)));
    }
    table.add_row(balance_row("Total".bold().to_string(), &summary.total));
    table
}

fn fund_label(raw: Option<&str>) -> String {
    match raw {
        Some(MULTIPLE_FUNDS) => "Multiple".to_string(),
        Some(other) => FundType::parse(other)
            .map(|f| f.label().to_string())
            .unwrap_or_else(|| other.to_string()),
        None => "-".to_string(),
    }
}

pub(crate) fn ledger_table(rows: &[LedgerRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Fund", "Category", "Description", "Resident", "Amount"]);
    for row in rows {
        let m = &row.mutation;
        let amount = match m.kind {
            MutationKind::In => format!("+{}", rupiah(m.amount)).green(),
            MutationKind::Out => format!("-{}", rupiah(m.amount)).red(),
        };
        let id = if row.is_aggregated {
            format!("P{}", m.payment_id.unwrap_or_default())
        } else {
            m.id.to_string()
        };
        table.add_row(vec![
            Cell::new(id),
            Cell::new(m.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "?".into())),
            Cell::new(fund_label(m.fund_type.as_deref())),
            Cell::new(m.category.as_deref().unwrap_or("")),
            Cell::new(&m.description),
            Cell::new(m.resident_name.as_deref().unwrap_or("")),
            Cell::new(amount).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn period_title(period: &Period) -> String {
    match period {
        Period::Month { year, month } => format!("{} {year}", month_name(*month)),
        other => other.to_string(),
    }
}

pub fn run(as_user: Option<&str>, month: Option<&str>, year: Option<i32>, before: Option<&str>) -> Result<()> {
    let session = Session::open(as_user)?;
    let period = parse_period(month, year, before, today())?;
    let report = reports::get_financial_report(&session.conn, period)?;

    println!("{}", format!("Financial Report ({})", period_title(&report.period)).bold());
    println!("{}", summary_table(&report.summary));

    if report.rows.is_empty() {
        println!("\nNo mutations in this period.");
    } else {
        println!("\nMutations\n{}", ledger_table(&report.rows));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funds::{mutation, summarize};
    use crate::grouping::group_mutations;
    use crate::models::MutationKind::{In, Out};

    #[test]
    fn test_tables_render_funds_and_rows() {
        colored::control::set_override(false);
        let ms = vec![
            mutation(2, In, 50_000, Some("social"), "2024-03-05", Some(4)),
            mutation(1, In, 100_000, Some("housing"), "2024-03-05", Some(4)),
            mutation(3, Out, 25_000, None, "2024-03-01", None),
        ];
        let summary = summarize(&ms, &Period::All);
        let rendered = summary_table(&summary).to_string();
        assert!(rendered.contains("Kas Perumahan"));
        assert!(rendered.contains("Rp 100.000"));

        let rows = group_mutations(ms);
        let rendered = ledger_table(&rows).to_string();
        assert!(rendered.contains("P4"));
        assert!(rendered.contains("Multiple"));
        assert!(rendered.contains("+Rp 150.000"));
        assert!(rendered.contains("-Rp 25.000"));
    }

    #[test]
    fn test_fund_label() {
        assert_eq!(fund_label(Some("rt")), "Kas RT");
        assert_eq!(fund_label(Some("parking")), "parking");
        assert_eq!(fund_label(None), "-");
    }

    #[test]
    fn test_period_title_names_month() {
        assert_eq!(period_title(&Period::Month { year: 2024, month: 8 }), "Agustus 2024");
        assert_eq!(period_title(&Period::Year(2024)), "2024");
    }
}
