use std::io::Write;
use std::path::{Path, PathBuf};

use crate::db::{format_datetime, parse_datetime};
use crate::error::{Result, WargaError};
use crate::fmt::rupiah;
use crate::funds::Period;
use crate::grouping::LedgerRow;
use crate::ledger::{add_mutation, delete_mutation, parse_amount};
use crate::models::{FundType, MutationKind, NewMutation};
use crate::reports;
use crate::storage::store_proof;

use super::report::ledger_table;
use super::{parse_period, today, Session};

pub struct AddArgs {
    pub kind: String,
    pub amount: String,
    pub description: String,
    pub category: Option<String>,
    pub fund: Option<String>,
    pub date: Option<String>,
    pub proof: Option<String>,
}

fn ledger_rows(session: &Session, period: Period) -> Result<Vec<LedgerRow>> {
    if period.is_filtered() {
        Ok(reports::get_financial_report(&session.conn, period)?.rows)
    } else {
        reports::get_mutation_ledger(&session.conn)
    }
}

pub fn list(as_user: Option<&str>, month: Option<&str>, year: Option<i32>) -> Result<()> {
    let session = Session::open(as_user)?;
    let period = parse_period(month, year, None, today())?;
    let rows = ledger_rows(&session, period)?;
    if rows.is_empty() {
        println!("No mutations recorded ({period}).");
        return Ok(());
    }
    println!("Mutations ({period})\n{}", ledger_table(&rows));
    Ok(())
}

fn build_mutation(args: AddArgs, data_dir: &Path) -> Result<NewMutation> {
    let kind = MutationKind::parse(&args.kind)
        .ok_or_else(|| WargaError::Other(format!("Unknown mutation type: {} (expected in or out)", args.kind)))?;
    let amount = parse_amount(&args.amount)?;
    let fund = match args.fund.as_deref() {
        Some(raw) => Some(FundType::parse(raw).ok_or_else(|| {
            WargaError::Other(format!("Unknown fund: {raw} (expected housing, social or rt)"))
        })?),
        None => None,
    };
    let date = match args.date.as_deref() {
        Some(raw) => Some(
            parse_datetime(raw)
                .ok_or_else(|| WargaError::Other(format!("Invalid date: {raw} (expected YYYY-MM-DD)")))?,
        ),
        None => None,
    };
    let proof_image = match args.proof.as_deref() {
        Some(path) => Some(store_proof(data_dir, Path::new(path))?),
        None => None,
    };
    Ok(NewMutation {
        kind,
        amount,
        description: args.description,
        category: args.category,
        fund,
        date,
        proof_image,
    })
}

pub fn add(as_user: Option<&str>, args: AddArgs) -> Result<()> {
    let session = Session::admin(as_user)?;
    let mutation = build_mutation(args, &session.data_dir)?;
    let id = add_mutation(&session.conn, &mutation)?;
    println!(
        "Recorded mutation {id}: {} {} ({})",
        mutation.kind.as_str(),
        rupiah(mutation.amount),
        mutation.fund.map(|f| f.label()).unwrap_or("no fund")
    );
    Ok(())
}

pub fn delete(as_user: Option<&str>, id: i64) -> Result<()> {
    let session = Session::admin(as_user)?;
    delete_mutation(&session.conn, id)?;
    println!("Deleted mutation {id}");
    Ok(())
}

pub(crate) fn write_ledger_csv<W: Write>(rows: &[LedgerRow], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "id", "date", "type", "fund", "category", "description", "resident", "amount", "payment_id",
    ])?;
    for row in rows {
        let m = &row.mutation;
        wtr.write_record([
            m.id.to_string(),
            m.date.as_ref().map(format_datetime).unwrap_or_default(),
            m.kind.as_str().to_string(),
            m.fund_type.clone().unwrap_or_default(),
            m.category.clone().unwrap_or_default(),
            m.description.clone(),
            m.resident_name.clone().unwrap_or_default(),
            m.amount.to_string(),
            m.payment_id.map(|p| p.to_string()).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export(as_user: Option<&str>, month: Option<&str>, year: Option<i32>, output: Option<String>) -> Result<()> {
    let session = Session::admin(as_user)?;
    let period = parse_period(month, year, None, today())?;
    let rows = ledger_rows(&session, period)?;

    let path = match output {
        Some(p) => PathBuf::from(p),
        None => {
            let dir = session.data_dir.join("exports");
            std::fs::create_dir_all(&dir)?;
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            dir.join(format!("mutations-{stamp}.csv"))
        }
    };
    write_ledger_csv(&rows, std::fs::File::create(&path)?)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "exported ledger");
    println!("Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}
