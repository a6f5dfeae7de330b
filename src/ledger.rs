use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row};

use crate::db::format_datetime;
use crate::error::{Result, WargaError};
use crate::funds::Period;
use crate::models::{Mutation, MutationKind, NewMutation, MAX_AMOUNT};

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

pub(crate) const MUTATION_SELECT: &str = "\
    SELECT m.id, m.type, m.amount, m.description, m.category, m.fund_type, \
           m.date, m.proof_image, m.payment_id, u.full_name \
    FROM mutations m \
    LEFT JOIN payments p ON m.payment_id = p.id \
    LEFT JOIN users u ON p.user_id = u.id";

pub(crate) const MUTATION_ORDER: &str = "ORDER BY m.date DESC, m.id DESC";

fn text_of(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Text(t) => std::str::from_utf8(t).ok().map(str::to_string),
        ValueRef::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}

fn int_of(value: ValueRef<'_>) -> Option<i64> {
    match value {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Text(t) => std::str::from_utf8(t).ok()?.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Whole amount in `0..=MAX_AMOUNT` from whatever the column holds.
fn amount_of(value: ValueRef<'_>) -> Option<i64> {
    let amount = match value {
        ValueRef::Real(f) if f.fract() == 0.0 && f.abs() <= MAX_AMOUNT as f64 => f as i64,
        other => int_of(other)?,
    };
    (0..=MAX_AMOUNT).contains(&amount).then_some(amount)
}

/// Decode one row of [`MUTATION_SELECT`]. A malformed column never fails
/// the row: the field is dropped (amount as zero, the rest as none) so one
/// bad entry cannot blank a whole report.
pub(crate) fn mutation_from_row(row: &Row<'_>) -> rusqlite::Result<Mutation> {
    let id: i64 = row.get(0)?;

    let raw_kind = text_of(row.get_ref(1)?).unwrap_or_default();
    let mut amount = amount_of(row.get_ref(2)?).unwrap_or_else(|| {
        tracing::warn!(mutation_id = id, "ignoring malformed mutation amount");
        0
    });
    let kind = MutationKind::parse(&raw_kind).unwrap_or_else(|| {
        tracing::warn!(mutation_id = id, kind = %raw_kind, "ignoring mutation with unknown type");
        amount = 0;
        MutationKind::In
    });

    let raw_date = text_of(row.get_ref(6)?);
    let date = raw_date.as_deref().and_then(crate::db::parse_datetime);
    if date.is_none() {
        tracing::warn!(mutation_id = id, date = ?raw_date, "mutation has an unreadable date");
    }

    let payment_ref = row.get_ref(8)?;
    let payment_id = int_of(payment_ref);
    if payment_id.is_none() && !matches!(payment_ref, ValueRef::Null) {
        tracing::warn!(mutation_id = id, "ignoring malformed payment link");
    }

    Ok(Mutation {
        id,
        kind,
        amount,
        description: text_of(row.get_ref(3)?).unwrap_or_default(),
        category: text_of(row.get_ref(4)?),
        fund_type: text_of(row.get_ref(5)?),
        date,
        proof_image: text_of(row.get_ref(7)?),
        payment_id,
        resident_name: text_of(row.get_ref(9)?),
    })
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Mutations inside `period`, most recent first, with the payer's name.
pub fn list_mutations(conn: &Connection, period: &Period) -> Result<Vec<Mutation>> {
    let Some((start, end)) = period.bounds() else {
        tracing::warn!(%period, "period lies outside the calendar");
        return Ok(Vec::new());
    };
    let mut clauses = Vec::new();
    let mut params: Vec<String> = Vec::new();
    if let Some(start) = start {
        params.push(start.format("%Y-%m-%d").to_string());
        clauses.push(format!("m.date >= ?{}", params.len()));
    }
    if let Some(end) = end {
        params.push(end.format("%Y-%m-%d").to_string());
        clauses.push(format!("m.date < ?{}", params.len()));
    }
    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let sql = format!("{MUTATION_SELECT}{where_clause} {MUTATION_ORDER}");
    tracing::debug!(%period, "loading mutations");
    let mut stmt = conn.prepare(&sql)?;
    let param_values: Vec<&dyn rusqlite::types::ToSql> = params
        .iter()
        .map(|p| p as &dyn rusqlite::types::ToSql)
        .collect();
    let rows = stmt
        .query_map(param_values.as_slice(), mutation_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_mutations(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT count(*) FROM mutations", [], |r| r.get(0))?)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

pub(crate) fn insert_mutation(
    conn: &Connection,
    mutation: &NewMutation,
    payment_id: Option<i64>,
) -> Result<i64> {
    if !(0..=MAX_AMOUNT).contains(&mutation.amount) {
        return Err(WargaError::InvalidAmount(mutation.amount.to_string()));
    }
    let date = mutation
        .date
        .unwrap_or_else(|| chrono::Local::now().naive_local());
    conn.execute(
        "INSERT INTO mutations (type, amount, description, category, fund_type, date, proof_image, payment_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            mutation.kind.as_str(),
            mutation.amount,
            mutation.description,
            mutation.category,
            mutation.fund.map(|f| f.as_str()),
            format_datetime(&date),
            mutation.proof_image,
            payment_id,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(
        mutation_id = id,
        kind = mutation.kind.as_str(),
        amount = mutation.amount,
        payment_id = ?payment_id,
        "recorded mutation"
    );
    Ok(id)
}

pub fn add_mutation(conn: &Connection, mutation: &NewMutation) -> Result<i64> {
    insert_mutation(conn, mutation, None)
}

pub fn delete_mutation(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM mutations WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(WargaError::NotFound(format!("Mutation {id}")));
    }
    tracing::info!(mutation_id = id, "deleted mutation");
    Ok(())
}

/// Parse a rupiah amount typed by a user: `150000`, `150.000`, `Rp 150.000`.
/// Anything negative or above [`MAX_AMOUNT`] is rejected.
pub fn parse_amount(raw: &str) -> Result<i64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("Rp")
        .trim_start_matches("rp")
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | ' ' | '_'))
        .collect();
    match cleaned.parse::<i64>() {
        Ok(v) if (0..=MAX_AMOUNT).contains(&v) => Ok(v),
        _ => Err(WargaError::InvalidAmount(raw.to_string())),
    }
}
