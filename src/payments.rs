use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::arrears::YearMonth;
use crate::dues;
use crate::error::{Result, WargaError};
use crate::ledger::insert_mutation;
use crate::models::{
    FundType, MutationKind, NewMutation, Payment, PaymentMonths, PaymentStatus, MAX_AMOUNT,
};
use crate::residents;

pub const DUES_CATEGORY: &str = "Iuran Warga";

const PAYMENT_SELECT: &str = "\
    SELECT p.id, p.user_id, p.month_paid_for, p.status, p.proof_image, \
           p.housing_amount, p.social_amount, p.rt_amount, p.amount, \
           COALESCE(p.submitted_at, ''), u.full_name \
    FROM payments p LEFT JOIN users u ON p.user_id = u.id";

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    let id: i64 = row.get(0)?;
    let raw_status: String = row.get(3)?;
    let status = PaymentStatus::parse(&raw_status).unwrap_or_else(|| {
        tracing::warn!(payment_id = id, status = %raw_status, "unknown payment status, treating as pending");
        PaymentStatus::Pending
    });
    Ok(Payment {
        id,
        user_id: row.get(1)?,
        month_paid_for: row.get(2)?,
        status,
        proof_image: row.get(4)?,
        housing_amount: row.get(5)?,
        social_amount: row.get(6)?,
        rt_amount: row.get(7)?,
        amount: row.get(8)?,
        submitted_at: row.get(9)?,
        resident_name: row.get(10)?,
    })
}

/// Parse a comma-separated list of `YYYY-MM` months typed by a user.
/// Duplicates collapse and the result is sorted.
pub fn parse_months(raw: &str) -> Result<Vec<YearMonth>> {
    let months: BTreeSet<YearMonth> = crate::arrears::expand_months(raw)
        .map(str::parse::<YearMonth>)
        .collect::<Result<_>>()?;
    if months.is_empty() {
        return Err(WargaError::InvalidMonth(raw.to_string()));
    }
    Ok(months.into_iter().collect())
}

fn join_months(months: &[YearMonth]) -> String {
    months
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Record a resident's dues submission. Each fund's share is its current
/// monthly rate times the number of months covered; the split is fixed here
/// so that approval posts exactly the submitted total.
pub fn submit_payment(
    conn: &Connection,
    user_id: i64,
    months: &[YearMonth],
    proof_image: Option<&str>,
) -> Result<i64> {
    if months.is_empty() {
        return Err(WargaError::InvalidMonth(String::new()));
    }
    residents::get_resident(conn, user_id)?;

    let rates = dues::get_rates(conn)?;
    let count = months.len() as i64;
    let share = |rate: i64| {
        rate.checked_mul(count)
            .filter(|v| *v <= MAX_AMOUNT)
            .ok_or_else(|| WargaError::InvalidAmount(format!("{rate} x {count} months")))
    };
    let housing = share(rates.housing)?;
    let social = share(rates.social)?;
    let rt = share(rates.rt)?;
    let total = housing + social + rt;
    if total > MAX_AMOUNT {
        return Err(WargaError::InvalidAmount(total.to_string()));
    }
    let month_paid_for = join_months(months);

    conn.execute(
        "INSERT INTO payments (user_id, month_paid_for, status, proof_image, housing_amount, social_amount, rt_amount, amount) \
         VALUES (?1, ?2, 'pending', ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![user_id, month_paid_for, proof_image, housing, social, rt, total],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(payment_id = id, user_id, months = %month_paid_for, "submitted payment");
    Ok(id)
}

pub fn get_payment(conn: &Connection, id: i64) -> Result<Payment> {
    conn.query_row(&format!("{PAYMENT_SELECT} WHERE p.id = ?1"), [id], payment_from_row)
        .optional()?
        .ok_or_else(|| WargaError::NotFound(format!("Payment {id}")))
}

pub fn list_payments(conn: &Connection, status: Option<PaymentStatus>) -> Result<Vec<Payment>> {
    let mut sql = PAYMENT_SELECT.to_string();
    let mut params: Vec<&str> = Vec::new();
    if let Some(status) = status {
        sql.push_str(" WHERE p.status = ?1");
        params.push(status.as_str());
    }
    sql.push_str(" ORDER BY p.submitted_at DESC, p.id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), payment_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn payments_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Payment>> {
    let mut stmt = conn.prepare(&format!(
        "{PAYMENT_SELECT} WHERE p.user_id = ?1 ORDER BY p.submitted_at DESC, p.id DESC"
    ))?;
    let rows = stmt
        .query_map([user_id], payment_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_pending(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT count(*) FROM payments WHERE status = 'pending'",
        [],
        |r| r.get(0),
    )?)
}

/// Approved payments mentioning `year`, for one resident or for everyone.
/// The `LIKE` is only a prefilter; callers match exact months.
pub fn approved_months(conn: &Connection, user_id: Option<i64>, year: i32) -> Result<Vec<PaymentMonths>> {
    let pattern = format!("%{year:04}-%");
    let mut sql = String::from(
        "SELECT user_id, month_paid_for FROM payments \
         WHERE status = 'approved' AND month_paid_for LIKE ?1",
    );
    if user_id.is_some() {
        sql.push_str(" AND user_id = ?2");
    }
    sql.push_str(" ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let map_row = |row: &Row<'_>| {
        Ok(PaymentMonths {
            user_id: row.get(0)?,
            month_paid_for: row.get(1)?,
        })
    };
    let rows = match user_id {
        Some(uid) => stmt
            .query_map(rusqlite::params![pattern, uid], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?,
        None => stmt
            .query_map([&pattern], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };
    Ok(rows)
}

fn pending_payment(conn: &Connection, id: i64) -> Result<Payment> {
    let payment = get_payment(conn, id)?;
    if payment.status != PaymentStatus::Pending {
        return Err(WargaError::Other(format!(
            "Payment {id} is already {}",
            payment.status.as_str()
        )));
    }
    Ok(payment)
}

pub fn approve_payment(conn: &Connection, id: i64) -> Result<Vec<i64>> {
    approve_payment_at(conn, id, chrono::Local::now().naive_local())
}

/// Approve a pending payment and post one incoming mutation per fund with a
/// non-zero share, all linked to the payment and dated `approved_at`.
/// Returns the new mutation ids.
pub fn approve_payment_at(conn: &Connection, id: i64, approved_at: NaiveDateTime) -> Result<Vec<i64>> {
    let tx = conn.unchecked_transaction()?;
    let payment = pending_payment(&tx, id)?;

    tx.execute("UPDATE payments SET status = 'approved' WHERE id = ?1", [id])?;

    let payer = payment.resident_name.as_deref().unwrap_or("warga");
    let mut mutation_ids = Vec::new();
    for fund in FundType::ALL {
        let amount = payment.fund_amount(fund);
        if amount == 0 {
            continue;
        }
        let mutation = NewMutation {
            kind: MutationKind::In,
            amount,
            description: format!("{} {} - {payer}", fund.label(), payment.month_paid_for),
            category: Some(DUES_CATEGORY.to_string()),
            fund: Some(fund),
            date: Some(approved_at),
            proof_image: payment.proof_image.clone(),
        };
        mutation_ids.push(insert_mutation(&tx, &mutation, Some(id))?);
    }
    tx.commit()?;

    tracing::info!(payment_id = id, mutations = mutation_ids.len(), "approved payment");
    Ok(mutation_ids)
}

pub fn reject_payment(conn: &Connection, id: i64) -> Result<()> {
    pending_payment(conn, id)?;
    conn.execute("UPDATE payments SET status = 'rejected' WHERE id = ?1", [id])?;
    tracing::info!(payment_id = id, "rejected payment");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::funds::{summarize, Period};
    use crate::grouping::group_mutations;
    use crate::ledger::list_mutations;
    use crate::models::MULTIPLE_FUNDS;
    use crate::residents::{add_resident, form};

    fn months(raw: &str) -> Vec<YearMonth> {
        parse_months(raw).unwrap()
    }

    #[test]
    fn test_parse_months() {
        let parsed = months("2024-02, 2024-01,2024-02");
        let text: Vec<String> = parsed.iter().map(|m| m.to_string()).collect();
        assert_eq!(text, vec!["2024-01", "2024-02"]);
        assert!(parse_months("").is_err());
        assert!(parse_months("2024-01,januari").is_err());
    }

    #[test]
    fn test_submit_splits_by_fund_rates() {
        let (_dir, conn) = test_db();
        let user = add_resident(&conn, &form("budi", "Budi", "A-01")).unwrap();
        let id = submit_payment(&conn, user, &months("2024-01,2024-02"), Some("proof-abc.jpg")).unwrap();
        let p = get_payment(&conn, id).unwrap();
        assert_eq!(p.status, PaymentStatus::Pending);
        assert_eq!(p.month_paid_for, "2024-01,2024-02");
        assert_eq!(p.housing_amount, 100_000);
        assert_eq!(p.social_amount, 40_000);
        assert_eq!(p.rt_amount, 20_000);
        assert_eq!(p.amount, 160_000);
        assert_eq!(p.resident_name.as_deref(), Some("Budi"));
        assert_eq!(count_pending(&conn).unwrap(), 1);
    }

    #[test]
    fn test_submit_rejects_share_beyond_max_amount() {
        let (_dir, conn) = test_db();
        let user = add_resident(&conn, &form("budi", "Budi", "A-01")).unwrap();
        dues::update_rates(
            &conn,
            &dues::DuesRates {
                housing: MAX_AMOUNT,
                social: 0,
                rt: 0,
            },
        )
        .unwrap();
        assert!(submit_payment(&conn, user, &months("2024-01"), None).is_ok());
        let result = submit_payment(&conn, user, &months("2024-01,2024-02"), None);
        assert!(matches!(result, Err(WargaError::InvalidAmount(_))));

        dues::update_rates(
            &conn,
            &dues::DuesRates {
                housing: MAX_AMOUNT,
                social: 1,
                rt: 0,
            },
        )
        .unwrap();
        let result = submit_payment(&conn, user, &months("2024-03"), None);
        assert!(matches!(result, Err(WargaError::InvalidAmount(_))));
        assert_eq!(count_pending(&conn).unwrap(), 1);
    }

    #[test]
    fn test_submit_requires_resident() {
        let (_dir, conn) = test_db();
        assert!(submit_payment(&conn, 99, &months("2024-01"), None).is_err());
    }

    #[test]
    fn test_approval_fans_out_mutations_summing_to_total() {
        let (_dir, conn) = test_db();
        let user = add_resident(&conn, &form("budi", "Budi", "A-01")).unwrap();
        let id = submit_payment(&conn, user, &months("2024-03"), None).unwrap();
        let created = approve_payment(&conn, id).unwrap();
        assert_eq!(created.len(), 3);

        let payment = get_payment(&conn, id).unwrap();
        assert_eq!(payment.status, PaymentStatus::Approved);

        let ms = list_mutations(&conn, &Period::All).unwrap();
        assert!(ms.iter().all(|m| m.payment_id == Some(id)));
        let total: i64 = ms.iter().map(|m| m.amount).sum();
        assert_eq!(total, payment.amount);

        let summary = summarize(&ms, &Period::All);
        assert_eq!(summary.fund(FundType::Housing).inflow, 50_000);
        assert_eq!(summary.fund(FundType::Social).inflow, 20_000);
        assert_eq!(summary.fund(FundType::Rt).inflow, 10_000);

        let rows = group_mutations(ms);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mutation.amount, 80_000);
        assert_eq!(rows[0].mutation.fund_type.as_deref(), Some(MULTIPLE_FUNDS));
        assert_eq!(rows[0].mutation.resident_name.as_deref(), Some("Budi"));
    }

    #[test]
    fn test_approval_dates_mutations() {
        let (_dir, conn) = test_db();
        let user = add_resident(&conn, &form("budi", "Budi", "A-01")).unwrap();
        let id = submit_payment(&conn, user, &months("2024-05"), None).unwrap();
        let at = crate::db::parse_datetime("2024-05-06 09:30:00").unwrap();
        approve_payment_at(&conn, id, at).unwrap();
        let may = list_mutations(&conn, &Period::Month { year: 2024, month: 5 }).unwrap();
        assert_eq!(may.len(), 3);
        assert!(may.iter().all(|m| m.date == Some(at)));
    }

    #[test]
    fn test_zero_rate_fund_gets_no_mutation() {
        let (_dir, conn) = test_db();
        dues::update_rates(&conn, &dues::DuesRates { housing: 30_000, social: 0, rt: 5_000 }).unwrap();
        let user = add_resident(&conn, &form("budi", "Budi", "A-01")).unwrap();
        let id = submit_payment(&conn, user, &months("2024-03"), None).unwrap();
        assert_eq!(approve_payment(&conn, id).unwrap().len(), 2);
    }

    #[test]
    fn test_only_pending_payments_change_status() {
        let (_dir, conn) = test_db();
        let user = add_resident(&conn, &form("budi", "Budi", "A-01")).unwrap();
        let approved = submit_payment(&conn, user, &months("2024-01"), None).unwrap();
        approve_payment(&conn, approved).unwrap();
        assert!(approve_payment(&conn, approved).is_err());
        assert!(reject_payment(&conn, approved).is_err());

        let rejected = submit_payment(&conn, user, &months("2024-02"), None).unwrap();
        reject_payment(&conn, rejected).unwrap();
        assert_eq!(get_payment(&conn, rejected).unwrap().status, PaymentStatus::Rejected);
        assert!(approve_payment(&conn, rejected).is_err());

        // Only the first approval posted mutations.
        assert_eq!(list_mutations(&conn, &Period::All).unwrap().len(), 3);
    }

    #[test]
    fn test_approved_months_filters_status_year_and_user() {
        let (_dir, conn) = test_db();
        let budi = add_resident(&conn, &form("budi", "Budi", "A-01")).unwrap();
        let sari = add_resident(&conn, &form("sari", "Sari", "A-02")).unwrap();
        let p1 = submit_payment(&conn, budi, &months("2024-01,2024-02"), None).unwrap();
        let p2 = submit_payment(&conn, sari, &months("2024-01"), None).unwrap();
        let p3 = submit_payment(&conn, sari, &months("2023-12"), None).unwrap();
        submit_payment(&conn, budi, &months("2024-03"), None).unwrap();
        for id in [p1, p2, p3] {
            approve_payment(&conn, id).unwrap();
        }

        let all_2024 = approved_months(&conn, None, 2024).unwrap();
        assert_eq!(all_2024.len(), 2);
        let budi_2024 = approved_months(&conn, Some(budi), 2024).unwrap();
        assert_eq!(budi_2024, vec![PaymentMonths { user_id: budi, month_paid_for: "2024-01,2024-02".to_string() }]);
        assert_eq!(approved_months(&conn, Some(sari), 2023).unwrap().len(), 1);
    }

    #[test]
    fn test_list_payments_by_status_and_user() {
        let (_dir, conn) = test_db();
        let budi = add_resident(&conn, &form("budi", "Budi", "A-01")).unwrap();
        let sari = add_resident(&conn, &form("sari", "Sari", "A-02")).unwrap();
        let p1 = submit_payment(&conn, budi, &months("2024-01"), None).unwrap();
        submit_payment(&conn, sari, &months("2024-01"), None).unwrap();
        approve_payment(&conn, p1).unwrap();

        assert_eq!(list_payments(&conn, None).unwrap().len(), 2);
        let pending = list_payments(&conn, Some(PaymentStatus::Pending)).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].resident_name.as_deref(), Some("Sari"));
        assert_eq!(payments_for_user(&conn, budi).unwrap().len(), 1);
    }
}
