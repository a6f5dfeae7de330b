use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;

use crate::arrears::{resolve_status, DuesStatus, PaidMonthIndex, PaidMonths, YearMonth};
use crate::auth::Principal;
use crate::error::Result;
use crate::funds::{monthly_cashflow, summarize, FundSummary, MonthlyCashflow, Period};
use crate::grouping::{group_mutations, LedgerRow};
use crate::ledger::list_mutations;
use crate::models::{Mutation, PaymentMonths, Resident};
use crate::payments::{approved_months, count_pending};
use crate::residents::{count_residents, residents_by_house};

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct DashboardStats {
    pub year: i32,
    pub residents: i64,
    pub pending_payments: i64,
    pub balances: FundSummary,
    pub cashflow: MonthlyCashflow,
    /// Only present when the caller is a resident.
    pub resident_status: Option<Vec<DuesStatus>>,
}

impl DashboardStats {
    fn new(year: i32, residents: i64, pending_payments: i64) -> Self {
        Self {
            year,
            residents,
            pending_payments,
            balances: FundSummary::default(),
            cashflow: MonthlyCashflow::default(),
            resident_status: None,
        }
    }

    fn with_ledger(mut self, mutations: &[Mutation]) -> Self {
        self.balances = summarize(mutations, &Period::All);
        self.cashflow = monthly_cashflow(mutations, self.year);
        self
    }

    fn with_resident_status(mut self, own_payments: Option<&[PaymentMonths]>, today: NaiveDate) -> Self {
        self.resident_status =
            own_payments.map(|p| resolve_status(&PaidMonths::from_payments(p), today));
        self
    }
}

pub fn get_dashboard(conn: &Connection, principal: &Principal, today: NaiveDate) -> Result<DashboardStats> {
    let year = today.year();
    let tx = conn.unchecked_transaction()?;
    let residents = count_residents(&tx)?;
    let pending = count_pending(&tx)?;
    let mutations = list_mutations(&tx, &Period::All)?;
    let own_payments = if principal.is_admin() {
        None
    } else {
        Some(approved_months(&tx, Some(principal.user_id), year)?)
    };
    tx.finish()?;

    Ok(DashboardStats::new(year, residents, pending)
        .with_ledger(&mutations)
        .with_resident_status(own_payments.as_deref(), today))
}

// ---------------------------------------------------------------------------
// Financial report
// ---------------------------------------------------------------------------

pub struct FinancialReport {
    pub period: Period,
    pub summary: FundSummary,
    pub rows: Vec<LedgerRow>,
}

/// Balances need every mutation before the period, so the whole ledger is
/// read and the itemized rows are cut down to the period afterwards.
pub fn build_financial_report(mutations: Vec<Mutation>, period: Period) -> FinancialReport {
    let summary = summarize(&mutations, &period);
    let in_period: Vec<Mutation> = mutations
        .into_iter()
        .filter(|m| period.contains(m.date))
        .collect();
    FinancialReport {
        period,
        summary,
        rows: group_mutations(in_period),
    }
}

pub fn get_financial_report(conn: &Connection, period: Period) -> Result<FinancialReport> {
    let tx = conn.unchecked_transaction()?;
    let mutations = list_mutations(&tx, &Period::All)?;
    tx.finish()?;
    tracing::debug!(%period, mutations = mutations.len(), "building financial report");
    Ok(build_financial_report(mutations, period))
}

/// The whole ledger, payment fan-outs collapsed, most recent first.
pub fn get_mutation_ledger(conn: &Connection) -> Result<Vec<LedgerRow>> {
    Ok(group_mutations(list_mutations(conn, &Period::All)?))
}

// ---------------------------------------------------------------------------
// Payment matrix
// ---------------------------------------------------------------------------

pub struct MatrixRow {
    pub resident: Resident,
    /// January first.
    pub months: [bool; 12],
}

impl MatrixRow {
    pub fn paid_count(&self) -> usize {
        self.months.iter().filter(|paid| **paid).count()
    }
}

pub struct PaymentMatrix {
    pub year: i32,
    pub rows: Vec<MatrixRow>,
}

pub fn build_payment_matrix(residents: Vec<Resident>, payments: &[PaymentMonths], year: i32) -> PaymentMatrix {
    let index = PaidMonthIndex::build(payments);
    let rows = residents
        .into_iter()
        .map(|resident| {
            let mut months = [false; 12];
            for (cell, ym) in months.iter_mut().zip(YearMonth::months_of(year)) {
                *cell = index.is_paid(resident.id, ym);
            }
            MatrixRow { resident, months }
        })
        .collect();
    PaymentMatrix { year, rows }
}

pub fn get_payment_matrix(conn: &Connection, year: i32) -> Result<PaymentMatrix> {
    let tx = conn.unchecked_transaction()?;
    let residents = residents_by_house(&tx)?;
    let payments = approved_months(&tx, None, year)?;
    tx.finish()?;
    Ok(build_payment_matrix(residents, &payments, year))
}
