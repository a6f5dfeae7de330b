//! Dues status per resident: which months are paid, and whether the resident
//! is behind for the current year.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::WargaError;
use crate::models::PaymentMonths;

/// A `YYYY-MM` dues period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// January through December of `year`.
    pub fn months_of(year: i32) -> impl Iterator<Item = YearMonth> {
        (1..=12).map(move |month| YearMonth { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = WargaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WargaError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

/// Split a stored `month_paid_for` list into its tokens.
pub fn expand_months(month_paid_for: &str) -> impl Iterator<Item = &str> {
    month_paid_for
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Union of every month covered by a resident's approved payments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaidMonths(HashSet<YearMonth>);

impl PaidMonths {
    pub fn from_lists<'a, I>(lists: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut paid = PaidMonths::default();
        for list in lists {
            paid.extend_from(list);
        }
        paid
    }

    pub fn from_payments(payments: &[PaymentMonths]) -> Self {
        Self::from_lists(payments.iter().map(|p| p.month_paid_for.as_str()))
    }

    /// Malformed tokens are skipped.
    fn extend_from(&mut self, month_paid_for: &str) {
        for token in expand_months(month_paid_for) {
            match token.parse::<YearMonth>() {
                Ok(ym) => {
                    self.0.insert(ym);
                }
                Err(_) => tracing::warn!(token, "skipping malformed month token"),
            }
        }
    }

    pub fn contains(&self, ym: YearMonth) -> bool {
        self.0.contains(&ym)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuesStatus {
    /// A month earlier in the current year is unpaid.
    Arrears,
    /// The current month is unpaid.
    Unpaid,
    PaidUp,
}

impl DuesStatus {
    pub fn label(self) -> &'static str {
        match self {
            DuesStatus::Arrears => "MENUNGGAK",
            DuesStatus::Unpaid => "BELUM BAYAR",
            DuesStatus::PaidUp => "LUNAS",
        }
    }
}

impl fmt::Display for DuesStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status labels for one resident as of `today`. Arrears only looks at the
/// months of `today`'s year before the current one.
pub fn resolve_status(paid: &PaidMonths, today: NaiveDate) -> Vec<DuesStatus> {
    let current = YearMonth::of(today);
    let in_arrears = (1..current.month).any(|month| {
        !paid.contains(YearMonth {
            year: current.year,
            month,
        })
    });

    let mut statuses = Vec::new();
    if in_arrears {
        statuses.push(DuesStatus::Arrears);
    }
    if !paid.contains(current) {
        statuses.push(DuesStatus::Unpaid);
    }
    if statuses.is_empty() {
        statuses.push(DuesStatus::PaidUp);
    }
    statuses
}

/// Paid months for every resident, built once per request so that matrix
/// cells are answered without rescanning payments.
#[derive(Debug, Clone, Default)]
pub struct PaidMonthIndex {
    by_user: HashMap<i64, PaidMonths>,
}

impl PaidMonthIndex {
    pub fn build(payments: &[PaymentMonths]) -> Self {
        let mut by_user: HashMap<i64, PaidMonths> = HashMap::new();
        for p in payments {
            by_user
                .entry(p.user_id)
                .or_default()
                .extend_from(&p.month_paid_for);
        }
        Self { by_user }
    }

    pub fn is_paid(&self, user_id: i64, ym: YearMonth) -> bool {
        self.by_user
            .get(&user_id)
            .is_some_and(|paid| paid.contains(ym))
    }

    pub fn paid_months(&self, user_id: i64) -> Option<&PaidMonths> {
        self.by_user.get(&user_id)
    }

    pub fn status(&self, user_id: i64, today: NaiveDate) -> Vec<DuesStatus> {
        match self.paid_months(user_id) {
            Some(paid) => resolve_status(paid, today),
            None => resolve_status(&PaidMonths::default(), today),
        }
    }
}
