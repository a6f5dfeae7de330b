//! Fund balance aggregation: opening balances and per-fund in/out totals.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::{Result, WargaError};
use crate::models::{FundType, Mutation, MutationKind};

/// Reporting window over the ledger. `end` bounds are exclusive.
///
/// `Month::month` is 1-based; build periods from user input with
/// [`Period::from_filters`], which validates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    All,
    Before(NaiveDate),
    Year(i32),
    Month { year: i32, month: u32 },
}

impl Period {
    /// Month without a year is read as that month of `today`'s year.
    /// Years whose bounds fall outside the calendar are rejected.
    pub fn from_filters(year: Option<i32>, month: Option<u32>, today: NaiveDate) -> Result<Period> {
        if let Some(y) = year {
            if !year_in_range(y) {
                return Err(WargaError::Other(format!("Year out of range: {y}")));
            }
        }
        match (year, month) {
            (_, Some(m)) if !(1..=12).contains(&m) => {
                Err(WargaError::InvalidMonth(format!("{m:02}")))
            }
            (Some(year), Some(month)) => Ok(Period::Month { year, month }),
            (None, Some(month)) => Ok(Period::Month {
                year: today.year(),
                month,
            }),
            (Some(year), None) => Ok(Period::Year(year)),
            (None, None) => Ok(Period::All),
        }
    }

    pub fn start(&self) -> Option<NaiveDate> {
        match *self {
            Period::All | Period::Before(_) => None,
            Period::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
            Period::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1),
        }
    }

    pub fn end(&self) -> Option<NaiveDate> {
        match *self {
            Period::All => None,
            Period::Before(date) => Some(date),
            Period::Year(year) => NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1),
            Period::Month { year, month } if month == 12 => {
                NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)
            }
            Period::Month { year, month } => NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1),
        }
    }

    pub fn is_filtered(&self) -> bool {
        !matches!(self, Period::All)
    }

    /// `(start, end)` of a filtered period, `None` for either open side.
    /// Returns `None` when a year or month period falls outside the
    /// calendar, so such a period matches nothing.
    pub fn bounds(&self) -> Option<(Option<NaiveDate>, Option<NaiveDate>)> {
        match *self {
            Period::All => Some((None, None)),
            Period::Before(date) => Some((None, Some(date))),
            Period::Year(_) | Period::Month { .. } => {
                Some((Some(self.start()?), Some(self.end()?)))
            }
        }
    }

    /// Undated mutations only fall inside the unfiltered period.
    pub fn contains(&self, date: Option<NaiveDateTime>) -> bool {
        if !self.is_filtered() {
            return true;
        }
        let (Some(date), Some((start, end))) = (date.map(|d| d.date()), self.bounds()) else {
            return false;
        };
        start.map_or(true, |start| date >= start) && end.map_or(true, |end| date < end)
    }
}

/// Both Jan 1 of `year` and of the following year exist.
fn year_in_range(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 1, 1).is_some()
        && year
            .checked_add(1)
            .and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1))
            .is_some()
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::All => write!(f, "all time"),
            Period::Before(date) => write!(f, "before {}", date.format("%Y-%m-%d")),
            Period::Year(year) => write!(f, "{year}"),
            Period::Month { year, month } => write!(f, "{year:04}-{month:02}"),
        }
    }
}

/// One value per fixed fund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FundSet<T> {
    pub housing: T,
    pub social: T,
    pub rt: T,
}

impl<T> FundSet<T> {
    pub fn get(&self, fund: FundType) -> &T {
        match fund {
            FundType::Housing => &self.housing,
            FundType::Social => &self.social,
            FundType::Rt => &self.rt,
        }
    }

    pub fn get_mut(&mut self, fund: FundType) -> &mut T {
        match fund {
            FundType::Housing => &mut self.housing,
            FundType::Social => &mut self.social,
            FundType::Rt => &mut self.rt,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FundBalance {
    pub initial: i64,
    pub inflow: i64,
    pub outflow: i64,
    pub balance: i64,
}

impl FundBalance {
    fn settle(&mut self) {
        self.balance = self
            .initial
            .saturating_add(self.inflow)
            .saturating_sub(self.outflow);
    }

    fn add(&mut self, other: &FundBalance) {
        self.initial = self.initial.saturating_add(other.initial);
        self.inflow = self.inflow.saturating_add(other.inflow);
        self.outflow = self.outflow.saturating_add(other.outflow);
        self.balance = self.balance.saturating_add(other.balance);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FundSummary {
    pub funds: FundSet<FundBalance>,
    pub total: FundBalance,
}

impl FundSummary {
    pub fn fund(&self, fund: FundType) -> &FundBalance {
        self.funds.get(fund)
    }
}

/// Net of every fund mutation dated strictly before the period start.
/// Periods without a lower bound open at zero.
pub fn opening_balances(mutations: &[Mutation], period: &Period) -> FundSet<i64> {
    let mut opening = FundSet::default();
    let Some(start) = period.start() else {
        return opening;
    };
    for m in mutations {
        let (Some(fund), Some(date)) = (m.fund(), m.date) else {
            continue;
        };
        if date.date() < start {
            let entry = opening.get_mut(fund);
            *entry = entry.saturating_add(m.signed_amount());
        }
    }
    opening
}

pub fn summarize(mutations: &[Mutation], period: &Period) -> FundSummary {
    let opening = opening_balances(mutations, period);

    let mut summary = FundSummary::default();
    for fund in FundType::ALL {
        summary.funds.get_mut(fund).initial = *opening.get(fund);
    }

    for m in mutations.iter().filter(|m| period.contains(m.date)) {
        let Some(fund) = m.fund() else {
            continue;
        };
        let entry = summary.funds.get_mut(fund);
        match m.kind {
            MutationKind::In => entry.inflow = entry.inflow.saturating_add(m.amount),
            MutationKind::Out => entry.outflow = entry.outflow.saturating_add(m.amount),
        }
    }

    for fund in FundType::ALL {
        let entry = summary.funds.get_mut(fund);
        entry.settle();
        let settled = *entry;
        summary.total.add(&settled);
    }
    summary
}

/// Income and expense per calendar month of `year`, indexed 0..12.
/// Counts every dated mutation, fund or not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyCashflow {
    pub income: [i64; 12],
    pub expense: [i64; 12],
}

pub fn monthly_cashflow(mutations: &[Mutation], year: i32) -> MonthlyCashflow {
    let mut cashflow = MonthlyCashflow::default();
    for m in mutations {
        let Some(date) = m.date else {
            continue;
        };
        if date.year() != year {
            continue;
        }
        let idx = date.month0() as usize;
        let bucket = match m.kind {
            MutationKind::In => &mut cashflow.income[idx],
            MutationKind::Out => &mut cashflow.expense[idx],
        };
        *bucket = bucket.saturating_add(m.amount);
    }
    cashflow
}

#[cfg(test)]
pub(crate) fn mutation(
    id: i64,
    kind: MutationKind,
    amount: i64,
    fund: Option<&str>,
    date: &str,
    payment_id: Option<i64>,
) -> Mutation {
    Mutation {
        id,
        kind,
        amount,
        description: format!("mutation {id}"),
        category: None,
        fund_type: fund.map(str::to_string),
        date: crate::db::parse_datetime(date),
        proof_image: None,
        payment_id,
        resident_name: None,
    }
}
