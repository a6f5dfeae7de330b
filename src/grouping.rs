//! Collapses the fund mutations of one payment into a single display row.

use std::collections::HashMap;

use crate::models::{Mutation, MULTIPLE_FUNDS};

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub mutation: Mutation,
    /// Set once the row stands for every mutation of its payment.
    pub is_aggregated: bool,
}

impl From<Mutation> for LedgerRow {
    fn from(mutation: Mutation) -> Self {
        Self {
            mutation,
            is_aggregated: false,
        }
    }
}

/// Merge rows sharing a payment id into the row of their first occurrence.
///
/// Rows without a payment id pass through untouched. A merged row keeps the
/// descriptive fields of the first occurrence, carries the summed amount and
/// reports its fund as [`MULTIPLE_FUNDS`]. Output order is the order of first
/// appearance in `rows`.
pub fn group_by_payment<I>(rows: I) -> Vec<LedgerRow>
where
    I: IntoIterator<Item = LedgerRow>,
{
    let mut grouped: Vec<LedgerRow> = Vec::new();
    let mut by_payment: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let Some(payment_id) = row.mutation.payment_id else {
            grouped.push(row);
            continue;
        };
        match by_payment.get(&payment_id) {
            Some(&idx) => {
                let merged = &mut grouped[idx].mutation.amount;
                *merged = merged.saturating_add(row.mutation.amount);
            }
            None => {
                let mut first = row;
                first.mutation.fund_type = Some(MULTIPLE_FUNDS.to_string());
                first.is_aggregated = true;
                by_payment.insert(payment_id, grouped.len());
                grouped.push(first);
            }
        }
    }

    grouped
}

pub fn group_mutations(mutations: Vec<Mutation>) -> Vec<LedgerRow> {
    group_by_payment(mutations.into_iter().map(LedgerRow::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funds::mutation;
    use crate::models::MutationKind::{In, Out};

    #[test]
    fn test_payment_mutations_collapse_into_one_row() {
        let rows = group_mutations(vec![
            mutation(1, In, 100, Some("housing"), "2024-05-01", Some(1)),
            mutation(2, In, 50, Some("social"), "2024-05-01", Some(1)),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mutation.amount, 150);
        assert_eq!(rows[0].mutation.fund_type.as_deref(), Some(MULTIPLE_FUNDS));
        assert!(rows[0].is_aggregated);
        assert_eq!(rows[0].mutation.id, 1);
    }

    #[test]
    fn test_first_occurrence_keeps_position_and_fields() {
        let mut first = mutation(10, In, 100, Some("housing"), "2024-05-03", Some(4));
        first.description = "Iuran Mei".to_string();
        first.resident_name = Some("Budi".to_string());
        let rows = group_mutations(vec![
            mutation(12, Out, 70, Some("rt"), "2024-05-04", None),
            first,
            mutation(11, Out, 20, None, "2024-05-02", None),
            mutation(9, In, 30, Some("rt"), "2024-05-01", Some(4)),
            mutation(8, In, 20, Some("social"), "2024-05-01", Some(4)),
        ]);
        let ids: Vec<i64> = rows.iter().map(|r| r.mutation.id).collect();
        assert_eq!(ids, vec![12, 10, 11]);
        let merged = &rows[1];
        assert_eq!(merged.mutation.amount, 150);
        assert_eq!(merged.mutation.description, "Iuran Mei");
        assert_eq!(merged.mutation.resident_name.as_deref(), Some("Budi"));
        assert_eq!(merged.mutation.date, crate::db::parse_datetime("2024-05-03"));
    }

    #[test]
    fn test_unpaid_rows_pass_through_unmodified() {
        let plain = mutation(3, Out, 45, None, "2024-05-01", None);
        let rows = group_mutations(vec![plain.clone()]);
        assert_eq!(rows, vec![LedgerRow::from(plain)]);
        assert!(!rows[0].is_aggregated);
        assert_eq!(rows[0].mutation.fund_type, None);
    }

    #[test]
    fn test_interleaved_payments_stay_separate() {
        let rows = group_mutations(vec![
            mutation(1, In, 10, Some("housing"), "2024-05-01", Some(1)),
            mutation(2, In, 20, Some("housing"), "2024-05-01", Some(2)),
            mutation(3, In, 1, Some("rt"), "2024-05-01", Some(1)),
            mutation(4, In, 2, Some("rt"), "2024-05-01", Some(2)),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mutation.payment_id, Some(1));
        assert_eq!(rows[0].mutation.amount, 11);
        assert_eq!(rows[1].mutation.payment_id, Some(2));
        assert_eq!(rows[1].mutation.amount, 22);
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let once = group_mutations(vec![
            mutation(1, In, 100, Some("housing"), "2024-05-01", Some(1)),
            mutation(2, Out, 5, None, "2024-05-01", None),
            mutation(3, In, 50, Some("social"), "2024-05-01", Some(1)),
            mutation(4, In, 25, Some("rt"), "2024-04-01", Some(2)),
        ]);
        let twice = group_by_payment(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merged_amount_saturates() {
        let rows = group_mutations(vec![
            mutation(1, In, i64::MAX - 1, Some("housing"), "2024-05-01", Some(3)),
            mutation(2, In, 10, Some("rt"), "2024-05-01", Some(3)),
        ]);
        assert_eq!(rows[0].mutation.amount, i64::MAX);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_mutations(Vec::new()).is_empty());
    }
}
