//! Sort descriptors for debt queries.
//!
//! # Invariants
//! - `compare_debts` and `order_by_sql` produce the same total order; both end
//!   with `uuid ASC` as the final tie-break.
//! - Absent due dates compare lowest, matching SQLite `NULL` ordering.

use crate::model::debt::Debt;
use std::cmp::Ordering;

/// Sortable debt attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    HasDueDate,
    DueDate,
    LastUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortDescriptor {
    pub field: SortField,
    pub ascending: bool,
}

impl SortDescriptor {
    pub const fn ascending(field: SortField) -> Self {
        Self {
            field,
            ascending: true,
        }
    }

    pub const fn descending(field: SortField) -> Self {
        Self {
            field,
            ascending: false,
        }
    }

    fn column_sql(self) -> &'static str {
        match self.field {
            SortField::HasDueDate => "(due_date IS NOT NULL)",
            SortField::DueDate => "due_date",
            SortField::LastUpdate => "updated_at",
        }
    }
}

/// Debt list order: dated first (soonest first), then undated by most recent
/// update.
pub const DEBT_LIST_SORT: [SortDescriptor; 3] = [
    SortDescriptor::descending(SortField::HasDueDate),
    SortDescriptor::ascending(SortField::DueDate),
    SortDescriptor::descending(SortField::LastUpdate),
];

/// Compares two debts under `descriptors`.
pub fn compare_debts(descriptors: &[SortDescriptor], left: &Debt, right: &Debt) -> Ordering {
    for descriptor in descriptors {
        let ordering = match descriptor.field {
            SortField::HasDueDate => left.has_due_date().cmp(&right.has_due_date()),
            SortField::DueDate => left.due_date.cmp(&right.due_date),
            SortField::LastUpdate => left.last_update.cmp(&right.last_update),
        };
        let ordering = if descriptor.ascending {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.uuid.cmp(&right.uuid)
}

/// Renders `ORDER BY` terms (without the keyword) for the `debts` table.
pub(crate) fn order_by_sql(descriptors: &[SortDescriptor]) -> String {
    descriptors
        .iter()
        .map(|descriptor| {
            format!(
                "{} {}",
                descriptor.column_sql(),
                if descriptor.ascending { "ASC" } else { "DESC" }
            )
        })
        .chain(std::iter::once("uuid ASC".to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{compare_debts, order_by_sql, DEBT_LIST_SORT};
    use crate::model::debt::{Debt, Ownership};

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn dated_debts_precede_undated_and_sort_soonest_first() {
        let mut undated_old = Debt::new(Ownership::MyDebt, "old", NOW);
        undated_old.last_update = NOW - 10;
        let mut undated_new = Debt::new(Ownership::MyDebt, "new", NOW);
        undated_new.last_update = NOW;
        let late = Debt::new(Ownership::MyDebt, "late", NOW).with_due_date(NOW + 100);
        let soon = Debt::new(Ownership::MyDebt, "soon", NOW).with_due_date(NOW + 1);

        let mut debts = vec![undated_old, late, undated_new, soon];
        debts.sort_by(|a, b| compare_debts(&DEBT_LIST_SORT, a, b));

        let names: Vec<&str> = debts.iter().map(|debt| debt.name.as_str()).collect();
        assert_eq!(names, vec!["soon", "late", "new", "old"]);
    }

    #[test]
    fn order_by_sql_appends_uuid_tiebreak() {
        assert_eq!(
            order_by_sql(&DEBT_LIST_SORT),
            "(due_date IS NOT NULL) DESC, due_date ASC, updated_at DESC, uuid ASC"
        );
    }
}
