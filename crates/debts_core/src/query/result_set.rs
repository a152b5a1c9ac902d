//! Sectioned query snapshot.
//!
//! # Invariants
//! - Rows inside a section follow the query sort order.
//! - There are at most two sections, expired first, and no section is ever
//!   empty.
//! - `is_expired` is evaluated against the store clock whenever the row is
//!   read; live queries re-check retained rows on every applied notification.

use crate::model::debt::{Debt, DebtId};

/// Row position inside a sectioned list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexPath {
    pub section: usize,
    pub row: usize,
}

impl IndexPath {
    pub const fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

/// Identity of a section. Declaration order is section order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKey {
    Expired,
    Relevant,
}

impl SectionKey {
    pub fn for_row(row: &FetchedDebt) -> Self {
        if row.is_expired {
            Self::Expired
        } else {
            Self::Relevant
        }
    }
}

/// Header label of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionTitle {
    Expired,
    Relevant,
}

impl SectionTitle {
    pub fn text(self) -> &'static str {
        match self {
            Self::Expired => "Expired",
            Self::Relevant => "Relevant",
        }
    }
}

/// One debt with its expiry as of the last read.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDebt {
    pub debt: Debt,
    pub is_expired: bool,
}

impl FetchedDebt {
    pub fn new(debt: Debt, now_ms: i64) -> Self {
        let is_expired = debt.is_expired(now_ms);
        Self { debt, is_expired }
    }

    pub fn id(&self) -> DebtId {
        self.debt.uuid
    }

    /// True when the stored flag no longer matches `now_ms`.
    pub fn expiry_outdated(&self, now_ms: i64) -> bool {
        self.debt.is_expired(now_ms) != self.is_expired
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSection {
    pub key: SectionKey,
    pub items: Vec<FetchedDebt>,
}

/// Ordered, sectioned rows of one live query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    sections: Vec<ResultSection>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Groups already sorted rows into sections, keeping row order.
    pub(crate) fn from_sorted(items: Vec<FetchedDebt>) -> Self {
        let mut sections: Vec<ResultSection> = Vec::new();
        for item in items {
            let key = SectionKey::for_row(&item);
            match sections.iter_mut().find(|section| section.key == key) {
                Some(section) => section.items.push(item),
                None => sections.push(ResultSection {
                    key,
                    items: vec![item],
                }),
            }
        }
        sections.sort_by_key(|section| section.key);
        Self { sections }
    }

    pub fn sections(&self) -> &[ResultSection] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Rows in `section`, or zero when out of range.
    pub fn row_count(&self, section: usize) -> usize {
        self.sections
            .get(section)
            .map_or(0, |section| section.items.len())
    }

    pub fn total_count(&self) -> usize {
        self.sections.iter().map(|section| section.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    pub fn object_at(&self, path: IndexPath) -> Option<&FetchedDebt> {
        self.sections.get(path.section)?.items.get(path.row)
    }

    pub fn index_path_of(&self, id: DebtId) -> Option<IndexPath> {
        self.sections
            .iter()
            .enumerate()
            .find_map(|(section_index, section)| {
                section
                    .items
                    .iter()
                    .position(|item| item.id() == id)
                    .map(|row| IndexPath::new(section_index, row))
            })
    }

    /// Header label: section 0 reads "Expired" when its first row is expired,
    /// any other first section reads "Relevant", section 1 always reads
    /// "Relevant". Empty or missing sections have no label.
    pub fn section_title(&self, section: usize) -> Option<SectionTitle> {
        let first = self.sections.get(section)?.items.first()?;
        match section {
            0 if first.is_expired => Some(SectionTitle::Expired),
            0 | 1 => Some(SectionTitle::Relevant),
            _ => None,
        }
    }

    /// Row ids per section, the shape a list view mirrors.
    pub fn ids(&self) -> Vec<Vec<DebtId>> {
        self.sections
            .iter()
            .map(|section| section.items.iter().map(FetchedDebt::id).collect())
            .collect()
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (IndexPath, &FetchedDebt)> {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(section_index, section)| {
                section
                    .items
                    .iter()
                    .enumerate()
                    .map(move |(row, item)| (IndexPath::new(section_index, row), item))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchedDebt, IndexPath, ResultSet, SectionKey, SectionTitle};
    use crate::model::debt::{Debt, Ownership};

    const NOW: i64 = 1_700_000_000_000;

    fn fetched(name: &str, due: Option<i64>) -> FetchedDebt {
        let mut debt = Debt::new(Ownership::MyDebt, name, NOW);
        debt.due_date = due;
        FetchedDebt::new(debt, NOW)
    }

    #[test]
    fn expired_section_comes_first_and_is_labelled() {
        let set = ResultSet::from_sorted(
            vec![fetched("past", Some(NOW - 1)), fetched("later", Some(NOW + 1))],
        );
        assert_eq!(set.section_count(), 2);
        assert_eq!(set.sections()[0].key, SectionKey::Expired);
        assert_eq!(set.section_title(0), Some(SectionTitle::Expired));
        assert_eq!(set.section_title(1), Some(SectionTitle::Relevant));
    }

    #[test]
    fn lone_relevant_section_is_labelled_relevant() {
        let set = ResultSet::from_sorted(vec![fetched("later", None)]);
        assert_eq!(set.section_count(), 1);
        assert_eq!(set.section_title(0), Some(SectionTitle::Relevant));
    }

    #[test]
    fn out_of_range_lookups_do_not_fault() {
        let set = ResultSet::empty();
        assert_eq!(set.section_title(0), None);
        assert_eq!(set.section_title(7), None);
        assert_eq!(set.row_count(3), 0);
        assert!(set.object_at(IndexPath::new(0, 0)).is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn expiry_goes_stale_once_the_due_date_passes() {
        let row = fetched("soon", Some(NOW + 1));
        assert!(!row.is_expired);
        assert!(!row.expiry_outdated(NOW));
        assert!(row.expiry_outdated(NOW + 2));
        assert!(!fetched("undated", None).expiry_outdated(NOW + 2));
    }
}
