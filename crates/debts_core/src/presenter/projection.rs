//! On-screen row projection mutated only through change batches.
//!
//! # Invariants
//! - A batch applies atomically: on any out-of-range index the projection is
//!   left untouched and an error is returned.
//! - After a successful batch the projection mirrors the query result set.

use crate::model::debt::DebtId;
use crate::query::diff::{ChangeBatch, ChangeEvent};
use crate::query::result_set::{IndexPath, ResultSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// Batch does not start with `BeginBatch` and end with `EndBatch`.
    UnframedBatch,
    RowOutOfRange(IndexPath),
    SectionOutOfRange(usize),
}

impl Display for ProjectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnframedBatch => write!(f, "change batch is missing its frame markers"),
            Self::RowOutOfRange(path) => write!(
                f,
                "row {} in section {} is out of range",
                path.row, path.section
            ),
            Self::SectionOutOfRange(section) => write!(f, "section {section} is out of range"),
        }
    }
}

impl Error for ProjectionError {}

/// Rows whose cells or headers must be re-rendered after a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedBatch {
    pub inserted_rows: Vec<DebtId>,
    pub reloaded_rows: Vec<DebtId>,
    pub reloaded_sections: Vec<usize>,
}

/// Section/row ids as currently displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListProjection {
    sections: Vec<Vec<DebtId>>,
}

impl ListProjection {
    pub fn from_result_set(result_set: &ResultSet) -> Self {
        Self {
            sections: result_set.ids(),
        }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn row_count(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, Vec::len)
    }

    pub fn id_at(&self, path: IndexPath) -> Option<DebtId> {
        self.sections.get(path.section)?.get(path.row).copied()
    }

    pub fn mirrors(&self, result_set: &ResultSet) -> bool {
        self.sections == result_set.ids()
    }

    /// Applies one framed batch with list-view batch-update semantics.
    pub fn apply(&mut self, batch: &ChangeBatch) -> Result<AppliedBatch, ProjectionError> {
        let framed = matches!(batch.events.first(), Some(ChangeEvent::BeginBatch))
            && matches!(batch.events.last(), Some(ChangeEvent::EndBatch));
        if !framed {
            return Err(ProjectionError::UnframedBatch);
        }

        let mut removals = Vec::new();
        let mut insertions = Vec::new();
        let mut section_deletes = Vec::new();
        let mut section_inserts = Vec::new();
        let mut applied = AppliedBatch::default();

        for event in batch.body() {
            match event {
                ChangeEvent::Delete { path } => removals.push(*path),
                ChangeEvent::Insert { debt, new_path } => {
                    insertions.push((*new_path, debt.id()));
                    applied.inserted_rows.push(debt.id());
                }
                ChangeEvent::Move { debt, from, to } => {
                    removals.push(*from);
                    insertions.push((*to, debt.id()));
                    applied.reloaded_rows.push(debt.id());
                }
                ChangeEvent::Update { path, .. } => {
                    let id = self
                        .id_at(*path)
                        .ok_or(ProjectionError::RowOutOfRange(*path))?;
                    applied.reloaded_rows.push(id);
                }
                ChangeEvent::SectionDelete(section) => section_deletes.push(*section),
                ChangeEvent::SectionInsert(section) => section_inserts.push(*section),
                ChangeEvent::SectionUpdate(section) => applied.reloaded_sections.push(*section),
                ChangeEvent::BeginBatch | ChangeEvent::EndBatch => {
                    return Err(ProjectionError::UnframedBatch);
                }
            }
        }

        let mut next = self.sections.clone();

        removals.sort_unstable_by(|left, right| right.cmp(left));
        for path in removals {
            let rows = next
                .get_mut(path.section)
                .ok_or(ProjectionError::RowOutOfRange(path))?;
            if path.row >= rows.len() {
                return Err(ProjectionError::RowOutOfRange(path));
            }
            rows.remove(path.row);
        }

        section_deletes.sort_unstable_by(|left, right| right.cmp(left));
        for section in section_deletes {
            if section >= next.len() {
                return Err(ProjectionError::SectionOutOfRange(section));
            }
            next.remove(section);
        }

        section_inserts.sort_unstable();
        for section in section_inserts {
            if section > next.len() {
                return Err(ProjectionError::SectionOutOfRange(section));
            }
            next.insert(section, Vec::new());
        }

        insertions.sort_unstable_by_key(|(path, _)| *path);
        for (path, id) in insertions {
            let rows = next
                .get_mut(path.section)
                .ok_or(ProjectionError::RowOutOfRange(path))?;
            if path.row > rows.len() {
                return Err(ProjectionError::RowOutOfRange(path));
            }
            rows.insert(path.row, id);
        }

        self.sections = next;
        Ok(applied)
    }
}
