//! Per-item outcomes for operations over a selection of ids.

use std::collections::HashSet;

use forkd_common::{AppError, AppResult};

/// Outcome of one item in a bulk operation.
#[derive(Debug)]
pub struct BulkItem<T> {
    pub id: String,
    pub result: AppResult<T>,
}

/// Ordered per-item outcomes. One failing item never blocks the rest.
#[derive(Debug)]
pub struct BulkOutcome<T> {
    pub items: Vec<BulkItem<T>>,
}

impl<T> BulkOutcome<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, id: impl Into<String>, result: AppResult<T>) {
        self.items.push(BulkItem {
            id: id.into(),
            result,
        });
    }

    /// Number of items that went through.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    /// Number of items that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    /// Ids of the failed items, in selection order.
    #[must_use]
    pub fn failed_ids(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| i.result.is_err())
            .map(|i| i.id.as_str())
            .collect()
    }
}

impl<T> Default for BulkOutcome<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// De-duplicate a selection, keeping first-seen order.
///
/// Blank ids are dropped. An empty selection is a validation error.
pub fn normalize_selection(ids: &[String], what: &str) -> AppResult<Vec<String>> {
    let mut seen = HashSet::new();
    let selection: Vec<String> = ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(*id))
        .map(String::from)
        .collect();

    if selection.is_empty() {
        return Err(AppError::validation(format!("No {what} selected")));
    }
    Ok(selection)
}
