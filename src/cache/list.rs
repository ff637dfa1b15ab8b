//! The current page of a resource's list view.

use crate::model::{record_id, Record, RecordId};

/// Ids of the last fetched page, in server order, plus the server's total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    pub ids: Vec<RecordId>,
    pub total: u64,
}

impl ListState {
    /// Builds the list state from a `GET_LIST` response. A missing `total`
    /// falls back to the page length.
    pub fn from_page(records: &[Record], total: Option<u64>) -> Self {
        let ids: Vec<RecordId> = records.iter().filter_map(record_id).collect();
        let total = total.unwrap_or(ids.len() as u64);
        Self { ids, total }
    }
}
