//! Lazy iteration over AQL query results.
use super::client::{encode_segment, ArangoClient, Method};
use super::error::{DriverError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::VecDeque;

/// Per-query options; `None` fields fall back to server defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub batch_size: Option<u32>,
    pub count: bool,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub(crate) struct CursorResponse<T> {
    #[serde(default)]
    pub(crate) result: Vec<T>,
    #[serde(default, rename = "hasMore")]
    pub(crate) has_more: bool,
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) count: Option<u64>,
}

/// Forward-only result stream. Each item is yielded once; a cursor cannot be
/// restarted.
///
/// Dropping a cursor that still has server-side batches discards them.
pub struct Cursor<'a, T> {
    client: &'a ArangoClient,
    database: String,
    id: Option<String>,
    batch: VecDeque<T>,
    /// Last `hasMore` reported by the server.
    has_more: bool,
    /// Set after a failed continuation; iteration ends but the server-side
    /// cursor may still be open.
    failed: bool,
    count: Option<u64>,
}

impl<'a, T> Cursor<'a, T> {
    pub(crate) fn new(client: &'a ArangoClient, database: &str, first: CursorResponse<T>) -> Self {
        Self {
            client,
            database: database.to_string(),
            id: first.id,
            batch: first.result.into(),
            has_more: first.has_more,
            failed: false,
            count: first.count,
        }
    }

    /// Total result count, present when the query asked for it.
    pub fn result_count(&self) -> Option<u64> {
        self.count
    }

    fn cursor_path(&self, id: &str) -> String {
        format!(
            "/_db/{}/_api/cursor/{}",
            encode_segment(&self.database),
            encode_segment(id)
        )
    }
}

impl<T: DeserializeOwned> Cursor<'_, T> {
    fn fetch_next_batch(&mut self) -> Result<()> {
        let id = self.id.as_deref().ok_or(DriverError::CursorExhausted)?;
        let path = self.cursor_path(id);
        let body = self.client.request(Method::Put, &path, None)?;
        let next: CursorResponse<T> = serde_json::from_str(&body)?;
        tracing::debug!(cursor = id, batch = next.result.len(), has_more = next.has_more, "cursor batch");
        self.batch.extend(next.result);
        self.has_more = next.has_more;
        Ok(())
    }
}

impl<T: DeserializeOwned> Iterator for Cursor<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.batch.pop_front() {
                return Some(Ok(item));
            }
            if !self.has_more || self.failed {
                return None;
            }
            if let Err(err) = self.fetch_next_batch() {
                self.failed = true;
                return Some(Err(err));
            }
        }
    }
}

impl<T> Drop for Cursor<'_, T> {
    fn drop(&mut self) {
        if !self.has_more {
            return;
        }
        if let Some(id) = self.id.take() {
            let path = self.cursor_path(&id);
            if let Err(err) = self.client.request(Method::Delete, &path, None) {
                tracing::debug!(cursor = %id, error = %err, "discard cursor failed");
            }
        }
    }
}
