//! Persistence capability used by `create` and `create_many`
//!
//! Factories do not write to the database themselves. The host ORM supplies a
//! [`RowPersister`]; [`MemoryStore`] is an in-memory implementation for tests
//! and seeding dry runs.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::error::FactoryResult;
use crate::row::ModelRow;

/// Writes factory rows to the underlying store
#[async_trait]
pub trait RowPersister: Send + Sync {
    /// Persist a row. Implementations must populate the primary key when the
    /// store generates it.
    async fn insert(&self, row: &mut ModelRow) -> FactoryResult<()>;

    /// Persist a many-to-many pivot row
    async fn insert_pivot(
        &self,
        table: &str,
        attributes: Map<String, Value>,
    ) -> FactoryResult<()>;
}

/// In-memory store with per-table auto-increment keys
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Arc<DashMap<String, Vec<ModelRow>>>,
    pivots: Arc<DashMap<String, Vec<Map<String, Value>>>>,
    sequences: Arc<DashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows inserted into a table, in insertion order
    pub fn rows(&self, table: &str) -> Vec<ModelRow> {
        self.rows
            .get(table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    pub fn pivots(&self, table: &str) -> Vec<Map<String, Value>> {
        self.pivots
            .get(table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, table: &str) -> usize {
        self.rows.get(table).map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        self.rows.clear();
        self.pivots.clear();
        self.sequences.clear();
    }

    fn next_id(&self, table: &str) -> i64 {
        let mut sequence = self.sequences.entry(table.to_string()).or_insert(0);
        *sequence += 1;
        *sequence
    }

    /// Keep auto-assigned ids above an explicitly inserted integer key
    fn advance_sequence(&self, table: &str, key: i64) {
        let mut sequence = self.sequences.entry(table.to_string()).or_insert(0);
        *sequence = (*sequence).max(key);
    }
}

#[async_trait]
impl RowPersister for MemoryStore {
    async fn insert(&self, row: &mut ModelRow) -> FactoryResult<()> {
        match row.key() {
            Some(key) => {
                if let Some(explicit) = key.as_i64() {
                    self.advance_sequence(row.table(), explicit);
                }
            }
            None => {
                let id = self.next_id(row.table());
                row.set_key(id);
            }
        }
        row.mark_persisted();

        // Stored rows are flat; related rows live in their own tables
        let mut stored = ModelRow::new(row.model(), row.table(), row.primary_key_column());
        stored.merge(row.attributes());
        stored.mark_persisted();

        self.rows
            .entry(row.table().to_string())
            .or_default()
            .push(stored);

        Ok(())
    }

    async fn insert_pivot(&self, table: &str, attributes: Map<String, Value>) -> FactoryResult<()> {
        self.pivots
            .entry(table.to_string())
            .or_default()
            .push(attributes);
        Ok(())
    }
}
