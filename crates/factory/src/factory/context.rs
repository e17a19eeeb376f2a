//! Build context passed to new-up functions and state callbacks

use std::sync::atomic::{AtomicU64, Ordering};

use super::fake_data::Faker;

static STUB_ID: AtomicU64 = AtomicU64::new(1);

/// Next process-unique id for stubbed rows
pub(crate) fn next_stub_id() -> u64 {
    STUB_ID.fetch_add(1, Ordering::Relaxed)
}

/// How a builder invocation materializes rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// In-memory rows without primary keys
    Make,
    /// In-memory rows with fake primary keys
    Stubbed,
    /// Rows handed to a persister
    Create,
}

/// Context for a single builder invocation
#[derive(Debug, Clone)]
pub struct FactoryContext {
    /// Fake data generator, seeded from the factory config when a seed is set
    pub faker: Faker,
    mode: BuildMode,
    index: usize,
}

impl FactoryContext {
    pub fn new(faker: Faker, mode: BuildMode) -> Self {
        Self {
            faker,
            mode,
            index: 0,
        }
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn is_stubbed(&self) -> bool {
        self.mode == BuildMode::Stubbed
    }

    pub fn is_persisting(&self) -> bool {
        self.mode == BuildMode::Create
    }

    /// Position of the row being built within a `*_many` batch
    pub fn index(&self) -> usize {
        self.index
    }
}
