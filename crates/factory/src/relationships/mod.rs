//! Relationship metadata consumed by factories

pub mod metadata;

pub use metadata::*;
