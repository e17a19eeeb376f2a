//! # elif-factory: Model factories for elif.rs
//!
//! Declarative factories for building test and seed rows. A factory binds a
//! model descriptor to a new-up function, named states and relation bindings
//! (belongs-to, has-one, has-many, many-to-many). Builders produced by a
//! factory make rows in memory, make stubbed rows with fake keys, or create
//! them through a host-supplied [`RowPersister`].

pub mod config;
pub mod error;
pub mod factory;
pub mod model;
pub mod persistence;
pub mod relationships;
pub mod row;

// Used by the `attributes!` macro
#[doc(hidden)]
pub use serde_json;

pub use config::*;
pub use error::*;
pub use factory::*;
pub use model::*;
pub use persistence::*;
pub use relationships::*;
pub use row::*;
