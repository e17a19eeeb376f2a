//! Rows produced by factories

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FactoryResult;
use crate::model::ModelDescriptor;

/// A model instance as built by a factory: attributes plus attached related rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRow {
    model: String,
    table: String,
    primary_key: String,
    attributes: Map<String, Value>,
    related: HashMap<String, Vec<ModelRow>>,
    persisted: bool,
}

impl ModelRow {
    pub fn new(
        model: impl Into<String>,
        table: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            table: table.into(),
            primary_key: primary_key.into(),
            attributes: Map::new(),
            related: HashMap::new(),
            persisted: false,
        }
    }

    /// Empty row for the described model
    pub fn for_model(model: &dyn ModelDescriptor) -> Self {
        Self::new(model.name(), model.table(), model.primary_key())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key_column(&self) -> &str {
        &self.primary_key
    }

    /// Primary key value, if one has been assigned
    pub fn key(&self) -> Option<&Value> {
        self.get(&self.primary_key).filter(|value| !value.is_null())
    }

    pub fn set_key(&mut self, value: impl Into<Value>) {
        let column = self.primary_key.clone();
        self.set(column, value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(column.into(), value.into());
        self
    }

    /// Overlay attributes onto the row, replacing existing columns
    pub fn merge(&mut self, attributes: &Map<String, Value>) -> &mut Self {
        for (column, value) in attributes {
            self.attributes.insert(column.clone(), value.clone());
        }
        self
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Rows attached through the named relation
    pub fn related(&self, relation: &str) -> &[ModelRow] {
        self.related
            .get(relation)
            .map(|rows| rows.as_slice())
            .unwrap_or(&[])
    }

    pub fn attach(&mut self, relation: impl Into<String>, rows: Vec<ModelRow>) {
        self.related.entry(relation.into()).or_default().extend(rows);
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// Deserialize the row attributes into a typed model
    pub fn into_model<T: DeserializeOwned>(self) -> FactoryResult<T> {
        Ok(serde_json::from_value(Value::Object(self.attributes))?)
    }
}

/// Build an attribute map for factory definitions and merges
///
/// ```ignore
/// let attributes = attributes! { "email" => ctx.faker.email(), "age" => 30 };
/// ```
#[macro_export]
macro_rules! attributes {
    () => {
        $crate::serde_json::Map::<String, $crate::serde_json::Value>::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut attributes = $crate::serde_json::Map::<String, $crate::serde_json::Value>::new();
        $(
            attributes.insert(($column).to_string(), $crate::serde_json::json!($value));
        )+
        attributes
    }};
}
