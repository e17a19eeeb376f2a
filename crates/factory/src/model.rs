//! Model descriptors - what a factory needs to know about the model it builds
//!
//! Factories never talk to the database schema directly. They only need the
//! model's name, table, primary key column and a way to resolve a relation
//! name into its metadata. Applications either implement [`ModelDescriptor`]
//! on top of their ORM models or describe the model with a [`ModelSchema`].

use std::collections::HashMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::FactoryResult;
use crate::relationships::{
    ForeignKeyConfig, PivotConfig, PolymorphicConfig, RelationshipMetadata, RelationshipType,
};

/// Capability contract for the model type a factory is bound to
pub trait ModelDescriptor: Send + Sync + Debug {
    /// Model type name used in error messages, e.g. "User"
    fn name(&self) -> &str;

    fn table(&self) -> &str;

    fn primary_key(&self) -> &str {
        "id"
    }

    /// Resolve a relation declared on the model, or `None` when it does not exist
    fn relation(&self, name: &str) -> Option<RelationshipMetadata>;
}

/// Declarative model description implementing [`ModelDescriptor`]
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    name: String,
    table: String,
    primary_key: String,
    relations: HashMap<String, RelationshipMetadata>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            relations: HashMap::new(),
        }
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Declare an arbitrary relation; the metadata name is the lookup key
    pub fn with_relation(mut self, metadata: RelationshipMetadata) -> Self {
        self.relations.insert(metadata.name.clone(), metadata);
        self
    }

    /// `foreign_key` lives on the related table and points at this model's key
    pub fn has_one(
        self,
        name: &str,
        related_model: &str,
        related_table: &str,
        foreign_key: &str,
    ) -> Self {
        self.with_relation(RelationshipMetadata::new(
            RelationshipType::HasOne,
            name,
            related_model,
            related_table,
            ForeignKeyConfig::simple(foreign_key, related_table),
        ))
    }

    pub fn has_many(
        self,
        name: &str,
        related_model: &str,
        related_table: &str,
        foreign_key: &str,
    ) -> Self {
        self.with_relation(RelationshipMetadata::new(
            RelationshipType::HasMany,
            name,
            related_model,
            related_table,
            ForeignKeyConfig::simple(foreign_key, related_table),
        ))
    }

    /// `foreign_key` lives on this model's table and points at the related
    /// model's primary key
    pub fn belongs_to(
        self,
        name: &str,
        related_model: &str,
        related_table: &str,
        foreign_key: &str,
    ) -> Self {
        let table = self.table.clone();
        self.with_relation(RelationshipMetadata::new(
            RelationshipType::BelongsTo,
            name,
            related_model,
            related_table,
            ForeignKeyConfig::simple(foreign_key, table),
        ))
    }

    pub fn many_to_many(
        self,
        name: &str,
        related_model: &str,
        related_table: &str,
        pivot: PivotConfig,
    ) -> Self {
        self.with_relation(
            RelationshipMetadata::new(
                RelationshipType::ManyToMany,
                name,
                related_model,
                related_table,
                ForeignKeyConfig::simple(pivot.local_key.clone(), pivot.table.clone()),
            )
            .with_pivot(pivot),
        )
    }

    pub fn morph_many(
        self,
        name: &str,
        related_model: &str,
        related_table: &str,
        morph_name: &str,
    ) -> Self {
        let poly = PolymorphicConfig::new(morph_name);
        self.with_relation(
            RelationshipMetadata::new(
                RelationshipType::MorphMany,
                name,
                related_model,
                related_table,
                ForeignKeyConfig::simple(poly.id_column.clone(), related_table),
            )
            .with_polymorphic(poly),
        )
    }

    pub fn relation_names(&self) -> Vec<&str> {
        self.relations.keys().map(|name| name.as_str()).collect()
    }

    /// Validate every declared relation
    pub fn validate(&self) -> FactoryResult<()> {
        for metadata in self.relations.values() {
            metadata.validate()?;
        }
        Ok(())
    }
}

impl ModelDescriptor for ModelSchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn table(&self) -> &str {
        &self.table
    }

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn relation(&self, name: &str) -> Option<RelationshipMetadata> {
        self.relations.get(name).cloned()
    }
}

/// Typed models that can be produced by factories
pub trait Factoryable: Serialize + DeserializeOwned + Send + Sync {
    /// Describe the model and its relations
    fn schema() -> ModelSchema;
}
