//! Relation bindings registered on a model factory
//!
//! A binding pairs the model's [`RelationshipMetadata`] with the callback that
//! produces a builder for the related factory. Bindings know how to wire keys
//! between the parent row and the related rows for their cardinality.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{FactoryError, FactoryResult};
use crate::factory::builder::FactoryBuilder;
use crate::factory::context::BuildMode;
use crate::persistence::RowPersister;
use crate::relationships::{RelationshipMetadata, RelationshipType};
use crate::row::ModelRow;

pub mod belongs_to;
pub mod has_many;
pub mod has_one;
pub mod many_to_many;

pub use belongs_to::BelongsTo;
pub use has_many::HasMany;
pub use has_one::HasOne;
pub use many_to_many::ManyToMany;

/// Produces a builder for the related model's factory
pub type RelationCallback = Arc<dyn Fn() -> FactoryBuilder + Send + Sync>;

/// Customizes the related builder for a single `with_related` request
pub type RelatedCustomizer = Arc<dyn Fn(FactoryBuilder) -> FactoryBuilder + Send + Sync>;

/// A relation requested on a builder through `with` / `with_related`
#[derive(Clone)]
pub struct RelationRequest {
    pub(crate) name: String,
    pub(crate) count: usize,
    pub(crate) customize: Option<RelatedCustomizer>,
}

impl RelationRequest {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl fmt::Debug for RelationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationRequest")
            .field("name", &self.name)
            .field("count", &self.count)
            .field("customized", &self.customize.is_some())
            .finish()
    }
}

/// Behaviour shared by every relation binding
#[async_trait]
pub trait FactoryRelation: Send + Sync {
    fn relationship_type(&self) -> RelationshipType;

    fn metadata(&self) -> &RelationshipMetadata;

    /// The callback registered through `ModelFactory::related`
    fn callback(&self) -> &RelationCallback;

    /// Builder for the related side, with the request customization applied
    fn related_builder(&self, request: &RelationRequest) -> FactoryBuilder {
        let builder = (self.callback())();
        match &request.customize {
            Some(customize) => customize(builder),
            None => builder,
        }
    }

    /// Build related rows in memory and attach them to `parent`
    fn make_for_parent(
        &self,
        parent: &mut ModelRow,
        request: &RelationRequest,
        mode: BuildMode,
    ) -> FactoryResult<()>;

    /// Persist related rows and attach them to `parent`
    async fn create_for_parent(
        &self,
        parent: &mut ModelRow,
        request: &RelationRequest,
        persister: &dyn RowPersister,
    ) -> FactoryResult<()>;
}

/// A relation registered on a model factory, tagged by cardinality
#[derive(Clone)]
pub enum RelationBinding {
    BelongsTo(BelongsTo),
    HasOne(HasOne),
    HasMany(HasMany),
    ManyToMany(ManyToMany),
}

impl RelationBinding {
    /// Binding for the given metadata, or `None` for kinds factories cannot wire
    pub fn for_metadata(
        metadata: RelationshipMetadata,
        callback: RelationCallback,
    ) -> Option<Self> {
        match metadata.relationship_type {
            RelationshipType::BelongsTo => {
                Some(Self::BelongsTo(BelongsTo::new(metadata, callback)))
            }
            RelationshipType::HasOne => Some(Self::HasOne(HasOne::new(metadata, callback))),
            RelationshipType::HasMany => Some(Self::HasMany(HasMany::new(metadata, callback))),
            RelationshipType::ManyToMany => {
                Some(Self::ManyToMany(ManyToMany::new(metadata, callback)))
            }
            RelationshipType::MorphOne
            | RelationshipType::MorphMany
            | RelationshipType::MorphTo => None,
        }
    }

    pub fn as_relation(&self) -> &dyn FactoryRelation {
        match self {
            Self::BelongsTo(relation) => relation as &dyn FactoryRelation,
            Self::HasOne(relation) => relation as &dyn FactoryRelation,
            Self::HasMany(relation) => relation as &dyn FactoryRelation,
            Self::ManyToMany(relation) => relation as &dyn FactoryRelation,
        }
    }

    pub fn relationship_type(&self) -> RelationshipType {
        self.as_relation().relationship_type()
    }

    pub fn metadata(&self) -> &RelationshipMetadata {
        self.as_relation().metadata()
    }

    pub fn callback(&self) -> &RelationCallback {
        self.as_relation().callback()
    }

    /// Belongs-to parents have to exist before the row that points at them
    pub fn wires_before_parent(&self) -> bool {
        matches!(self, Self::BelongsTo(_))
    }

    /// Number of related rows a request may produce for this cardinality
    pub(crate) fn effective_count(&self, requested: usize) -> usize {
        match self {
            Self::BelongsTo(_) | Self::HasOne(_) => 1,
            Self::HasMany(_) | Self::ManyToMany(_) => requested,
        }
    }
}

impl fmt::Debug for RelationBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationBinding")
            .field("type", &self.relationship_type())
            .field("metadata", self.metadata())
            .finish()
    }
}

/// Value of the relation's local key on `row`, which is the row's own primary
/// key unless the metadata names another column
pub(crate) fn local_key_value(
    metadata: &RelationshipMetadata,
    row: &ModelRow,
    required: bool,
) -> FactoryResult<Value> {
    wiring_key(row, metadata.local_key_or(row.primary_key_column()), required)
}

/// Read a key used for wiring. Missing keys become `null` unless `required`.
pub(crate) fn wiring_key(row: &ModelRow, column: &str, required: bool) -> FactoryResult<Value> {
    match row.get(column).filter(|value| !value.is_null()) {
        Some(value) => Ok(value.clone()),
        None if required => Err(FactoryError::MissingKey {
            model: row.model().to_string(),
            column: column.to_string(),
        }),
        None => Ok(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelSchema;
    use crate::relationships::{ForeignKeyConfig, PolymorphicConfig};
    use crate::ModelFactory;
    use serde_json::json;

    fn callback() -> RelationCallback {
        let posts = ModelFactory::define(ModelSchema::new("Post", "posts"), |_| {
            Ok(serde_json::Map::new())
        });
        Arc::new(move || posts.build())
    }

    fn metadata(kind: RelationshipType) -> RelationshipMetadata {
        RelationshipMetadata::new(
            kind,
            "posts",
            "Post",
            "posts",
            ForeignKeyConfig::simple("user_id", "posts"),
        )
    }

    fn bind(kind: RelationshipType) -> Option<RelationBinding> {
        RelationBinding::for_metadata(metadata(kind), callback())
    }

    #[test]
    fn test_binding_variant_follows_kind() {
        assert!(matches!(bind(RelationshipType::HasMany), Some(RelationBinding::HasMany(_))));
        assert!(matches!(bind(RelationshipType::HasOne), Some(RelationBinding::HasOne(_))));

        let binding = bind(RelationshipType::BelongsTo);
        assert!(matches!(binding, Some(RelationBinding::BelongsTo(_))));
        assert!(binding.unwrap().wires_before_parent());

        assert!(matches!(
            bind(RelationshipType::ManyToMany),
            Some(RelationBinding::ManyToMany(_))
        ));
    }

    #[test]
    fn test_polymorphic_kinds_have_no_binding() {
        let morph = metadata(RelationshipType::MorphMany)
            .with_polymorphic(PolymorphicConfig::new("commentable"));
        assert!(RelationBinding::for_metadata(morph, callback()).is_none());
    }

    #[test]
    fn test_effective_count() {
        let has_one = bind(RelationshipType::HasOne).unwrap();
        assert_eq!(has_one.effective_count(5), 1);

        let has_many = bind(RelationshipType::HasMany).unwrap();
        assert_eq!(has_many.effective_count(5), 5);
    }

    #[test]
    fn test_wiring_key() {
        let mut row = ModelRow::new("User", "users", "id");
        assert_eq!(wiring_key(&row, "id", false).unwrap(), Value::Null);
        assert!(matches!(
            wiring_key(&row, "id", true),
            Err(FactoryError::MissingKey { .. })
        ));

        row.set_key(4);
        assert_eq!(wiring_key(&row, "id", true).unwrap(), json!(4));
    }

    #[test]
    fn test_local_key_defaults_to_row_primary_key() {
        let mut account = ModelRow::new("Account", "accounts", "uuid");
        account.set_key("acc-1");
        account.set("code", "ACME");

        let posts = metadata(RelationshipType::HasMany);
        assert_eq!(local_key_value(&posts, &account, true).unwrap(), json!("acc-1"));

        let by_code = posts.with_local_key("code");
        assert_eq!(local_key_value(&by_code, &account, true).unwrap(), json!("ACME"));
    }
}
