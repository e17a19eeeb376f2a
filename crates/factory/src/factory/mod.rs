//! Model Factory System
//!
//! A [`ModelFactory`] describes how to build rows for one model: a new-up
//! function, named states and relation bindings. Definitions are assembled
//! once, typically at test setup, and turned into a [`FactoryBuilder`] with
//! [`ModelFactory::build`] whenever rows are needed.
//!
//! ```ignore
//! let posts = ModelFactory::define(post_schema(), |ctx| {
//!     Ok(attributes! { "title" => ctx.faker.sentence() })
//! })
//! .state("draft", |row, _| {
//!     row.set("status", "draft");
//!     Ok(())
//! });
//!
//! let users = ModelFactory::define(user_schema(), |ctx| {
//!     Ok(attributes! { "email" => ctx.faker.email() })
//! })
//! .related("posts", move || posts.build())?;
//!
//! let user = users.build().with("posts", 3).create(&store).await?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{factory_config, FactoryConfig};
use crate::error::{FactoryError, FactoryResult};
use crate::model::{Factoryable, ModelDescriptor};
use crate::row::ModelRow;

pub mod builder;
pub mod context;
pub mod fake_data;
pub mod relations;

pub use builder::FactoryBuilder;
pub use context::{BuildMode, FactoryContext};
pub use fake_data::Faker;
pub use relations::{
    BelongsTo, FactoryRelation, HasMany, HasOne, ManyToMany, RelationBinding, RelationCallback,
};

/// Produces a fresh, unsaved row for the factory's model
pub type NewUpFn = Arc<dyn Fn(&mut FactoryContext) -> FactoryResult<ModelRow> + Send + Sync>;

/// Mutates a row to produce a named variation
pub type StateCallback =
    Arc<dyn Fn(&mut ModelRow, &mut FactoryContext) -> FactoryResult<()> + Send + Sync>;

/// Registry of states and relations for a single model
#[derive(Clone)]
pub struct ModelFactory {
    model: Arc<dyn ModelDescriptor>,
    new_up: NewUpFn,
    states: HashMap<String, StateCallback>,
    relations: HashMap<String, RelationBinding>,
    config: FactoryConfig,
}

impl ModelFactory {
    /// Factory for `model` whose rows come from `new_up`
    pub fn new<M, F>(model: M, new_up: F) -> Self
    where
        M: ModelDescriptor + 'static,
        F: Fn(&mut FactoryContext) -> FactoryResult<ModelRow> + Send + Sync + 'static,
    {
        Self::from_parts(Arc::new(model), Arc::new(new_up))
    }

    /// Factory whose rows are the attributes returned by `definition`
    pub fn define<M, F>(model: M, definition: F) -> Self
    where
        M: ModelDescriptor + 'static,
        F: Fn(&mut FactoryContext) -> FactoryResult<Map<String, Value>> + Send + Sync + 'static,
    {
        let model: Arc<dyn ModelDescriptor> = Arc::new(model);
        let descriptor = Arc::clone(&model);
        let new_up: NewUpFn = Arc::new(move |ctx: &mut FactoryContext| -> FactoryResult<ModelRow> {
            let mut row = ModelRow::for_model(descriptor.as_ref());
            row.merge(&definition(ctx)?);
            Ok(row)
        });
        Self::from_parts(model, new_up)
    }

    /// Factory for a typed model described by its [`Factoryable`] schema
    pub fn for_model<T, F>(definition: F) -> Self
    where
        T: Factoryable,
        F: Fn(&mut FactoryContext) -> FactoryResult<Map<String, Value>> + Send + Sync + 'static,
    {
        Self::define(T::schema(), definition)
    }

    fn from_parts(model: Arc<dyn ModelDescriptor>, new_up: NewUpFn) -> Self {
        Self {
            model,
            new_up,
            states: HashMap::new(),
            relations: HashMap::new(),
            config: factory_config(),
        }
    }

    /// Override the global configuration for this factory
    pub fn with_config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(&self) -> &dyn ModelDescriptor {
        self.model.as_ref()
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Run the new-up function
    pub fn new_up(&self, ctx: &mut FactoryContext) -> FactoryResult<ModelRow> {
        (self.new_up)(ctx)
    }

    /// Register a state, replacing any state with the same name
    pub fn state<F>(mut self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut ModelRow, &mut FactoryContext) -> FactoryResult<()> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(model = %self.model.name(), state = %name, "registered factory state");
        self.states.insert(name, Arc::new(callback));
        self
    }

    /// Registered callback for a state
    pub fn get_state(&self, name: &str) -> FactoryResult<&StateCallback> {
        self.states
            .get(name)
            .ok_or_else(|| FactoryError::UndefinedState {
                state: name.to_string(),
            })
    }

    /// Bind a relation declared on the model to the factory that builds its
    /// related rows. `callback` returns a builder for the related factory.
    ///
    /// Relations the model does not declare are rejected. Polymorphic relations
    /// cannot be wired by factories; they are skipped unless
    /// `strict_relations` is enabled, in which case they are rejected.
    ///
    /// The factory is consumed on error. Use
    /// [`register_relation`](Self::register_relation) to keep it.
    pub fn related<F>(mut self, name: &str, callback: F) -> FactoryResult<Self>
    where
        F: Fn() -> FactoryBuilder + Send + Sync + 'static,
    {
        self.register_relation(name, callback)?;
        Ok(self)
    }

    /// In-place form of [`related`](Self::related). On error the registry is
    /// left unchanged.
    pub fn register_relation<F>(&mut self, name: &str, callback: F) -> FactoryResult<&mut Self>
    where
        F: Fn() -> FactoryBuilder + Send + Sync + 'static,
    {
        let metadata = self
            .model
            .relation(name)
            .ok_or_else(|| FactoryError::RelationNotOnModel {
                relation: name.to_string(),
                model: self.model.name().to_string(),
            })?;
        let kind = metadata.relationship_type;

        if !kind.is_polymorphic() {
            metadata.validate()?;
        }

        match RelationBinding::for_metadata(metadata, Arc::new(callback)) {
            Some(binding) => {
                debug!(
                    model = %self.model.name(),
                    relation = %name,
                    ?kind,
                    "registered factory relation"
                );
                self.relations.insert(name.to_string(), binding);
            }
            None if self.config.strict_relations => {
                return Err(FactoryError::UnsupportedRelation {
                    relation: name.to_string(),
                    model: self.model.name().to_string(),
                    kind,
                });
            }
            None => {
                warn!(
                    model = %self.model.name(),
                    relation = %name,
                    ?kind,
                    "skipping relation factories cannot wire"
                );
            }
        }

        Ok(self)
    }

    /// Registered binding for a relation
    pub fn get_relation(&self, name: &str) -> FactoryResult<&RelationBinding> {
        self.relations
            .get(name)
            .ok_or_else(|| FactoryError::UndefinedRelation {
                relation: name.to_string(),
            })
    }

    pub fn state_names(&self) -> Vec<&str> {
        self.states.keys().map(|name| name.as_str()).collect()
    }

    pub fn relation_names(&self) -> Vec<&str> {
        self.relations.keys().map(|name| name.as_str()).collect()
    }

    /// Fresh builder bound to this factory
    pub fn build(&self) -> FactoryBuilder {
        FactoryBuilder::new(Arc::new(self.clone()))
    }
}

impl fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFactory")
            .field("model", &self.model.name())
            .field("states", &self.state_names())
            .field("relations", &self.relations)
            .field("config", &self.config)
            .finish()
    }
}
