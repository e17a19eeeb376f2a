//! Factory builder - materializes rows from a model factory definition

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::context::{next_stub_id, BuildMode, FactoryContext};
use super::fake_data::Faker;
use super::relations::{RelationBinding, RelationRequest};
use super::ModelFactory;
use crate::error::{FactoryError, FactoryResult};
use crate::persistence::RowPersister;
use crate::row::ModelRow;

/// Per-row hook run after states and belongs-to wiring
pub type TapCallback =
    Arc<dyn Fn(&mut ModelRow, &mut FactoryContext) -> FactoryResult<()> + Send + Sync>;

type RowsFuture<'a> = Pin<Box<dyn Future<Output = FactoryResult<Vec<ModelRow>>> + Send + 'a>>;

/// Builder bound to a single [`ModelFactory`]
///
/// Builders are cheap to clone and every configuration method consumes and
/// returns the builder, so a base builder can be reused:
///
/// ```ignore
/// let users = user_factory.build().apply("verified");
/// let admin = users.clone().apply("admin").make()?;
/// let user = users.with("posts", 3).create(&store).await?;
/// ```
#[derive(Clone)]
pub struct FactoryBuilder {
    factory: Arc<ModelFactory>,
    attributes: Map<String, Value>,
    states: Vec<String>,
    relations: Vec<RelationRequest>,
    pivot_attributes: Map<String, Value>,
    taps: Vec<TapCallback>,
}

impl FactoryBuilder {
    pub fn new(factory: Arc<ModelFactory>) -> Self {
        Self {
            factory,
            attributes: Map::new(),
            states: Vec::new(),
            relations: Vec::new(),
            pivot_attributes: Map::new(),
            taps: Vec::new(),
        }
    }

    pub fn factory(&self) -> &ModelFactory {
        &self.factory
    }

    /// Attributes overlaid on every row after new-up, before states
    pub fn merge(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn merge_attribute(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(column.into(), value.into());
        self
    }

    /// Apply a registered state. States run in the order they are applied.
    pub fn apply(mut self, state: impl Into<String>) -> Self {
        self.states.push(state.into());
        self
    }

    pub fn apply_all<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states.extend(states.into_iter().map(Into::into));
        self
    }

    /// Build `count` related rows through a registered relation
    pub fn with(mut self, relation: impl Into<String>, count: usize) -> Self {
        self.relations.push(RelationRequest {
            name: relation.into(),
            count,
            customize: None,
        });
        self
    }

    /// Like [`with`](Self::with), customizing the related builder first
    pub fn with_related<F>(
        mut self,
        relation: impl Into<String>,
        count: usize,
        customize: F,
    ) -> Self
    where
        F: Fn(FactoryBuilder) -> FactoryBuilder + Send + Sync + 'static,
    {
        self.relations.push(RelationRequest {
            name: relation.into(),
            count,
            customize: Some(Arc::new(customize)),
        });
        self
    }

    /// Extra pivot columns written when these rows are created as the related
    /// side of a many-to-many relation
    pub fn pivot_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.pivot_attributes.extend(attributes);
        self
    }

    pub(crate) fn pivot_attribute_map(&self) -> &Map<String, Value> {
        &self.pivot_attributes
    }

    pub fn tap<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut ModelRow, &mut FactoryContext) -> FactoryResult<()> + Send + Sync + 'static,
    {
        self.taps.push(Arc::new(callback));
        self
    }

    /// Make a single row without persisting it
    pub fn make(&self) -> FactoryResult<ModelRow> {
        self.make_single(BuildMode::Make)
    }

    pub fn make_many(&self, count: usize) -> FactoryResult<Vec<ModelRow>> {
        self.make_rows(count, BuildMode::Make)
    }

    /// Make a single row with a fake primary key
    pub fn make_stubbed(&self) -> FactoryResult<ModelRow> {
        self.make_single(BuildMode::Stubbed)
    }

    pub fn make_stubbed_many(&self, count: usize) -> FactoryResult<Vec<ModelRow>> {
        self.make_rows(count, BuildMode::Stubbed)
    }

    /// Create and persist a single row along with the requested relations
    pub async fn create(&self, persister: &dyn RowPersister) -> FactoryResult<ModelRow> {
        let relations = self.resolve_relations()?;
        let mut ctx = self.context(BuildMode::Create);

        debug!(model = %self.factory.model().name(), "creating factory row");
        self.create_one(&relations, &mut ctx, persister).await
    }

    pub async fn create_many(
        &self,
        count: usize,
        persister: &dyn RowPersister,
    ) -> FactoryResult<Vec<ModelRow>> {
        self.create_rows(count, persister).await
    }

    pub fn make_as<T: DeserializeOwned>(&self) -> FactoryResult<T> {
        self.make()?.into_model()
    }

    pub fn make_many_as<T: DeserializeOwned>(&self, count: usize) -> FactoryResult<Vec<T>> {
        self.make_many(count)?
            .into_iter()
            .map(ModelRow::into_model)
            .collect()
    }

    pub async fn create_as<T: DeserializeOwned>(
        &self,
        persister: &dyn RowPersister,
    ) -> FactoryResult<T> {
        self.create(persister).await?.into_model()
    }

    fn make_single(&self, mode: BuildMode) -> FactoryResult<ModelRow> {
        let relations = self.resolve_relations()?;
        let mut ctx = self.context(mode);

        debug!(model = %self.factory.model().name(), ?mode, "making factory row");
        self.make_one(&relations, &mut ctx)
    }

    pub(crate) fn make_rows(&self, count: usize, mode: BuildMode) -> FactoryResult<Vec<ModelRow>> {
        self.check_batch(count)?;
        let relations = self.resolve_relations()?;
        let mut ctx = self.context(mode);

        debug!(model = %self.factory.model().name(), count, ?mode, "making factory rows");

        (0..count)
            .map(|index| {
                ctx.set_index(index);
                self.make_one(&relations, &mut ctx)
            })
            .collect()
    }

    /// Boxed so relation bindings can recurse into related builders
    pub(crate) fn create_rows<'a>(
        &'a self,
        count: usize,
        persister: &'a dyn RowPersister,
    ) -> RowsFuture<'a> {
        Box::pin(async move {
            self.check_batch(count)?;
            let relations = self.resolve_relations()?;
            let mut ctx = self.context(BuildMode::Create);

            debug!(model = %self.factory.model().name(), count, "creating factory rows");

            let mut rows = Vec::with_capacity(count);
            for index in 0..count {
                ctx.set_index(index);
                rows.push(self.create_one(&relations, &mut ctx, persister).await?);
            }

            Ok::<_, FactoryError>(rows)
        })
    }

    fn make_one(
        &self,
        relations: &[(&RelationBinding, RelationRequest)],
        ctx: &mut FactoryContext,
    ) -> FactoryResult<ModelRow> {
        let mode = ctx.mode();
        let mut row = self.compile(ctx)?;

        for (binding, request) in relations.iter().filter(|(b, _)| b.wires_before_parent()) {
            binding.as_relation().make_for_parent(&mut row, request, mode)?;
        }
        self.run_taps(&mut row, ctx)?;

        if ctx.is_stubbed() && row.key().is_none() {
            row.set_key(next_stub_id());
        }

        for (binding, request) in relations.iter().filter(|(b, _)| !b.wires_before_parent()) {
            binding.as_relation().make_for_parent(&mut row, request, mode)?;
        }
        Ok(row)
    }

    async fn create_one(
        &self,
        relations: &[(&RelationBinding, RelationRequest)],
        ctx: &mut FactoryContext,
        persister: &dyn RowPersister,
    ) -> FactoryResult<ModelRow> {
        let mut row = self.compile(ctx)?;

        for (binding, request) in relations.iter().filter(|(b, _)| b.wires_before_parent()) {
            binding
                .as_relation()
                .create_for_parent(&mut row, request, persister)
                .await?;
        }
        self.run_taps(&mut row, ctx)?;

        persister.insert(&mut row).await?;

        for (binding, request) in relations.iter().filter(|(b, _)| !b.wires_before_parent()) {
            binding
                .as_relation()
                .create_for_parent(&mut row, request, persister)
                .await?;
        }
        Ok(row)
    }

    fn context(&self, mode: BuildMode) -> FactoryContext {
        FactoryContext::new(Faker::new(self.factory.config().seed), mode)
    }

    fn check_batch(&self, count: usize) -> FactoryResult<()> {
        let max = self.factory.config().max_batch_size;
        if count > max {
            return Err(FactoryError::BatchLimit {
                requested: count,
                max,
            });
        }
        Ok(())
    }

    /// Resolve every requested relation up front so unknown names fail before
    /// any row is built
    fn resolve_relations(&self) -> FactoryResult<Vec<(&RelationBinding, RelationRequest)>> {
        self.relations
            .iter()
            .map(|request| {
                let binding = self.factory.get_relation(&request.name)?;
                let mut request = request.clone();
                request.count = binding.effective_count(request.count);
                Ok((binding, request))
            })
            .collect()
    }

    /// New-up, merged attributes, then states in order
    fn compile(&self, ctx: &mut FactoryContext) -> FactoryResult<ModelRow> {
        let mut row = self.factory.new_up(ctx)?;
        row.merge(&self.attributes);

        for state in &self.states {
            let callback = self.factory.get_state(state)?;
            callback(&mut row, ctx)?;
        }

        Ok(row)
    }

    fn run_taps(&self, row: &mut ModelRow, ctx: &mut FactoryContext) -> FactoryResult<()> {
        for tap in &self.taps {
            tap(row, ctx)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FactoryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryBuilder")
            .field("model", &self.factory.model().name())
            .field("attributes", &self.attributes)
            .field("states", &self.states)
            .field("relations", &self.relations)
            .field("taps", &self.taps.len())
            .finish()
    }
}
