//! HasMany binding - the related rows carry this row's key

use async_trait::async_trait;
use tracing::trace;

use super::{local_key_value, FactoryRelation, RelationCallback, RelationRequest};
use crate::error::FactoryResult;
use crate::factory::context::BuildMode;
use crate::persistence::RowPersister;
use crate::relationships::{RelationshipMetadata, RelationshipType};
use crate::row::ModelRow;

#[derive(Clone)]
pub struct HasMany {
    metadata: RelationshipMetadata,
    callback: RelationCallback,
}

impl HasMany {
    pub fn new(metadata: RelationshipMetadata, callback: RelationCallback) -> Self {
        Self { metadata, callback }
    }
}

#[async_trait]
impl FactoryRelation for HasMany {
    fn relationship_type(&self) -> RelationshipType {
        RelationshipType::HasMany
    }

    fn metadata(&self) -> &RelationshipMetadata {
        &self.metadata
    }

    fn callback(&self) -> &RelationCallback {
        &self.callback
    }

    fn make_for_parent(
        &self,
        parent: &mut ModelRow,
        request: &RelationRequest,
        mode: BuildMode,
    ) -> FactoryResult<()> {
        let parent_key = local_key_value(&self.metadata, parent, false)?;
        let rows = self
            .related_builder(request)
            .merge_attribute(self.metadata.foreign_key_column(), parent_key)
            .make_rows(request.count, mode)?;

        trace!(relation = %request.name, rows = rows.len(), "made has-many rows");
        parent.attach(request.name.clone(), rows);
        Ok(())
    }

    async fn create_for_parent(
        &self,
        parent: &mut ModelRow,
        request: &RelationRequest,
        persister: &dyn RowPersister,
    ) -> FactoryResult<()> {
        let parent_key = local_key_value(&self.metadata, parent, true)?;
        let builder = self
            .related_builder(request)
            .merge_attribute(self.metadata.foreign_key_column(), parent_key);
        let rows = builder.create_rows(request.count, persister).await?;

        trace!(relation = %request.name, rows = rows.len(), "created has-many rows");
        parent.attach(request.name.clone(), rows);
        Ok(())
    }
}
