//! HasOne binding - a single related row carrying this row's key

use async_trait::async_trait;

use super::{local_key_value, FactoryRelation, RelationCallback, RelationRequest};
use crate::error::FactoryResult;
use crate::factory::context::BuildMode;
use crate::persistence::RowPersister;
use crate::relationships::{RelationshipMetadata, RelationshipType};
use crate::row::ModelRow;

#[derive(Clone)]
pub struct HasOne {
    metadata: RelationshipMetadata,
    callback: RelationCallback,
}

impl HasOne {
    pub fn new(metadata: RelationshipMetadata, callback: RelationCallback) -> Self {
        Self { metadata, callback }
    }
}

#[async_trait]
impl FactoryRelation for HasOne {
    fn relationship_type(&self) -> RelationshipType {
        RelationshipType::HasOne
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
            .make_rows(1, mode)?;

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
        let rows = builder.create_rows(1, persister).await?;

        parent.attach(request.name.clone(), rows);
        Ok(())
    }
}
