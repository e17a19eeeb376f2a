//! BelongsTo binding - the related (owner) row is built first and this row
//! points at it through its foreign key

use async_trait::async_trait;
use tracing::trace;

use super::{local_key_value, FactoryRelation, RelationCallback, RelationRequest};
use crate::error::{FactoryError, FactoryResult};
use crate::factory::context::BuildMode;
use crate::persistence::RowPersister;
use crate::relationships::{RelationshipMetadata, RelationshipType};
use crate::row::ModelRow;

#[derive(Clone)]
pub struct BelongsTo {
    metadata: RelationshipMetadata,
    callback: RelationCallback,
}

impl BelongsTo {
    pub fn new(metadata: RelationshipMetadata, callback: RelationCallback) -> Self {
        Self { metadata, callback }
    }

    fn wire(
        &self,
        child: &mut ModelRow,
        name: &str,
        mut rows: Vec<ModelRow>,
        required: bool,
    ) -> FactoryResult<()> {
        let owner = rows.pop().ok_or_else(|| {
            FactoryError::configuration(format!(
                "Relationship '{}' produced no {} row to belong to",
                name, self.metadata.related_model
            ))
        })?;
        let owner_key = local_key_value(&self.metadata, &owner, required)?;

        trace!(relation = %name, key = %owner_key, "wired belongs-to owner");
        child.set(self.metadata.foreign_key_column(), owner_key);
        child.attach(name, vec![owner]);
        Ok(())
    }
}

#[async_trait]
impl FactoryRelation for BelongsTo {
    fn relationship_type(&self) -> RelationshipType {
        RelationshipType::BelongsTo
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
        let rows = self.related_builder(request).make_rows(1, mode)?;
        self.wire(parent, &request.name, rows, false)
    }

    async fn create_for_parent(
        &self,
        parent: &mut ModelRow,
        request: &RelationRequest,
        persister: &dyn RowPersister,
    ) -> FactoryResult<()> {
        let builder = self.related_builder(request);
        let rows = builder.create_rows(1, persister).await?;
        self.wire(parent, &request.name, rows, true)
    }
}
