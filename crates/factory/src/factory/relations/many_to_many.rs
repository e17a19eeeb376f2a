//! ManyToMany binding - related rows are linked through pivot rows

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::trace;

use super::{local_key_value, wiring_key, FactoryRelation, RelationCallback, RelationRequest};
use crate::error::{FactoryError, FactoryResult};
use crate::factory::context::BuildMode;
use crate::persistence::RowPersister;
use crate::relationships::{PivotConfig, RelationshipMetadata, RelationshipType};
use crate::row::ModelRow;

#[derive(Clone)]
pub struct ManyToMany {
    metadata: RelationshipMetadata,
    callback: RelationCallback,
}

impl ManyToMany {
    pub fn new(metadata: RelationshipMetadata, callback: RelationCallback) -> Self {
        Self { metadata, callback }
    }

    fn pivot(&self) -> FactoryResult<&PivotConfig> {
        self.metadata.pivot_config.as_ref().ok_or_else(|| {
            FactoryError::configuration(format!(
                "Relationship '{}' of type ManyToMany requires pivot configuration",
                self.metadata.name
            ))
        })
    }
}

#[async_trait]
impl FactoryRelation for ManyToMany {
    fn relationship_type(&self) -> RelationshipType {
        RelationshipType::ManyToMany
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
        let builder = self.related_builder(request);
        self.pivot()?
            .check_attributes(builder.pivot_attribute_map().keys())?;

        let rows = builder.make_rows(request.count, mode)?;
        parent.attach(request.name.clone(), rows);
        Ok(())
    }

    async fn create_for_parent(
        &self,
        parent: &mut ModelRow,
        request: &RelationRequest,
        persister: &dyn RowPersister,
    ) -> FactoryResult<()> {
        let pivot = self.pivot()?;
        let parent_key = local_key_value(&self.metadata, parent, true)?;

        let builder = self.related_builder(request);
        pivot.check_attributes(builder.pivot_attribute_map().keys())?;
        let rows = builder.create_rows(request.count, persister).await?;

        for row in &rows {
            let related_key = wiring_key(row, row.primary_key_column(), true)?;

            let mut attributes = builder.pivot_attribute_map().clone();
            attributes.insert(pivot.local_key.clone(), parent_key.clone());
            attributes.insert(pivot.foreign_key.clone(), related_key);
            if pivot.with_timestamps {
                let now: Value = json!(Utc::now().to_rfc3339());
                attributes.insert("created_at".to_string(), now.clone());
                attributes.insert("updated_at".to_string(), now);
            }

            persister.insert_pivot(&pivot.table, attributes).await?;
        }

        trace!(
            relation = %request.name,
            pivot = %pivot.table,
            rows = rows.len(),
            "created many-to-many rows"
        );
        parent.attach(request.name.clone(), rows);
        Ok(())
    }
}
