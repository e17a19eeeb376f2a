//! Relationship metadata - how two models are wired together

use serde::{Deserialize, Serialize};

use crate::error::{FactoryError, FactoryResult};

/// Defines the type of relationship between models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipType {
    /// One-to-one relationship (hasOne)
    HasOne,
    /// One-to-many relationship (hasMany)
    HasMany,
    /// Many-to-one relationship (belongsTo)
    BelongsTo,
    /// Many-to-many relationship through a pivot table
    ManyToMany,
    /// Polymorphic one-to-one relationship
    MorphOne,
    /// Polymorphic one-to-many relationship
    MorphMany,
    /// Inverse polymorphic relationship
    MorphTo,
}

impl RelationshipType {
    pub fn is_polymorphic(self) -> bool {
        matches!(self, Self::MorphOne | Self::MorphMany | Self::MorphTo)
    }

    pub fn requires_pivot(self) -> bool {
        matches!(self, Self::ManyToMany)
    }
}

/// Relationship metadata as declared on a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMetadata {
    pub relationship_type: RelationshipType,

    /// Name of the relationship (field name in the model)
    pub name: String,

    /// The related model's type name
    pub related_model: String,

    /// The related model's table name
    pub related_table: String,

    pub foreign_key: ForeignKeyConfig,

    /// Key on the owning side of the relationship. For `BelongsTo` this is the
    /// key on the related (parent) model. `None` means the owning row's
    /// primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_key: Option<String>,

    pub pivot_config: Option<PivotConfig>,

    pub polymorphic_config: Option<PolymorphicConfig>,
}

impl RelationshipMetadata {
    pub fn new(
        relationship_type: RelationshipType,
        name: impl Into<String>,
        related_model: impl Into<String>,
        related_table: impl Into<String>,
        foreign_key: ForeignKeyConfig,
    ) -> Self {
        Self {
            relationship_type,
            name: name.into(),
            related_model: related_model.into(),
            related_table: related_table.into(),
            foreign_key,
            local_key: None,
            pivot_config: None,
            polymorphic_config: None,
        }
    }

    pub fn with_local_key(mut self, local_key: impl Into<String>) -> Self {
        self.local_key = Some(local_key.into());
        self
    }

    pub fn with_pivot(mut self, pivot_config: PivotConfig) -> Self {
        self.pivot_config = Some(pivot_config);
        self
    }

    pub fn with_polymorphic(mut self, polymorphic_config: PolymorphicConfig) -> Self {
        self.polymorphic_config = Some(polymorphic_config);
        self
    }

    /// The foreign key column used when wiring rows together
    pub fn foreign_key_column(&self) -> &str {
        self.foreign_key.primary_column()
    }

    /// Explicit local key, or `primary_key` of the owning row
    pub fn local_key_or<'a>(&'a self, primary_key: &'a str) -> &'a str {
        self.local_key.as_deref().unwrap_or(primary_key)
    }

    /// Validate the relationship metadata for consistency
    pub fn validate(&self) -> FactoryResult<()> {
        if self.relationship_type.requires_pivot() && self.pivot_config.is_none() {
            return Err(FactoryError::configuration(format!(
                "Relationship '{}' of type {:?} requires pivot configuration",
                self.name, self.relationship_type
            )));
        }

        if self.relationship_type.is_polymorphic() && self.polymorphic_config.is_none() {
            return Err(FactoryError::configuration(format!(
                "Relationship '{}' of type {:?} requires polymorphic configuration",
                self.name, self.relationship_type
            )));
        }

        if self.local_key.as_deref() == Some("") {
            return Err(FactoryError::configuration(format!(
                "Relationship '{}' must have a local key",
                self.name
            )));
        }

        self.foreign_key.validate()?;

        if let Some(ref pivot) = self.pivot_config {
            pivot.validate()?;
        }

        if let Some(ref poly) = self.polymorphic_config {
            poly.validate()?;
        }

        Ok(())
    }
}

/// Foreign key configuration for relationships
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyConfig {
    /// The foreign key column name(s)
    pub columns: Vec<String>,

    /// The table where the foreign key is located
    pub table: String,
}

impl ForeignKeyConfig {
    pub fn simple(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            columns: vec![column.into()],
            table: table.into(),
        }
    }

    /// The key column factories wire
    pub fn primary_column(&self) -> &str {
        self.columns.first().map(|s| s.as_str()).unwrap_or("")
    }

    pub fn validate(&self) -> FactoryResult<()> {
        if self.columns.is_empty() || self.columns.iter().any(|c| c.is_empty()) {
            return Err(FactoryError::configuration(
                "Foreign key configuration must have at least one non-empty column",
            ));
        }

        if self.columns.len() > 1 {
            return Err(FactoryError::configuration(format!(
                "Composite foreign key ({}) cannot be wired by factories",
                self.columns.join(", ")
            )));
        }

        if self.table.is_empty() {
            return Err(FactoryError::configuration(
                "Foreign key configuration must specify a table",
            ));
        }

        Ok(())
    }
}

/// Pivot table configuration for many-to-many relationships
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotConfig {
    pub table: String,

    /// Column in the pivot table pointing at the local model
    pub local_key: String,

    /// Column in the pivot table pointing at the related model
    pub foreign_key: String,

    /// Extra pivot columns factories may fill through `pivot_attributes`
    pub additional_columns: Vec<String>,

    pub with_timestamps: bool,
}

impl PivotConfig {
    pub fn new(
        table: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            local_key: local_key.into(),
            foreign_key: foreign_key.into(),
            additional_columns: Vec::new(),
            with_timestamps: false,
        }
    }

    pub fn with_additional_columns(mut self, columns: Vec<String>) -> Self {
        self.additional_columns = columns;
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.with_timestamps = true;
        self
    }

    pub fn validate(&self) -> FactoryResult<()> {
        if self.table.is_empty() {
            return Err(FactoryError::configuration("Pivot table name cannot be empty"));
        }

        if self.local_key.is_empty() || self.foreign_key.is_empty() {
            return Err(FactoryError::configuration("Pivot keys cannot be empty"));
        }

        if self.local_key == self.foreign_key {
            return Err(FactoryError::configuration(
                "Pivot local key and foreign key must be different",
            ));
        }

        Ok(())
    }

    /// Reject pivot attributes that are not declared additional columns
    pub fn check_attributes<'a, I>(&self, columns: I) -> FactoryResult<()>
    where
        I: IntoIterator<Item = &'a String>,
    {
        match columns
            .into_iter()
            .find(|column| !self.additional_columns.contains(*column))
        {
            Some(column) => Err(FactoryError::configuration(format!(
                "Column '{}' is not an additional column of pivot table '{}'",
                column, self.table
            ))),
            None => Ok(()),
        }
    }
}

/// Polymorphic relationship configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolymorphicConfig {
    /// The morph name, e.g. "commentable"
    pub name: String,

    /// Column storing the owner model type
    pub type_column: String,

    /// Column storing the owner key
    pub id_column: String,
}

impl PolymorphicConfig {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            type_column: format!("{}_type", name),
            id_column: format!("{}_id", name),
            name,
        }
    }

    pub fn validate(&self) -> FactoryResult<()> {
        if self.name.is_empty() || self.type_column.is_empty() || self.id_column.is_empty() {
            return Err(FactoryError::configuration(
                "Polymorphic name and columns cannot be empty",
            ));
        }

        if self.type_column == self.id_column {
            return Err(FactoryError::configuration(
                "Polymorphic type column and ID column must be different",
            ));
        }

        Ok(())
    }
}
