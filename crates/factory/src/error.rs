//! Error types for the factory system
//!
//! Every lookup failure is a configuration mistake in a factory definition,
//! so messages always carry the offending state, relation or model name.

use thiserror::Error;

use crate::relationships::RelationshipType;

/// Result type alias for factory operations
pub type FactoryResult<T> = Result<T, FactoryError>;

/// Error types for factory definition and building
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Cannot apply undefined state \"{state}\". Double check the model factory")]
    UndefinedState { state: String },

    #[error("Cannot setup undefined relationship \"{relation}\". Double check the model factory")]
    UndefinedRelation { relation: String },

    #[error(
        "Cannot define \"{relation}\" relationship. The relationship must exist on the \"{model}\" model first"
    )]
    RelationNotOnModel { relation: String, model: String },

    #[error(
        "Cannot define \"{relation}\" relationship on the \"{model}\" model: {kind:?} relationships are not supported by factories"
    )]
    UnsupportedRelation {
        relation: String,
        model: String,
        kind: RelationshipType,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Cannot wire relationship: \"{model}\" row has no value for \"{column}\"")]
    MissingKey { model: String, column: String },

    #[error("Requested {requested} rows but the factory batch limit is {max}")]
    BatchLimit { requested: usize, max: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persistence error: {message}")]
    Persistence { message: String },
}

impl FactoryError {
    pub fn configuration(message: impl Into<String>) -> Self {
        FactoryError::Configuration {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        FactoryError::Persistence {
            message: message.into(),
        }
    }
}

// Persisters built on the host ORM usually surface anyhow errors
impl From<anyhow::Error> for FactoryError {
    fn from(err: anyhow::Error) -> Self {
        FactoryError::Persistence {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_state_names_the_state() {
        let err = FactoryError::UndefinedState {
            state: "admin".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot apply undefined state \"admin\". Double check the model factory"
        );
    }

    #[test]
    fn test_relation_not_on_model_names_relation_and_model() {
        let err = FactoryError::RelationNotOnModel {
            relation: "comments".to_string(),
            model: "User".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("\"comments\""));
        assert!(message.contains("\"User\""));
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: FactoryError = anyhow::anyhow!("connection refused").into();
        assert!(matches!(err, FactoryError::Persistence { .. }));
        assert!(err.to_string().contains("connection refused"));
    }
}
