//! JSON Schemas for the engine's JSON documents.
//!
//! The `DocumentSchemaRegistry` builds JSON Schemas from the engine types at
//! construction time using [`schemars::schema_for!`] and validates raw JSON
//! against them with `jsonschema`, before any of it is deserialized.

use std::collections::HashMap;

use schemars::schema_for;

use crate::error::DocumentError;
use crate::impact::SchemaChangeImpact;
use crate::published::PublishedSchemaSpecification;
use crate::spec::{SchemaSpecification, SchemaTransientMigrationAction};
use crate::update::SchemaSpecificationUpdate;

/// Document schema names, in registration order.
pub const DOCUMENT_NAMES: [&str; 5] = [
    "schema_specification",
    "schema_specification_update",
    "published_schema_specification",
    "schema_change_impact",
    "schema_transient_migration_actions",
];

/// Store of the JSON Schemas for every document the engine reads or writes.
pub struct DocumentSchemaRegistry {
    schemas: HashMap<&'static str, serde_json::Value>,
}

macro_rules! register {
    ($map:expr, $name:expr, $ty:ty) => {
        $map.insert(
            $name,
            serde_json::to_value(schema_for!($ty))
                .map_err(|e| DocumentError::Generation(format!("{}: {e}", $name)))?,
        );
    };
}

impl DocumentSchemaRegistry {
    /// Build the registry.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Generation` if a generated schema can't be
    /// converted to JSON.
    pub fn new() -> Result<Self, DocumentError> {
        let mut schemas = HashMap::new();

        register!(schemas, "schema_specification", SchemaSpecification);
        register!(
            schemas,
            "schema_specification_update",
            SchemaSpecificationUpdate
        );
        register!(
            schemas,
            "published_schema_specification",
            PublishedSchemaSpecification
        );
        register!(schemas, "schema_change_impact", SchemaChangeImpact);
        register!(
            schemas,
            "schema_transient_migration_actions",
            Vec<SchemaTransientMigrationAction>
        );

        Ok(Self { schemas })
    }

    /// Get a schema by name. Returns `None` if not found.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.schemas.get(name)
    }

    /// Validate a JSON value against a named schema.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::NotFound` if the schema name is unknown, or
    /// `DocumentError::ValidationFailed` if validation produces errors.
    pub fn validate(&self, name: &str, instance: &serde_json::Value) -> Result<(), DocumentError> {
        let schema = self
            .get(name)
            .ok_or_else(|| DocumentError::NotFound(name.to_string()))?;

        let validator = jsonschema::validator_for(schema)
            .map_err(|e| DocumentError::Generation(format!("{e}")))?;

        let errors: Vec<String> = validator
            .iter_errors(instance)
            .map(|e| format!("{}: {e}", e.instance_path))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DocumentError::ValidationFailed { errors })
        }
    }

    /// Registered schema names, sorted.
    #[must_use]
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.schemas.keys().copied().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}
