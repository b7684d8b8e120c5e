//! # vellum-schema
//!
//! Schema definition, validation, evolution and change-impact engine for
//! Vellum content repositories.
//!
//! This crate provides:
//! - The schema model ([`SchemaSpecification`]) and partial updates
//!   ([`SchemaSpecificationUpdate`]) with builder helpers
//! - [`AdminSchema`]: a validated, immutable schema that produces its next
//!   version through [`AdminSchema::update_and_validate`]
//! - The migration log (renames and deletions of fields and types)
//! - [`calculate_schema_change_impact`]: which stored entities a schema change
//!   makes stale
//! - The publishable-only projection ([`PublishedSchema`])
//! - JSON Schemas of all engine documents ([`DocumentSchemaRegistry`])
//!
//! ## Architecture
//!
//! Everything here is synchronous and pure. A schema is a value; an update
//! builds a new value from the previous one and never mutates it. Storage of
//! "the current schema" belongs to the caller.

pub mod documents;
pub mod error;
pub mod impact;
pub mod merge;
pub mod migration;
pub mod naming;
mod patterns;
pub mod published;
pub mod schema;
pub mod spec;
pub mod update;
pub mod validate;

pub use documents::DocumentSchemaRegistry;
pub use error::{DocumentError, SchemaError};
pub use impact::{DirtyEntitiesSelector, SchemaChangeImpact, calculate_schema_change_impact};
pub use published::{PublishedSchema, PublishedSchemaSpecification};
pub use schema::AdminSchema;
pub use spec::{
    ComponentTypeSpecification, EntityTypeSpecification, FieldKind, FieldSpecification,
    FieldType, IndexSpecification, IndexType, PatternSpecification, SchemaMigrationAction,
    SchemaSpecification, SchemaTransientMigrationAction, SchemaVersionMigration, TypeKind,
    TypeReference, TypeSpecification,
};
pub use update::{
    ComponentTypeSpecificationUpdate, ComponentTypeUpdateBuilder, EntityTypeSpecificationUpdate,
    EntityTypeUpdateBuilder, FieldSpecificationUpdate, FieldUpdateBuilder,
    SchemaSpecificationUpdate, SchemaUpdateBuilder,
};
pub use validate::validate_specification;
