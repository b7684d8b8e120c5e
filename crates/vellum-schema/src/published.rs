//! The publishable-only projection of a schema.
//!
//! This is the read-only view handed to query and search: only publishable
//! types, only fields that are not `adminOnly`, and only the patterns and
//! indexes those fields still reach.

use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::patterns::PatternCache;
use crate::spec::{
    FieldKind, FieldSpecification, IndexSpecification, PatternSpecification, SchemaSpecification,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishedSchemaSpecification {
    pub version: u32,
    #[serde(default)]
    pub entity_types: Vec<PublishedEntityTypeSpecification>,
    #[serde(default)]
    pub component_types: Vec<PublishedComponentTypeSpecification>,
    #[serde(default)]
    pub patterns: Vec<PatternSpecification>,
    #[serde(default)]
    pub indexes: Vec<IndexSpecification>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishedEntityTypeSpecification {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_key_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<PublishedFieldSpecification>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishedComponentTypeSpecification {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<PublishedFieldSpecification>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishedFieldSpecification {
    pub name: String,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl PublishedSchemaSpecification {
    /// Project `spec` onto its publishable subset.
    #[must_use]
    pub fn project(spec: &SchemaSpecification) -> Self {
        let entity_types: Vec<PublishedEntityTypeSpecification> = spec
            .entity_types
            .iter()
            .filter(|it| it.publishable)
            .map(|it| {
                let fields = published_fields(&it.fields);
                let name_field = it
                    .name_field
                    .clone()
                    .filter(|name| fields.iter().any(|field| field.name == *name));
                PublishedEntityTypeSpecification {
                    name: it.name.clone(),
                    auth_key_pattern: it.auth_key_pattern.clone(),
                    name_field,
                    fields,
                }
            })
            .collect();

        let component_types: Vec<PublishedComponentTypeSpecification> = spec
            .component_types
            .iter()
            .filter(|it| it.publishable)
            .map(|it| PublishedComponentTypeSpecification {
                name: it.name.clone(),
                fields: published_fields(&it.fields),
            })
            .collect();

        let published_fields = entity_types
            .iter()
            .flat_map(|it| it.fields.iter())
            .chain(component_types.iter().flat_map(|it| it.fields.iter()));

        let mut pattern_names: BTreeSet<&str> = entity_types
            .iter()
            .filter_map(|it| it.auth_key_pattern.as_deref())
            .collect();
        let mut index_names = BTreeSet::new();
        for field in published_fields {
            pattern_names.extend(field.kind.match_pattern());
            index_names.extend(field.kind.index());
        }

        let patterns = pattern_names
            .into_iter()
            .filter_map(|name| spec.pattern(name).cloned())
            .collect();
        let indexes = index_names
            .into_iter()
            .filter_map(|name| spec.index(name).cloned())
            .collect();

        Self {
            version: spec.version,
            entity_types,
            component_types,
            patterns,
            indexes,
        }
    }
}

fn published_fields(fields: &[FieldSpecification]) -> Vec<PublishedFieldSpecification> {
    fields
        .iter()
        .filter(|it| !it.admin_only)
        .map(|it| PublishedFieldSpecification {
            name: it.name.clone(),
            list: it.list,
            required: it.required,
            kind: it.kind.clone(),
        })
        .collect()
}

/// A published projection with lookups and compile-once pattern regexes.
#[derive(Debug, Clone)]
pub struct PublishedSchema {
    spec: PublishedSchemaSpecification,
    pattern_cache: PatternCache,
}

impl PublishedSchema {
    #[must_use]
    pub fn new(spec: PublishedSchemaSpecification) -> Self {
        let pattern_cache = PatternCache::new(spec.patterns.len());
        Self {
            spec,
            pattern_cache,
        }
    }

    #[must_use]
    pub const fn spec(&self) -> &PublishedSchemaSpecification {
        &self.spec
    }

    #[must_use]
    pub const fn version(&self) -> u32 {
        self.spec.version
    }

    #[must_use]
    pub fn entity_type(&self, name: &str) -> Option<&PublishedEntityTypeSpecification> {
        self.spec.entity_types.iter().find(|it| it.name == name)
    }

    #[must_use]
    pub fn component_type(&self, name: &str) -> Option<&PublishedComponentTypeSpecification> {
        self.spec.component_types.iter().find(|it| it.name == name)
    }

    #[must_use]
    pub fn pattern(&self, name: &str) -> Option<&PatternSpecification> {
        self.spec.patterns.iter().find(|it| it.name == name)
    }

    #[must_use]
    pub fn pattern_regex(&self, name: &str) -> Option<&Regex> {
        self.pattern_cache.regex(&self.spec.patterns, name)
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexSpecification> {
        self.spec.indexes.iter().find(|it| it.name == name)
    }
}
