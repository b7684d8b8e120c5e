//! Partial schema updates.
//!
//! Every attribute is optional: `None` means "keep what the previous schema
//! has". Clearable references (`authKeyPattern`, `nameField`, `matchPattern`,
//! `index`) use `Option<Option<_>>` so that an explicit JSON `null` clears the
//! value while an absent key inherits it.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::spec::{
    FieldType, IndexSpecification, PatternSpecification, SchemaTransientMigrationAction,
    SchemaVersionMigration,
};

/// Deserialize a present key (including `null`) as `Some(..)`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSpecificationUpdate {
    /// Expected new version. Required together with `transientMigrations`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_types: Vec<EntityTypeSpecificationUpdate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component_types: Vec<ComponentTypeSpecificationUpdate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<PatternSpecification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexSpecification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub migrations: Vec<SchemaVersionMigration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transient_migrations: Vec<SchemaTransientMigrationAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypeSpecificationUpdate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publishable: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub auth_key_pattern: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub name_field: Option<Option<String>>,
    #[serde(default)]
    pub fields: Vec<FieldSpecificationUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTypeSpecificationUpdate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publishable: Option<bool>,
    /// Not allowed on component types; rejected when present.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub auth_key_pattern: Option<Option<String>>,
    /// Not allowed on component types; rejected when present.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub name_field: Option<Option<String>>,
    #[serde(default)]
    pub fields: Vec<FieldSpecificationUpdate>,
}

/// A field update. Kind attributes live side by side here; the merger checks
/// them against the allow-list of `field_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpecificationUpdate {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub match_pattern: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub index: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_entity_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text_nodes: Option<Vec<String>>,
}

impl FieldSpecificationUpdate {
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            list: None,
            required: None,
            admin_only: None,
            integer: None,
            multiline: None,
            match_pattern: None,
            values: None,
            index: None,
            entity_types: None,
            link_entity_types: None,
            component_types: None,
            rich_text_nodes: None,
        }
    }

    /// Names of the kind attributes present in this update, in a fixed order.
    #[must_use]
    pub fn supplied_attributes(&self) -> Vec<&'static str> {
        [
            ("integer", self.integer.is_some()),
            ("multiline", self.multiline.is_some()),
            ("matchPattern", self.match_pattern.is_some()),
            ("values", self.values.is_some()),
            ("index", self.index.is_some()),
            ("entityTypes", self.entity_types.is_some()),
            ("linkEntityTypes", self.link_entity_types.is_some()),
            ("componentTypes", self.component_types.is_some()),
            ("richTextNodes", self.rich_text_nodes.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub struct SchemaUpdateBuilder(SchemaSpecificationUpdate);

impl SchemaUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(SchemaSpecificationUpdate::default())
    }

    #[must_use]
    pub const fn version(mut self, version: u32) -> Self {
        self.0.version = Some(version);
        self
    }

    #[must_use]
    pub fn entity_type(mut self, entity_type: EntityTypeSpecificationUpdate) -> Self {
        self.0.entity_types.push(entity_type);
        self
    }

    #[must_use]
    pub fn component_type(mut self, component_type: ComponentTypeSpecificationUpdate) -> Self {
        self.0.component_types.push(component_type);
        self
    }

    #[must_use]
    pub fn pattern(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.0.patterns.push(PatternSpecification {
            name: name.into(),
            pattern: pattern.into(),
        });
        self
    }

    #[must_use]
    pub fn unique_index(mut self, name: impl Into<String>) -> Self {
        self.0.indexes.push(IndexSpecification::unique(name));
        self
    }

    #[must_use]
    pub fn migration(mut self, migration: SchemaVersionMigration) -> Self {
        self.0.migrations.push(migration);
        self
    }

    #[must_use]
    pub fn transient_migration(mut self, action: SchemaTransientMigrationAction) -> Self {
        self.0.transient_migrations.push(action);
        self
    }

    #[must_use]
    pub fn build(self) -> SchemaSpecificationUpdate {
        self.0
    }
}

impl Default for SchemaUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EntityTypeUpdateBuilder(EntityTypeSpecificationUpdate);

impl EntityTypeUpdateBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(EntityTypeSpecificationUpdate {
            name: name.into(),
            publishable: None,
            auth_key_pattern: None,
            name_field: None,
            fields: Vec::new(),
        })
    }

    #[must_use]
    pub const fn publishable(mut self, publishable: bool) -> Self {
        self.0.publishable = Some(publishable);
        self
    }

    #[must_use]
    pub fn auth_key_pattern(mut self, pattern: Option<String>) -> Self {
        self.0.auth_key_pattern = Some(pattern);
        self
    }

    #[must_use]
    pub fn name_field(mut self, field: Option<String>) -> Self {
        self.0.name_field = Some(field);
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldSpecificationUpdate) -> Self {
        self.0.fields.push(field);
        self
    }

    #[must_use]
    pub fn build(self) -> EntityTypeSpecificationUpdate {
        self.0
    }
}

pub struct ComponentTypeUpdateBuilder(ComponentTypeSpecificationUpdate);

impl ComponentTypeUpdateBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(ComponentTypeSpecificationUpdate {
            name: name.into(),
            publishable: None,
            auth_key_pattern: None,
            name_field: None,
            fields: Vec::new(),
        })
    }

    #[must_use]
    pub const fn publishable(mut self, publishable: bool) -> Self {
        self.0.publishable = Some(publishable);
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldSpecificationUpdate) -> Self {
        self.0.fields.push(field);
        self
    }

    #[must_use]
    pub fn build(self) -> ComponentTypeSpecificationUpdate {
        self.0
    }
}

pub struct FieldUpdateBuilder(FieldSpecificationUpdate);

impl FieldUpdateBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self(FieldSpecificationUpdate::new(name, field_type))
    }

    #[must_use]
    pub const fn list(mut self, list: bool) -> Self {
        self.0.list = Some(list);
        self
    }

    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.0.required = Some(required);
        self
    }

    #[must_use]
    pub const fn admin_only(mut self, admin_only: bool) -> Self {
        self.0.admin_only = Some(admin_only);
        self
    }

    #[must_use]
    pub const fn integer(mut self, integer: bool) -> Self {
        self.0.integer = Some(integer);
        self
    }

    #[must_use]
    pub const fn multiline(mut self, multiline: bool) -> Self {
        self.0.multiline = Some(multiline);
        self
    }

    #[must_use]
    pub fn match_pattern(mut self, pattern: Option<&str>) -> Self {
        self.0.match_pattern = Some(pattern.map(str::to_string));
        self
    }

    #[must_use]
    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn index(mut self, index: Option<&str>) -> Self {
        self.0.index = Some(index.map(str::to_string));
        self
    }

    #[must_use]
    pub fn entity_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.entity_types = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn link_entity_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.link_entity_types = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn component_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.component_types = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn rich_text_nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.rich_text_nodes = Some(nodes.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn build(self) -> FieldSpecificationUpdate {
        self.0
    }
}
