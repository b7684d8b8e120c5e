//! Schema specification value types.
//!
//! A [`SchemaSpecification`] is a plain value: types, fields, patterns,
//! indexes and the migration log. It is never mutated in place by the engine;
//! every update builds a new value from the previous one.
//!
//! All types serialize with camelCase keys. Field kinds are a closed,
//! internally tagged enum keyed by `type`.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SchemaSpecification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSpecification {
    pub version: u32,
    #[serde(default)]
    pub entity_types: Vec<EntityTypeSpecification>,
    #[serde(default)]
    pub component_types: Vec<ComponentTypeSpecification>,
    #[serde(default)]
    pub patterns: Vec<PatternSpecification>,
    #[serde(default)]
    pub indexes: Vec<IndexSpecification>,
    /// Newest entry first.
    #[serde(default)]
    pub migrations: Vec<SchemaVersionMigration>,
}

impl SchemaSpecification {
    #[must_use]
    pub fn entity_type(&self, name: &str) -> Option<&EntityTypeSpecification> {
        self.entity_types.iter().find(|it| it.name == name)
    }

    #[must_use]
    pub fn component_type(&self, name: &str) -> Option<&ComponentTypeSpecification> {
        self.component_types.iter().find(|it| it.name == name)
    }

    #[must_use]
    pub fn pattern(&self, name: &str) -> Option<&PatternSpecification> {
        self.patterns.iter().find(|it| it.name == name)
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexSpecification> {
        self.indexes.iter().find(|it| it.name == name)
    }

    #[must_use]
    pub fn migration(&self, version: u32) -> Option<&SchemaVersionMigration> {
        self.migrations.iter().find(|it| it.version == version)
    }

    /// Look up a type of either kind.
    #[must_use]
    pub fn type_spec(&self, kind: TypeKind, name: &str) -> Option<&dyn TypeSpecification> {
        match kind {
            TypeKind::Entity => self
                .entity_type(name)
                .map(|it| it as &dyn TypeSpecification),
            TypeKind::Component => self
                .component_type(name)
                .map(|it| it as &dyn TypeSpecification),
        }
    }

    /// True when both specifications hold the same types, patterns, indexes
    /// and migration log, whatever their versions.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.entity_types == other.entity_types
            && self.component_types == other.component_types
            && self.patterns == other.patterns
            && self.indexes == other.indexes
            && self.migrations == other.migrations
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Entity vs component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    Entity,
    Component,
}

impl TypeKind {
    /// Lower-case label used in messages, e.g. "entity type".
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Entity => "entity type",
            Self::Component => "component type",
        }
    }
}

/// Behaviour shared by entity and component types.
pub trait TypeSpecification {
    fn kind(&self) -> TypeKind;
    fn name(&self) -> &str;
    fn publishable(&self) -> bool;
    fn fields(&self) -> &[FieldSpecification];

    fn field(&self, name: &str) -> Option<&FieldSpecification> {
        self.fields().iter().find(|it| it.name == name)
    }

    /// Always `None` for component types.
    fn auth_key_pattern(&self) -> Option<&str> {
        None
    }

    /// Always `None` for component types.
    fn name_field(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypeSpecification {
    pub name: String,
    #[serde(default)]
    pub publishable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_key_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpecification>,
}

impl EntityTypeSpecification {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            publishable: false,
            auth_key_pattern: None,
            name_field: None,
            fields: Vec::new(),
        }
    }
}

impl TypeSpecification for EntityTypeSpecification {
    fn kind(&self) -> TypeKind {
        TypeKind::Entity
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn publishable(&self) -> bool {
        self.publishable
    }

    fn fields(&self) -> &[FieldSpecification] {
        &self.fields
    }

    fn auth_key_pattern(&self) -> Option<&str> {
        self.auth_key_pattern.as_deref()
    }

    fn name_field(&self) -> Option<&str> {
        self.name_field.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTypeSpecification {
    pub name: String,
    #[serde(default)]
    pub publishable: bool,
    #[serde(default)]
    pub fields: Vec<FieldSpecification>,
}

impl ComponentTypeSpecification {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            publishable: false,
            fields: Vec::new(),
        }
    }
}

impl TypeSpecification for ComponentTypeSpecification {
    fn kind(&self) -> TypeKind {
        TypeKind::Component
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn publishable(&self) -> bool {
        self.publishable
    }

    fn fields(&self) -> &[FieldSpecification] {
        &self.fields
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpecification {
    pub name: String,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub admin_only: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpecification {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            list: false,
            required: false,
            admin_only: false,
            kind,
        }
    }

    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }
}

/// Kind-specific field attributes. The `type` key selects the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum FieldKind {
    Boolean,
    #[serde(rename_all = "camelCase")]
    Component {
        #[serde(default)]
        component_types: Vec<String>,
    },
    Location,
    Number {
        #[serde(default)]
        integer: bool,
    },
    #[serde(rename_all = "camelCase")]
    Reference {
        #[serde(default)]
        entity_types: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    RichText {
        #[serde(default)]
        entity_types: Vec<String>,
        #[serde(default)]
        link_entity_types: Vec<String>,
        #[serde(default)]
        component_types: Vec<String>,
        #[serde(default)]
        rich_text_nodes: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    String {
        #[serde(default)]
        multiline: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        match_pattern: Option<String>,
        #[serde(default)]
        values: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<String>,
    },
}

impl FieldKind {
    /// The attribute-free kind with every attribute at its default.
    #[must_use]
    pub const fn default_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Boolean => Self::Boolean,
            FieldType::Component => Self::Component {
                component_types: Vec::new(),
            },
            FieldType::Location => Self::Location,
            FieldType::Number => Self::Number { integer: false },
            FieldType::Reference => Self::Reference {
                entity_types: Vec::new(),
            },
            FieldType::RichText => Self::RichText {
                entity_types: Vec::new(),
                link_entity_types: Vec::new(),
                component_types: Vec::new(),
                rich_text_nodes: Vec::new(),
            },
            FieldType::String => Self::String {
                multiline: false,
                match_pattern: None,
                values: Vec::new(),
                index: None,
            },
        }
    }

    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match self {
            Self::Boolean => FieldType::Boolean,
            Self::Component { .. } => FieldType::Component,
            Self::Location => FieldType::Location,
            Self::Number { .. } => FieldType::Number,
            Self::Reference { .. } => FieldType::Reference,
            Self::RichText { .. } => FieldType::RichText,
            Self::String { .. } => FieldType::String,
        }
    }

    /// Referenced entity types (`entityTypes`).
    #[must_use]
    pub fn entity_types(&self) -> &[String] {
        match self {
            Self::Reference { entity_types } | Self::RichText { entity_types, .. } => entity_types,
            _ => &[],
        }
    }

    /// Link targets of rich text (`linkEntityTypes`).
    #[must_use]
    pub fn link_entity_types(&self) -> &[String] {
        match self {
            Self::RichText {
                link_entity_types, ..
            } => link_entity_types,
            _ => &[],
        }
    }

    /// Embeddable component types (`componentTypes`).
    #[must_use]
    pub fn component_types(&self) -> &[String] {
        match self {
            Self::Component { component_types } | Self::RichText { component_types, .. } => {
                component_types
            }
            _ => &[],
        }
    }

    #[must_use]
    pub fn match_pattern(&self) -> Option<&str> {
        match self {
            Self::String { match_pattern, .. } => match_pattern.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn index(&self) -> Option<&str> {
        match self {
            Self::String { index, .. } => index.as_deref(),
            _ => None,
        }
    }

    /// True if any reference list of `kind` names `type_name`.
    #[must_use]
    pub fn references(&self, kind: TypeKind, type_name: &str) -> bool {
        let named = |list: &[String]| list.iter().any(|it| it == type_name);
        match kind {
            TypeKind::Entity => named(self.entity_types()) || named(self.link_entity_types()),
            TypeKind::Component => named(self.component_types()),
        }
    }

    /// Mutable access to every reference list naming types of `kind`.
    pub fn reference_lists_mut(&mut self, kind: TypeKind) -> Vec<&mut Vec<String>> {
        match (self, kind) {
            (Self::Reference { entity_types }, TypeKind::Entity) => vec![entity_types],
            (
                Self::RichText {
                    entity_types,
                    link_entity_types,
                    ..
                },
                TypeKind::Entity,
            ) => vec![entity_types, link_entity_types],
            (
                Self::Component { component_types } | Self::RichText { component_types, .. },
                TypeKind::Component,
            ) => vec![component_types],
            _ => Vec::new(),
        }
    }

    /// Sort and deduplicate every list-valued attribute.
    pub fn normalize(&mut self) {
        match self {
            Self::Boolean | Self::Location | Self::Number { .. } => {}
            Self::Component { component_types } => sort_dedup(component_types),
            Self::Reference { entity_types } => sort_dedup(entity_types),
            Self::RichText {
                entity_types,
                link_entity_types,
                component_types,
                rich_text_nodes,
            } => {
                sort_dedup(entity_types);
                sort_dedup(link_entity_types);
                sort_dedup(component_types);
                sort_dedup(rich_text_nodes);
            }
            Self::String { values, .. } => sort_dedup(values),
        }
    }
}

pub(crate) fn sort_dedup(list: &mut Vec<String>) {
    list.sort();
    list.dedup();
}

/// Attribute-free field kind tag, as it appears in the `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum FieldType {
    Boolean,
    Component,
    Location,
    Number,
    Reference,
    RichText,
    String,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Component => "Component",
            Self::Location => "Location",
            Self::Number => "Number",
            Self::Reference => "Reference",
            Self::RichText => "RichText",
            Self::String => "String",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rich text node kinds known to the engine.
pub mod rich_text_node {
    pub const CODE: &str = "code";
    pub const CODE_HIGHLIGHT: &str = "code-highlight";
    pub const COMPONENT: &str = "component";
    pub const ENTITY: &str = "entity";
    pub const ENTITY_LINK: &str = "entityLink";
    pub const HEADING: &str = "heading";
    pub const LINEBREAK: &str = "linebreak";
    pub const LINK: &str = "link";
    pub const LIST: &str = "list";
    pub const LISTITEM: &str = "listitem";
    pub const PARAGRAPH: &str = "paragraph";
    pub const ROOT: &str = "root";
    pub const TAB: &str = "tab";
    pub const TEXT: &str = "text";

    /// Nodes every restricted node set must contain.
    pub const REQUIRED: [&str; 5] = [ROOT, PARAGRAPH, TEXT, LINEBREAK, TAB];

    /// Nodes that are only meaningful together.
    pub const PAIRS: [(&str, &str); 2] = [(LIST, LISTITEM), (CODE, CODE_HIGHLIGHT)];
}

// ---------------------------------------------------------------------------
// Patterns and indexes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PatternSpecification {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndexSpecification {
    pub name: String,
    #[serde(rename = "type")]
    pub index_type: IndexType,
}

impl IndexSpecification {
    #[must_use]
    pub fn unique(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index_type: IndexType::Unique,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Unique,
}

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

/// One entry of the persisted migration log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaVersionMigration {
    pub version: u32,
    pub actions: Vec<SchemaMigrationAction>,
}

/// The type a migration action targets. Serialized as either an
/// `entityType` or a `componentType` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum TypeReference {
    EntityType(String),
    ComponentType(String),
}

impl TypeReference {
    #[must_use]
    pub const fn kind(&self) -> TypeKind {
        match self {
            Self::EntityType(_) => TypeKind::Entity,
            Self::ComponentType(_) => TypeKind::Component,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::EntityType(name) | Self::ComponentType(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SchemaMigrationAction {
    DeleteField {
        #[serde(flatten)]
        target: TypeReference,
        field: String,
    },
    #[serde(rename_all = "camelCase")]
    RenameField {
        #[serde(flatten)]
        target: TypeReference,
        field: String,
        new_name: String,
    },
    DeleteType {
        #[serde(flatten)]
        target: TypeReference,
    },
    #[serde(rename_all = "camelCase")]
    RenameType {
        #[serde(flatten)]
        target: TypeReference,
        new_name: String,
    },
}

impl SchemaMigrationAction {
    /// The `action` tag, e.g. "renameField".
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DeleteField { .. } => "deleteField",
            Self::RenameField { .. } => "renameField",
            Self::DeleteType { .. } => "deleteType",
            Self::RenameType { .. } => "renameType",
        }
    }

    #[must_use]
    pub const fn target(&self) -> &TypeReference {
        match self {
            Self::DeleteField { target, .. }
            | Self::RenameField { target, .. }
            | Self::DeleteType { target }
            | Self::RenameType { target, .. } => target,
        }
    }
}

/// Index repair instructions supplied alongside an update. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SchemaTransientMigrationAction {
    #[serde(rename_all = "camelCase")]
    RenameIndex { index: String, new_name: String },
    DeleteIndex { index: String },
}

impl SchemaTransientMigrationAction {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RenameIndex { .. } => "renameIndex",
            Self::DeleteIndex { .. } => "deleteIndex",
        }
    }

    #[must_use]
    pub fn index(&self) -> &str {
        match self {
            Self::RenameIndex { index, .. } | Self::DeleteIndex { index } => index,
        }
    }
}
