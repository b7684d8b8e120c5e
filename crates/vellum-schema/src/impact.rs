//! Change impact between two schema versions.
//!
//! Given the schema before and after an update, work out which stored
//! entities must be re-indexed or re-validated, which types and unique
//! indexes were deleted, and how renamed ones map from old to new names.
//!
//! Renames are followed through the migration log entries between the two
//! versions so that the same logical type or field is compared pairwise.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SchemaError, bad_request};
use crate::spec::{
    FieldKind, FieldSpecification, SchemaMigrationAction, SchemaSpecification,
    SchemaTransientMigrationAction, TypeKind, TypeSpecification,
};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaChangeImpact {
    /// Original names of deleted entity types.
    pub delete_entity_types: Vec<String>,
    /// Original name to final name.
    pub rename_entity_types: BTreeMap<String, String>,
    pub delete_component_types: Vec<String>,
    pub rename_component_types: BTreeMap<String, String>,
    pub delete_unique_value_indexes: Vec<String>,
    pub rename_unique_value_indexes: BTreeMap<String, String>,
    /// `None` when no stored entity is affected.
    pub dirty_entities_selector: Option<DirtyEntitiesSelector>,
}

/// Types whose stored entities need re-indexing or re-validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirtyEntitiesSelector {
    pub index_entity_types: Vec<String>,
    pub index_component_types: Vec<String>,
    pub validate_entity_types: Vec<String>,
    pub validate_component_types: Vec<String>,
}

/// Compute the impact of going from `previous` to `next`.
///
/// `transient` holds the index actions supplied with the update that
/// produced `next`.
///
/// # Errors
///
/// Returns `SchemaError::BadRequest` when `next` is older than `previous`.
pub fn calculate_schema_change_impact(
    previous: &SchemaSpecification,
    next: &SchemaSpecification,
    transient: &[SchemaTransientMigrationAction],
) -> Result<SchemaChangeImpact, SchemaError> {
    if next.version < previous.version {
        return bad_request!(
            "The version of the next schema ({}) can't be older than the previous schema version ({})",
            next.version,
            previous.version
        );
    }

    let mut replay = Replay::default();
    let mut entries: Vec<_> = next
        .migrations
        .iter()
        .filter(|it| it.version > previous.version && it.version <= next.version)
        .collect();
    entries.sort_by_key(|it| it.version);
    for entry in entries {
        for action in &entry.actions {
            replay.migration(action);
        }
    }
    for action in transient {
        replay.transient(action);
    }

    let dirty = DirtyTypes::collect(previous, next, &replay);

    let impact = SchemaChangeImpact {
        delete_entity_types: replay.entity_types.deleted.iter().cloned().collect(),
        rename_entity_types: replay.entity_types.renames(),
        delete_component_types: replay.component_types.deleted.iter().cloned().collect(),
        rename_component_types: replay.component_types.renames(),
        delete_unique_value_indexes: replay.indexes.deleted.iter().cloned().collect(),
        rename_unique_value_indexes: replay.indexes.renames(),
        dirty_entities_selector: dirty.into_selector(),
    };
    debug!(
        previous = previous.version,
        next = next.version,
        deleted_types = impact.delete_entity_types.len() + impact.delete_component_types.len(),
        renamed_types = impact.rename_entity_types.len() + impact.rename_component_types.len(),
        dirty = impact.dirty_entities_selector.is_some(),
        "calculated schema change impact"
    );
    Ok(impact)
}

// ---------------------------------------------------------------------------
// Rename bookkeeping
// ---------------------------------------------------------------------------

/// Tracks how current names relate to the names in `previous`.
#[derive(Debug, Default)]
struct RenameLedger {
    /// Current name to original name. `None` marks a name that no longer
    /// denotes anything from `previous` (renamed away, deleted, or new).
    originals: BTreeMap<String, Option<String>>,
    /// Original names of deleted items.
    deleted: BTreeSet<String>,
}

impl RenameLedger {
    /// Original name of the item currently called `current`.
    fn original(&self, current: &str) -> Option<String> {
        match self.originals.get(current) {
            Some(original) => original.clone(),
            None => Some(current.to_owned()),
        }
    }

    /// Current name of the item originally called `original`.
    fn current(&self, original: &str) -> Option<String> {
        if self.deleted.contains(original) {
            return None;
        }
        if let Some((current, _)) = self
            .originals
            .iter()
            .find(|(_, it)| it.as_deref() == Some(original))
        {
            return Some(current.clone());
        }
        (!self.originals.contains_key(original)).then(|| original.to_owned())
    }

    fn rename(&mut self, from: &str, to: &str) {
        let original = self.original(from);
        self.originals.insert(from.to_owned(), None);
        self.originals.insert(to.to_owned(), original);
    }

    fn delete(&mut self, name: &str) {
        if let Some(original) = self.original(name) {
            self.deleted.insert(original);
        }
        self.originals.insert(name.to_owned(), None);
    }

    /// Original to final name, for items that survived under a new name.
    fn renames(&self) -> BTreeMap<String, String> {
        self.originals
            .iter()
            .filter_map(|(current, original)| match original {
                Some(original) if original != current => Some((original.clone(), current.clone())),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct Replay {
    entity_types: RenameLedger,
    component_types: RenameLedger,
    /// Field ledgers keyed by the owning type's original name.
    fields: HashMap<(TypeKind, String), RenameLedger>,
    indexes: RenameLedger,
}

impl Replay {
    const fn types(&self, kind: TypeKind) -> &RenameLedger {
        match kind {
            TypeKind::Entity => &self.entity_types,
            TypeKind::Component => &self.component_types,
        }
    }

    const fn types_mut(&mut self, kind: TypeKind) -> &mut RenameLedger {
        match kind {
            TypeKind::Entity => &mut self.entity_types,
            TypeKind::Component => &mut self.component_types,
        }
    }

    fn field_ledger(&self, kind: TypeKind, original_type: &str) -> Option<&RenameLedger> {
        self.fields.get(&(kind, original_type.to_owned()))
    }

    fn migration(&mut self, action: &SchemaMigrationAction) {
        let target = action.target();
        let kind = target.kind();
        match action {
            SchemaMigrationAction::RenameType { new_name, .. } => {
                self.types_mut(kind).rename(target.name(), new_name);
            }
            SchemaMigrationAction::DeleteType { .. } => self.types_mut(kind).delete(target.name()),
            SchemaMigrationAction::RenameField {
                field, new_name, ..
            } => {
                if let Some(original_type) = self.types(kind).original(target.name()) {
                    self.fields
                        .entry((kind, original_type))
                        .or_default()
                        .rename(field, new_name);
                }
            }
            SchemaMigrationAction::DeleteField { field, .. } => {
                if let Some(original_type) = self.types(kind).original(target.name()) {
                    self.fields
                        .entry((kind, original_type))
                        .or_default()
                        .delete(field);
                }
            }
        }
    }

    fn transient(&mut self, action: &SchemaTransientMigrationAction) {
        match action {
            SchemaTransientMigrationAction::RenameIndex { index, new_name } => {
                self.indexes.rename(index, new_name);
            }
            SchemaTransientMigrationAction::DeleteIndex { index } => self.indexes.delete(index),
        }
    }

    /// Rewrite a previous-version field into next-version names.
    fn forward_field(
        &self,
        field: &FieldSpecification,
        field_ledger: Option<&RenameLedger>,
    ) -> Option<FieldSpecification> {
        let name = match field_ledger {
            Some(ledger) => ledger.current(&field.name)?,
            None => field.name.clone(),
        };
        let mut kind = field.kind.clone();
        for type_kind in [TypeKind::Entity, TypeKind::Component] {
            let ledger = self.types(type_kind);
            for list in kind.reference_lists_mut(type_kind) {
                *list = list.iter().filter_map(|it| ledger.current(it)).collect();
            }
        }
        if let FieldKind::String {
            index: Some(index), ..
        } = &mut kind
            && let Some(current) = self.indexes.current(index)
        {
            *index = current;
        }
        kind.normalize();
        Some(FieldSpecification {
            name,
            kind,
            ..field.clone()
        })
    }
}

// ---------------------------------------------------------------------------
// Dirty types
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct DirtyTypes {
    to_index: BTreeSet<(TypeKind, String)>,
    to_validate: BTreeSet<(TypeKind, String)>,
}

impl DirtyTypes {
    fn index(&mut self, kind: TypeKind, name: &str) {
        self.to_index.insert((kind, name.to_owned()));
    }

    fn validate(&mut self, kind: TypeKind, name: &str) {
        self.to_validate.insert((kind, name.to_owned()));
    }

    fn both(&mut self, kind: TypeKind, name: &str) {
        self.index(kind, name);
        self.validate(kind, name);
    }

    fn collect(
        previous: &SchemaSpecification,
        next: &SchemaSpecification,
        replay: &Replay,
    ) -> Self {
        let mut dirty = Self::default();

        for kind in [TypeKind::Entity, TypeKind::Component] {
            for original in &replay.types(kind).deleted {
                dirty.both(kind, original);
            }
        }

        let next_types = next
            .entity_types
            .iter()
            .map(|it| it as &dyn TypeSpecification)
            .chain(next.component_types.iter().map(|it| it as &dyn TypeSpecification));
        for next_type in next_types {
            let kind = next_type.kind();
            let Some(previous_type) = replay
                .types(kind)
                .original(next_type.name())
                .and_then(|original| previous.type_spec(kind, &original))
            else {
                continue;
            };
            dirty.compare_types(previous, next, replay, previous_type, next_type);
        }

        dirty.collect_transient_indexes(previous, next, replay);
        dirty
    }

    fn compare_types(
        &mut self,
        previous: &SchemaSpecification,
        next: &SchemaSpecification,
        replay: &Replay,
        previous_type: &dyn TypeSpecification,
        next_type: &dyn TypeSpecification,
    ) {
        let kind = next_type.kind();
        let name = next_type.name();
        let field_ledger = replay.field_ledger(kind, previous_type.name());

        if previous_type.publishable() != next_type.publishable() {
            self.both(kind, name);
        }

        let references_deleted = [TypeKind::Entity, TypeKind::Component]
            .into_iter()
            .any(|deleted_kind| {
                replay.types(deleted_kind).deleted.iter().any(|deleted| {
                    previous_type
                        .fields()
                        .iter()
                        .any(|field| field.kind.references(deleted_kind, deleted))
                })
            });
        if references_deleted {
            self.validate(kind, name);
        }

        for previous_field in previous_type.fields() {
            let forwarded_field = field_ledger
                .map_or(Some(previous_field.name.clone()), |ledger| {
                    ledger.current(&previous_field.name)
                })
                .and_then(|current| next_type.field(&current));
            if forwarded_field.is_none() && previous_field.kind.index().is_some() {
                self.both(kind, name);
            }
        }

        for next_field in next_type.fields() {
            let previous_field = field_ledger
                .map_or(Some(next_field.name.clone()), |ledger| {
                    ledger.original(&next_field.name)
                })
                .and_then(|original| previous_type.field(&original));

            if let Some(previous_field) = previous_field
                && previous_field.admin_only != next_field.admin_only
            {
                self.both(kind, name);
            }

            let previous_index = previous_field
                .and_then(|it| it.kind.index())
                .map(|index| replay.indexes.current(index).unwrap_or_else(|| index.to_owned()));
            if previous_index.as_deref() != next_field.kind.index() {
                self.both(kind, name);
            }

            let previous_pattern = previous_field
                .and_then(|it| it.kind.match_pattern())
                .and_then(|it| previous.pattern(it))
                .map(|it| it.pattern.as_str());
            let next_pattern = next_field
                .kind
                .match_pattern()
                .and_then(|it| next.pattern(it))
                .map(|it| it.pattern.as_str());
            if next_pattern.is_some() && next_pattern != previous_pattern {
                self.validate(kind, name);
            }
        }

        // A renamed type is only clean when nothing but names changed.
        if previous_type.name() != name {
            let forwarded: Vec<FieldSpecification> = previous_type
                .fields()
                .iter()
                .filter_map(|field| replay.forward_field(field, field_ledger))
                .collect();
            if has_content_delta(previous_type, next_type, forwarded, field_ledger) {
                self.validate(kind, name);
            }
        }
    }

    /// Every type with a field on a deleted or renamed unique index.
    fn collect_transient_indexes(
        &mut self,
        previous: &SchemaSpecification,
        next: &SchemaSpecification,
        replay: &Replay,
    ) {
        let renamed = replay.indexes.renames();
        let originals: BTreeSet<&str> = replay
            .indexes
            .deleted
            .iter()
            .chain(renamed.keys())
            .map(String::as_str)
            .collect();
        let finals: BTreeSet<&str> = renamed.values().map(String::as_str).collect();

        for kind in [TypeKind::Entity, TypeKind::Component] {
            let ledger = replay.types(kind);
            for previous_type in types_of(previous, kind) {
                let uses_index = previous_type
                    .fields()
                    .iter()
                    .any(|field| field.kind.index().is_some_and(|it| originals.contains(it)));
                if uses_index {
                    let name = ledger
                        .current(previous_type.name())
                        .unwrap_or_else(|| previous_type.name().to_owned());
                    self.index(kind, &name);
                }
            }
            for next_type in types_of(next, kind) {
                let uses_index = next_type
                    .fields()
                    .iter()
                    .any(|field| field.kind.index().is_some_and(|it| finals.contains(it)));
                if uses_index {
                    self.index(kind, next_type.name());
                }
            }
        }
    }

    fn into_selector(self) -> Option<DirtyEntitiesSelector> {
        if self.to_index.is_empty() && self.to_validate.is_empty() {
            return None;
        }
        let names = |set: &BTreeSet<(TypeKind, String)>, kind: TypeKind| -> Vec<String> {
            set.iter()
                .filter(|(it, _)| *it == kind)
                .map(|(_, name)| name.clone())
                .collect()
        };
        Some(DirtyEntitiesSelector {
            index_entity_types: names(&self.to_index, TypeKind::Entity),
            index_component_types: names(&self.to_index, TypeKind::Component),
            validate_entity_types: names(&self.to_validate, TypeKind::Entity),
            validate_component_types: names(&self.to_validate, TypeKind::Component),
        })
    }
}

fn types_of(spec: &SchemaSpecification, kind: TypeKind) -> Vec<&dyn TypeSpecification> {
    match kind {
        TypeKind::Entity => spec
            .entity_types
            .iter()
            .map(|it| it as &dyn TypeSpecification)
            .collect(),
        TypeKind::Component => spec
            .component_types
            .iter()
            .map(|it| it as &dyn TypeSpecification)
            .collect(),
    }
}

/// True when the type differs in anything but names that migrations changed.
/// Field order is ignored.
fn has_content_delta(
    previous_type: &dyn TypeSpecification,
    next_type: &dyn TypeSpecification,
    mut forwarded: Vec<FieldSpecification>,
    field_ledger: Option<&RenameLedger>,
) -> bool {
    let mut next_fields = next_type.fields().to_vec();
    forwarded.sort_by(|a, b| a.name.cmp(&b.name));
    next_fields.sort_by(|a, b| a.name.cmp(&b.name));

    let forwarded_name_field = previous_type
        .name_field()
        .and_then(|name| match field_ledger {
            Some(ledger) => ledger.current(name),
            None => Some(name.to_owned()),
        });

    previous_type.publishable() != next_type.publishable()
        || previous_type.auth_key_pattern() != next_type.auth_key_pattern()
        || forwarded_name_field.as_deref() != next_type.name_field()
        || forwarded != next_fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{EntityTypeSpecification, FieldType, SchemaVersionMigration, TypeReference};
    use pretty_assertions::assert_eq;

    #[test]
    fn ledger_collapses_rename_chains() {
        let mut ledger = RenameLedger::default();
        ledger.rename("A", "B");
        ledger.rename("B", "C");
        assert_eq!(ledger.renames(), BTreeMap::from([("A".into(), "C".into())]));
        assert_eq!(ledger.original("C"), Some("A".into()));
        assert_eq!(ledger.original("A"), None);
        assert_eq!(ledger.current("A"), Some("C".into()));
    }

    #[test]
    fn ledger_reports_renamed_then_deleted_under_original_name() {
        let mut ledger = RenameLedger::default();
        ledger.rename("slugs", "paths");
        ledger.delete("paths");
        assert!(ledger.renames().is_empty());
        assert_eq!(ledger.deleted, BTreeSet::from(["slugs".to_string()]));
        assert_eq!(ledger.current("slugs"), None);
    }

    #[test]
    fn ledger_swaps_names() {
        let mut ledger = RenameLedger::default();
        ledger.rename("A", "Tmp");
        ledger.rename("B", "A");
        ledger.rename("Tmp", "B");
        assert_eq!(
            ledger.renames(),
            BTreeMap::from([("A".into(), "B".into()), ("B".into(), "A".into())])
        );
    }

    #[test]
    fn untouched_names_map_to_themselves() {
        let ledger = RenameLedger::default();
        assert_eq!(ledger.original("Post"), Some("Post".into()));
        assert_eq!(ledger.current("Post"), Some("Post".into()));
    }

    #[test]
    fn identical_schemas_have_no_impact() {
        let mut post = EntityTypeSpecification::new("Post");
        post.fields = vec![FieldSpecification::new(
            "title",
            FieldKind::default_for(FieldType::String),
        )];
        let spec = SchemaSpecification {
            version: 3,
            entity_types: vec![post],
            ..SchemaSpecification::default()
        };
        assert_eq!(
            calculate_schema_change_impact(&spec, &spec, &[]).unwrap(),
            SchemaChangeImpact::default()
        );
    }

    #[test]
    fn older_next_is_rejected() {
        let previous = SchemaSpecification {
            version: 3,
            ..SchemaSpecification::default()
        };
        let next = SchemaSpecification {
            version: 2,
            ..SchemaSpecification::default()
        };
        assert_eq!(
            calculate_schema_change_impact(&previous, &next, &[])
                .unwrap_err()
                .message(),
            "The version of the next schema (2) can't be older than the previous schema version (3)"
        );
    }

    #[test]
    fn migrations_outside_the_version_range_are_ignored() {
        let previous = SchemaSpecification {
            version: 2,
            entity_types: vec![EntityTypeSpecification::new("Post")],
            migrations: vec![SchemaVersionMigration {
                version: 2,
                actions: vec![SchemaMigrationAction::DeleteType {
                    target: TypeReference::EntityType("Old".into()),
                }],
            }],
            ..SchemaSpecification::default()
        };
        let impact = calculate_schema_change_impact(&previous, &previous, &[]).unwrap();
        assert!(impact.delete_entity_types.is_empty());
        assert_eq!(impact.dirty_entities_selector, None);
    }

    #[test]
    fn selector_serializes_as_null_when_clean() {
        let value = serde_json::to_value(SchemaChangeImpact::default()).unwrap();
        assert_eq!(value["dirtyEntitiesSelector"], serde_json::Value::Null);
        assert_eq!(value["renameEntityTypes"], serde_json::json!({}));
    }
}
