//! Layering a partial update onto a previous specification.

use std::collections::BTreeSet;

use crate::error::{SchemaError, bad_request};
use crate::migration::{apply_migrations, next_version};
use crate::spec::{
    ComponentTypeSpecification, EntityTypeSpecification, FieldKind, FieldSpecification, FieldType,
    IndexSpecification, PatternSpecification, SchemaSpecification, TypeSpecification,
};
use crate::update::{
    ComponentTypeSpecificationUpdate, EntityTypeSpecificationUpdate, FieldSpecificationUpdate,
    SchemaSpecificationUpdate,
};

/// Build the candidate specification for `update` on top of `previous`.
///
/// The candidate carries `previous.version + 1` and is not validated.
pub fn merge_update(
    previous: &SchemaSpecification,
    update: &SchemaSpecificationUpdate,
) -> Result<SchemaSpecification, SchemaError> {
    let mut spec = apply_migrations(previous, &update.migrations)?;

    for type_update in &update.entity_types {
        let merged = merge_entity_type(spec.entity_type(&type_update.name), type_update)?;
        upsert(&mut spec.entity_types, merged);
    }
    for type_update in &update.component_types {
        let merged = merge_component_type(spec.component_type(&type_update.name), type_update)?;
        upsert(&mut spec.component_types, merged);
    }

    spec.patterns = derive_patterns(&spec, &update.patterns, previous);
    spec.indexes = derive_indexes(&spec, &update.indexes, previous);

    spec.entity_types.sort_by(|a, b| a.name.cmp(&b.name));
    spec.component_types.sort_by(|a, b| a.name.cmp(&b.name));
    for field in spec
        .entity_types
        .iter_mut()
        .flat_map(|it| it.fields.iter_mut())
        .chain(spec.component_types.iter_mut().flat_map(|it| it.fields.iter_mut()))
    {
        field.kind.normalize();
    }

    spec.version = next_version(previous)?;
    Ok(spec)
}

fn upsert<T: TypeSpecification>(types: &mut Vec<T>, merged: T) {
    match types.iter_mut().find(|it| it.name() == merged.name()) {
        Some(slot) => *slot = merged,
        None => types.push(merged),
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn merge_entity_type(
    existing: Option<&EntityTypeSpecification>,
    update: &EntityTypeSpecificationUpdate,
) -> Result<EntityTypeSpecification, SchemaError> {
    let name = &update.name;
    let publishable =
        merge_publishable(name, update.publishable, existing.map(|it| it.publishable))?;
    let fields = merge_fields(
        name,
        existing.map_or(&[][..], |it| it.fields.as_slice()),
        &update.fields,
    )?;

    Ok(EntityTypeSpecification {
        name: name.clone(),
        publishable,
        auth_key_pattern: update
            .auth_key_pattern
            .clone()
            .unwrap_or_else(|| existing.and_then(|it| it.auth_key_pattern.clone())),
        name_field: update
            .name_field
            .clone()
            .unwrap_or_else(|| existing.and_then(|it| it.name_field.clone())),
        fields,
    })
}

fn merge_component_type(
    existing: Option<&ComponentTypeSpecification>,
    update: &ComponentTypeSpecificationUpdate,
) -> Result<ComponentTypeSpecification, SchemaError> {
    let name = &update.name;
    if update.auth_key_pattern.is_some() {
        return bad_request!("{name}: Component types can't specify authKeyPattern");
    }
    if update.name_field.is_some() {
        return bad_request!("{name}: Component types can't specify nameField");
    }
    let publishable =
        merge_publishable(name, update.publishable, existing.map(|it| it.publishable))?;
    let fields = merge_fields(
        name,
        existing.map_or(&[][..], |it| it.fields.as_slice()),
        &update.fields,
    )?;

    Ok(ComponentTypeSpecification {
        name: name.clone(),
        publishable,
        fields,
    })
}

fn merge_publishable(
    type_name: &str,
    requested: Option<bool>,
    current: Option<bool>,
) -> Result<bool, SchemaError> {
    match (requested, current) {
        (Some(requested), Some(current)) if requested != current => bad_request!(
            "{type_name}: Can't change the value of publishable. Requested {requested} but is {current}"
        ),
        (Some(value), _) | (None, Some(value)) => Ok(value),
        (None, None) => Ok(false),
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Updated fields first, in update order, then the untouched ones in their
/// previous order.
fn merge_fields(
    type_name: &str,
    existing: &[FieldSpecification],
    updates: &[FieldSpecificationUpdate],
) -> Result<Vec<FieldSpecification>, SchemaError> {
    let mut fields = Vec::with_capacity(existing.len() + updates.len());
    for update in updates {
        let previous = existing.iter().find(|it| it.name == update.name);
        fields.push(merge_field(type_name, previous, update)?);
    }
    fields.extend(
        existing
            .iter()
            .filter(|field| !updates.iter().any(|it| it.name == field.name))
            .cloned(),
    );
    Ok(fields)
}

/// Attributes a field kind accepts beyond the shared ones.
const fn allowed_attributes(field_type: FieldType) -> &'static [&'static str] {
    match field_type {
        FieldType::Boolean | FieldType::Location => &[],
        FieldType::Component => &["componentTypes"],
        FieldType::Number => &["integer"],
        FieldType::Reference => &["entityTypes"],
        FieldType::RichText => &[
            "entityTypes",
            "linkEntityTypes",
            "componentTypes",
            "richTextNodes",
        ],
        FieldType::String => &["multiline", "matchPattern", "values", "index"],
    }
}

fn merge_field(
    type_name: &str,
    previous: Option<&FieldSpecification>,
    update: &FieldSpecificationUpdate,
) -> Result<FieldSpecification, SchemaError> {
    let field_name = &update.name;
    let field_type = update.field_type;

    let allowed = allowed_attributes(field_type);
    if let Some(attribute) = update
        .supplied_attributes()
        .into_iter()
        .find(|it| !allowed.contains(it))
    {
        return bad_request!(
            "{type_name}.{field_name}: Field with type {field_type} shouldn't specify {attribute}"
        );
    }

    if let Some(previous) = previous {
        if previous.field_type() != field_type {
            return bad_request!(
                "{type_name}.{field_name}: Can't change type of field. Requested {field_type} but is {}",
                previous.field_type()
            );
        }
        for (attribute, requested, current) in [
            ("list", update.list, previous.list),
            ("adminOnly", update.admin_only, previous.admin_only),
        ] {
            if let Some(requested) = requested
                && requested != current
            {
                return bad_request!(
                    "{type_name}.{field_name}: Can't change the value of {attribute}. Requested {requested} but is {current}"
                );
            }
        }
    }

    let mut kind = previous.map_or_else(
        || FieldKind::default_for(field_type),
        |it| it.kind.clone(),
    );
    merge_kind(&mut kind, update);
    kind.normalize();

    Ok(FieldSpecification {
        name: field_name.clone(),
        list: update.list.or(previous.map(|it| it.list)).unwrap_or(false),
        required: update
            .required
            .or(previous.map(|it| it.required))
            .unwrap_or(false),
        admin_only: update
            .admin_only
            .or(previous.map(|it| it.admin_only))
            .unwrap_or(false),
        kind,
    })
}

/// Overwrite every kind attribute the update supplies; the rest are inherited.
fn merge_kind(kind: &mut FieldKind, update: &FieldSpecificationUpdate) {
    match kind {
        FieldKind::Boolean | FieldKind::Location => {}
        FieldKind::Component { component_types } => {
            inherit(component_types, update.component_types.as_ref());
        }
        FieldKind::Number { integer } => inherit(integer, update.integer.as_ref()),
        FieldKind::Reference { entity_types } => {
            inherit(entity_types, update.entity_types.as_ref());
        }
        FieldKind::RichText {
            entity_types,
            link_entity_types,
            component_types,
            rich_text_nodes,
        } => {
            inherit(entity_types, update.entity_types.as_ref());
            inherit(link_entity_types, update.link_entity_types.as_ref());
            inherit(component_types, update.component_types.as_ref());
            inherit(rich_text_nodes, update.rich_text_nodes.as_ref());
        }
        FieldKind::String {
            multiline,
            match_pattern,
            values,
            index,
        } => {
            inherit(multiline, update.multiline.as_ref());
            inherit(match_pattern, update.match_pattern.as_ref());
            inherit(values, update.values.as_ref());
            inherit(index, update.index.as_ref());
        }
    }
}

fn inherit<T: Clone>(slot: &mut T, update: Option<&T>) {
    if let Some(value) = update {
        slot.clone_from(value);
    }
}

// ---------------------------------------------------------------------------
// Derived tables
// ---------------------------------------------------------------------------

fn all_fields(spec: &SchemaSpecification) -> impl Iterator<Item = &FieldSpecification> {
    spec.entity_types
        .iter()
        .flat_map(|it| it.fields.iter())
        .chain(spec.component_types.iter().flat_map(|it| it.fields.iter()))
}

/// Referenced patterns in name order. Names found in neither table are left
/// out so the validator reports the dangling reference.
fn derive_patterns(
    spec: &SchemaSpecification,
    table: &[PatternSpecification],
    previous: &SchemaSpecification,
) -> Vec<PatternSpecification> {
    let names: BTreeSet<&str> = spec
        .entity_types
        .iter()
        .filter_map(|it| it.auth_key_pattern.as_deref())
        .chain(all_fields(spec).filter_map(|it| it.kind.match_pattern()))
        .collect();

    names
        .into_iter()
        .filter_map(|name| {
            table
                .iter()
                .find(|it| it.name == name)
                .or_else(|| previous.pattern(name))
                .cloned()
        })
        .collect()
}

fn derive_indexes(
    spec: &SchemaSpecification,
    table: &[IndexSpecification],
    previous: &SchemaSpecification,
) -> Vec<IndexSpecification> {
    let names: BTreeSet<&str> = all_fields(spec).filter_map(|it| it.kind.index()).collect();

    names
        .into_iter()
        .filter_map(|name| {
            table
                .iter()
                .find(|it| it.name == name)
                .or_else(|| previous.index(name))
                .cloned()
        })
        .collect()
}
