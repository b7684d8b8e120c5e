//! Migration log application.
//!
//! An update may carry new migration entries. Each accepted entry is applied
//! action by action against the previous specification and then prepended to
//! the log, so the log stays newest-first.

use tracing::debug;

use crate::error::{SchemaError, bad_request};
use crate::spec::{
    FieldSpecification, SchemaMigrationAction, SchemaSpecification,
    SchemaTransientMigrationAction, SchemaVersionMigration, TypeKind, TypeReference,
};
use crate::update::SchemaSpecificationUpdate;

/// Apply `migrations` to a copy of `previous`.
///
/// Entries already present in the log are accepted when identical and
/// rejected otherwise. Any other entry must target `previous.version + 1`.
/// Entries without actions are dropped.
pub fn apply_migrations(
    previous: &SchemaSpecification,
    migrations: &[SchemaVersionMigration],
) -> Result<SchemaSpecification, SchemaError> {
    let new_version = next_version(previous)?;
    let mut spec = previous.clone();

    for migration in migrations {
        let version = migration.version;

        if let Some(existing) = spec.migration(version) {
            if existing.actions == migration.actions {
                continue;
            }
            return bad_request!(
                "Migration for version {version} is already defined with different actions"
            );
        }
        if version != new_version {
            return bad_request!(
                "Version specified for migration ({version}) must be the same as the schema new version {new_version}"
            );
        }
        if migration.actions.is_empty() {
            continue;
        }

        for action in &migration.actions {
            apply_action(&mut spec, action)?;
            debug!(
                version,
                action = action.name(),
                target = action.target().name(),
                "applied migration action"
            );
        }
        spec.migrations.insert(0, migration.clone());
    }

    Ok(spec)
}

/// Update-level checks that run before any merging.
/// The version an update of `previous` produces.
pub(crate) fn next_version(previous: &SchemaSpecification) -> Result<u32, SchemaError> {
    match previous.version.checked_add(1) {
        Some(version) => Ok(version),
        None => bad_request!(
            "The schema version ({}) can't be incremented",
            previous.version
        ),
    }
}

pub(crate) fn check_update(
    previous: &SchemaSpecification,
    update: &SchemaSpecificationUpdate,
) -> Result<(), SchemaError> {
    let new_version = next_version(previous)?;

    if let Some(version) = update.version
        && version != new_version
    {
        return bad_request!(
            "The version of the update ({version}) must be the same as the schema new version {new_version}"
        );
    }

    if update.transient_migrations.is_empty() {
        return Ok(());
    }
    if update.version.is_none() {
        return bad_request!("Version must be specified when using transient migrations");
    }

    // Transient actions chain: a renamed index is addressed by its new name.
    let mut indexes: Vec<&str> = previous.indexes.iter().map(|it| it.name.as_str()).collect();
    for action in &update.transient_migrations {
        let index = action.index();
        let Some(position) = indexes.iter().position(|it| *it == index) else {
            return bad_request!("{}: Index {index} doesn't exist", action.name());
        };
        match action {
            SchemaTransientMigrationAction::RenameIndex { new_name, .. } => {
                indexes[position] = new_name.as_str();
            }
            SchemaTransientMigrationAction::DeleteIndex { .. } => {
                indexes.remove(position);
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Mutable view of the parts of a type that field actions touch.
struct TypeFields<'a> {
    fields: &'a mut Vec<FieldSpecification>,
    name_field: Option<&'a mut Option<String>>,
}

fn apply_action(
    spec: &mut SchemaSpecification,
    action: &SchemaMigrationAction,
) -> Result<(), SchemaError> {
    match action {
        SchemaMigrationAction::DeleteField { target, field } => {
            let entry = type_fields(spec, action)?;
            let Some(position) = entry.fields.iter().position(|it| it.name == *field) else {
                return Err(missing_field(action, target, field));
            };
            entry.fields.remove(position);
            if let Some(name_field) = entry.name_field
                && name_field.as_deref() == Some(field.as_str())
            {
                *name_field = None;
            }
        }
        SchemaMigrationAction::RenameField {
            target,
            field,
            new_name,
        } => {
            let entry = type_fields(spec, action)?;
            let Some(renamed) = entry.fields.iter_mut().find(|it| it.name == *field) else {
                return Err(missing_field(action, target, field));
            };
            renamed.name.clone_from(new_name);
            if let Some(name_field) = entry.name_field
                && name_field.as_deref() == Some(field.as_str())
            {
                *name_field = Some(new_name.clone());
            }
        }
        SchemaMigrationAction::DeleteType { target } => {
            let name = target.name();
            let removed = match target.kind() {
                TypeKind::Entity => remove_by_name(&mut spec.entity_types, |it| &it.name, name),
                TypeKind::Component => {
                    remove_by_name(&mut spec.component_types, |it| &it.name, name)
                }
            };
            if !removed {
                return Err(missing_type(action));
            }
            for_each_field(spec, |field| {
                for list in field.kind.reference_lists_mut(target.kind()) {
                    list.retain(|it| it != name);
                }
            });
        }
        SchemaMigrationAction::RenameType { target, new_name } => {
            let name = target.name();
            let renamed = match target.kind() {
                TypeKind::Entity => spec
                    .entity_types
                    .iter_mut()
                    .find(|it| it.name == name)
                    .map(|it| &mut it.name),
                TypeKind::Component => spec
                    .component_types
                    .iter_mut()
                    .find(|it| it.name == name)
                    .map(|it| &mut it.name),
            };
            let Some(renamed) = renamed else {
                return Err(missing_type(action));
            };
            renamed.clone_from(new_name);
            for_each_field(spec, |field| {
                for list in field.kind.reference_lists_mut(target.kind()) {
                    for reference in list.iter_mut().filter(|it| it.as_str() == name) {
                        reference.clone_from(new_name);
                    }
                }
            });
        }
    }
    Ok(())
}

fn type_fields<'a>(
    spec: &'a mut SchemaSpecification,
    action: &SchemaMigrationAction,
) -> Result<TypeFields<'a>, SchemaError> {
    let entry = match action.target() {
        TypeReference::EntityType(name) => spec
            .entity_types
            .iter_mut()
            .find(|it| it.name == *name)
            .map(|it| TypeFields {
                fields: &mut it.fields,
                name_field: Some(&mut it.name_field),
            }),
        TypeReference::ComponentType(name) => spec
            .component_types
            .iter_mut()
            .find(|it| it.name == *name)
            .map(|it| TypeFields {
                fields: &mut it.fields,
                name_field: None,
            }),
    };
    entry.ok_or_else(|| missing_type(action))
}

fn remove_by_name<T>(items: &mut Vec<T>, name_of: impl Fn(&T) -> &String, name: &str) -> bool {
    let before = items.len();
    items.retain(|it| name_of(it) != name);
    items.len() != before
}

fn for_each_field(spec: &mut SchemaSpecification, mut visit: impl FnMut(&mut FieldSpecification)) {
    let entity_fields = spec.entity_types.iter_mut().flat_map(|it| it.fields.iter_mut());
    let component_fields = spec
        .component_types
        .iter_mut()
        .flat_map(|it| it.fields.iter_mut());
    entity_fields.chain(component_fields).for_each(&mut visit);
}

fn kind_title(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Entity => "Entity type",
        TypeKind::Component => "Component type",
    }
}

fn missing_type(action: &SchemaMigrationAction) -> SchemaError {
    let target = action.target();
    SchemaError::BadRequest(format!(
        "{}: {} {} doesn't exist",
        action.name(),
        kind_title(target.kind()),
        target.name()
    ))
}

fn missing_field(
    action: &SchemaMigrationAction,
    target: &TypeReference,
    field: &str,
) -> SchemaError {
    SchemaError::BadRequest(format!(
        "{}: Field {}.{field} doesn't exist",
        action.name(),
        target.name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{
        ComponentTypeSpecification, EntityTypeSpecification, FieldKind, FieldType,
        IndexSpecification,
    };
    use crate::update::SchemaUpdateBuilder;
    use pretty_assertions::assert_eq;

    fn string_field(name: &str) -> FieldSpecification {
        FieldSpecification::new(name, FieldKind::default_for(FieldType::String))
    }

    fn reference_field(name: &str, targets: &[&str]) -> FieldSpecification {
        FieldSpecification::new(
            name,
            FieldKind::Reference {
                entity_types: targets.iter().map(ToString::to_string).collect(),
            },
        )
    }

    fn blog() -> SchemaSpecification {
        let mut post = EntityTypeSpecification::new("Post");
        post.name_field = Some("title".into());
        post.fields = vec![
            string_field("title"),
            string_field("summary"),
            reference_field("author", &["Person"]),
        ];
        let mut person = EntityTypeSpecification::new("Person");
        person.fields = vec![string_field("name")];
        let mut quote = ComponentTypeSpecification::new("Quote");
        quote.fields = vec![string_field("text")];
        SchemaSpecification {
            version: 1,
            entity_types: vec![person, post],
            component_types: vec![quote],
            indexes: vec![IndexSpecification::unique("slugs")],
            ..SchemaSpecification::default()
        }
    }

    fn entry(version: u32, actions: Vec<SchemaMigrationAction>) -> SchemaVersionMigration {
        SchemaVersionMigration { version, actions }
    }

    fn entity(name: &str) -> TypeReference {
        TypeReference::EntityType(name.into())
    }

    fn message(result: Result<SchemaSpecification, SchemaError>) -> String {
        result
            .expect_err("migration should fail")
            .message()
            .to_string()
    }

    #[test]
    fn delete_field_clears_name_field() {
        let migrated = apply_migrations(
            &blog(),
            &[entry(
                2,
                vec![SchemaMigrationAction::DeleteField {
                    target: entity("Post"),
                    field: "title".into(),
                }],
            )],
        )
        .unwrap();
        let post = migrated.entity_type("Post").unwrap();
        assert_eq!(post.name_field, None);
        assert_eq!(
            post.fields.iter().map(|it| it.name.as_str()).collect::<Vec<_>>(),
            vec!["summary", "author"]
        );
        assert_eq!(migrated.migrations.len(), 1);
        assert_eq!(migrated.version, 1, "migration alone does not bump the version");
    }

    #[test]
    fn rename_field_keeps_position_and_repoints_name_field() {
        let migrated = apply_migrations(
            &blog(),
            &[entry(
                2,
                vec![SchemaMigrationAction::RenameField {
                    target: entity("Post"),
                    field: "title".into(),
                    new_name: "headline".into(),
                }],
            )],
        )
        .unwrap();
        let post = migrated.entity_type("Post").unwrap();
        assert_eq!(post.fields[0].name, "headline");
        assert_eq!(post.name_field.as_deref(), Some("headline"));
    }

    #[test]
    fn delete_type_strips_references_but_keeps_fields() {
        let migrated = apply_migrations(
            &blog(),
            &[entry(
                2,
                vec![SchemaMigrationAction::DeleteType {
                    target: entity("Person"),
                }],
            )],
        )
        .unwrap();
        assert!(migrated.entity_type("Person").is_none());
        let author = migrated.entity_type("Post").unwrap().fields[2].clone();
        assert_eq!(author.name, "author");
        assert!(author.kind.entity_types().is_empty());
    }

    #[test]
    fn chained_type_renames_rewrite_references_to_final_name() {
        let migrated = apply_migrations(
            &blog(),
            &[entry(
                2,
                vec![
                    SchemaMigrationAction::RenameType {
                        target: entity("Person"),
                        new_name: "Author".into(),
                    },
                    SchemaMigrationAction::RenameType {
                        target: entity("Author"),
                        new_name: "Writer".into(),
                    },
                ],
            )],
        )
        .unwrap();
        assert!(migrated.entity_type("Writer").is_some());
        assert_eq!(
            migrated.entity_type("Post").unwrap().fields[2].kind.entity_types(),
            ["Writer"]
        );
    }

    #[test]
    fn missing_targets_are_reported_per_kind() {
        assert_eq!(
            message(apply_migrations(
                &blog(),
                &[entry(
                    2,
                    vec![SchemaMigrationAction::DeleteType {
                        target: entity("Missing"),
                    }],
                )],
            )),
            "deleteType: Entity type Missing doesn't exist"
        );
        assert_eq!(
            message(apply_migrations(
                &blog(),
                &[entry(
                    2,
                    vec![SchemaMigrationAction::RenameType {
                        target: TypeReference::ComponentType("Post".into()),
                        new_name: "Article".into(),
                    }],
                )],
            )),
            "renameType: Component type Post doesn't exist"
        );
        assert_eq!(
            message(apply_migrations(
                &blog(),
                &[entry(
                    2,
                    vec![SchemaMigrationAction::RenameField {
                        target: entity("Post"),
                        field: "body".into(),
                        new_name: "content".into(),
                    }],
                )],
            )),
            "renameField: Field Post.body doesn't exist"
        );
    }

    #[test]
    fn version_must_be_next() {
        let delete = SchemaMigrationAction::DeleteField {
            target: entity("Post"),
            field: "summary".into(),
        };
        assert_eq!(
            message(apply_migrations(&blog(), &[entry(1, vec![delete.clone()])])),
            "Version specified for migration (1) must be the same as the schema new version 2"
        );
        assert_eq!(
            message(apply_migrations(&blog(), &[entry(5, vec![delete])])),
            "Version specified for migration (5) must be the same as the schema new version 2"
        );
    }

    #[test]
    fn existing_entries_are_idempotent_or_rejected() {
        let delete = SchemaMigrationAction::DeleteField {
            target: entity("Post"),
            field: "summary".into(),
        };
        let mut previous = blog();
        previous.migrations = vec![entry(1, vec![delete.clone()])];

        let same = apply_migrations(&previous, &[entry(1, vec![delete])]).unwrap();
        assert_eq!(same, previous);

        let other = SchemaMigrationAction::DeleteField {
            target: entity("Post"),
            field: "title".into(),
        };
        assert_eq!(
            message(apply_migrations(&previous, &[entry(1, vec![other])])),
            "Migration for version 1 is already defined with different actions"
        );
    }

    #[test]
    fn empty_entries_are_dropped() {
        let migrated = apply_migrations(&blog(), &[entry(2, vec![])]).unwrap();
        assert!(migrated.migrations.is_empty());
    }

    #[test]
    fn transient_migrations_require_version() {
        let update = SchemaUpdateBuilder::new()
            .transient_migration(SchemaTransientMigrationAction::DeleteIndex {
                index: "slugs".into(),
            })
            .build();
        assert_eq!(
            check_update(&blog(), &update).unwrap_err().message(),
            "Version must be specified when using transient migrations"
        );
    }

    #[test]
    fn transient_migrations_follow_renames() {
        let update = SchemaUpdateBuilder::new()
            .version(2)
            .transient_migration(SchemaTransientMigrationAction::RenameIndex {
                index: "slugs".into(),
                new_name: "paths".into(),
            })
            .transient_migration(SchemaTransientMigrationAction::DeleteIndex {
                index: "paths".into(),
            })
            .build();
        assert!(check_update(&blog(), &update).is_ok());

        let update = SchemaUpdateBuilder::new()
            .version(2)
            .transient_migration(SchemaTransientMigrationAction::RenameIndex {
                index: "slugs".into(),
                new_name: "paths".into(),
            })
            .transient_migration(SchemaTransientMigrationAction::DeleteIndex {
                index: "slugs".into(),
            })
            .build();
        assert_eq!(
            check_update(&blog(), &update).unwrap_err().message(),
            "deleteIndex: Index slugs doesn't exist"
        );
    }

    #[test]
    fn update_version_must_be_next() {
        let update = SchemaUpdateBuilder::new().version(3).build();
        assert_eq!(
            check_update(&blog(), &update).unwrap_err().message(),
            "The version of the update (3) must be the same as the schema new version 2"
        );
    }

    #[test]
    fn last_version_cannot_be_incremented() {
        let previous = SchemaSpecification {
            version: u32::MAX,
            ..blog()
        };
        let expected = format!("The schema version ({}) can't be incremented", u32::MAX);
        assert_eq!(
            check_update(&previous, &SchemaSpecificationUpdate::default())
                .unwrap_err()
                .message(),
            expected
        );
        assert_eq!(
            apply_migrations(&previous, &[]).unwrap_err().message(),
            expected
        );
    }
}
