//! Structural validation of an assembled specification.
//!
//! Validation is fail-fast: the first violated rule is reported and nothing
//! else is checked. Rules run in a fixed order so the same input always
//! yields the same message:
//!
//! 1. type names (shape, uniqueness)
//! 2. per type: type-level rules, then every field of that type
//! 3. pattern table
//! 4. index table

use std::collections::HashSet;

use regex::Regex;

use crate::error::{SchemaError, bad_request};
use crate::naming::{
    field_name_rule, index_name_rule, is_valid_camel_name, is_valid_type_name, pattern_name_rule,
    type_name_rule,
};
use crate::spec::{
    EntityTypeSpecification, FieldKind, FieldSpecification, FieldType, SchemaSpecification,
    TypeKind, TypeSpecification, rich_text_node,
};

/// Field name reserved for the component discriminator.
pub const COMPONENT_TYPE_FIELD: &str = "type";

/// Check `spec` against every structural invariant.
pub fn validate_specification(spec: &SchemaSpecification) -> Result<(), SchemaError> {
    validate_type_names(spec)?;

    for entity_type in &spec.entity_types {
        validate_entity_type(spec, entity_type)?;
        validate_fields(spec, entity_type)?;
    }
    for component_type in &spec.component_types {
        validate_fields(spec, component_type)?;
    }

    validate_patterns(spec)?;
    validate_indexes(spec)
}

fn validate_type_names(spec: &SchemaSpecification) -> Result<(), SchemaError> {
    let names = spec
        .entity_types
        .iter()
        .map(|it| it.name.as_str())
        .chain(spec.component_types.iter().map(|it| it.name.as_str()));

    let mut seen = HashSet::new();
    for name in names {
        if !is_valid_type_name(name) {
            return Err(SchemaError::BadRequest(type_name_rule(name)));
        }
        if !seen.insert(name) {
            return bad_request!("{name}: Duplicate type name");
        }
    }
    Ok(())
}

fn validate_entity_type(
    spec: &SchemaSpecification,
    entity_type: &EntityTypeSpecification,
) -> Result<(), SchemaError> {
    let type_name = &entity_type.name;

    if let Some(pattern) = &entity_type.auth_key_pattern
        && spec.pattern(pattern).is_none()
    {
        return bad_request!("{type_name}: Unknown authKeyPattern ({pattern})");
    }

    if let Some(name_field) = &entity_type.name_field {
        let Some(field) = entity_type.field(name_field) else {
            return bad_request!("{type_name}: Found no field matching nameField ({name_field})");
        };
        if field.field_type() != FieldType::String {
            return bad_request!(
                "{type_name}: nameField ({name_field}) should be a string (found {})",
                field.field_type()
            );
        }
        if field.list {
            return bad_request!("{type_name}: nameField ({name_field}) can't be a list field");
        }
    }

    Ok(())
}

fn validate_fields(
    spec: &SchemaSpecification,
    type_spec: &dyn TypeSpecification,
) -> Result<(), SchemaError> {
    let type_name = type_spec.name();
    let mut seen = HashSet::new();

    for field in type_spec.fields() {
        let field_name = field.name.as_str();

        if !is_valid_camel_name(field_name) {
            return Err(SchemaError::BadRequest(field_name_rule(type_name, field_name)));
        }
        if type_spec.kind() == TypeKind::Component && field_name == COMPONENT_TYPE_FIELD {
            return bad_request!(
                "{type_name}.{field_name}: Invalid field name for a component type"
            );
        }
        if !seen.insert(field_name) {
            return bad_request!("{type_name}.{field_name}: Duplicate field name");
        }

        validate_references(spec, type_spec, field)?;

        match &field.kind {
            FieldKind::RichText {
                entity_types,
                link_entity_types,
                component_types,
                rich_text_nodes,
            } => validate_rich_text_nodes(
                type_name,
                field_name,
                rich_text_nodes,
                [
                    ("entityTypes", entity_types, rich_text_node::ENTITY),
                    ("linkEntityTypes", link_entity_types, rich_text_node::ENTITY_LINK),
                    ("componentTypes", component_types, rich_text_node::COMPONENT),
                ],
            )?,
            FieldKind::String {
                match_pattern,
                values,
                index,
                ..
            } => validate_string_field(
                spec,
                type_name,
                field_name,
                match_pattern.as_deref(),
                values,
                index.as_deref(),
            )?,
            FieldKind::Boolean
            | FieldKind::Component { .. }
            | FieldKind::Location
            | FieldKind::Number { .. }
            | FieldKind::Reference { .. } => {}
        }
    }

    Ok(())
}

/// Reference lists of a field, paired with their attribute name and kind.
fn reference_lists(field: &FieldSpecification) -> [(&'static str, &[String], TypeKind); 3] {
    [
        ("entityTypes", field.kind.entity_types(), TypeKind::Entity),
        (
            "linkEntityTypes",
            field.kind.link_entity_types(),
            TypeKind::Entity,
        ),
        (
            "componentTypes",
            field.kind.component_types(),
            TypeKind::Component,
        ),
    ]
}

fn validate_references(
    spec: &SchemaSpecification,
    type_spec: &dyn TypeSpecification,
    field: &FieldSpecification,
) -> Result<(), SchemaError> {
    let type_name = type_spec.name();
    let field_name = &field.name;

    for (attribute, names, kind) in reference_lists(field) {
        for name in names {
            if spec.type_spec(kind, name).is_none() {
                return bad_request!(
                    "{type_name}.{field_name}: Referenced {} in {attribute} {name} doesn't exist",
                    kind.label()
                );
            }
        }
    }

    // Non-publishable content must never be reachable from publishable content.
    if !type_spec.publishable() || field.admin_only {
        return Ok(());
    }
    for (attribute, names, kind) in reference_lists(field) {
        for name in names {
            let publishable = spec
                .type_spec(kind, name)
                .is_some_and(|it| it.publishable());
            if !publishable {
                return bad_request!(
                    "{type_name}.{field_name}: Referenced {} in {attribute} {name} is not publishable, but {type_name}.{field_name} is",
                    kind.label()
                );
            }
        }
    }

    Ok(())
}

fn validate_rich_text_nodes(
    type_name: &str,
    field_name: &str,
    nodes: &[String],
    node_requirements: [(&str, &Vec<String>, &str); 3],
) -> Result<(), SchemaError> {
    // An empty node list allows every node kind.
    if nodes.is_empty() {
        return Ok(());
    }
    let has = |node: &str| nodes.iter().any(|it| it == node);

    let missing: Vec<&str> = rich_text_node::REQUIRED
        .into_iter()
        .filter(|node| !has(node))
        .collect();
    if !missing.is_empty() {
        return bad_request!(
            "{type_name}.{field_name}: richTextNodes must include {} (missing: {})",
            rich_text_node::REQUIRED.join(", "),
            missing.join(", ")
        );
    }

    for (first, second) in rich_text_node::PAIRS {
        for (present, absent) in [(first, second), (second, first)] {
            if has(present) && !has(absent) {
                return bad_request!(
                    "{type_name}.{field_name}: richTextNodes includes {present} but must also include {absent}"
                );
            }
        }
    }

    for (attribute, names, node) in node_requirements {
        if !names.is_empty() && !has(node) {
            return bad_request!(
                "{type_name}.{field_name}: {attribute} is specified for field, but richTextNodes is missing {node}"
            );
        }
    }

    Ok(())
}

fn validate_string_field(
    spec: &SchemaSpecification,
    type_name: &str,
    field_name: &str,
    match_pattern: Option<&str>,
    values: &[String],
    index: Option<&str>,
) -> Result<(), SchemaError> {
    if match_pattern.is_some() && !values.is_empty() {
        return bad_request!("{type_name}.{field_name}: Can't specify both matchPattern and values");
    }
    if let Some(pattern) = match_pattern
        && spec.pattern(pattern).is_none()
    {
        return bad_request!("{type_name}.{field_name}: Unknown matchPattern ({pattern})");
    }
    if let Some(index) = index
        && spec.index(index).is_none()
    {
        return bad_request!("{type_name}.{field_name}: Unknown index ({index})");
    }
    Ok(())
}

fn validate_patterns(spec: &SchemaSpecification) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for pattern in &spec.patterns {
        let name = pattern.name.as_str();
        if !seen.insert(name) {
            return bad_request!("{name}: Duplicate pattern name");
        }
        if !is_valid_camel_name(name) {
            return Err(SchemaError::BadRequest(pattern_name_rule(name)));
        }
        if Regex::new(&pattern.pattern).is_err() {
            return bad_request!("{name}: Can't parse pattern ({})", pattern.pattern);
        }
    }
    Ok(())
}

fn validate_indexes(spec: &SchemaSpecification) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for index in &spec.indexes {
        let name = index.name.as_str();
        if !seen.insert(name) {
            return bad_request!("{name}: Duplicate index name");
        }
        if !is_valid_camel_name(name) {
            return Err(SchemaError::BadRequest(index_name_rule(name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{
        ComponentTypeSpecification, FieldType, IndexSpecification, PatternSpecification,
    };
    use pretty_assertions::assert_eq;

    fn entity(
        name: &str,
        publishable: bool,
        fields: Vec<FieldSpecification>,
    ) -> EntityTypeSpecification {
        EntityTypeSpecification {
            publishable,
            fields,
            ..EntityTypeSpecification::new(name)
        }
    }

    fn component(
        name: &str,
        publishable: bool,
        fields: Vec<FieldSpecification>,
    ) -> ComponentTypeSpecification {
        ComponentTypeSpecification {
            publishable,
            fields,
            ..ComponentTypeSpecification::new(name)
        }
    }

    fn field(name: &str, field_type: FieldType) -> FieldSpecification {
        FieldSpecification::new(name, FieldKind::default_for(field_type))
    }

    fn rich_text(name: &str, entity_types: &[&str], nodes: &[&str]) -> FieldSpecification {
        FieldSpecification::new(
            name,
            FieldKind::RichText {
                entity_types: entity_types.iter().map(ToString::to_string).collect(),
                link_entity_types: vec![],
                component_types: vec![],
                rich_text_nodes: nodes.iter().map(ToString::to_string).collect(),
            },
        )
    }

    fn string_field(
        name: &str,
        pattern: Option<&str>,
        values: &[&str],
        index: Option<&str>,
    ) -> FieldSpecification {
        FieldSpecification::new(
            name,
            FieldKind::String {
                multiline: false,
                match_pattern: pattern.map(ToString::to_string),
                values: values.iter().map(ToString::to_string).collect(),
                index: index.map(ToString::to_string),
            },
        )
    }

    fn spec_with(entity_types: Vec<EntityTypeSpecification>) -> SchemaSpecification {
        SchemaSpecification {
            version: 1,
            entity_types,
            ..SchemaSpecification::default()
        }
    }

    fn message(spec: &SchemaSpecification) -> String {
        validate_specification(spec)
            .expect_err("validation should fail")
            .message()
            .to_string()
    }

    const ALL_REQUIRED: [&str; 5] = ["root", "paragraph", "text", "linebreak", "tab"];

    #[test]
    fn empty_spec_is_valid() {
        assert!(validate_specification(&SchemaSpecification::default()).is_ok());
    }

    #[test]
    fn lower_case_type_name_is_rejected() {
        let spec = spec_with(vec![entity("foo", false, vec![])]);
        assert_eq!(
            message(&spec),
            "foo: The type name has to start with an upper-case letter (A-Z) and can only contain letters (a-z, A-Z), numbers and underscore (_), such as MyType_123"
        );
    }

    #[test]
    fn type_names_are_unique_across_kinds() {
        let mut spec = spec_with(vec![entity("Foo", false, vec![])]);
        spec.component_types.push(component("Foo", false, vec![]));
        assert_eq!(message(&spec), "Foo: Duplicate type name");
    }

    #[test]
    fn type_names_are_checked_before_fields() {
        let spec = spec_with(vec![
            entity("Foo", false, vec![field("Bad", FieldType::Boolean)]),
            entity("bar", false, vec![]),
        ]);
        assert!(message(&spec).starts_with("bar: The type name"));
    }

    #[test]
    fn unknown_auth_key_pattern() {
        let mut foo = entity("Foo", false, vec![]);
        foo.auth_key_pattern = Some("missing".into());
        assert_eq!(
            message(&spec_with(vec![foo])),
            "Foo: Unknown authKeyPattern (missing)"
        );
    }

    #[test]
    fn name_field_must_be_a_single_string_field() {
        let mut foo = entity("Foo", false, vec![field("count", FieldType::Number)]);
        foo.name_field = Some("title".into());
        assert_eq!(
            message(&spec_with(vec![foo.clone()])),
            "Foo: Found no field matching nameField (title)"
        );

        foo.name_field = Some("count".into());
        assert_eq!(
            message(&spec_with(vec![foo.clone()])),
            "Foo: nameField (count) should be a string (found Number)"
        );

        let mut tags = field("tags", FieldType::String);
        tags.list = true;
        foo.fields.push(tags);
        foo.name_field = Some("tags".into());
        assert_eq!(
            message(&spec_with(vec![foo])),
            "Foo: nameField (tags) can't be a list field"
        );
    }

    #[test]
    fn field_name_shape_and_uniqueness() {
        let spec = spec_with(vec![entity("Foo", false, vec![field("Title", FieldType::String)])]);
        assert!(message(&spec).starts_with(
            "Foo.Title: The field name has to start with a lower-case letter (a-z)"
        ));

        let spec = spec_with(vec![entity(
            "Foo",
            false,
            vec![field("title", FieldType::String), field("title", FieldType::Boolean)],
        )]);
        assert_eq!(message(&spec), "Foo.title: Duplicate field name");
    }

    #[test]
    fn component_type_cannot_have_type_field() {
        let spec = SchemaSpecification {
            component_types: vec![component(
                "Quote",
                false,
                vec![field("type", FieldType::String)],
            )],
            ..SchemaSpecification::default()
        };
        assert_eq!(message(&spec), "Quote.type: Invalid field name for a component type");
    }

    #[test]
    fn entity_type_may_have_type_field() {
        let spec = spec_with(vec![entity("Foo", false, vec![field("type", FieldType::String)])]);
        assert!(validate_specification(&spec).is_ok());
    }

    #[test]
    fn referenced_types_must_exist_with_the_right_kind() {
        let mut reference = field("target", FieldType::Reference);
        reference.kind = FieldKind::Reference {
            entity_types: vec!["Quote".into()],
        };
        let mut spec = spec_with(vec![entity("Foo", false, vec![reference])]);
        spec.component_types.push(component("Quote", false, vec![]));
        assert_eq!(
            message(&spec),
            "Foo.target: Referenced entity type in entityTypes Quote doesn't exist"
        );

        let mut embed = field("quote", FieldType::Component);
        embed.kind = FieldKind::Component {
            component_types: vec!["Missing".into()],
        };
        let spec = spec_with(vec![entity("Foo", false, vec![embed])]);
        assert_eq!(
            message(&spec),
            "Foo.quote: Referenced component type in componentTypes Missing doesn't exist"
        );
    }

    #[test]
    fn publishable_field_cannot_reach_non_publishable_type() {
        let mut reference = field("secret", FieldType::Reference);
        reference.kind = FieldKind::Reference {
            entity_types: vec!["Hidden".into()],
        };
        let spec = spec_with(vec![
            entity("Foo", true, vec![reference.clone()]),
            entity("Hidden", false, vec![]),
        ]);
        assert_eq!(
            message(&spec),
            "Foo.secret: Referenced entity type in entityTypes Hidden is not publishable, but Foo.secret is"
        );

        reference.admin_only = true;
        let spec = spec_with(vec![
            entity("Foo", true, vec![reference.clone()]),
            entity("Hidden", false, vec![]),
        ]);
        assert!(validate_specification(&spec).is_ok());

        reference.admin_only = false;
        let spec = spec_with(vec![
            entity("Foo", false, vec![reference]),
            entity("Hidden", false, vec![]),
        ]);
        assert!(validate_specification(&spec).is_ok());
    }

    #[test]
    fn rich_text_entity_types_require_entity_node() {
        let spec = spec_with(vec![
            entity("Foo", false, vec![]),
            entity("Bar", false, vec![rich_text("body", &["Foo"], &ALL_REQUIRED)]),
        ]);
        assert_eq!(
            message(&spec),
            "Bar.body: entityTypes is specified for field, but richTextNodes is missing entity"
        );
    }

    #[test]
    fn rich_text_with_all_nodes_allowed_accepts_entity_types() {
        let spec = spec_with(vec![
            entity("Foo", false, vec![]),
            entity("Bar", false, vec![rich_text("body", &["Foo"], &[])]),
        ]);
        assert!(validate_specification(&spec).is_ok());
    }

    #[test]
    fn rich_text_requires_baseline_nodes() {
        let spec = spec_with(vec![entity(
            "Foo",
            false,
            vec![rich_text("body", &[], &["root", "paragraph", "text"])],
        )]);
        assert_eq!(
            message(&spec),
            "Foo.body: richTextNodes must include root, paragraph, text, linebreak, tab (missing: linebreak, tab)"
        );
    }

    #[test]
    fn rich_text_paired_nodes() {
        let mut nodes = ALL_REQUIRED.to_vec();
        nodes.push("listitem");
        let spec = spec_with(vec![entity("Foo", false, vec![rich_text("body", &[], &nodes)])]);
        assert_eq!(
            message(&spec),
            "Foo.body: richTextNodes includes listitem but must also include list"
        );

        let mut nodes = ALL_REQUIRED.to_vec();
        nodes.push("code");
        let spec = spec_with(vec![entity("Foo", false, vec![rich_text("body", &[], &nodes)])]);
        assert_eq!(
            message(&spec),
            "Foo.body: richTextNodes includes code but must also include code-highlight"
        );
    }

    #[test]
    fn string_cannot_combine_pattern_and_values() {
        let mut spec = spec_with(vec![entity(
            "Foo",
            false,
            vec![string_field("slug", Some("slug"), &["a"], None)],
        )]);
        spec.patterns.push(PatternSpecification {
            name: "slug".into(),
            pattern: "^[a-z]+$".into(),
        });
        assert_eq!(message(&spec), "Foo.slug: Can't specify both matchPattern and values");
    }

    #[test]
    fn string_pattern_and_index_must_exist() {
        let spec = spec_with(vec![entity(
            "Foo",
            false,
            vec![string_field("slug", Some("slug"), &[], None)],
        )]);
        assert_eq!(message(&spec), "Foo.slug: Unknown matchPattern (slug)");

        let spec = spec_with(vec![entity(
            "Foo",
            false,
            vec![string_field("slug", None, &[], Some("slugs"))],
        )]);
        assert_eq!(message(&spec), "Foo.slug: Unknown index (slugs)");
    }

    #[test]
    fn pattern_table_rules() {
        let mut spec = SchemaSpecification::default();
        spec.patterns = vec![
            PatternSpecification {
                name: "slug".into(),
                pattern: "^a$".into(),
            },
            PatternSpecification {
                name: "slug".into(),
                pattern: "^b$".into(),
            },
        ];
        assert_eq!(message(&spec), "slug: Duplicate pattern name");

        spec.patterns = vec![PatternSpecification {
            name: "Slug".into(),
            pattern: "^a$".into(),
        }];
        assert!(message(&spec).starts_with("Slug: The pattern name has to start"));

        spec.patterns = vec![PatternSpecification {
            name: "broken".into(),
            pattern: "([a-z]".into(),
        }];
        assert_eq!(message(&spec), "broken: Can't parse pattern (([a-z])");
    }

    #[test]
    fn index_table_rules() {
        let mut spec = SchemaSpecification::default();
        spec.indexes = vec![
            IndexSpecification::unique("slugs"),
            IndexSpecification::unique("slugs"),
        ];
        assert_eq!(message(&spec), "slugs: Duplicate index name");

        spec.indexes = vec![IndexSpecification::unique("Slugs")];
        assert!(message(&spec).starts_with("Slugs: The index name has to start"));
    }
}
