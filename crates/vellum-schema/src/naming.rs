//! Identifier shape rules for types, fields, patterns and indexes.

/// PascalCase type names: `[A-Z][a-zA-Z0-9_]*`.
#[must_use]
pub fn is_valid_type_name(name: &str) -> bool {
    starts_with_and_continues(name, |c| c.is_ascii_uppercase())
}

/// camelCase names for fields, patterns and indexes: `[a-z][a-zA-Z0-9_]*`.
#[must_use]
pub fn is_valid_camel_name(name: &str) -> bool {
    starts_with_and_continues(name, |c| c.is_ascii_lowercase())
}

fn starts_with_and_continues(name: &str, first: impl Fn(char) -> bool) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(first) && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn type_name_rule(name: &str) -> String {
    format!(
        "{name}: The type name has to start with an upper-case letter (A-Z) and can only contain letters (a-z, A-Z), numbers and underscore (_), such as MyType_123"
    )
}

pub(crate) fn field_name_rule(type_name: &str, field_name: &str) -> String {
    format!(
        "{type_name}.{field_name}: The field name has to start with a lower-case letter (a-z) and can only contain letters (a-z, A-Z), numbers and underscore (_), such as myField_123"
    )
}

pub(crate) fn pattern_name_rule(name: &str) -> String {
    format!(
        "{name}: The pattern name has to start with a lower-case letter (a-z) and can only contain letters (a-z, A-Z), numbers and underscore (_), such as myPattern_123"
    )
}

pub(crate) fn index_name_rule(name: &str) -> String {
    format!(
        "{name}: The index name has to start with a lower-case letter (a-z) and can only contain letters (a-z, A-Z), numbers and underscore (_), such as myIndex_123"
    )
}
