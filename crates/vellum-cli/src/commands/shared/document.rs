use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use tracing::debug;
use vellum_schema::DocumentSchemaRegistry;

/// Read a JSON document from `path` (`-` for stdin), check it against the
/// registered document schema `name`, then deserialize it.
pub fn read_document<T>(
    path: &Path,
    name: &str,
    registry: &DocumentSchemaRegistry,
) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let text = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    registry
        .validate(name, &value)
        .with_context(|| format!("{} is not a valid {name} document", path.display()))?;
    debug!(path = %path.display(), document = name, "read document");

    serde_json::from_value(value)
        .with_context(|| format!("failed to decode {} as {name}", path.display()))
}

#[cfg(test)]
mod tests {
    use vellum_schema::SchemaSpecificationUpdate;

    use super::read_document;
    use crate::commands::shared::fixtures::{registry, write_json};

    #[test]
    fn reads_a_valid_update() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_json(
            &dir,
            "update.json",
            &serde_json::json!({ "entityTypes": [{ "name": "Post", "fields": [] }] }),
        );

        let update: SchemaSpecificationUpdate =
            read_document(&path, "schema_specification_update", &registry())
                .expect("document should load");
        assert_eq!(update.entity_types.len(), 1);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_document::<SchemaSpecificationUpdate>(
            std::path::Path::new("/nonexistent/update.json"),
            "schema_specification_update",
            &registry(),
        )
        .expect_err("missing file should fail");
        assert!(err.to_string().contains("/nonexistent/update.json"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").expect("write");

        let err = read_document::<SchemaSpecificationUpdate>(
            &path,
            "schema_specification_update",
            &registry(),
        )
        .expect_err("bad json should fail");
        assert!(err.to_string().contains("is not valid JSON"), "{err}");
    }

    #[test]
    fn document_schema_violations_are_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_json(
            &dir,
            "update.json",
            &serde_json::json!({
                "entityTypes": [{ "name": "Post", "fields": [{ "name": "when", "type": "Date" }] }]
            }),
        );

        let err = read_document::<SchemaSpecificationUpdate>(
            &path,
            "schema_specification_update",
            &registry(),
        )
        .expect_err("unknown field type should fail");
        assert!(
            err.to_string()
                .contains("is not a valid schema_specification_update document"),
            "{err}"
        );
    }
}
