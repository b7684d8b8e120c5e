use serde::Serialize;
use vellum_schema::{AdminSchema, DocumentSchemaRegistry, SchemaSpecification};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ValidateArgs;
use crate::commands::shared::document::read_document;
use crate::output::output;

#[derive(Debug, Serialize)]
pub struct ValidateReport {
    pub valid: bool,
    pub version: u32,
}

/// Handle `vlm validate`.
pub fn handle(
    args: &ValidateArgs,
    registry: &DocumentSchemaRegistry,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    output(&run(args, registry)?, flags.format)
}

pub fn run(
    args: &ValidateArgs,
    registry: &DocumentSchemaRegistry,
) -> anyhow::Result<ValidateReport> {
    let spec: SchemaSpecification = read_document(&args.schema, "schema_specification", registry)?;
    let schema = AdminSchema::new(spec)?;
    Ok(ValidateReport {
        valid: true,
        version: schema.version(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::shared::fixtures::{registry, write_json};

    #[test]
    fn reports_version_of_valid_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_json(
            &dir,
            "schema.json",
            &serde_json::json!({
                "version": 4,
                "entityTypes": [{ "name": "Post", "fields": [{ "name": "title", "type": "String" }] }]
            }),
        );

        let report = run(&ValidateArgs { schema: path }, &registry()).expect("valid schema");
        assert!(report.valid);
        assert_eq!(report.version, 4);
    }

    #[test]
    fn structural_errors_surface_the_engine_message() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_json(
            &dir,
            "schema.json",
            &serde_json::json!({
                "version": 1,
                "entityTypes": [{ "name": "Post", "fields": [{ "name": "code", "type": "String", "matchPattern": "missing" }] }]
            }),
        );

        let err = run(&ValidateArgs { schema: path }, &registry()).expect_err("should fail");
        assert_eq!(err.to_string(), "Post.code: Unknown matchPattern (missing)");
    }
}
