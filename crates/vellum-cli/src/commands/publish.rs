use vellum_schema::{
    AdminSchema, DocumentSchemaRegistry, PublishedSchemaSpecification, SchemaSpecification,
};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::PublishArgs;
use crate::commands::shared::document::read_document;
use crate::output::output;

/// Handle `vlm publish`.
pub fn handle(
    args: &PublishArgs,
    registry: &DocumentSchemaRegistry,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    output(&run(args, registry)?, flags.format)
}

pub fn run(
    args: &PublishArgs,
    registry: &DocumentSchemaRegistry,
) -> anyhow::Result<PublishedSchemaSpecification> {
    let spec: SchemaSpecification = read_document(&args.schema, "schema_specification", registry)?;
    let schema = AdminSchema::new(spec)?;
    Ok(schema.to_published_schema().spec().clone())
}
