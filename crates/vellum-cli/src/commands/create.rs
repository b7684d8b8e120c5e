use vellum_schema::{
    AdminSchema, DocumentSchemaRegistry, SchemaSpecification, SchemaSpecificationUpdate,
};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CreateArgs;
use crate::commands::shared::document::read_document;
use crate::output::output;

/// Handle `vlm create`.
pub fn handle(
    args: &CreateArgs,
    registry: &DocumentSchemaRegistry,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    output(&run(args, registry)?, flags.format)
}

pub fn run(
    args: &CreateArgs,
    registry: &DocumentSchemaRegistry,
) -> anyhow::Result<SchemaSpecification> {
    let update: SchemaSpecificationUpdate =
        read_document(&args.update, "schema_specification_update", registry)?;
    let schema = AdminSchema::create_and_validate(&update)?;
    Ok(schema.spec().clone())
}
