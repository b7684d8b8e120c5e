use vellum_schema::{
    DocumentSchemaRegistry, SchemaChangeImpact, SchemaSpecification,
    SchemaTransientMigrationAction, calculate_schema_change_impact,
};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ImpactArgs;
use crate::commands::shared::document::read_document;
use crate::output::output;

/// Handle `vlm impact`.
pub fn handle(
    args: &ImpactArgs,
    registry: &DocumentSchemaRegistry,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    output(&run(args, registry)?, flags.format)
}

pub fn run(
    args: &ImpactArgs,
    registry: &DocumentSchemaRegistry,
) -> anyhow::Result<SchemaChangeImpact> {
    let previous: SchemaSpecification =
        read_document(&args.previous, "schema_specification", registry)?;
    let next: SchemaSpecification = read_document(&args.next, "schema_specification", registry)?;
    let transient: Vec<SchemaTransientMigrationAction> = match &args.transient {
        Some(path) => read_document(path, "schema_transient_migration_actions", registry)?,
        None => Vec::new(),
    };

    Ok(calculate_schema_change_impact(&previous, &next, &transient)?)
}
