use serde::Serialize;
use vellum_schema::{
    AdminSchema, DocumentSchemaRegistry, SchemaChangeImpact, SchemaSpecification,
    SchemaSpecificationUpdate, calculate_schema_change_impact,
};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::UpdateArgs;
use crate::commands::shared::document::read_document;
use crate::output::output;

#[derive(Debug, Serialize)]
pub struct UpdateReport {
    pub schema: SchemaSpecification,
    /// False when the update changed nothing and the version stayed put.
    pub modified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<SchemaChangeImpact>,
}

/// Handle `vlm update`.
pub fn handle(
    args: &UpdateArgs,
    registry: &DocumentSchemaRegistry,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    output(&run(args, registry)?, flags.format)
}

pub fn run(args: &UpdateArgs, registry: &DocumentSchemaRegistry) -> anyhow::Result<UpdateReport> {
    let spec: SchemaSpecification = read_document(&args.schema, "schema_specification", registry)?;
    let update: SchemaSpecificationUpdate =
        read_document(&args.update, "schema_specification_update", registry)?;

    let previous = AdminSchema::new(spec)?;
    let next = previous.update_and_validate(&update)?;

    let impact = if args.impact {
        Some(calculate_schema_change_impact(
            previous.spec(),
            next.spec(),
            &update.transient_migrations,
        )?)
    } else {
        None
    };

    Ok(UpdateReport {
        modified: next.version() != previous.version(),
        schema: next.spec().clone(),
        impact,
    })
}
