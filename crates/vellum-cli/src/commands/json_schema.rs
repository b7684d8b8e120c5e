use anyhow::bail;
use vellum_schema::DocumentSchemaRegistry;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::JsonSchemaArgs;
use crate::output::output;

/// Handle `vlm json-schema`.
pub fn handle(
    args: &JsonSchemaArgs,
    registry: &DocumentSchemaRegistry,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    output(&run(args, registry)?, flags.format)
}

pub fn run(
    args: &JsonSchemaArgs,
    registry: &DocumentSchemaRegistry,
) -> anyhow::Result<serde_json::Value> {
    let Some(name) = &args.name else {
        return Ok(serde_json::json!(registry.list()));
    };
    match registry.get(name) {
        Some(schema) => Ok(schema.clone()),
        None => bail!(
            "unknown document schema '{name}', expected one of: {}",
            registry.list().join(", ")
        ),
    }
}
