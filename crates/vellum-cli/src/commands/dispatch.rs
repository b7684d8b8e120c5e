use anyhow::Context;
use vellum_schema::DocumentSchemaRegistry;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;

/// Dispatch a parsed command to the corresponding handler module.
pub fn dispatch(command: &Commands, flags: &GlobalFlags) -> anyhow::Result<()> {
    let registry =
        DocumentSchemaRegistry::new().context("failed to build document JSON Schemas")?;

    match command {
        Commands::Validate(args) => commands::validate::handle(args, &registry, flags),
        Commands::Create(args) => commands::create::handle(args, &registry, flags),
        Commands::Update(args) => commands::update::handle(args, &registry, flags),
        Commands::Impact(args) => commands::impact::handle(args, &registry, flags),
        Commands::Publish(args) => commands::publish::handle(args, &registry, flags),
        Commands::JsonSchema(args) => commands::json_schema::handle(args, &registry, flags),
    }
}
