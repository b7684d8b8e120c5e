use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
///
/// File arguments accept `-` for stdin.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Check a stored schema specification.
    Validate(ValidateArgs),
    /// Create a schema specification from an update.
    Create(CreateArgs),
    /// Apply an update to a schema specification.
    Update(UpdateArgs),
    /// Compute the change impact between two schema versions.
    Impact(ImpactArgs),
    /// Print the published projection of a schema specification.
    Publish(PublishArgs),
    /// Print a document JSON Schema, or list the available ones.
    JsonSchema(JsonSchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ValidateArgs {
    /// Schema specification JSON file.
    pub schema: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct CreateArgs {
    /// Schema specification update JSON file.
    pub update: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct UpdateArgs {
    /// Current schema specification JSON file.
    pub schema: PathBuf,
    /// Schema specification update JSON file.
    pub update: PathBuf,
    /// Also report the change impact of the update.
    #[arg(long)]
    pub impact: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ImpactArgs {
    /// Previous schema specification JSON file.
    pub previous: PathBuf,
    /// Next schema specification JSON file.
    pub next: PathBuf,
    /// JSON array of transient migration actions that produced `next`.
    #[arg(long)]
    pub transient: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct PublishArgs {
    /// Schema specification JSON file.
    pub schema: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct JsonSchemaArgs {
    /// Document name (omit to list them).
    pub name: Option<String>,
}
