//! `archdoc schema` command implementation.

use archdoc_server::openapi_schema;
use clap::Args;

use super::ServiceArg;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the schema command.
#[derive(Args)]
pub(crate) struct SchemaArgs {
    /// Handler whose actions are described.
    #[arg(long, value_enum, default_value_t = ServiceArg::All)]
    service: ServiceArg,
}

impl SchemaArgs {
    /// Print the action schema as pretty JSON.
    pub(crate) fn execute(&self) -> Result<(), CliError> {
        let schema = openapi_schema(self.service.into());
        let json = serde_json::to_string_pretty(&schema)
            .map_err(|e| CliError::Validation(format!("Failed to encode schema: {e}")))?;
        Output::new().result(&json)?;
        Ok(())
    }
}
