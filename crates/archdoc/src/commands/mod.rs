//! CLI command implementations.

pub(crate) mod schema;
pub(crate) mod serve;

pub(crate) use schema::SchemaArgs;
pub(crate) use serve::ServeArgs;

use archdoc_server::ServiceKind;
use clap::ValueEnum;

/// Handler selection shared by `serve` and `schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ServiceArg {
    /// Architecture diagram generation.
    Diagram,
    /// PDF documentation generation.
    Document,
    /// Both handlers.
    All,
}

impl From<ServiceArg> for ServiceKind {
    fn from(arg: ServiceArg) -> Self {
        match arg {
            ServiceArg::Diagram => Self::Diagram,
            ServiceArg::Document => Self::Document,
            ServiceArg::All => Self::All,
        }
    }
}
