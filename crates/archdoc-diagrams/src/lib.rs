//! Architecture diagram rendering for archdoc.
//!
//! Turns a description plus a list of cloud service names into an image:
//! - [`catalog`]: known components, their aliases and categories
//! - [`compile_dot`]: Graphviz DOT generation (left-to-right, one cluster per
//!   category, edges between consecutive services)
//! - [`KrokiRenderer`]: layout and rasterization via a Kroki server
//!
//! # Example
//!
//! ```ignore
//! use archdoc_diagrams::{DiagramRenderer, DiagramSpec, KrokiRenderer};
//!
//! let renderer = KrokiRenderer::new("https://kroki.io");
//! let spec = DiagramSpec::new("Web tier", vec!["ELB".into(), "EC2".into(), "RDS".into()]);
//! let png = renderer.render(&spec)?;
//! ```

pub mod catalog;
mod consts;
mod diagram;
mod dot;
mod error;
mod format;
mod kroki;

pub use consts::DEFAULT_TIMEOUT;
pub use diagram::{DiagramRenderer, DiagramSpec};
pub use dot::compile_dot;
pub use error::RenderError;
pub use format::DiagramFormat;
pub use kroki::{KrokiRenderer, create_agent};
