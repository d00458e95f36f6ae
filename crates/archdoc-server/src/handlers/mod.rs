//! HTTP request handlers.

pub(crate) mod agent;
pub(crate) mod diagrams;
pub(crate) mod documents;
pub(crate) mod health;
