//! Infrastructure layer: catalog persistence and configuration.

pub mod config;
pub mod store;
