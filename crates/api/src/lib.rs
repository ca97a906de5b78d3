//! HTTP surface of the stockroom catalog: server wiring, routing, and
//! HTML/JSON response mapping.

pub mod app;
pub mod middleware;
