//! Test utilities for the synthetic product drivers.
//!
//! See the modules for all available utilities.

pub mod dynamodb;
pub mod server;
pub mod tracing;
