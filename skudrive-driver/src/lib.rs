//! The synthetic product data driver.
//!
//! Two independent drivers share this crate: the [`LoadDriver`](load::LoadDriver) sends product
//! lookups with random identifiers to an HTTP endpoint, and the [`SeedDriver`](seed::SeedDriver)
//! resets a products table and fills it with synthetic records in batches. Both log every remote
//! outcome and, by default, keep going after failures.

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod http;
pub mod load;
pub mod observability;
pub mod seed;
