//! Shared data model of the synthetic product drivers.
//!
//! Both the load driver and the seed driver speak about the same kind of product: an identifier
//! in the [`Sku`] format, and for seeded records a [`Price`] and a constant type label. This crate
//! holds those types so the identifier format is defined exactly once.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod product;
pub mod sku;

pub use product::{PRODUCT_TYPE, Price, Product};
pub use sku::{Sku, SkuError};
