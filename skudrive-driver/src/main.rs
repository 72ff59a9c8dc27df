//! Synthetic product data driver.
//!
//! Generates lookup traffic against a product endpoint (`skudrive load`) and resets and seeds the
//! products table of a remote key-value store (`skudrive seed`).
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

fn main() -> anyhow::Result<()> {
    skudrive_driver::cli::execute()
}
