//! Resets a products table and fills it with synthetic records.
//!
//! A run has three phases, each started only after the previous remote call returned:
//!
//! 1. *Delete*: the table is deleted. A missing table is fine.
//! 2. *Create*: the table is created again with `SKU` as its string hash key.
//! 3. *Populate*: products `THING-00000000` upwards are written in batches of at most
//!    [`MAX_BATCH_SIZE`], each with a random price.
//!
//! Outcomes of all calls are logged. Delete and create failures never stop the run. Batch write
//! failures stop it only under [`ErrorPolicy::Abort`].

use std::error::Error as _;

use skudrive_store::{BoxedStore, MAX_BATCH_SIZE, StoreError, TableSchema};
use skudrive_types::sku::SKU_SPACE;
use skudrive_types::{Product, Sku};

use crate::config::ErrorPolicy;
use crate::error::{DriverError, Result};
use crate::generator::Generator;

/// A builder for creating a [`SeedDriver`].
#[derive(Debug)]
pub struct SeedDriverBuilder {
    store: BoxedStore,
    schema: TableSchema,
    policy: ErrorPolicy,
    seed: Option<u64>,
}

impl SeedDriverBuilder {
    /// What to do after a failed batch write. Defaults to [`ErrorPolicy::Continue`].
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seed for the price generator. A random seed is used if `None`.
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Creates the driver.
    pub fn build(self) -> SeedDriver {
        SeedDriver {
            store: self.store,
            schema: self.schema,
            policy: self.policy,
            seed: self.seed,
        }
    }
}

/// Outcome of a [`SeedDriver::reset_and_seed`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Number of batch writes sent.
    pub batches: u64,
    /// Number of products the store accepted.
    pub written: u64,
    /// Number of products the store handed back as unprocessed.
    pub unprocessed: u64,
    /// Number of batch writes that failed.
    pub failed_batches: u64,
}

/// Recreates a products table and seeds it with synthetic records.
#[derive(Debug)]
pub struct SeedDriver {
    store: BoxedStore,
    schema: TableSchema,
    policy: ErrorPolicy,
    seed: Option<u64>,
}

impl SeedDriver {
    /// Constructs a new driver builder that recreates the table described by `schema` in `store`.
    pub fn builder(store: BoxedStore, schema: TableSchema) -> SeedDriverBuilder {
        SeedDriverBuilder {
            store,
            schema,
            policy: ErrorPolicy::default(),
            seed: None,
        }
    }

    /// Deletes and recreates the table, then writes `total_items` products in batches.
    ///
    /// `batch_size` is clamped to [`MAX_BATCH_SIZE`]. Fails before any remote call if
    /// `batch_size` is zero or `total_items` exceeds the identifier space.
    pub async fn reset_and_seed(&self, total_items: u64, batch_size: usize) -> Result<SeedSummary> {
        if batch_size == 0 {
            return Err(DriverError::InvalidConfig(
                "batch size must be at least 1".to_owned(),
            ));
        }
        if total_items > SKU_SPACE {
            return Err(DriverError::InvalidConfig(format!(
                "cannot seed {total_items} items, at most {SKU_SPACE} identifiers exist"
            )));
        }
        let batch_size = if batch_size > MAX_BATCH_SIZE {
            tracing::warn!(
                batch_size,
                max = MAX_BATCH_SIZE,
                "Batch size exceeds store limit, clamping"
            );
            MAX_BATCH_SIZE
        } else {
            batch_size
        };

        tracing::info!(
            store = self.store.name(),
            table = %self.schema.table,
            total_items,
            batch_size,
            "Starting seed run"
        );

        self.delete_table().await;
        self.create_table().await;
        self.populate(total_items, batch_size).await
    }

    async fn delete_table(&self) {
        let table = self.schema.table.as_str();
        tracing::info!(table, "Deleting existing table");
        match self.store.delete_table(table).await {
            Ok(info) => tracing::info!(table, status = ?info.status, "Deleted table"),
            Err(StoreError::TableNotFound { .. }) => {
                tracing::info!(table, "Table did not exist")
            }
            Err(err) => tracing::error!(
                table,
                error = &err as &dyn std::error::Error,
                "Failed to delete table"
            ),
        }
    }

    async fn create_table(&self) {
        let table = self.schema.table.as_str();
        tracing::info!(table, hash_key = %self.schema.hash_key, "Creating new table");
        match self.store.create_table(&self.schema).await {
            Ok(info) => tracing::info!(table, status = ?info.status, "Created table"),
            Err(err) => tracing::error!(
                table,
                error = &err as &dyn std::error::Error,
                "Failed to create table"
            ),
        }
    }

    async fn populate(&self, total_items: u64, batch_size: usize) -> Result<SeedSummary> {
        let table = self.schema.table.as_str();
        let mut generator = Generator::new(self.seed);
        let mut summary = SeedSummary::default();
        let mut remaining = total_items;

        while remaining > 0 {
            let in_batch = remaining.min(batch_size as u64);
            let mut products = Vec::with_capacity(in_batch as usize);
            for _ in 0..in_batch {
                let sku = Sku::new(total_items - remaining)?;
                products.push(Product::regular(sku, generator.random_price()));
                remaining -= 1;
            }

            summary.batches += 1;
            tracing::info!(
                batch = summary.batches,
                items = products.len(),
                remaining,
                "Writing batch"
            );

            match self.store.batch_write(table, &products).await {
                Ok(response) => {
                    summary.written += response.written as u64;
                    summary.unprocessed += response.unprocessed as u64;
                    if response.unprocessed > 0 {
                        tracing::warn!(
                            batch = summary.batches,
                            written = response.written,
                            unprocessed = response.unprocessed,
                            "Batch partially written"
                        );
                    } else {
                        tracing::info!(
                            batch = summary.batches,
                            written = response.written,
                            "Batch written"
                        );
                    }
                }
                Err(err) => {
                    summary.failed_batches += 1;
                    tracing::error!(
                        batch = summary.batches,
                        error = &err as &dyn std::error::Error,
                        cause = err.source().map(tracing::field::display),
                        "Failed to write batch"
                    );
                    if self.policy == ErrorPolicy::Abort {
                        return Err(err.into());
                    }
                }
            }
        }

        tracing::info!(
            batches = summary.batches,
            written = summary.written,
            unprocessed = summary.unprocessed,
            failed_batches = summary.failed_batches,
            seed = generator.seed(),
            "Seed run finished"
        );
        Ok(summary)
    }
}
