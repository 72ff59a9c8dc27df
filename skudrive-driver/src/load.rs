//! Sends product lookups with random identifiers to a remote endpoint.
//!
//! Each lookup draws a fresh identifier uniformly from the configured keyspace. With the default
//! concurrency of one, a lookup is only sent once the previous one has completed. Every response is
//! logged with its status code and body; network failures are logged and, unless the
//! [`ErrorPolicy`] says otherwise, the driver moves on to the next lookup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::TryStreamExt;
use skudrive_types::sku::SKU_SPACE;

use crate::config::ErrorPolicy;
use crate::error::{DriverError, Result};
use crate::generator::Generator;
use crate::http::HttpLookup;

/// A builder for creating a [`LoadDriver`].
#[derive(Debug)]
pub struct LoadDriverBuilder {
    remote: HttpLookup,
    concurrency: usize,
    policy: ErrorPolicy,
    seed: Option<u64>,
}

impl LoadDriverBuilder {
    /// The maximum number of lookups in flight. Defaults to `1`.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// What to do after a failed lookup. Defaults to [`ErrorPolicy::Continue`].
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seed for the identifier generator. A random seed is used if `None`.
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Creates the driver.
    pub fn build(self) -> Result<LoadDriver> {
        if self.concurrency == 0 {
            return Err(DriverError::InvalidConfig(
                "load concurrency must be at least 1".to_owned(),
            ));
        }

        Ok(LoadDriver {
            remote: self.remote,
            concurrency: self.concurrency,
            policy: self.policy,
            seed: self.seed,
        })
    }
}

/// Outcome of a [`LoadDriver::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Number of lookups sent.
    pub requests: u64,
    /// Number of lookups that failed on the network level.
    pub failures: u64,
}

/// Generates lookup traffic against a product endpoint.
#[derive(Debug)]
pub struct LoadDriver {
    remote: HttpLookup,
    concurrency: usize,
    policy: ErrorPolicy,
    seed: Option<u64>,
}

impl LoadDriver {
    /// Constructs a new driver builder that sends lookups through `remote`.
    pub fn builder(remote: HttpLookup) -> LoadDriverBuilder {
        LoadDriverBuilder {
            remote,
            concurrency: 1,
            policy: ErrorPolicy::default(),
            seed: None,
        }
    }

    /// Sends exactly `total_requests` lookups with identifiers drawn from `[0, keyspace)`.
    ///
    /// Fails before sending anything if `keyspace` is zero or larger than the identifier space.
    /// With [`ErrorPolicy::Abort`], the first failed lookup stops the run and is returned.
    pub async fn run(&self, total_requests: u64, keyspace: u64) -> Result<LoadSummary> {
        if keyspace == 0 || keyspace > SKU_SPACE {
            return Err(DriverError::InvalidConfig(format!(
                "keyspace must be between 1 and {SKU_SPACE}, got {keyspace}"
            )));
        }

        let generator = Mutex::new(Generator::new(self.seed));
        let seed = generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .seed();
        tracing::info!(
            endpoint = %self.remote.endpoint(),
            total_requests,
            keyspace,
            concurrency = self.concurrency,
            seed,
            "Starting load run"
        );

        let requests = AtomicU64::new(0);
        let failures = AtomicU64::new(0);

        let (generator_ref, requests_ref, failures_ref) = (&generator, &requests, &failures);
        let result = futures::stream::iter((0..total_requests).map(Ok::<_, DriverError>))
            .try_for_each_concurrent(self.concurrency, move |_| async move {
                let sku = match generator_ref
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .random_sku(keyspace)
                {
                    Ok(sku) => sku,
                    Err(err) => return Err(DriverError::from(err)),
                };

                requests_ref.fetch_add(1, Ordering::Relaxed);
                match self.remote.lookup(&sku).await {
                    Ok(response) => {
                        tracing::info!(
                            %sku,
                            status = response.status.as_u16(),
                            body = %response.body,
                            "Lookup completed"
                        );
                        Ok(())
                    }
                    Err(err) => {
                        failures_ref.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            %sku,
                            error = &err as &dyn std::error::Error,
                            "Lookup failed"
                        );
                        match self.policy {
                            ErrorPolicy::Continue => Ok(()),
                            ErrorPolicy::Abort => Err(DriverError::Lookup(err)),
                        }
                    }
                }
            })
            .await;

        let summary = LoadSummary {
            requests: requests.into_inner(),
            failures: failures.into_inner(),
        };
        match &result {
            Ok(()) => tracing::info!(
                requests = summary.requests,
                failures = summary.failures,
                "Load run finished"
            ),
            Err(err) => tracing::error!(
                requests = summary.requests,
                failures = summary.failures,
                error = err as &dyn std::error::Error,
                "Load run aborted"
            ),
        }

        result.map(|()| summary)
    }
}
