//! Error types of the drivers.

use skudrive_store::StoreError;
use skudrive_types::SkuError;
use thiserror::Error;

/// Errors that stop a driver run.
///
/// With [`ErrorPolicy::Continue`](crate::config::ErrorPolicy::Continue), remote failures are only
/// logged, so a run can only fail with [`DriverError::InvalidConfig`] or [`DriverError::Client`]
/// before any remote call is made.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver was configured with values it cannot run with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client for lookups could not be set up.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A product lookup failed on the network level.
    #[error("lookup failed: {0}")]
    Lookup(#[source] reqwest::Error),

    /// A call to the table store failed.
    #[error("store call failed: {0}")]
    Store(#[from] StoreError),

    /// A product number could not be turned into an identifier.
    #[error(transparent)]
    Sku(#[from] SkuError),
}

/// Result type for driver operations.
pub type Result<T, E = DriverError> = std::result::Result<T, E>;
