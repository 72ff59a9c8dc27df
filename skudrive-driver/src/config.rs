//! Configuration for the synthetic product drivers.
//!
//! Configuration can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Command line overrides of the `load` and `seed` subcommands
//! 2. Environment variables (prefixed with `SD__`)
//! 3. YAML configuration file (specified via `-c` or `--config` flag)
//! 4. Defaults
//!
//! The defaults reproduce a run of 10000 lookups against `http://localhost:8181/product` and a
//! seed of 1000 products in batches of 25 into the `Products` table.
//!
//! # Environment Variables
//!
//! Environment variables use `SD__` as a prefix and double underscores (`__`) to denote nested
//! configuration structures. For example:
//!
//! - `SD__LOAD__REQUESTS=500` sets the number of lookups
//! - `SD__STORE__TYPE=dynamodb` selects the DynamoDB store
//! - `SD__STORE__ENDPOINT=http://localhost:8000` points it at DynamoDB Local
//!
//! # YAML Configuration File
//!
//! ```yaml
//! load:
//!   requests: 500
//!
//! store:
//!   type: dynamodb
//!   endpoint: http://localhost:8000
//! ```

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use secrecy::{CloneableSecret, SecretBox, SerializableSecret, zeroize::Zeroize};
use serde::{Deserialize, Serialize};
use skudrive_store::{MAX_BATCH_SIZE, TableSchema};
use tracing::level_filters::LevelFilter;

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "SD__";

/// Newtype around `String` that protects against accidental logging of secrets in our
/// configuration struct. Use with [`secrecy::SecretBox`].
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigSecret(String);

impl ConfigSecret {
    /// Returns the secret as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ConfigSecret {
    fn from(str: &str) -> Self {
        ConfigSecret(str.to_string())
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "[redacted]")
    }
}

impl CloneableSecret for ConfigSecret {}
impl SerializableSecret for ConfigSecret {}
impl Zeroize for ConfigSecret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// What a driver does after a remote call failed.
///
/// Used in: [`Config::on_error`]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the failure and move on to the next unit of work.
    #[default]
    Continue,
    /// Log the failure and stop the run, reporting the error.
    Abort,
}

/// Settings of the `load` subcommand.
///
/// Used in: [`Config::load`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Load {
    /// URL of the lookup endpoint. The identifier is appended as the `sku` query parameter.
    ///
    /// # Default
    ///
    /// `http://localhost:8181/product`
    ///
    /// # Environment Variable
    ///
    /// `SD__LOAD__ENDPOINT`
    pub endpoint: String,

    /// Total number of lookups to send.
    ///
    /// # Default
    ///
    /// `10000`
    pub requests: u64,

    /// Number of distinct identifiers lookups are drawn from, starting at `THING-00000000`.
    ///
    /// Must be between 1 and 100000000 so every identifier fits the 8-digit suffix.
    ///
    /// # Default
    ///
    /// `500000`
    pub keyspace: u64,

    /// Maximum number of lookups in flight.
    ///
    /// With `1`, every lookup is only sent after the previous one completed.
    ///
    /// # Default
    ///
    /// `1`
    pub concurrency: usize,

    /// Timeout of a single lookup, including reading the response body.
    ///
    /// # Default
    ///
    /// `30s`
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Seed for the identifier generator. Seeded from entropy if unset.
    pub seed: Option<u64>,
}

impl Default for Load {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8181/product".to_owned(),
            requests: 10_000,
            keyspace: 500_000,
            concurrency: 1,
            timeout: Duration::from_secs(30),
            seed: None,
        }
    }
}

/// Settings of the `seed` subcommand.
///
/// Used in: [`Config::seed`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Seed {
    /// Number of products to write, numbered from `THING-00000000`.
    ///
    /// # Default
    ///
    /// `1000`
    pub items: u64,

    /// Number of products per batch write.
    ///
    /// Values above the store limit of 25 are clamped.
    ///
    /// # Default
    ///
    /// `25`
    pub batch_size: usize,

    /// Seed for the price generator. Seeded from entropy if unset.
    pub seed: Option<u64>,
}

impl Default for Seed {
    fn default() -> Self {
        Self {
            items: 1_000,
            batch_size: MAX_BATCH_SIZE,
            seed: None,
        }
    }
}

/// Definition of the products table that `seed` recreates.
///
/// Used in: [`Config::table`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Table {
    /// Table name.
    ///
    /// # Default
    ///
    /// `Products`
    pub name: String,

    /// Provisioned read capacity units.
    pub read_capacity: i64,

    /// Provisioned write capacity units.
    pub write_capacity: i64,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            name: "Products".to_owned(),
            read_capacity: 1,
            write_capacity: 1,
        }
    }
}

impl Table {
    /// Returns the schema of the table with `SKU` as hash key.
    pub fn schema(&self) -> TableSchema {
        TableSchema {
            read_capacity: self.read_capacity,
            write_capacity: self.write_capacity,
            ..TableSchema::products(self.name.as_str())
        }
    }
}

/// Store the `seed` subcommand writes to.
///
/// The `type` field in YAML or `__TYPE` in environment variables determines which variant is used.
///
/// Used in: [`Config::store`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Store {
    /// Amazon DynamoDB or a service speaking its API (type `"dynamodb"`).
    ///
    /// Credentials are resolved from the standard AWS configuration chain, such as
    /// `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`.
    ///
    /// # Example
    ///
    /// ```yaml
    /// store:
    ///   type: dynamodb
    ///   endpoint: http://localhost:8000
    ///   region: us-east-1
    /// ```
    DynamoDb {
        /// Custom endpoint URL, e.g. of DynamoDB Local.
        endpoint: Option<String>,
        /// AWS region, overriding the configuration chain.
        region: Option<String>,
    },

    /// Tables kept in process memory (type `"memory"`).
    ///
    /// Nothing is persisted. Useful to check a seeding configuration without a store.
    Memory,
}

impl Default for Store {
    fn default() -> Self {
        Store::DynamoDb {
            endpoint: None,
            region: None,
        }
    }
}

/// Sentry error tracking configuration.
///
/// Used in: [`Config::sentry`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Sentry {
    /// Sentry DSN. Sentry integration is enabled if this is set.
    ///
    /// # Environment Variable
    ///
    /// `SD__SENTRY__DSN`
    pub dsn: Option<SecretBox<ConfigSecret>>,

    /// Environment name attached to all events.
    pub environment: Option<Cow<'static, str>>,

    /// Sample rate for error events, between `0.0` and `1.0`.
    ///
    /// # Default
    ///
    /// `1.0`
    pub sample_rate: f32,
}

impl Sentry {
    /// Returns whether Sentry integration is enabled.
    pub fn is_enabled(&self) -> bool {
        self.dsn.is_some()
    }
}

impl Default for Sentry {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Chooses [`LogFormat::Pretty`] for a TTY, otherwise [`LogFormat::Simplified`].
    Auto,

    /// Pretty printing with colors.
    Pretty,

    /// Simplified plain text output.
    ///
    /// ```text
    /// 2025-01-01T12:10:32Z  INFO skudrive_driver::load: Lookup completed sku=THING-00004711 status=200
    /// ```
    Simplified,

    /// JSON lines.
    Json,
}

/// Logging configuration.
///
/// Logs are always written to stderr.
///
/// Used in: [`Config::logging`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Minimum log level to output.
    ///
    /// The `RUST_LOG` environment variable takes precedence if set.
    ///
    /// # Default
    ///
    /// `INFO`
    ///
    /// # Environment Variable
    ///
    /// `SD__LOGGING__LEVEL`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Log output format.
    ///
    /// # Default
    ///
    /// `auto`
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Main configuration struct of the drivers.
///
/// Each subcommand only reads the sections it needs: `load` reads [`Config::load`], `seed` reads
/// [`Config::seed`], [`Config::table`] and [`Config::store`].
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Settings of the load driver.
    pub load: Load,
    /// Settings of the seed driver.
    pub seed: Seed,
    /// The products table recreated by the seed driver.
    pub table: Table,
    /// The store holding the products table.
    pub store: Store,
    /// What to do after a failed remote call.
    ///
    /// # Default
    ///
    /// `continue`
    ///
    /// # Environment Variable
    ///
    /// `SD__ON_ERROR`
    pub on_error: ErrorPolicy,
    /// Logging configuration.
    pub logging: Logging,
    /// Sentry error tracking configuration.
    pub sentry: Sentry,
}

impl Config {
    /// Loads configuration from defaults, the optional YAML file and the environment.
    ///
    /// Configuration is merged in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. YAML configuration file (if `path` is given)
    /// 3. Environment variables (prefixed with `SD__`)
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML file cannot be read or parsed, or if any value is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();

            assert_eq!(config.load.endpoint, "http://localhost:8181/product");
            assert_eq!(config.load.requests, 10_000);
            assert_eq!(config.load.keyspace, 500_000);
            assert_eq!(config.load.concurrency, 1);
            assert_eq!(config.seed.items, 1_000);
            assert_eq!(config.seed.batch_size, 25);
            assert_eq!(config.table.schema(), TableSchema::products("Products"));
            assert_eq!(config.on_error, ErrorPolicy::Continue);
            assert!(matches!(
                config.store,
                Store::DynamoDb {
                    endpoint: None,
                    region: None
                }
            ));
            assert!(!config.sentry.is_enabled());

            Ok(())
        });
    }

    #[test]
    fn configurable_via_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SD__LOAD__REQUESTS", "42");
            jail.set_env("SD__LOAD__TIMEOUT", "5s");
            jail.set_env("SD__SEED__BATCH_SIZE", "10");
            jail.set_env("SD__STORE__TYPE", "dynamodb");
            jail.set_env("SD__STORE__ENDPOINT", "http://localhost:8000");
            jail.set_env("SD__ON_ERROR", "abort");
            jail.set_env("SD__LOGGING__LEVEL", "debug");
            jail.set_env("SD__SENTRY__DSN", "abcde");

            let config = Config::load(None).unwrap();

            assert_eq!(config.load.requests, 42);
            assert_eq!(config.load.timeout, Duration::from_secs(5));
            assert_eq!(config.seed.batch_size, 10);
            let Store::DynamoDb { endpoint, .. } = &dbg!(&config).store else {
                panic!("expected dynamodb store");
            };
            assert_eq!(endpoint.as_deref(), Some("http://localhost:8000"));
            assert_eq!(config.on_error, ErrorPolicy::Abort);
            assert_eq!(config.logging.level, LevelFilter::DEBUG);
            assert_eq!(
                config.sentry.dsn.unwrap().expose_secret().as_str(),
                "abcde"
            );

            Ok(())
        });
    }

    #[test]
    fn configurable_via_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
            load:
                endpoint: http://example.com/lookup
                keyspace: 100
                concurrency: 4
                seed: 7
            table:
                name: Catalog
                write_capacity: 5
            store:
                type: memory
            logging:
                format: json
            "#,
            )
            .unwrap();

        figment::Jail::expect_with(|_jail| {
            let config = Config::load(Some(tempfile.path())).unwrap();

            assert_eq!(config.load.endpoint, "http://example.com/lookup");
            assert_eq!(config.load.keyspace, 100);
            assert_eq!(config.load.concurrency, 4);
            assert_eq!(config.load.seed, Some(7));
            // untouched fields keep their defaults
            assert_eq!(config.load.requests, 10_000);

            let schema = config.table.schema();
            assert_eq!(schema.table, "Catalog");
            assert_eq!(schema.hash_key, "SKU");
            assert_eq!(schema.read_capacity, 1);
            assert_eq!(schema.write_capacity, 5);

            assert!(matches!(config.store, Store::Memory));
            assert_eq!(config.logging.format, LogFormat::Json);

            Ok(())
        });
    }

    #[test]
    fn env_overrides_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
            seed:
                items: 50
            "#,
            )
            .unwrap();

        figment::Jail::expect_with(|jail| {
            jail.set_env("SD__SEED__ITEMS", "75");

            let config = Config::load(Some(tempfile.path())).unwrap();
            assert_eq!(config.seed.items, 75);

            Ok(())
        });
    }

    #[test]
    fn rejects_unknown_error_policy() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SD__ON_ERROR", "retry");
            assert!(Config::load(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn secret_is_redacted() {
        let secret = ConfigSecret::from("hunter2");
        assert_eq!(format!("{secret:?}"), "[redacted]");
    }
}
