use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;
use skudrive_store::{BoxedStore, DynamoDbStore, DynamoDbStoreConfig, InMemoryStore};

use crate::config::{Config, Store};
use crate::http::HttpLookup;
use crate::load::LoadDriver;
use crate::observability;
use crate::seed::SeedDriver;

/// Synthetic product data driver.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,

    #[argh(subcommand)]
    pub command: Command,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Command {
    Load(LoadCommand),
    Seed(SeedCommand),
    Version(VersionCommand),
}

/// send product lookups with random identifiers to the configured endpoint
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "load")]
struct LoadCommand {
    /// number of lookups to send
    #[argh(option)]
    requests: Option<u64>,

    /// number of distinct identifiers to draw from
    #[argh(option)]
    keyspace: Option<u64>,

    /// maximum number of lookups in flight
    #[argh(option)]
    concurrency: Option<usize>,
}

/// delete, recreate and populate the products table
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "seed")]
struct SeedCommand {
    /// number of products to write
    #[argh(option)]
    items: Option<u64>,

    /// number of products per batch write, at most 25
    #[argh(option)]
    batch_size: Option<usize>,
}

/// print the version
#[derive(Default, Debug, FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCommand {}

impl Command {
    /// Applies command line options on top of the loaded configuration.
    fn apply_overrides(&self, config: &mut Config) {
        match self {
            Command::Load(cmd) => {
                if let Some(requests) = cmd.requests {
                    config.load.requests = requests;
                }
                if let Some(keyspace) = cmd.keyspace {
                    config.load.keyspace = keyspace;
                }
                if let Some(concurrency) = cmd.concurrency {
                    config.load.concurrency = concurrency;
                }
            }
            Command::Seed(cmd) => {
                if let Some(items) = cmd.items {
                    config.seed.items = items;
                }
                if let Some(batch_size) = cmd.batch_size {
                    config.seed.batch_size = batch_size;
                }
            }
            Command::Version(_) => (),
        }
    }
}

/// Bootstrap the runtime and execute the CLI command.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();

    // Special switch to just print the version and exit.
    if let Command::Version(_) = args.command {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = Config::load(args.config.as_deref()).context("failed to load config")?;
    args.command.apply_overrides(&mut config);

    // Sentry should be initialized before creating the async runtime.
    let _sentry_guard = observability::init_sentry(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("main-rt")
        .enable_all()
        .build()?;
    let _runtime_guard = runtime.enter();

    observability::init_tracing(&config);
    tracing::debug!(?config);

    runtime.block_on(async move {
        match args.command {
            Command::Load(_) => run_load(config).await,
            Command::Seed(_) => run_seed(config).await,
            Command::Version(_) => unreachable!(),
        }
    })
}

async fn run_load(config: Config) -> Result<()> {
    let remote = HttpLookup::new(&config.load.endpoint, config.load.timeout)?;
    let driver = LoadDriver::builder(remote)
        .concurrency(config.load.concurrency)
        .error_policy(config.on_error)
        .seed(config.load.seed)
        .build()?;

    driver
        .run(config.load.requests, config.load.keyspace)
        .await
        .context("load run failed")?;
    Ok(())
}

async fn run_seed(config: Config) -> Result<()> {
    let store: BoxedStore = match config.store {
        Store::DynamoDb { endpoint, region } => Box::new(
            DynamoDbStore::from_config(DynamoDbStoreConfig { endpoint, region }).await,
        ),
        Store::Memory => Box::new(InMemoryStore::new()),
    };

    let driver = SeedDriver::builder(store, config.table.schema())
        .error_policy(config.on_error)
        .seed(config.seed.seed)
        .build();

    driver
        .reset_and_seed(config.seed.items, config.seed.batch_size)
        .await
        .context("seed run failed")?;
    Ok(())
}
