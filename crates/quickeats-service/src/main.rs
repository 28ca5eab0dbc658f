//! Main entry point for the QuickEats order service.
//!
//! This binary loads configuration, wires up the configured storage backend,
//! and serves the order API until interrupted.

use anyhow::Context;
use clap::Parser;
use quickeats_config::Config;
use quickeats_core::{IdempotencyLayer, OrderEngine};
use quickeats_service::server::{self, AppState};
use quickeats_storage::{StorageFactory, StorageService};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line arguments for the order service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the order service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Wires up the storage backend, engine, and idempotency layer
/// 5. Serves the API until interrupted
#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config = Config::from_file(&args.config)
		.await
		.with_context(|| format!("failed to load configuration from {:?}", args.config))?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let storage = Arc::new(build_storage(&config)?);
	let engine = Arc::new(OrderEngine::new(Arc::clone(&storage)));
	let idempotency = Arc::new(IdempotencyLayer::new(storage));

	let state = AppState {
		engine,
		idempotency,
	};

	server::start_server(config.api.clone(), state)
		.await
		.context("API server failed")?;

	Ok(())
}

/// Constructs the configured storage backend.
///
/// The backend named by `storage.primary` is instantiated from its
/// implementation table, and that table is validated against the backend's
/// own configuration schema.
fn build_storage(config: &Config) -> anyhow::Result<StorageService> {
	let factories: HashMap<&'static str, StorageFactory> =
		quickeats_storage::get_all_implementations()
			.into_iter()
			.collect();

	let primary = config.storage.primary.as_str();
	let factory = factories
		.get(primary)
		.with_context(|| format!("unknown storage implementation '{}'", primary))?;

	let impl_config = config
		.storage
		.implementations
		.get(primary)
		.cloned()
		.unwrap_or(toml::Value::Table(Default::default()));

	let backend = factory(&impl_config)?;
	backend
		.config_schema()
		.validate(&impl_config)
		.with_context(|| format!("invalid configuration for storage '{}'", primary))?;

	tracing::info!("Using '{}' storage backend", primary);
	Ok(StorageService::new(backend))
}
