//! Sigil command line tools.
//!
//! - `decode`: split a stored module list into ids, reporting bad tokens
//! - `check`: validate a configuration file
//! - `migrate`: resolve ids through a configuration's migration table

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use sigil_config::Config;
use sigil_primitives::{ModuleId, parse_id_list};
use sigil_registry::{ModuleRegistry, RegistryBuilder};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "SIGIL_LOG";

/// Sigil command line arguments.
#[derive(Parser, Debug)]
#[command(name = "sigil")]
#[command(about = "Inspect sigil module lists and configurations")]
struct Args {
	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Decode a stored module list
	Decode {
		/// Colon-delimited module ids
		list: String,
	},
	/// Validate a configuration file
	Check {
		/// Path to the TOML configuration
		#[arg(value_name = "PATH")]
		config: PathBuf,
	},
	/// Resolve module ids through the configured migrations
	Migrate {
		/// Path to the TOML configuration
		#[arg(value_name = "PATH")]
		config: PathBuf,
		/// Module ids to resolve
		#[arg(required = true)]
		ids: Vec<ModuleId>,
	},
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let filter = EnvFilter::try_from_env(LOG_ENV)
		.unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "warn" }));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();

	match args.command {
		Command::Decode { list } => decode(&list),
		Command::Check { config } => check(&config),
		Command::Migrate { config, ids } => migrate(&config, &ids),
	}
}

fn decode(list: &str) -> anyhow::Result<()> {
	let (ids, errors) = parse_id_list(list);
	for id in &ids {
		println!("{id}");
	}
	for error in &errors {
		eprintln!("error: {error}");
	}
	if !errors.is_empty() {
		bail!("{} of {} tokens rejected", errors.len(), ids.len() + errors.len());
	}
	Ok(())
}

/// Registry of every module provider linked into this binary.
fn linked_registry() -> anyhow::Result<ModuleRegistry> {
	let mut builder = RegistryBuilder::new();
	builder
		.install_linked()
		.context("registering linked module providers")?;
	Ok(builder.seal())
}

fn check(path: &Path) -> anyhow::Result<()> {
	let config = Config::load(path).with_context(|| format!("loading {}", path.display()))?;
	let settings = config.cache_settings()?;

	let (table, mut warnings) = config.migration_table();
	let registry = linked_registry()?;
	if registry.is_empty() {
		tracing::debug!("no linked module providers, skipping order name check");
	} else {
		warnings.extend(config.lore_order(&registry).1);
	}

	println!("migrations: {}", table.len());
	match &config.modules.order {
		Some(order) => println!("lore order: {}", order.join(", ")),
		None => println!("lore order: unconfigured"),
	}
	println!(
		"cache: idle {}s, sweep every {}s, write-back {:?}",
		settings.idle.as_secs(),
		settings.sweep_interval.as_secs(),
		settings.write_back
	);
	for warning in &warnings {
		eprintln!("warning: {warning}");
	}
	Ok(())
}

fn migrate(path: &Path, ids: &[ModuleId]) -> anyhow::Result<()> {
	let config = Config::load(path).with_context(|| format!("loading {}", path.display()))?;
	let (table, warnings) = config.migration_table();
	for warning in &warnings {
		eprintln!("warning: {warning}");
	}
	for &id in ids {
		let resolved = table.resolve_chain(id)?;
		if resolved == id {
			println!("{id}");
		} else {
			println!("{id} > {resolved}");
		}
	}
	Ok(())
}
