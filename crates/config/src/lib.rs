//! Configuration for sigil.
//!
//! Configuration is written in TOML and covers three concerns:
//!
//! - **Lore order**: which module sections appear in item lore, top to bottom.
//! - **Migrations**: retired module ids and the ids replacing them.
//! - **Cache**: idle expiry, sweep cadence and write-back policy.
//!
//! # Schema
//!
//! ```toml
//! [modules]
//! order = ["Enchantments", "Durability"]
//! migration = ["<old-uuid>><new-uuid>"]
//!
//! [cache]
//! idle-secs = 900
//! sweep-interval-secs = 30
//! write-back = "immediate"   # or "deferred"
//! ```
//!
//! Every section and key is optional. A missing `order` means lore is never
//! rewritten; an empty one means lore is rewritten empty.
//!
//! # Warnings
//!
//! Bad migration entries and unknown module names do not fail loading. They
//! are skipped and returned as [`ConfigWarning`]s from the methods that
//! interpret them, and logged.

pub mod error;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sigil_registry::{LoreOrder, MigrationTable, ModuleRegistry};

pub use error::{ConfigError, ConfigWarning, Result};

/// Default idle time before a cached record is evicted.
pub const DEFAULT_IDLE_SECS: u64 = 15 * 60;
/// Default period of the background eviction sweep.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Module ordering and migrations.
	pub modules: ModulesConfig,
	/// Record cache tuning.
	pub cache: CacheConfig,
}

/// The `[modules]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModulesConfig {
	/// Module names by ascending lore weight. `None` leaves lore untouched.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order: Option<Vec<String>>,
	/// `"<old-id>><new-id>"` entries.
	pub migration: Vec<String>,
}

/// The `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CacheConfig {
	pub idle_secs: u64,
	pub sweep_interval_secs: u64,
	pub write_back: WriteBackPolicy,
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self {
			idle_secs: DEFAULT_IDLE_SECS,
			sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
			write_back: WriteBackPolicy::default(),
		}
	}
}

/// When mutations of a record reach the item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteBackPolicy {
	/// Every successful add or remove writes the record back at once.
	#[default]
	Immediate,
	/// Mutations stay in memory until an explicit flush or eviction.
	Deferred,
}

/// Validated cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
	/// Idle time after which a record is evicted.
	pub idle: Duration,
	/// Period of the eviction sweep.
	pub sweep_interval: Duration,
	pub write_back: WriteBackPolicy,
}

impl Default for CacheSettings {
	fn default() -> Self {
		Self {
			idle: Duration::from_secs(DEFAULT_IDLE_SECS),
			sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
			write_back: WriteBackPolicy::default(),
		}
	}
}

impl Config {
	/// Parse a TOML string into a [`Config`].
	pub fn parse(input: &str) -> Result<Self> {
		Ok(toml::from_str(input)?)
	}

	/// Load configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	/// Encode the configuration as TOML.
	pub fn to_toml_string(&self) -> Result<String> {
		Ok(toml::to_string(self)?)
	}

	/// Write the configuration to a file.
	pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		let content = self.to_toml_string()?;
		std::fs::write(path, content).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})
	}

	/// Build the migration table, skipping bad entries.
	pub fn migration_table(&self) -> (MigrationTable, Vec<ConfigWarning>) {
		let (table, errors) =
			MigrationTable::from_entries(self.modules.migration.iter().map(String::as_str));
		let warnings = errors.into_iter().map(ConfigWarning::Migration).collect();
		(table, warnings)
	}

	/// Build the lore order against the sealed registry.
	///
	/// Names the registry does not know are skipped with a warning.
	pub fn lore_order(&self, registry: &ModuleRegistry) -> (LoreOrder, Vec<ConfigWarning>) {
		let Some(names) = &self.modules.order else {
			return (LoreOrder::unconfigured(), Vec::new());
		};
		let (order, unresolved) = LoreOrder::from_names(names.iter().map(String::as_str), registry);
		let warnings = unresolved
			.into_iter()
			.map(|name| {
				tracing::warn!(module = %name, "lore order names an unregistered module");
				ConfigWarning::UnknownModule { name }
			})
			.collect();
		(order, warnings)
	}

	/// Validate and convert the `[cache]` section.
	pub fn cache_settings(&self) -> Result<CacheSettings> {
		if self.cache.idle_secs == 0 {
			return Err(ConfigError::InvalidValue {
				field: "cache.idle-secs",
				reason: "must be at least 1".into(),
			});
		}
		if self.cache.sweep_interval_secs == 0 {
			return Err(ConfigError::InvalidValue {
				field: "cache.sweep-interval-secs",
				reason: "must be at least 1".into(),
			});
		}
		Ok(CacheSettings {
			idle: Duration::from_secs(self.cache.idle_secs),
			sweep_interval: Duration::from_secs(self.cache.sweep_interval_secs),
			write_back: self.cache.write_back,
		})
	}

	/// Append registered module names missing from the lore order.
	///
	/// New names go last, in registration order. Returns the names added.
	pub fn append_unordered(&mut self, registry: &ModuleRegistry) -> Vec<String> {
		let order = self.modules.order.get_or_insert_with(Vec::new);
		let mut added = Vec::new();
		for (_, name) in registry.modules() {
			if !order.iter().any(|existing| existing == name) {
				order.push(name.to_string());
				added.push(name.to_string());
			}
		}
		if !added.is_empty() {
			tracing::info!(added = added.len(), "appended unordered modules to lore order");
		}
		added
	}
}
