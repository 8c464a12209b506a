//! Error types for configuration parsing.

use std::path::PathBuf;

use sigil_registry::MigrationError;
use thiserror::Error;

/// Errors that prevent a configuration from loading.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error encoding the configuration back to TOML.
	#[error("TOML encode error: {0}")]
	Serialize(#[from] toml::ser::Error),

	/// Error reading or writing a configuration file.
	#[error("I/O error on {path}: {error}")]
	Io {
		/// Path to the file that failed.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A value parsed but is out of range.
	#[error("invalid value for {field}: {reason}")]
	InvalidValue {
		/// Dotted key of the offending field.
		field: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Non-fatal problem with a configuration entry.
///
/// The entry is skipped; the rest of the configuration still applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
	/// A `modules.migration` entry is malformed or would close a cycle.
	Migration(MigrationError),
	/// A `modules.order` name matches no registered module.
	UnknownModule {
		/// The unmatched name.
		name: String,
	},
}

impl std::fmt::Display for ConfigWarning {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ConfigWarning::Migration(error) => write!(f, "modules.migration: {error}"),
			ConfigWarning::UnknownModule { name } => {
				write!(f, "modules.order: '{name}' is not a registered module")
			}
		}
	}
}
