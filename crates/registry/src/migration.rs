//! Module id migrations: old id → replacement id.
//!
//! A renamed or replaced module keeps working on existing items by mapping
//! its retired id to the id that supersedes it. Resolution follows the chain
//! to its end; the item is rewritten under the final id on its next
//! write-back.

use rustc_hash::FxHashMap;
use sigil_primitives::ModuleId;

use crate::error::MigrationError;

/// Separator between the old and the new id in a configuration entry.
pub const MIGRATION_SEPARATOR: char = '>';

/// Parses one `"<old-id>><new-id>"` entry.
pub fn parse_migration_entry(entry: &str) -> Result<(ModuleId, ModuleId), MigrationError> {
	let malformed = |reason: String| MigrationError::Malformed {
		entry: entry.to_string(),
		reason,
	};
	let (from, to) = entry
		.split_once(MIGRATION_SEPARATOR)
		.ok_or_else(|| malformed(format!("missing '{MIGRATION_SEPARATOR}'")))?;
	let from = from
		.trim()
		.parse::<ModuleId>()
		.map_err(|e| malformed(format!("old id: {e}")))?;
	let to = to
		.trim()
		.parse::<ModuleId>()
		.map_err(|e| malformed(format!("new id: {e}")))?;
	if from == to {
		return Err(MigrationError::Cycle { from, to });
	}
	Ok((from, to))
}

/// Directed, acyclic map of retired ids to their replacements.
#[derive(Debug, Clone, Default)]
pub struct MigrationTable {
	steps: FxHashMap<ModuleId, ModuleId>,
}

impl MigrationTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a table from configuration entries, skipping bad ones.
	///
	/// Every skipped entry is logged and returned.
	pub fn from_entries<'a, I>(entries: I) -> (Self, Vec<MigrationError>)
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut table = Self::new();
		let mut errors = Vec::new();
		for entry in entries {
			let result = parse_migration_entry(entry).and_then(|(from, to)| table.insert(from, to));
			match result {
				Ok(Some(previous)) => {
					tracing::warn!(entry, %previous, "migration entry overrides an earlier one");
				}
				Ok(None) => {}
				Err(error) => {
					tracing::error!(entry, %error, "skipping migration entry");
					errors.push(error);
				}
			}
		}
		(table, errors)
	}

	pub fn len(&self) -> usize {
		self.steps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	/// Adds `from → to`, returning the replacement it overrides, if any.
	///
	/// # Errors
	///
	/// [`MigrationError::Cycle`] if following `to` leads back to `from`. The
	/// table is unchanged.
	pub fn insert(&mut self, from: ModuleId, to: ModuleId) -> Result<Option<ModuleId>, MigrationError> {
		let mut cursor = to;
		for _ in 0..=self.steps.len() {
			if cursor == from {
				return Err(MigrationError::Cycle { from, to });
			}
			match self.steps.get(&cursor) {
				Some(&next) => cursor = next,
				None => return Ok(self.steps.insert(from, to)),
			}
		}
		Err(MigrationError::Cycle { from, to })
	}

	/// Single migration step for `id`.
	pub fn resolve(&self, id: ModuleId) -> Option<ModuleId> {
		self.steps.get(&id).copied()
	}

	/// Follows migrations from `id` until no mapping remains.
	///
	/// Ids without a mapping resolve to themselves.
	pub fn resolve_chain(&self, id: ModuleId) -> Result<ModuleId, MigrationError> {
		let mut current = id;
		for _ in 0..=self.steps.len() {
			match self.steps.get(&current) {
				Some(&next) => current = next,
				None => return Ok(current),
			}
		}
		Err(MigrationError::Unterminated { start: id })
	}

	/// Iterates `(old, new)` steps in unspecified order.
	pub fn iter(&self) -> impl Iterator<Item = (ModuleId, ModuleId)> + '_ {
		self.steps.iter().map(|(&from, &to)| (from, to))
	}
}
