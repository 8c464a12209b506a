//! Item tag-store boundary.
//!
//! The host owns the real item representation. This crate only needs a
//! string key-value store scoped to one item plus two write-only sinks for
//! rendered lore and combined attribute effects.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::attribute::AttributeEffect;
use crate::id::{ItemId, TagKey};

/// Persistent tag storage of a single host item.
///
/// Methods take `&self`; implementations use interior mutability because a
/// live item is shared between the host and cached records.
pub trait ItemStore: Send + Sync {
	/// Returns the value stored under `key`, if any.
	fn tag(&self, key: TagKey) -> Option<String>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set_tag(&self, key: TagKey, value: String);

	/// Replaces the item's display lore.
	fn set_lore(&self, lore: Vec<String>);

	/// Replaces the attribute effects applied by the item.
	fn set_attribute_effects(&self, effects: Vec<AttributeEffect>);
}

/// Shared handle to a live host item.
pub type ItemHandle = Arc<dyn ItemStore>;

/// Reads the tracking id of `item`.
///
/// Returns `None` for untracked items and for items whose tracking tag is
/// corrupt.
pub fn tracking_id(item: &dyn ItemStore) -> Option<ItemId> {
	let raw = item.tag(TagKey::TRACKING)?;
	match ItemId::parse_str(&raw) {
		Ok(id) => Some(id),
		Err(error) => {
			tracing::warn!(tag = %raw, %error, "ignoring corrupt item tracking id");
			None
		}
	}
}

/// Returns the tracking id of `item`, assigning a fresh one if it has none.
pub fn ensure_tracking_id(item: &dyn ItemStore) -> ItemId {
	if let Some(id) = tracking_id(item) {
		return id;
	}
	let id = ItemId::new_v4();
	item.set_tag(TagKey::TRACKING, id.to_string());
	tracing::debug!(item = %id, "assigned tracking id");
	id
}

#[derive(Debug, Default, Clone)]
struct MemoryState {
	tags: FxHashMap<TagKey, String>,
	lore: Option<Vec<String>>,
	effects: Vec<AttributeEffect>,
}

/// In-memory [`ItemStore`] for tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryItem {
	state: Mutex<MemoryState>,
}

impl MemoryItem {
	/// Creates an empty, untracked item.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an item with a fixed tracking id.
	pub fn tracked(id: ItemId) -> Self {
		let item = Self::new();
		item.set_tag(TagKey::TRACKING, id.to_string());
		item
	}

	/// Sets a tag while building.
	pub fn with_tag(self, key: TagKey, value: impl Into<String>) -> Self {
		self.set_tag(key, value.into());
		self
	}

	/// Returns a distinct item carrying a copy of this item's state, the way
	/// hosts clone items when they move between containers.
	pub fn duplicate(&self) -> Self {
		Self {
			state: Mutex::new(self.state.lock().clone()),
		}
	}

	/// Returns the last lore written, or `None` if lore was never set.
	pub fn lore(&self) -> Option<Vec<String>> {
		self.state.lock().lore.clone()
	}

	/// Returns the attribute effects last written.
	pub fn attribute_effects(&self) -> Vec<AttributeEffect> {
		self.state.lock().effects.clone()
	}

	/// Returns true if a value is stored under `key`.
	pub fn has_tag(&self, key: TagKey) -> bool {
		self.state.lock().tags.contains_key(&key)
	}
}

impl ItemStore for MemoryItem {
	fn tag(&self, key: TagKey) -> Option<String> {
		self.state.lock().tags.get(&key).cloned()
	}

	fn set_tag(&self, key: TagKey, value: String) {
		self.state.lock().tags.insert(key, value);
	}

	fn set_lore(&self, lore: Vec<String>) {
		self.state.lock().lore = Some(lore);
	}

	fn set_attribute_effects(&self, effects: Vec<AttributeEffect>) {
		self.state.lock().effects = effects;
	}
}
