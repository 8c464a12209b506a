use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Permanent identifier of a module kind.
///
/// Assigned once at registration and persisted on every item carrying the
/// module. Reusing an id for a different kind corrupts existing items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Uuid);

impl ModuleId {
	/// Wraps a raw UUID.
	pub const fn from_uuid(id: Uuid) -> Self {
		Self(id)
	}

	/// Builds an id from its 128-bit integer form.
	pub const fn from_u128(v: u128) -> Self {
		Self(Uuid::from_u128(v))
	}

	/// Parses the canonical text form.
	pub fn parse_str(s: &str) -> Result<Self, uuid::Error> {
		Uuid::parse_str(s).map(Self)
	}

	/// Returns the underlying UUID.
	pub const fn as_uuid(&self) -> Uuid {
		self.0
	}
}

impl fmt::Display for ModuleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.hyphenated())
	}
}

impl FromStr for ModuleId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse_str(s)
	}
}

impl From<Uuid> for ModuleId {
	fn from(id: Uuid) -> Self {
		Self(id)
	}
}

/// Stable tracking id of an item.
///
/// Survives copies and moves of the host item, which is why caches key on it
/// instead of on the live item handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(Uuid);

impl ItemId {
	/// Generates a fresh random tracking id.
	pub fn new_v4() -> Self {
		Self(Uuid::new_v4())
	}

	/// Wraps a raw UUID.
	pub const fn from_uuid(id: Uuid) -> Self {
		Self(id)
	}

	/// Builds an id from its 128-bit integer form.
	pub const fn from_u128(v: u128) -> Self {
		Self(Uuid::from_u128(v))
	}

	/// Parses the canonical text form.
	pub fn parse_str(s: &str) -> Result<Self, uuid::Error> {
		Uuid::parse_str(s).map(Self)
	}

	/// Returns the underlying UUID.
	pub const fn as_uuid(&self) -> Uuid {
		self.0
	}
}

impl fmt::Display for ItemId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.hyphenated())
	}
}

/// Key into an item's tag store.
///
/// Module payloads are stored under their [`ModuleId`]; two keys are reserved
/// for bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagKey(Uuid);

impl TagKey {
	/// Holds the encoded list of attached module ids.
	pub const MODULE_LIST: TagKey = TagKey(Uuid::from_u128(0x65bd4610_a0d8_11e3_a5e2_0800200c9a66));
	/// Holds the item's tracking id.
	pub const TRACKING: TagKey = TagKey(Uuid::from_u128(0x198d8160_c487_11e3_9c1a_0800200c9a66));

	/// Wraps a raw UUID.
	pub const fn from_uuid(id: Uuid) -> Self {
		Self(id)
	}

	/// Returns true for the keys reserved for bookkeeping.
	pub fn is_reserved(&self) -> bool {
		*self == Self::MODULE_LIST || *self == Self::TRACKING
	}

	/// Returns the underlying UUID.
	pub const fn as_uuid(&self) -> Uuid {
		self.0
	}
}

impl From<ModuleId> for TagKey {
	fn from(id: ModuleId) -> Self {
		Self(id.0)
	}
}

impl fmt::Display for TagKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.hyphenated())
	}
}
