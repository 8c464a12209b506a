use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use sigil_primitives::{ItemStore, ModuleId, TagKey};

use crate::kind::{InitArgs, ModuleKind};
use crate::module::{AttachedModule, Module, guarded};

/// Registered data for one module kind.
#[derive(Clone)]
pub struct ModuleDescriptor {
	pub(crate) id: ModuleId,
	pub(crate) name: Arc<str>,
	pub(crate) kind: Arc<dyn ModuleKind>,
	pub(crate) kind_type: TypeId,
	pub(crate) kind_name: &'static str,
}

impl ModuleDescriptor {
	pub fn id(&self) -> ModuleId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Type name of the registered kind, for diagnostics.
	pub fn kind_name(&self) -> &'static str {
		self.kind_name
	}

	fn attach(&self, module: Box<dyn Module>) -> AttachedModule {
		AttachedModule::new(self.id, self.name.clone(), module)
	}

	fn deserialize(
		&self,
		payload: Option<&str>,
		item: &dyn ItemStore,
	) -> Option<AttachedModule> {
		match guarded(|| self.kind.deserialize(payload, item)) {
			Ok(Some(module)) => Some(self.attach(module)),
			Ok(None) => {
				tracing::debug!(module = %self.name, id = %self.id, "deserialize declined");
				None
			}
			Err(error) => {
				tracing::warn!(
					module = %self.name,
					id = %self.id,
					%error,
					"module deserialization failed"
				);
				None
			}
		}
	}
}

impl fmt::Debug for ModuleDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModuleDescriptor")
			.field("id", &self.id)
			.field("name", &self.name)
			.field("kind", &self.kind_name)
			.finish()
	}
}

/// A module addressed by id or by registered name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleRef<'a> {
	Id(ModuleId),
	Name(&'a str),
}

impl From<ModuleId> for ModuleRef<'_> {
	fn from(id: ModuleId) -> Self {
		Self::Id(id)
	}
}

impl<'a> From<&'a str> for ModuleRef<'a> {
	fn from(name: &'a str) -> Self {
		Self::Name(name)
	}
}

impl<'a> From<&'a String> for ModuleRef<'a> {
	fn from(name: &'a String) -> Self {
		Self::Name(name)
	}
}

impl fmt::Display for ModuleRef<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Id(id) => write!(f, "{id}"),
			Self::Name(name) => write!(f, "{name:?}"),
		}
	}
}

/// Sealed registry: lookups and dispatch only.
///
/// Immutable once built, so it can be shared behind an `Arc` without locking.
pub struct ModuleRegistry {
	by_id: FxHashMap<ModuleId, ModuleDescriptor>,
	by_name: FxHashMap<Arc<str>, ModuleId>,
	order: Vec<ModuleId>,
}

impl ModuleRegistry {
	pub(crate) fn from_parts(
		by_id: FxHashMap<ModuleId, ModuleDescriptor>,
		by_name: FxHashMap<Arc<str>, ModuleId>,
		order: Vec<ModuleId>,
	) -> Self {
		Self {
			by_id,
			by_name,
			order,
		}
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	pub fn contains(&self, id: ModuleId) -> bool {
		self.by_id.contains_key(&id)
	}

	pub fn resolve_by_name(&self, name: &str) -> Option<ModuleId> {
		self.by_name.get(name).copied()
	}

	pub fn resolve_by_id(&self, id: ModuleId) -> Option<&str> {
		self.by_id.get(&id).map(ModuleDescriptor::name)
	}

	/// Resolves a reference to a registered id. Unregistered ids yield `None`.
	pub fn resolve(&self, module: ModuleRef<'_>) -> Option<ModuleId> {
		match module {
			ModuleRef::Id(id) => self.contains(id).then_some(id),
			ModuleRef::Name(name) => self.resolve_by_name(name),
		}
	}

	pub fn descriptor(&self, id: ModuleId) -> Option<&ModuleDescriptor> {
		self.by_id.get(&id)
	}

	/// Registered `(id, name)` pairs in registration order.
	pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &str)> + '_ {
		self.order
			.iter()
			.filter_map(|id| self.by_id.get(id))
			.map(|desc| (desc.id, desc.name()))
	}

	/// Rebuilds module `id` from the payload stored on `item`.
	///
	/// Returns `None` if `id` is unregistered, if the kind declines, or if
	/// deserialization fails. Failures are logged, never propagated.
	pub fn materialize(&self, id: ModuleId, item: &dyn ItemStore) -> Option<AttachedModule> {
		let Some(desc) = self.by_id.get(&id) else {
			tracing::warn!(%id, "stored module id is not registered");
			return None;
		};
		let payload = item.tag(TagKey::from(id));
		desc.deserialize(payload.as_deref(), item)
	}

	/// Creates a new module `id` for a fresh attachment.
	pub fn construct(
		&self,
		id: ModuleId,
		item: &dyn ItemStore,
		args: &InitArgs,
	) -> Option<AttachedModule> {
		let desc = self.by_id.get(&id)?;
		match guarded(|| desc.kind.construct(item, args)) {
			Ok(Some(module)) => Some(desc.attach(module)),
			Ok(None) => {
				tracing::debug!(module = %desc.name, %id, "construct declined");
				None
			}
			Err(error) => {
				tracing::warn!(module = %desc.name, %id, %error, "module construction failed");
				None
			}
		}
	}

	/// Builds a detached module from explicit payload text.
	///
	/// The result is not attached to `item`'s record; see the record's
	/// `attach` for that.
	pub fn create_from_data(
		&self,
		module: ModuleRef<'_>,
		payload: Option<&str>,
		item: &dyn ItemStore,
	) -> Option<AttachedModule> {
		let id = self.resolve(module)?;
		let desc = self.by_id.get(&id)?;
		desc.deserialize(payload, item)
	}
}

impl fmt::Debug for ModuleRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModuleRegistry")
			.field("modules", &self.order.len())
			.finish_non_exhaustive()
	}
}
