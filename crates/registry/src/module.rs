//! Live module instances and the per-item module set.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Slice;
use sigil_primitives::{AttributeEffect, ModuleId};

use crate::error::ModuleError;

/// Upcast helper so attached modules can be downcast to their concrete type.
///
/// Implemented for every `'static` type; module authors never implement it.
pub trait AsAny: Any {
	fn as_any(&self) -> &dyn Any;
	fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

/// Persistent metadata attached to an item.
pub trait Module: AsAny + Send + Sync {
	/// Lore lines describing this module, or `None` for no lore section.
	fn lore(&self) -> Option<Vec<String>> {
		None
	}

	/// Encodes the module's state. `Ok(None)` means "do not persist a
	/// payload"; the module stays attached.
	fn serialize(&self) -> Result<Option<String>, ModuleError>;

	/// Runs once every module of the item is loaded, and once after a new
	/// attachment. `siblings` holds the other modules of the same item.
	fn post_load(&mut self, _siblings: &Siblings<'_>) {}

	/// Attribute effects applied while this module is attached.
	fn attribute_effects(&self) -> Vec<AttributeEffect> {
		Vec::new()
	}
}

/// Runs module code, turning a panic into [`ModuleError::Panicked`].
pub(crate) fn guarded<T>(f: impl FnOnce() -> Result<T, ModuleError>) -> Result<T, ModuleError> {
	match catch_unwind(AssertUnwindSafe(f)) {
		Ok(result) => result,
		Err(payload) => {
			let message = if let Some(s) = payload.downcast_ref::<&str>() {
				(*s).to_string()
			} else if let Some(s) = payload.downcast_ref::<String>() {
				s.clone()
			} else {
				"non-string panic payload".to_string()
			};
			Err(ModuleError::Panicked(message))
		}
	}
}

/// A module stamped with the id and name it was registered under.
pub struct AttachedModule {
	id: ModuleId,
	name: Arc<str>,
	inner: Box<dyn Module>,
}

impl AttachedModule {
	pub(crate) fn new(id: ModuleId, name: Arc<str>, inner: Box<dyn Module>) -> Self {
		Self { id, name, inner }
	}

	pub fn id(&self) -> ModuleId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn module(&self) -> &dyn Module {
		&*self.inner
	}

	pub fn module_mut(&mut self) -> &mut dyn Module {
		&mut *self.inner
	}

	/// Returns the module as `T` if that is its concrete type.
	pub fn downcast_ref<T: Module>(&self) -> Option<&T> {
		self.module().as_any().downcast_ref::<T>()
	}

	/// Returns the module as `&mut T` if that is its concrete type.
	pub fn downcast_mut<T: Module>(&mut self) -> Option<&mut T> {
		self.module_mut().as_any_mut().downcast_mut::<T>()
	}

	/// Serializes the module; panics surface as errors.
	pub fn serialize(&self) -> Result<Option<String>, ModuleError> {
		guarded(|| self.inner.serialize())
	}

	/// Lore lines of the module; a panicking module contributes none.
	pub fn lore(&self) -> Option<Vec<String>> {
		match guarded(|| Ok(self.inner.lore())) {
			Ok(lore) => lore,
			Err(error) => {
				tracing::warn!(module = %self.name, id = %self.id, %error, "lore section failed");
				None
			}
		}
	}

	/// Attribute effects of the module; a panicking module contributes none.
	pub fn attribute_effects(&self) -> Result<Vec<AttributeEffect>, ModuleError> {
		guarded(|| Ok(self.inner.attribute_effects()))
	}

	fn post_load(&mut self, siblings: &Siblings<'_>) {
		let (id, name) = (self.id, self.name.clone());
		let inner = &mut self.inner;
		if let Err(error) = guarded(|| {
			inner.post_load(siblings);
			Ok(())
		}) {
			tracing::warn!(module = %name, %id, %error, "post-load hook failed");
		}
	}
}

impl fmt::Debug for AttachedModule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AttachedModule")
			.field("id", &self.id)
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

/// Read-only view of an item's other modules, handed to [`Module::post_load`].
pub struct Siblings<'a> {
	before: &'a Slice<ModuleId, AttachedModule>,
	after: &'a Slice<ModuleId, AttachedModule>,
}

impl<'a> Siblings<'a> {
	/// Iterates sibling modules in attachment order.
	pub fn iter(&self) -> impl Iterator<Item = &'a AttachedModule> + use<'a> {
		self.before.values().chain(self.after.values())
	}

	pub fn get(&self, id: ModuleId) -> Option<&'a AttachedModule> {
		self.iter().find(|m| m.id == id)
	}

	pub fn by_name(&self, name: &str) -> Option<&'a AttachedModule> {
		self.iter().find(|m| &*m.name == name)
	}

	/// Returns sibling `id` as `T` if present with that concrete type.
	pub fn downcast_ref<T: Module>(&self, id: ModuleId) -> Option<&'a T> {
		self.get(id)?.downcast_ref::<T>()
	}

	pub fn len(&self) -> usize {
		self.before.len() + self.after.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Modules attached to one item, keyed by current module id.
///
/// Iteration follows attachment order; removal preserves the order of the
/// remaining modules.
#[derive(Debug, Default)]
pub struct ModuleSet {
	modules: IndexMap<ModuleId, AttachedModule>,
}

impl ModuleSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts `module`, replacing and returning any module with the same id.
	/// A replacement keeps the position of the module it replaces.
	pub fn insert(&mut self, module: AttachedModule) -> Option<AttachedModule> {
		self.modules.insert(module.id, module)
	}

	pub fn remove(&mut self, id: ModuleId) -> Option<AttachedModule> {
		self.modules.shift_remove(&id)
	}

	pub fn get(&self, id: ModuleId) -> Option<&AttachedModule> {
		self.modules.get(&id)
	}

	pub fn get_mut(&mut self, id: ModuleId) -> Option<&mut AttachedModule> {
		self.modules.get_mut(&id)
	}

	pub fn contains(&self, id: ModuleId) -> bool {
		self.modules.contains_key(&id)
	}

	pub fn ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
		self.modules.keys().copied()
	}

	pub fn iter(&self) -> impl Iterator<Item = &AttachedModule> {
		self.modules.values()
	}

	pub fn len(&self) -> usize {
		self.modules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.modules.is_empty()
	}

	/// Runs every module's post-load hook in attachment order.
	pub fn post_load_all(&mut self) {
		for index in 0..self.modules.len() {
			self.post_load_at(index);
		}
	}

	/// Runs the post-load hook of module `id` only.
	pub fn post_load(&mut self, id: ModuleId) {
		if let Some(index) = self.modules.get_index_of(&id) {
			self.post_load_at(index);
		}
	}

	fn post_load_at(&mut self, index: usize) {
		let (before, rest) = self.modules.as_mut_slice().split_at_mut(index);
		let Some(((_, module), after)) = rest.split_first_mut() else {
			return;
		};
		let siblings = Siblings {
			before: &*before,
			after: &*after,
		};
		module.post_load(&siblings);
	}
}
