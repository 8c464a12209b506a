//! Live module state of one tracked item.

use std::fmt;
use std::sync::Arc;

use sigil_config::{Config, ConfigWarning, WriteBackPolicy};
use sigil_primitives::{ItemHandle, ItemId, TagKey, decode_id_list, encode_id_list};
use sigil_registry::{
	AttachedModule, InitArgs, LoreOrder, MigrationTable, Module, ModuleRef, ModuleRegistry,
	ModuleSet,
};

/// Everything a record needs besides its item: dispatch, migrations, lore
/// order and write-back policy. Read-only once built.
#[derive(Debug)]
pub struct RecordContext {
	pub registry: Arc<ModuleRegistry>,
	pub migrations: MigrationTable,
	pub lore: LoreOrder,
	pub policy: WriteBackPolicy,
}

impl RecordContext {
	/// A context with no migrations, no lore order and immediate write-back.
	pub fn new(registry: Arc<ModuleRegistry>) -> Self {
		Self {
			registry,
			migrations: MigrationTable::new(),
			lore: LoreOrder::unconfigured(),
			policy: WriteBackPolicy::default(),
		}
	}

	/// Builds the context described by `config`.
	///
	/// Entries the registry or the table reject are skipped and returned.
	pub fn from_config(registry: Arc<ModuleRegistry>, config: &Config) -> (Self, Vec<ConfigWarning>) {
		let (migrations, mut warnings) = config.migration_table();
		let (lore, lore_warnings) = config.lore_order(&registry);
		warnings.extend(lore_warnings);
		let ctx = Self {
			registry,
			migrations,
			lore,
			policy: config.cache.write_back,
		};
		(ctx, warnings)
	}

	pub fn with_migrations(mut self, migrations: MigrationTable) -> Self {
		self.migrations = migrations;
		self
	}

	pub fn with_lore_order(mut self, lore: LoreOrder) -> Self {
		self.lore = lore;
		self
	}

	pub fn with_policy(mut self, policy: WriteBackPolicy) -> Self {
		self.policy = policy;
		self
	}
}

/// All modules attached to one tracked item.
///
/// Module keys are always current ids: anything loaded through a migration
/// sits under the id it migrated to.
pub struct ItemRecord {
	id: ItemId,
	item: ItemHandle,
	modules: ModuleSet,
	ctx: Arc<RecordContext>,
}

impl ItemRecord {
	/// Materializes every module listed on `item`.
	///
	/// Unparseable ids, unterminated migrations and modules that fail to
	/// load are skipped. Post-load hooks run once all modules are in place.
	/// Nothing is written to the item.
	pub fn load(id: ItemId, item: ItemHandle, ctx: Arc<RecordContext>) -> Self {
		let stored = item
			.tag(TagKey::MODULE_LIST)
			.map(|list| decode_id_list(&list))
			.unwrap_or_default();

		let mut modules = ModuleSet::new();
		for stored_id in stored {
			let module_id = match ctx.migrations.resolve_chain(stored_id) {
				Ok(module_id) => module_id,
				Err(error) => {
					tracing::error!(item = %id, module = %stored_id, %error, "skipping module");
					continue;
				}
			};
			if module_id != stored_id {
				tracing::debug!(item = %id, from = %stored_id, to = %module_id, "record.migrate");
			}
			if modules.contains(module_id) {
				tracing::debug!(item = %id, module = %module_id, "module listed twice");
				continue;
			}
			if let Some(module) = ctx.registry.materialize(module_id, item.as_ref()) {
				modules.insert(module);
			}
		}
		modules.post_load_all();

		tracing::debug!(item = %id, modules = modules.len(), "record.load");
		Self {
			id,
			item,
			modules,
			ctx,
		}
	}

	/// The item's stable tracking id.
	pub fn tracking_id(&self) -> ItemId {
		self.id
	}

	/// The live item this record writes to.
	pub fn item(&self) -> &ItemHandle {
		&self.item
	}

	/// Points the record at another live copy of the same tracked item.
	pub fn set_item(&mut self, item: ItemHandle) {
		self.item = item;
	}

	pub fn context(&self) -> &RecordContext {
		&self.ctx
	}

	/// Attached modules in attachment order.
	pub fn modules(&self) -> &ModuleSet {
		&self.modules
	}

	pub fn module<'a>(&self, module: impl Into<ModuleRef<'a>>) -> Option<&AttachedModule> {
		let id = self.ctx.registry.resolve(module.into())?;
		self.modules.get(id)
	}

	pub fn module_mut<'a>(&mut self, module: impl Into<ModuleRef<'a>>) -> Option<&mut AttachedModule> {
		let id = self.ctx.registry.resolve(module.into())?;
		self.modules.get_mut(id)
	}

	/// Returns the attached module as `T` if it has that concrete type.
	pub fn downcast_ref<'a, T: Module>(&self, module: impl Into<ModuleRef<'a>>) -> Option<&T> {
		self.module(module)?.downcast_ref::<T>()
	}

	pub fn downcast_mut<'a, T: Module>(&mut self, module: impl Into<ModuleRef<'a>>) -> Option<&mut T> {
		self.module_mut(module)?.downcast_mut::<T>()
	}

	pub fn has_module<'a>(&self, module: impl Into<ModuleRef<'a>>) -> bool {
		self.module(module).is_some()
	}

	/// Creates and attaches a new module, replacing any module with the same
	/// id.
	///
	/// Returns false, touching nothing, if the module is not registered or
	/// its kind declines to construct.
	pub fn add_module<'a>(&mut self, module: impl Into<ModuleRef<'a>>, args: &InitArgs) -> bool {
		let module = module.into();
		let Some(module_id) = self.ctx.registry.resolve(module) else {
			tracing::debug!(item = %self.id, %module, "add of unregistered module ignored");
			return false;
		};
		let Some(attached) = self.ctx.registry.construct(module_id, self.item.as_ref(), args) else {
			return false;
		};
		self.attach_and_flush(attached);
		true
	}

	/// Attaches a module built elsewhere, typically by
	/// [`ModuleRegistry::create_from_data`].
	///
	/// Returns the module it replaces, if any.
	pub fn attach(&mut self, module: AttachedModule) -> Option<AttachedModule> {
		self.attach_and_flush(module)
	}

	/// Detaches a module. Returns false if it was not attached.
	///
	/// The module's stored payload stays on the item; only the module list
	/// stops naming it.
	pub fn remove_module<'a>(&mut self, module: impl Into<ModuleRef<'a>>) -> bool {
		let Some(module_id) = self.ctx.registry.resolve(module.into()) else {
			return false;
		};
		if self.modules.remove(module_id).is_none() {
			return false;
		}
		tracing::debug!(item = %self.id, module = %module_id, "record.remove");
		self.flush_per_policy();
		true
	}

	/// Writes every module's payload, the module list, the combined
	/// attribute effects and the rendered lore to the item.
	///
	/// A module whose serialization fails keeps its id listed and its
	/// previous payload; its effects are left out of this pass.
	pub fn write_back(&self) {
		let mut ids = Vec::with_capacity(self.modules.len());
		let mut effects = Vec::new();
		for module in self.modules.iter() {
			ids.push(module.id());
			match module.serialize() {
				Ok(Some(payload)) => self.item.set_tag(TagKey::from(module.id()), payload),
				Ok(None) => {}
				Err(error) => {
					tracing::error!(
						item = %self.id,
						module = module.name(),
						%error,
						"serialization failed, keeping previous payload"
					);
					continue;
				}
			}
			match module.attribute_effects() {
				Ok(module_effects) => effects.extend(module_effects),
				Err(error) => {
					tracing::warn!(item = %self.id, module = module.name(), %error, "attribute effects failed");
				}
			}
		}

		self.item.set_attribute_effects(effects);
		self.item.set_tag(TagKey::MODULE_LIST, encode_id_list(&ids));
		if let Some(lore) = self.ctx.lore.render(&self.modules) {
			self.item.set_lore(lore);
		}
		tracing::trace!(item = %self.id, modules = ids.len(), "record.write_back");
	}

	fn attach_and_flush(&mut self, module: AttachedModule) -> Option<AttachedModule> {
		let module_id = module.id();
		let replaced = self.modules.insert(module);
		self.modules.post_load(module_id);
		tracing::debug!(item = %self.id, module = %module_id, replaced = replaced.is_some(), "record.attach");
		self.flush_per_policy();
		replaced
	}

	fn flush_per_policy(&self) {
		if self.ctx.policy == WriteBackPolicy::Immediate {
			self.write_back();
		}
	}
}

impl fmt::Debug for ItemRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ItemRecord")
			.field("id", &self.id)
			.field("modules", &self.modules)
			.finish_non_exhaustive()
	}
}

