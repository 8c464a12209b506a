use std::any::{TypeId, type_name};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use sigil_primitives::ModuleId;

use crate::error::RegistrationError;
use crate::kind::ModuleKind;
use crate::provider::ModuleProvider;
use crate::registry::{ModuleDescriptor, ModuleRegistry};

/// Open registry: accepts registrations, offers no lookups.
///
/// Handed to module providers during the host's load phase, then consumed by
/// [`Self::seal`].
#[derive(Default)]
pub struct RegistryBuilder {
	by_id: FxHashMap<ModuleId, ModuleDescriptor>,
	by_name: FxHashMap<Arc<str>, ModuleId>,
	/// Registration order, kept for deterministic listing.
	order: Vec<ModuleId>,
}

impl RegistryBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the number of kinds registered so far.
	pub fn len(&self) -> usize {
		self.order.len()
	}

	/// Returns true if nothing has been registered yet.
	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Registers `kind` under `name` and `id`.
	///
	/// Registering the identical mapping twice succeeds without effect. Any
	/// conflict is rejected before the builder is touched.
	///
	/// # Errors
	///
	/// - [`RegistrationError::DuplicateIdentifier`] if `id` belongs to another
	///   kind, or to the same kind under another name.
	/// - [`RegistrationError::DuplicateName`] if `name` belongs to another id.
	pub fn register<K: ModuleKind>(
		&mut self,
		name: &str,
		id: ModuleId,
		kind: K,
	) -> Result<(), RegistrationError> {
		let kind_type = TypeId::of::<K>();
		let kind_name = type_name::<K>();

		if let Some(existing) = self.by_id.get(&id) {
			if existing.kind_type == kind_type && existing.name() == name {
				tracing::trace!(module = name, %id, "ignoring repeated registration");
				return Ok(());
			}
			return Err(RegistrationError::DuplicateIdentifier {
				id,
				existing_name: existing.name().to_string(),
				existing_kind: existing.kind_name,
				incoming_name: name.to_string(),
				incoming_kind: kind_name,
			});
		}

		if let Some(&owner) = self.by_name.get(name) {
			return Err(RegistrationError::DuplicateName {
				name: name.to_string(),
				existing: owner,
				incoming: id,
			});
		}

		let name: Arc<str> = Arc::from(name);
		self.by_name.insert(name.clone(), id);
		self.by_id.insert(
			id,
			ModuleDescriptor {
				id,
				name,
				kind: Arc::new(kind),
				kind_type,
				kind_name,
			},
		);
		self.order.push(id);
		tracing::debug!(module = kind_name, %id, "registered module kind");
		Ok(())
	}

	/// Lets one provider register its kinds.
	pub fn install(&mut self, provider: &ModuleProvider) -> Result<(), RegistrationError> {
		tracing::debug!(provider = provider.name, "installing module provider");
		(provider.register)(self)
	}

	/// Installs every provider linked into the binary, ordered by name.
	pub fn install_linked(&mut self) -> Result<(), RegistrationError> {
		let mut providers: Vec<&'static ModuleProvider> =
			inventory::iter::<ModuleProvider>.into_iter().collect();
		providers.sort_by(|a, b| a.name.cmp(b.name));
		for provider in providers {
			self.install(provider)?;
		}
		Ok(())
	}

	/// Closes registration and returns the lookup-capable registry.
	pub fn seal(self) -> ModuleRegistry {
		tracing::info!(modules = self.order.len(), "module registry sealed");
		ModuleRegistry::from_parts(self.by_id, self.by_name, self.order)
	}
}
