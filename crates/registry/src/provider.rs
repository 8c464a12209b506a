use crate::builder::RegistryBuilder;
use crate::error::RegistrationError;

/// A bundle of module kinds contributed by one feature.
///
/// Providers are either installed explicitly with
/// [`RegistryBuilder::install`] or submitted with `inventory::submit!` and
/// picked up by [`RegistryBuilder::install_linked`].
pub struct ModuleProvider {
	/// Provider name, used for ordering and diagnostics.
	pub name: &'static str,
	/// Called once during the load phase.
	pub register: fn(&mut RegistryBuilder) -> Result<(), RegistrationError>,
}

inventory::collect!(ModuleProvider);

impl ModuleProvider {
	/// Creates a new provider definition.
	pub const fn new(
		name: &'static str,
		register: fn(&mut RegistryBuilder) -> Result<(), RegistrationError>,
	) -> Self {
		Self { name, register }
	}
}
