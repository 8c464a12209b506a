use std::any::{Any, type_name};
use std::fmt;

use sigil_primitives::ItemStore;

use crate::error::ModuleError;
use crate::module::Module;

/// Factory for one kind of module.
///
/// Registered once per kind on the [`crate::RegistryBuilder`]. Implementations
/// must not look up the item's record from inside either function: the record
/// is still being built when they run.
pub trait ModuleKind: Any + Send + Sync {
	/// Rebuilds a module from its stored payload.
	///
	/// `payload` is `None` when the item has no data under the module's id.
	/// Returning `Ok(None)` declines the attachment.
	fn deserialize(
		&self,
		payload: Option<&str>,
		item: &dyn ItemStore,
	) -> Result<Option<Box<dyn Module>>, ModuleError>;

	/// Creates a fresh module for a new attachment.
	fn construct(
		&self,
		item: &dyn ItemStore,
		args: &InitArgs,
	) -> Result<Option<Box<dyn Module>>, ModuleError>;
}

/// Positional, dynamically typed arguments for [`ModuleKind::construct`].
#[derive(Default)]
pub struct InitArgs {
	args: Vec<Box<dyn Any + Send + Sync>>,
}

impl InitArgs {
	/// Creates an empty argument list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends an argument while building.
	pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
		self.push(value);
		self
	}

	/// Appends an argument.
	pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
		self.args.push(Box::new(value));
	}

	pub fn len(&self) -> usize {
		self.args.len()
	}

	pub fn is_empty(&self) -> bool {
		self.args.is_empty()
	}

	/// Returns argument `index` if it exists and has type `T`.
	pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
		let arg: &(dyn Any + Send + Sync) = self.args.get(index)?.as_ref();
		arg.downcast_ref::<T>()
	}

	/// Like [`Self::get`], failing with [`ModuleError::MissingArgument`].
	pub fn require<T: Any>(&self, index: usize) -> Result<&T, ModuleError> {
		self.get(index).ok_or(ModuleError::MissingArgument {
			index,
			expected: type_name::<T>(),
		})
	}
}

impl fmt::Debug for InitArgs {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InitArgs").field("len", &self.args.len()).finish()
	}
}
