//! Sample module kinds shared by the registry's unit tests.

use std::sync::Arc;

use sigil_primitives::{ItemStore, ModuleId};

use crate::builder::RegistryBuilder;
use crate::error::ModuleError;
use crate::kind::{InitArgs, ModuleKind};
use crate::module::{AttachedModule, Module, ModuleSet, Siblings};
use crate::registry::ModuleRegistry;

pub const COUNTER: ModuleId = ModuleId::from_u128(0x1001);
pub const MARKER: ModuleId = ModuleId::from_u128(0x1002);
pub const BROKEN: ModuleId = ModuleId::from_u128(0x1003);
pub const LORE_A: ModuleId = ModuleId::from_u128(0x2001);
pub const LORE_B: ModuleId = ModuleId::from_u128(0x2002);

/// Persists a number; sees how many siblings it had after loading.
#[derive(Debug, Default)]
pub struct Counter {
	pub value: u32,
	pub siblings_seen: Option<usize>,
}

impl Module for Counter {
	fn lore(&self) -> Option<Vec<String>> {
		Some(vec![format!("Count: {}", self.value)])
	}

	fn serialize(&self) -> Result<Option<String>, ModuleError> {
		Ok(Some(self.value.to_string()))
	}

	fn post_load(&mut self, siblings: &Siblings<'_>) {
		self.siblings_seen = Some(siblings.len());
	}
}

pub struct CounterKind;

impl ModuleKind for CounterKind {
	fn deserialize(
		&self,
		payload: Option<&str>,
		_item: &dyn ItemStore,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		let value = match payload {
			Some(raw) => raw
				.parse()
				.map_err(|e| ModuleError::Payload(format!("{raw:?}: {e}")))?,
			None => 0,
		};
		Ok(Some(Box::new(Counter {
			value,
			siblings_seen: None,
		})))
	}

	fn construct(
		&self,
		_item: &dyn ItemStore,
		args: &InitArgs,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		let value = args.get::<u32>(0).copied().unwrap_or_default();
		Ok(Some(Box::new(Counter {
			value,
			siblings_seen: None,
		})))
	}
}

/// Carries no state and never persists a payload.
#[derive(Debug)]
pub struct Marker;

impl Module for Marker {
	fn serialize(&self) -> Result<Option<String>, ModuleError> {
		Ok(None)
	}
}

pub struct MarkerKind;

impl ModuleKind for MarkerKind {
	fn deserialize(
		&self,
		_payload: Option<&str>,
		_item: &dyn ItemStore,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		Ok(Some(Box::new(Marker)))
	}

	fn construct(
		&self,
		_item: &dyn ItemStore,
		_args: &InitArgs,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		Ok(Some(Box::new(Marker)))
	}
}

/// Fails to deserialize, panics on construction.
pub struct BrokenKind;

impl ModuleKind for BrokenKind {
	fn deserialize(
		&self,
		_payload: Option<&str>,
		_item: &dyn ItemStore,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		Err(ModuleError::Other("always broken".into()))
	}

	fn construct(
		&self,
		_item: &dyn ItemStore,
		_args: &InitArgs,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		panic!("construct exploded")
	}
}

/// Fixed lore lines, for rendering tests.
pub struct LoreLines(pub Vec<String>);

impl Module for LoreLines {
	fn lore(&self) -> Option<Vec<String>> {
		Some(self.0.clone())
	}

	fn serialize(&self) -> Result<Option<String>, ModuleError> {
		Ok(None)
	}
}

/// Registry holding `Counter`, `Marker` and `Broken`.
pub fn sample_registry() -> ModuleRegistry {
	let mut builder = RegistryBuilder::new();
	builder.register("Counter", COUNTER, CounterKind).unwrap();
	builder.register("Marker", MARKER, MarkerKind).unwrap();
	builder.register("Broken", BROKEN, BrokenKind).unwrap();
	builder.seal()
}

/// Builds a module set of [`LoreLines`] modules in the given order.
pub fn lore_set(entries: &[(ModuleId, &[&str])]) -> ModuleSet {
	let mut set = ModuleSet::new();
	for &(id, lines) in entries {
		let lines = lines.iter().map(|s| s.to_string()).collect();
		set.insert(AttachedModule::new(
			id,
			Arc::from(format!("lore-{id}")),
			Box::new(LoreLines(lines)),
		));
	}
	set
}
