//! Module kinds and helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sigil_core::{RecordCache, RecordContext};
use sigil_primitives::{
	AttributeEffect, AttributeKind, AttributeOperation, ItemHandle, ItemId, ItemStore, MemoryItem,
	ModuleId, Uuid,
};
use sigil_registry::{
	InitArgs, Module, ModuleError, ModuleKind, ModuleRegistry, RegistryBuilder, Siblings,
};

pub const COUNTER: ModuleId = ModuleId::from_u128(0x0c01);
pub const MARKER: ModuleId = ModuleId::from_u128(0x0c02);
pub const FAULTY: ModuleId = ModuleId::from_u128(0x0c03);
pub const WATCHER: ModuleId = ModuleId::from_u128(0x0c04);
pub const DECLINING: ModuleId = ModuleId::from_u128(0x0c05);

pub const VIGOR: Uuid = Uuid::from_u128(0x7160_0000_0000_0000_0000_0000_0000_0001);

/// Persists a number. Shows it as lore and grants that much max health.
#[derive(Debug)]
pub struct Counter {
	pub value: u32,
}

impl Module for Counter {
	fn lore(&self) -> Option<Vec<String>> {
		Some(vec![format!("Count: {}", self.value)])
	}

	fn serialize(&self) -> Result<Option<String>, ModuleError> {
		Ok(Some(self.value.to_string()))
	}

	fn attribute_effects(&self) -> Vec<AttributeEffect> {
		vec![AttributeEffect::new(
			VIGOR,
			"vigor",
			AttributeKind::MaxHealth,
			AttributeOperation::AddNumber,
			f64::from(self.value),
		)]
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
			Some(raw) => raw.parse().map_err(|_| ModuleError::Payload(raw.to_string()))?,
			None => 0,
		};
		Ok(Some(Box::new(Counter { value })))
	}

	fn construct(
		&self,
		_item: &dyn ItemStore,
		args: &InitArgs,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		let value = *args.require::<u32>(0)?;
		Ok(Some(Box::new(Counter { value })))
	}
}

/// Never persists a payload.
#[derive(Debug)]
pub struct Marker;

impl Module for Marker {
	fn lore(&self) -> Option<Vec<String>> {
		Some(vec!["Marked".to_string()])
	}

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

/// Loads fine, cannot be serialized.
#[derive(Debug)]
pub struct Faulty;

impl Module for Faulty {
	fn serialize(&self) -> Result<Option<String>, ModuleError> {
		Err(ModuleError::Other("disk on fire".into()))
	}

	fn attribute_effects(&self) -> Vec<AttributeEffect> {
		vec![AttributeEffect::new(
			Uuid::from_u128(0xfa),
			"faulty",
			AttributeKind::MovementSpeed,
			AttributeOperation::AddPercentage,
			0.5,
		)]
	}
}

pub struct FaultyKind;

impl ModuleKind for FaultyKind {
	fn deserialize(
		&self,
		_payload: Option<&str>,
		_item: &dyn ItemStore,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		Ok(Some(Box::new(Faulty)))
	}

	fn construct(
		&self,
		_item: &dyn ItemStore,
		_args: &InitArgs,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		Ok(Some(Box::new(Faulty)))
	}
}

/// Remembers the names of its siblings from its last post-load hook.
#[derive(Debug, Default)]
pub struct Watcher {
	pub seen: Vec<String>,
	pub hooks: usize,
}

impl Module for Watcher {
	fn serialize(&self) -> Result<Option<String>, ModuleError> {
		Ok(Some("watching".into()))
	}

	fn post_load(&mut self, siblings: &Siblings<'_>) {
		self.seen = siblings.iter().map(|m| m.name().to_string()).collect();
		self.hooks += 1;
	}
}

pub struct WatcherKind;

impl ModuleKind for WatcherKind {
	fn deserialize(
		&self,
		_payload: Option<&str>,
		_item: &dyn ItemStore,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		Ok(Some(Box::new(Watcher::default())))
	}

	fn construct(
		&self,
		_item: &dyn ItemStore,
		_args: &InitArgs,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		Ok(Some(Box::new(Watcher::default())))
	}
}

/// Declines every attachment.
pub struct DecliningKind;

impl ModuleKind for DecliningKind {
	fn deserialize(
		&self,
		_payload: Option<&str>,
		_item: &dyn ItemStore,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		Ok(None)
	}

	fn construct(
		&self,
		_item: &dyn ItemStore,
		_args: &InitArgs,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		Ok(None)
	}
}

/// Marker-like kind that counts its deserializations and takes its time.
pub struct CountingKind {
	pub loads: Arc<AtomicUsize>,
	pub delay: Duration,
}

impl ModuleKind for CountingKind {
	fn deserialize(
		&self,
		_payload: Option<&str>,
		_item: &dyn ItemStore,
	) -> Result<Option<Box<dyn Module>>, ModuleError> {
		self.loads.fetch_add(1, Ordering::SeqCst);
		std::thread::sleep(self.delay);
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

/// Builder pre-loaded with every sample kind.
pub fn builder() -> RegistryBuilder {
	let mut builder = RegistryBuilder::new();
	builder.register("Counter", COUNTER, CounterKind).unwrap();
	builder.register("Marker", MARKER, MarkerKind).unwrap();
	builder.register("Faulty", FAULTY, FaultyKind).unwrap();
	builder.register("Watcher", WATCHER, WatcherKind).unwrap();
	builder
		.register("Declining", DECLINING, DecliningKind)
		.unwrap();
	builder
}

pub fn registry() -> Arc<ModuleRegistry> {
	Arc::new(builder().seal())
}

pub fn context() -> RecordContext {
	RecordContext::new(registry())
}

/// A tracked in-memory item and its shared handle.
pub fn tracked_item(id: u128) -> (Arc<MemoryItem>, ItemHandle) {
	let item = Arc::new(MemoryItem::tracked(ItemId::from_u128(id)));
	let handle: ItemHandle = item.clone();
	(item, handle)
}

pub fn cache_with(ctx: RecordContext, idle: Duration, clock: &sigil_core::ManualClock) -> RecordCache {
	RecordCache::with_clock(Arc::new(ctx), idle, Arc::new(clock.clone()))
}
