//! Integration tests for loading, mutating and writing back item records.

mod common;

use std::sync::Arc;

use common::*;
use sigil_core::{ItemRecord, RecordContext, WriteBackPolicy};
use sigil_primitives::{ItemId, ItemStore, MemoryItem, ModuleId, TagKey, encode_id_list};
use sigil_registry::{InitArgs, LoreOrder, MigrationTable, ModuleRef};

fn load(ctx: RecordContext, id: u128, item: &Arc<MemoryItem>) -> ItemRecord {
	ItemRecord::load(ItemId::from_u128(id), item.clone(), Arc::new(ctx))
}

/// A module listed under a retired id loads under the end of its chain and
/// is persisted under that id on the next write-back.
#[test]
fn test_migration_chain() {
	let a = ModuleId::from_u128(0xa);
	let b = ModuleId::from_u128(0xb);
	let mut migrations = MigrationTable::new();
	migrations.insert(a, b).unwrap();
	migrations.insert(b, COUNTER).unwrap();

	let (item, _) = tracked_item(1);
	item.set_tag(TagKey::MODULE_LIST, a.to_string());
	item.set_tag(TagKey::from(COUNTER), "7".into());

	let record = load(context().with_migrations(migrations), 1, &item);
	assert!(record.has_module(COUNTER));
	assert!(!record.modules().contains(a));
	assert_eq!(record.downcast_ref::<Counter>(COUNTER).unwrap().value, 7);
	assert_eq!(item.tag(TagKey::MODULE_LIST), Some(a.to_string()));

	record.write_back();
	assert_eq!(item.tag(TagKey::MODULE_LIST), Some(COUNTER.to_string()));
}

/// Bad tokens, unknown ids and declining kinds are dropped; the rest loads.
#[test]
fn test_load_skips_broken_entries() {
	let (item, _) = tracked_item(1);
	let unknown = ModuleId::from_u128(0xdead);
	let list = format!("garbage:{COUNTER}:{unknown}:{DECLINING}:{MARKER}");
	item.set_tag(TagKey::MODULE_LIST, list.clone());

	let record = load(context(), 1, &item);
	assert_eq!(record.modules().ids().collect::<Vec<_>>(), vec![COUNTER, MARKER]);
	assert_eq!(item.tag(TagKey::MODULE_LIST), Some(list));

	record.write_back();
	assert_eq!(item.tag(TagKey::MODULE_LIST), Some(encode_id_list(&[COUNTER, MARKER])));
}

#[test]
fn test_untouched_item_loads_empty() {
	let (item, _) = tracked_item(1);
	let record = load(context(), 1, &item);
	assert!(record.modules().is_empty());
	assert_eq!(record.tracking_id(), ItemId::from_u128(1));
}

/// Unknown names and declining kinds leave the item untouched.
#[test]
fn test_add_unknown_is_noop() {
	let (item, _) = tracked_item(1);
	let mut record = load(context(), 1, &item);

	assert!(!record.add_module("Nonexistent", &InitArgs::new()));
	assert!(!record.add_module(ModuleId::from_u128(0xdead), &InitArgs::new()));
	assert!(!record.add_module("Declining", &InitArgs::new()));
	assert!(!record.add_module("Counter", &InitArgs::new()));
	assert!(record.modules().is_empty());
	assert!(!item.has_tag(TagKey::MODULE_LIST));
}

#[test]
fn test_add_writes_back_immediately() {
	let (item, _) = tracked_item(1);
	let mut record = load(context(), 1, &item);

	assert!(record.add_module("Counter", &InitArgs::new().with(5u32)));
	assert_eq!(item.tag(TagKey::MODULE_LIST), Some(COUNTER.to_string()));
	assert_eq!(item.tag(TagKey::from(COUNTER)).as_deref(), Some("5"));

	let effects = item.attribute_effects();
	assert_eq!(effects.len(), 1);
	assert_eq!(effects[0].id, VIGOR);
	assert_eq!(effects[0].amount, 5.0);
	assert_eq!(item.lore(), None);
}

#[test]
fn test_add_replaces_same_id() {
	let (item, _) = tracked_item(1);
	let mut record = load(context(), 1, &item);

	assert!(record.add_module("Counter", &InitArgs::new().with(1u32)));
	assert!(record.add_module(COUNTER, &InitArgs::new().with(2u32)));
	assert_eq!(record.modules().len(), 1);
	assert_eq!(record.downcast_ref::<Counter>("Counter").unwrap().value, 2);
	assert_eq!(item.tag(TagKey::from(COUNTER)).as_deref(), Some("2"));
}

#[test]
fn test_deferred_policy_waits_for_flush() {
	let (item, _) = tracked_item(1);
	let ctx = context().with_policy(WriteBackPolicy::Deferred);
	let mut record = load(ctx, 1, &item);

	assert!(record.add_module("Counter", &InitArgs::new().with(3u32)));
	assert!(!item.has_tag(TagKey::MODULE_LIST));

	record.write_back();
	assert_eq!(item.tag(TagKey::from(COUNTER)).as_deref(), Some("3"));
}

/// A module without a payload is still listed.
#[test]
fn test_write_back_lists_payloadless_modules() {
	let (item, _) = tracked_item(1);
	let mut record = load(context(), 1, &item);
	record.add_module("Marker", &InitArgs::new());
	record.add_module("Counter", &InitArgs::new().with(9u32));

	assert_eq!(item.tag(TagKey::MODULE_LIST), Some(encode_id_list(&[MARKER, COUNTER])));
	assert!(!item.has_tag(TagKey::from(MARKER)));
	assert_eq!(item.tag(TagKey::from(COUNTER)).as_deref(), Some("9"));
}

/// A failing serializer keeps its id and old payload; its effects are
/// skipped and the other modules still write.
#[test]
fn test_serialize_failure_keeps_previous_payload() {
	let (item, _) = tracked_item(1);
	item.set_tag(TagKey::MODULE_LIST, format!("{FAULTY}:{COUNTER}"));
	item.set_tag(TagKey::from(FAULTY), "old".into());
	item.set_tag(TagKey::from(COUNTER), "4".into());

	let mut record = load(context(), 1, &item);
	assert!(record.has_module("Faulty"));
	record.downcast_mut::<Counter>("Counter").unwrap().value = 6;
	record.write_back();

	assert_eq!(item.tag(TagKey::MODULE_LIST), Some(format!("{FAULTY}:{COUNTER}")));
	assert_eq!(item.tag(TagKey::from(FAULTY)).as_deref(), Some("old"));
	assert_eq!(item.tag(TagKey::from(COUNTER)).as_deref(), Some("6"));
	let effects = item.attribute_effects();
	assert_eq!(effects.len(), 1);
	assert_eq!(effects[0].id, VIGOR);
}

#[test]
fn test_remove_module() {
	let (item, _) = tracked_item(1);
	let mut record = load(context(), 1, &item);
	record.add_module("Counter", &InitArgs::new().with(1u32));
	record.add_module("Marker", &InitArgs::new());

	assert!(record.remove_module("Counter"));
	assert!(!record.remove_module("Counter"));
	assert!(!record.remove_module("Nonexistent"));
	assert_eq!(item.tag(TagKey::MODULE_LIST), Some(MARKER.to_string()));
	assert!(item.attribute_effects().is_empty());
}

/// Lore follows the configured order; unordered modules are left out.
#[test]
fn test_lore_rendering() {
	let (item, _) = tracked_item(1);
	let ctx = context().with_lore_order(LoreOrder::from_ids([MARKER, COUNTER]));
	let mut record = load(ctx, 1, &item);

	record.add_module("Counter", &InitArgs::new().with(2u32));
	record.add_module("Watcher", &InitArgs::new());
	record.add_module("Marker", &InitArgs::new());
	assert_eq!(
		item.lore(),
		Some(vec!["Marked".to_string(), "Count: 2".to_string()])
	);
}

/// Every hook runs once after loading with all siblings in place; a later
/// attachment runs only the new module's hook.
#[test]
fn test_post_load_hooks() {
	let (item, _) = tracked_item(1);
	item.set_tag(TagKey::MODULE_LIST, format!("{WATCHER}:{COUNTER}:{MARKER}"));

	let mut record = load(context(), 1, &item);
	let watcher = record.downcast_ref::<Watcher>("Watcher").unwrap();
	assert_eq!(watcher.seen, vec!["Counter".to_string(), "Marker".to_string()]);
	assert_eq!(watcher.hooks, 1);

	record.remove_module("Marker");
	record.add_module("Faulty", &InitArgs::new());
	let watcher = record.downcast_ref::<Watcher>("Watcher").unwrap();
	assert_eq!(watcher.hooks, 1);
}

#[test]
fn test_attach_created_module() {
	let (item, handle) = tracked_item(1);
	let mut record = load(context(), 1, &item);

	let module = record
		.context()
		.registry
		.create_from_data(ModuleRef::from("Counter"), Some("11"), handle.as_ref())
		.unwrap();
	assert!(record.attach(module).is_none());
	assert_eq!(record.downcast_ref::<Counter>(COUNTER).unwrap().value, 11);
	assert_eq!(item.tag(TagKey::from(COUNTER)).as_deref(), Some("11"));
}

#[test]
fn test_typed_lookup() {
	let (item, _) = tracked_item(1);
	let mut record = load(context(), 1, &item);
	record.add_module("Counter", &InitArgs::new().with(1u32));

	assert!(record.downcast_ref::<Counter>("Counter").is_some());
	assert!(record.downcast_ref::<Marker>("Counter").is_none());
	assert!(record.downcast_ref::<Counter>("Marker").is_none());
	assert_eq!(record.module(COUNTER).map(|m| m.name()), Some("Counter"));
}

#[derive(Debug, Clone)]
enum Op {
	Add(&'static str, u32),
	Remove(&'static str),
}

fn op_strategy() -> impl proptest::strategy::Strategy<Value = Op> {
	use proptest::prelude::*;
	let name = prop_oneof![Just("Counter"), Just("Marker"), Just("Watcher")];
	prop_oneof![
		(name.clone(), any::<u32>()).prop_map(|(n, v)| Op::Add(n, v)),
		name.prop_map(Op::Remove),
	]
}

proptest::proptest! {
	/// Under immediate write-back the item always lists exactly the
	/// record's modules, and reloading the item restores them.
	#[test]
	fn prop_item_mirrors_record(ops in proptest::collection::vec(op_strategy(), 1..24)) {
		let (item, _) = tracked_item(1);
		let mut record = load(context(), 1, &item);
		for op in ops {
			let mutated = match op {
				Op::Add(name, value) => {
					proptest::prop_assert!(record.add_module(name, &InitArgs::new().with(value)));
					true
				}
				Op::Remove(name) => {
					let attached = record.has_module(name);
					proptest::prop_assert_eq!(record.remove_module(name), attached);
					attached
				}
			};
			if mutated || item.has_tag(TagKey::MODULE_LIST) {
				let ids: Vec<ModuleId> = record.modules().ids().collect();
				proptest::prop_assert_eq!(item.tag(TagKey::MODULE_LIST), Some(encode_id_list(&ids)));
			}
		}

		let reloaded = load(context(), 1, &item);
		let expected: Vec<ModuleId> = record.modules().ids().collect();
		proptest::prop_assert_eq!(reloaded.modules().ids().collect::<Vec<_>>(), expected);
		if let Some(counter) = record.downcast_ref::<Counter>("Counter") {
			let reloaded_value = reloaded.downcast_ref::<Counter>("Counter").map(|c| c.value);
			proptest::prop_assert_eq!(reloaded_value, Some(counter.value));
		}
	}
}
