//! Identity-keyed write-back cache of item records.
//!
//! # Lifecycle
//!
//! Per tracking id: Absent → Loading → Resident → Evicted. Evicted is
//! terminal for that record; the next access loads a fresh one from the item.
//!
//! # Invariants
//!
//! - At most one record exists per tracking id. Concurrent first accesses
//!   to the same id wait for a single load; different ids never wait on each
//!   other's loads.
//! - A record leaves the cache only after its write-back has run, so a
//!   reload never observes an item older than the evicted state.
//! - An entry touched by `get` or `refresh` after an eviction picked it
//!   stays resident; the caller keeps a live record, never an evicted one.
//! - Lock order is record → map. The map lock is never held while waiting
//!   for a record.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use sigil_primitives::{ItemHandle, ItemId, ensure_tracking_id, tracking_id};

use crate::clock::{Clock, SystemClock};
use crate::record::{ItemRecord, RecordContext};

/// Idle time after which a record is evicted unless configured otherwise.
pub const DEFAULT_IDLE: Duration = Duration::from_secs(15 * 60);

/// A record shared between the cache and its callers.
pub type SharedRecord = Arc<Mutex<ItemRecord>>;

/// Cache key: a tracking id plus the live handle it was presented with.
///
/// Equality and hashing use the tracking id only.
#[derive(Clone)]
pub struct RecordKey {
	id: ItemId,
	item: ItemHandle,
}

impl RecordKey {
	pub fn new(id: ItemId, item: ItemHandle) -> Self {
		Self { id, item }
	}

	/// Keys a tracked item. Returns `None` for untracked items.
	pub fn for_item(item: ItemHandle) -> Option<Self> {
		let id = tracking_id(item.as_ref())?;
		Some(Self { id, item })
	}

	/// Keys an item, assigning a tracking id first if it has none.
	pub fn track(item: ItemHandle) -> Self {
		let id = ensure_tracking_id(item.as_ref());
		Self { id, item }
	}

	pub fn id(&self) -> ItemId {
		self.id
	}

	pub fn item(&self) -> &ItemHandle {
		&self.item
	}
}

impl PartialEq for RecordKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for RecordKey {}

impl Hash for RecordKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for RecordKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("RecordKey").field(&self.id).finish()
	}
}

/// One cache slot. Empty while its record is loading.
#[derive(Default)]
struct Slot {
	record: OnceLock<SharedRecord>,
}

struct Entry {
	slot: Arc<Slot>,
	last_access: Instant,
	/// Bumped on every touch.
	touches: u64,
}

impl Entry {
	fn touch(&mut self, now: Instant) {
		self.last_access = now;
		self.touches = self.touches.wrapping_add(1);
	}
}

/// An entry as seen when an eviction picked it.
struct Candidate {
	id: ItemId,
	slot: Arc<Slot>,
	touches: u64,
}

impl Candidate {
	fn of(id: ItemId, entry: &Entry) -> Self {
		Self {
			id,
			slot: Arc::clone(&entry.slot),
			touches: entry.touches,
		}
	}
}

/// Write-back cache of [`ItemRecord`]s keyed by tracking id.
pub struct RecordCache {
	ctx: Arc<RecordContext>,
	entries: Mutex<FxHashMap<ItemId, Entry>>,
	idle: Duration,
	clock: Arc<dyn Clock>,
}

impl RecordCache {
	/// A cache with the default idle time and the system clock.
	pub fn new(ctx: Arc<RecordContext>) -> Self {
		Self::with_clock(ctx, DEFAULT_IDLE, Arc::new(SystemClock))
	}

	pub fn with_clock(ctx: Arc<RecordContext>, idle: Duration, clock: Arc<dyn Clock>) -> Self {
		Self {
			ctx,
			entries: Mutex::new(FxHashMap::default()),
			idle,
			clock,
		}
	}

	pub fn context(&self) -> &Arc<RecordContext> {
		&self.ctx
	}

	pub fn idle(&self) -> Duration {
		self.idle
	}

	/// Returns the record for `key`, loading it on first access.
	///
	/// A resident record is repointed at `key`'s live handle when that
	/// handle differs from the one it holds; module state is kept.
	pub fn get(&self, key: &RecordKey) -> SharedRecord {
		let slot = {
			let now = self.clock.now();
			let mut entries = self.entries.lock();
			let entry = entries.entry(key.id).or_insert_with(|| Entry {
				slot: Arc::new(Slot::default()),
				last_access: now,
				touches: 0,
			});
			entry.touch(now);
			Arc::clone(&entry.slot)
		};

		let mut loaded = false;
		let record = slot.record.get_or_init(|| {
			loaded = true;
			let record = ItemRecord::load(key.id, Arc::clone(&key.item), Arc::clone(&self.ctx));
			Arc::new(Mutex::new(record))
		});
		if !loaded {
			let mut guard = record.lock();
			if !Arc::ptr_eq(guard.item(), &key.item) {
				tracing::trace!(item = %key.id, "cache.reattach");
				guard.set_item(Arc::clone(&key.item));
			}
		}
		Arc::clone(record)
	}

	/// Returns the resident record for `id` without loading or touching it.
	pub fn peek(&self, id: ItemId) -> Option<SharedRecord> {
		let entries = self.entries.lock();
		entries.get(&id)?.slot.record.get().cloned()
	}

	/// Resets the idle timer of a resident record. Returns false if `id` is
	/// not resident.
	pub fn refresh(&self, id: ItemId) -> bool {
		let now = self.clock.now();
		let mut entries = self.entries.lock();
		match entries.get_mut(&id) {
			Some(entry) if entry.slot.record.get().is_some() => {
				entry.touch(now);
				true
			}
			_ => false,
		}
	}

	pub fn contains(&self, id: ItemId) -> bool {
		self.entries.lock().contains_key(&id)
	}

	/// Number of cached ids, including ones still loading.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Evicts every record idle for at least the configured idle time.
	///
	/// Each record is written back before it is dropped. A record touched
	/// during its write-back stays resident. Returns the number evicted.
	pub fn evict_expired(&self) -> usize {
		let now = self.clock.now();
		let candidates: Vec<Candidate> = {
			let entries = self.entries.lock();
			entries
				.iter()
				.filter(|(_, entry)| now.saturating_duration_since(entry.last_access) >= self.idle)
				.map(|(&id, entry)| Candidate::of(id, entry))
				.collect()
		};

		let evicted = candidates
			.iter()
			.filter(|candidate| self.evict(candidate))
			.count();
		if evicted > 0 {
			tracing::debug!(evicted, remaining = self.len(), "cache.sweep");
		}
		evicted
	}

	/// Writes back and evicts `id` now.
	///
	/// Returns false if it was not resident, or if another caller touched it
	/// meanwhile; that caller's record then stays cached.
	pub fn invalidate(&self, id: ItemId) -> bool {
		match self.candidate(id) {
			Some(candidate) => self.evict(&candidate),
			None => false,
		}
	}

	/// Writes back every resident record. Records stay resident.
	pub fn flush_all(&self) -> usize {
		let records: Vec<SharedRecord> = {
			let entries = self.entries.lock();
			entries
				.values()
				.filter_map(|entry| entry.slot.record.get().cloned())
				.collect()
		};
		for record in &records {
			record.lock().write_back();
		}
		tracing::debug!(flushed = records.len(), "cache.flush");
		records.len()
	}

	/// Writes back and evicts every resident record.
	pub fn shutdown(&self) -> usize {
		let candidates: Vec<Candidate> = {
			let entries = self.entries.lock();
			entries
				.iter()
				.map(|(&id, entry)| Candidate::of(id, entry))
				.collect()
		};
		let evicted = candidates
			.iter()
			.filter(|candidate| self.evict(candidate))
			.count();
		tracing::info!(evicted, "cache.shutdown");
		evicted
	}

	fn candidate(&self, id: ItemId) -> Option<Candidate> {
		let entries = self.entries.lock();
		entries.get(&id).map(|entry| Candidate::of(id, entry))
	}

	/// Writes back the candidate's record, then drops its entry unless the
	/// slot was replaced or touched since the candidate was taken.
	///
	/// Slots still loading are left alone.
	fn evict(&self, candidate: &Candidate) -> bool {
		let Some(record) = candidate.slot.record.get() else {
			return false;
		};
		let guard = record.lock();
		guard.write_back();

		let mut entries = self.entries.lock();
		let untouched = entries.get(&candidate.id).is_some_and(|entry| {
			Arc::ptr_eq(&entry.slot, &candidate.slot) && entry.touches == candidate.touches
		});
		if untouched {
			entries.remove(&candidate.id);
			tracing::debug!(item = %candidate.id, "cache.evict");
		} else {
			tracing::trace!(item = %candidate.id, "cache.evict.touched");
		}
		untouched
	}
}

impl fmt::Debug for RecordCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RecordCache")
			.field("entries", &self.len())
			.field("idle", &self.idle)
			.finish_non_exhaustive()
	}
}
