use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sigil_config::{CacheSettings, Config, ConfigWarning};
use sigil_primitives::ItemHandle;
use sigil_registry::ModuleRegistry;

use crate::cache::{RecordCache, RecordKey, SharedRecord};
use crate::clock::{Clock, SystemClock};
use crate::record::RecordContext;
use crate::sweeper::Sweeper;

/// Host-facing entry point: one record context, one cache, one sweeper.
#[derive(Debug)]
pub struct ItemManager {
	cache: Arc<RecordCache>,
	sweep_interval: Duration,
	sweeper: Mutex<Option<Sweeper>>,
}

impl ItemManager {
	pub fn new(ctx: RecordContext, settings: CacheSettings) -> Self {
		Self::with_clock(ctx, settings, Arc::new(SystemClock))
	}

	pub fn with_clock(ctx: RecordContext, settings: CacheSettings, clock: Arc<dyn Clock>) -> Self {
		let ctx = RecordContext {
			policy: settings.write_back,
			..ctx
		};
		Self {
			cache: Arc::new(RecordCache::with_clock(Arc::new(ctx), settings.idle, clock)),
			sweep_interval: settings.sweep_interval,
			sweeper: Mutex::new(None),
		}
	}

	/// Builds a manager from a sealed registry and a configuration.
	///
	/// # Errors
	///
	/// Fails only on invalid cache settings. Bad migration entries and
	/// unknown module names are returned as warnings.
	pub fn from_config(
		registry: Arc<ModuleRegistry>,
		config: &Config,
	) -> sigil_config::Result<(Self, Vec<ConfigWarning>)> {
		let settings = config.cache_settings()?;
		let (ctx, warnings) = RecordContext::from_config(registry, config);
		for warning in &warnings {
			tracing::warn!(%warning, "configuration entry skipped");
		}
		Ok((Self::new(ctx, settings), warnings))
	}

	pub fn cache(&self) -> &Arc<RecordCache> {
		&self.cache
	}

	pub fn context(&self) -> &Arc<RecordContext> {
		self.cache.context()
	}

	/// Returns the record of a tracked item. Untracked items have none.
	pub fn record(&self, item: &ItemHandle) -> Option<SharedRecord> {
		let key = RecordKey::for_item(Arc::clone(item))?;
		Some(self.cache.get(&key))
	}

	/// Returns the record of `item`, tracking it first if needed.
	pub fn track(&self, item: &ItemHandle) -> SharedRecord {
		self.cache.get(&RecordKey::track(Arc::clone(item)))
	}

	/// Resets the idle timer of `item`'s resident record.
	pub fn refresh(&self, item: &ItemHandle) -> bool {
		RecordKey::for_item(Arc::clone(item)).is_some_and(|key| self.cache.refresh(key.id()))
	}

	/// Starts the background sweeper if it is not already running.
	///
	/// # Panics
	///
	/// Panics if called outside a tokio runtime.
	pub fn spawn_sweeper(&self) {
		let mut sweeper = self.sweeper.lock();
		if sweeper.as_ref().is_some_and(|s| !s.is_finished()) {
			return;
		}
		*sweeper = Some(Sweeper::spawn(Arc::clone(&self.cache), self.sweep_interval));
	}

	/// Stops the sweeper, then writes back and evicts every record.
	pub async fn shutdown(&self) -> usize {
		let sweeper = self.sweeper.lock().take();
		if let Some(sweeper) = sweeper {
			sweeper.stop().await;
		}
		self.cache.shutdown()
	}
}
