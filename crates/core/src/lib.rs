//! Item records and the record cache.
//!
//! An [`ItemRecord`] holds the live modules of one tracked item. The
//! [`RecordCache`] keeps records resident while items are in use, loads each
//! at most once, and writes it back to the item when it goes idle. The
//! [`ItemManager`] bundles both with a background [`Sweeper`] for hosts.

mod cache;
mod clock;
mod manager;
mod record;
mod sweeper;

pub use cache::{DEFAULT_IDLE, RecordCache, RecordKey, SharedRecord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::ItemManager;
pub use record::{ItemRecord, RecordContext};
pub use sigil_config::{CacheSettings, WriteBackPolicy};
pub use sweeper::Sweeper;
