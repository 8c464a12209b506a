//! Core types for module attachments: identifiers, tag keys, the module-list
//! codec, attribute effects, and the item tag-store boundary.

/// Attribute effect data contributed by modules.
pub mod attribute;
/// Colon-delimited module-list encoding.
pub mod codec;
/// Identifier types for modules, items and tags.
pub mod id;
/// Item tag-store boundary and an in-memory implementation.
pub mod item;

pub use attribute::{AttributeEffect, AttributeKind, AttributeOperation};
pub use codec::{CodecError, DELIMITER, decode_id_list, encode_id_list, parse_id_list};
pub use id::{ItemId, ModuleId, TagKey};
pub use item::{ItemHandle, ItemStore, MemoryItem, ensure_tracking_id, tracking_id};
pub use uuid::Uuid;
