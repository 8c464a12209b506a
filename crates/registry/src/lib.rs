//! Module kind registry.
//!
//! # Purpose
//!
//! Feature modules attach persistent metadata to items without knowing about
//! each other. This crate is the dispatch point: it maps a module's permanent
//! [`ModuleId`] and its display name to a [`ModuleKind`] that knows how to
//! rebuild the module from a stored payload or create it from scratch.
//!
//! # Mental Model
//!
//! 1. **Open:** during the host's load phase every provider registers its
//!    kinds on a [`RegistryBuilder`]. Lookups are not available yet.
//! 2. **Sealed:** [`RegistryBuilder::seal`] consumes the builder and yields an
//!    immutable [`ModuleRegistry`]. Registration is no longer possible;
//!    lookups, materialization and construction are.
//! 3. **Use:** item records ask the registry to [`ModuleRegistry::materialize`]
//!    stored ids (after [`MigrationTable`] resolution) and to
//!    [`ModuleRegistry::construct`] newly attached modules.
//!
//! The two states are two types, so calling a lookup while open or
//! registering after sealing does not compile.
//!
//! # Invariants
//!
//! - Ids and names are each unique; a failed registration leaves the builder
//!   unchanged.
//! - Registering the identical `(name, id, kind)` again is a no-op success.
//! - Modules handed out by the registry always carry the id and name they
//!   were registered under.
//! - A migration table never contains a cycle.

mod builder;
mod error;
mod kind;
pub mod lore;
pub mod migration;
mod module;
mod provider;
mod registry;

pub use builder::RegistryBuilder;
pub use error::{MigrationError, ModuleError, RegistrationError};
pub use kind::{InitArgs, ModuleKind};
pub use lore::LoreOrder;
pub use migration::{MIGRATION_SEPARATOR, MigrationTable, parse_migration_entry};
pub use module::{AsAny, AttachedModule, Module, ModuleSet, Siblings};
pub use provider::ModuleProvider;
pub use registry::{ModuleDescriptor, ModuleRef, ModuleRegistry};
pub use sigil_primitives::{ItemStore, ModuleId};

#[cfg(test)]
pub(crate) mod test_fixtures;
