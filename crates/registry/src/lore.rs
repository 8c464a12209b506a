//! Weight-ordered composition of module lore.
//!
//! Every module may contribute lore lines. The item shows them grouped by
//! module, in the order configured by the host. Modules absent from that
//! order contribute nothing; without any order at all the item's lore is
//! left alone.

use rustc_hash::FxHashMap;
use sigil_primitives::ModuleId;

use crate::module::ModuleSet;
use crate::registry::ModuleRegistry;

/// Ordering weights for module lore sections. Lower weights render first.
#[derive(Debug, Clone, Default)]
pub struct LoreOrder {
	weights: FxHashMap<ModuleId, u32>,
	configured: bool,
}

impl LoreOrder {
	/// No order at all; [`Self::render`] always yields `None`.
	pub fn unconfigured() -> Self {
		Self::default()
	}

	/// Weights ids by position. A repeated id keeps its first position.
	pub fn from_ids<I: IntoIterator<Item = ModuleId>>(ids: I) -> Self {
		let mut weights = FxHashMap::default();
		for (position, id) in ids.into_iter().enumerate() {
			let weight = u32::try_from(position).unwrap_or(u32::MAX);
			weights.entry(id).or_insert(weight);
		}
		Self {
			weights,
			configured: true,
		}
	}

	/// Uses explicit weights.
	pub fn from_weights<I: IntoIterator<Item = (ModuleId, u32)>>(weights: I) -> Self {
		Self {
			weights: weights.into_iter().collect(),
			configured: true,
		}
	}

	/// Weights modules by the position of their name.
	///
	/// Names the registry does not know are returned alongside the order.
	pub fn from_names<'a, I>(names: I, registry: &ModuleRegistry) -> (Self, Vec<String>)
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut unresolved = Vec::new();
		let ids: Vec<ModuleId> = names
			.into_iter()
			.filter_map(|name| {
				let id = registry.resolve_by_name(name);
				if id.is_none() {
					unresolved.push(name.to_string());
				}
				id
			})
			.collect();
		(Self::from_ids(ids), unresolved)
	}

	/// Returns true for every order except [`Self::unconfigured`], including
	/// an empty one.
	pub fn is_configured(&self) -> bool {
		self.configured
	}

	pub fn weight(&self, id: ModuleId) -> Option<u32> {
		self.weights.get(&id).copied()
	}

	/// Renders the lore of `modules`.
	///
	/// `None` means "leave the item's lore untouched". Otherwise sections of
	/// weighted modules follow ascending weight; equal weights keep
	/// attachment order.
	pub fn render(&self, modules: &ModuleSet) -> Option<Vec<String>> {
		if !self.is_configured() {
			return None;
		}
		let mut weighted: Vec<_> = modules
			.iter()
			.filter_map(|module| self.weight(module.id()).map(|w| (w, module)))
			.collect();
		weighted.sort_by_key(|&(weight, _)| weight);

		let mut lore = Vec::new();
		for (_, module) in weighted {
			if let Some(lines) = module.lore() {
				lore.extend(lines);
			}
		}
		Some(lore)
	}
}
