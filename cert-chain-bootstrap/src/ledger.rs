//! Which CAs have been generated during a run.

use std::collections::HashSet;

use crate::entity::Tier;

/// Names generated so far in a run, per CA tier.
///
/// Leaf certificates are never memoized: marking a leaf is a no-op and it
/// never reads as generated.
#[derive(Clone, Debug, Default)]
pub struct GenerationLedger {
	roots: HashSet<String>,
	intermediates: HashSet<String>,
}

impl GenerationLedger {
	/// An empty ledger.
	pub fn new() -> Self {
		Self::default()
	}

	/// Record `name` as generated. Returns false if it already was, or if
	/// `tier` is not memoized.
	pub fn mark_generated(&mut self, tier: Tier, name: &str) -> bool {
		match tier {
			Tier::Root => self.roots.insert(name.to_string()),
			Tier::Intermediate => self.intermediates.insert(name.to_string()),
			Tier::Leaf => false,
		}
	}

	/// Whether `name` has been generated in `tier` during this run.
	pub fn is_generated(&self, tier: Tier, name: &str) -> bool {
		match tier {
			Tier::Root => self.roots.contains(name),
			Tier::Intermediate => self.intermediates.contains(name),
			Tier::Leaf => false,
		}
	}

	/// Whether `name` has been generated as any kind of CA.
	pub fn is_known_ca(&self, name: &str) -> bool {
		self.is_generated(Tier::Root, name) || self.is_generated(Tier::Intermediate, name)
	}

	/// Number of names recorded in `tier`.
	pub fn len(&self, tier: Tier) -> usize {
		match tier {
			Tier::Root => self.roots.len(),
			Tier::Intermediate => self.intermediates.len(),
			Tier::Leaf => 0,
		}
	}
}
