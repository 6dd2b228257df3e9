//! Drives generation of a whole chain document in dependency order.
//!
//! Roots are generated first, then intermediates, then leaves. Before an
//! intermediate or leaf is generated, its parent is generated too when the
//! parent is declared in the document's `intermediate_ca` list, however deep
//! that chain goes. A parent that is neither declared nor generated in this
//! run is assumed to exist on the system already and only produces a warning.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::backend::CertificateBackend;
use crate::document::ChainDocument;
use crate::entity::{IntermediateCa, LeafCertificate, PolicyAttributes, RootCa, Tier};
use crate::layout::ConfigLayout;
use crate::ledger::GenerationLedger;
use crate::reference::ReferenceLoader;
use crate::render;
use crate::validate;
use crate::{Error, Result};

/// A parent CA that was neither generated in this run nor declared in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedParent {
	/// Tier of the entity naming the parent
	pub tier: Tier,
	/// Name of the entity naming the parent, when it has one
	pub dependent: Option<String>,
	/// The parent name that could not be found
	pub parent: String,
}

/// Resolved intermediate declarations, in order, with a first-wins name index.
struct IntermediateIndex {
	entries: Vec<IntermediateCa>,
	by_name: HashMap<String, usize>,
}

impl IntermediateIndex {
	fn build(loader: &ReferenceLoader, document: &ChainDocument) -> Result<Self> {
		let entries = document
			.intermediate_ca()
			.iter()
			.map(|source| loader.resolve(source))
			.collect::<Result<Vec<_>>>()?;
		let mut by_name = HashMap::new();
		for (i, entry) in entries.iter().enumerate() {
			if let Some(name) = &entry.name {
				by_name.entry(name.clone()).or_insert(i);
			}
		}
		Ok(Self { entries, by_name })
	}

	fn get(&self, name: &str) -> Option<&IntermediateCa> {
		self.by_name.get(name).map(|&i| &self.entries[i])
	}
}

/// Generates every entity of a [`ChainDocument`] through a [`CertificateBackend`].
pub struct ChainResolver<B> {
	loader: ReferenceLoader,
	layout: ConfigLayout,
	backend: B,
	ledger: GenerationLedger,
	in_progress: Vec<String>,
	unresolved: Vec<UnresolvedParent>,
	leaves: usize,
}

impl<B: CertificateBackend> ChainResolver<B> {
	/// A resolver with an empty ledger.
	pub fn new(loader: ReferenceLoader, layout: ConfigLayout, backend: B) -> Self {
		Self {
			loader,
			layout,
			backend,
			ledger: GenerationLedger::new(),
			in_progress: Vec::new(),
			unresolved: Vec::new(),
			leaves: 0,
		}
	}

	/// Names generated so far.
	pub fn ledger(&self) -> &GenerationLedger {
		&self.ledger
	}

	/// Parents that could not be found, in the order they were reported.
	pub fn unresolved_parents(&self) -> &[UnresolvedParent] {
		&self.unresolved
	}

	/// Number of leaf certificates generated so far.
	pub fn leaves_generated(&self) -> usize {
		self.leaves
	}

	/// The backend entities are generated with.
	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Generate every tier of `document`. Stops at the first error.
	pub fn run(&mut self, document: &ChainDocument) -> Result<()> {
		// a failed run leaves its partial parent chain behind
		self.in_progress.clear();

		if !document.root_ca().is_empty() {
			info!("Generating root CAs...");
			for source in document.root_ca() {
				let root = self.loader.resolve(source)?;
				self.generate_root(&root)?;
			}
		}

		if !document.intermediate_ca().is_empty() || !document.leaf_certificate().is_empty() {
			let index = IntermediateIndex::build(&self.loader, document)?;

			if !index.entries.is_empty() {
				info!("Generating intermediate CAs...");
				for ca in &index.entries {
					self.generate_intermediate(&index, ca)?;
				}
			}

			if !document.leaf_certificate().is_empty() {
				info!("Generating leaf certificates...");
				for source in document.leaf_certificate() {
					let leaf = self.loader.resolve(source)?;
					self.generate_leaf(&index, &leaf)?;
				}
			}
		}

		Ok(())
	}

	fn generate_root(&mut self, root: &RootCa) -> Result<()> {
		let request = validate::root(root)?;
		if self.ledger.is_generated(Tier::Root, &request.name) {
			debug!("Root CA {} already generated, skipping", request.name);
			return Ok(());
		}

		info!("Generating root CA {}...", request.name);
		self.persist_config(
			Tier::Root,
			&request.name,
			root.overwrite_config,
			root.config.as_ref(),
		)?;
		self.backend.generate_root(&request)?;
		self.ledger.mark_generated(Tier::Root, &request.name);
		Ok(())
	}

	fn generate_intermediate(&mut self, index: &IntermediateIndex, ca: &IntermediateCa) -> Result<()> {
		let name = ca.name.as_deref().filter(|n| !n.is_empty());
		if let Some(name) = name {
			if self.ledger.is_generated(Tier::Intermediate, name) {
				debug!("Intermediate CA {name} already generated, skipping");
				return Ok(());
			}
			if self.in_progress.iter().any(|n| n == name) {
				let mut cycle = self.in_progress.clone();
				cycle.push(name.to_string());
				return Err(Error::CircularChainReference(cycle));
			}
			self.in_progress.push(name.to_string());
		}

		self.ensure_parent(
			index,
			Tier::Intermediate,
			name,
			ca.is_last_in_chain,
			ca.parent_chain_name.as_deref(),
		)?;

		let request = validate::intermediate(ca)?;
		info!(
			"Generating intermediate CA {} signed by {}...",
			request.name, request.parent_name
		);
		self.persist_config(
			Tier::Intermediate,
			&request.name,
			ca.overwrite_config,
			ca.config.as_ref(),
		)?;
		self.backend.generate_intermediate(&request)?;
		self.ledger.mark_generated(Tier::Intermediate, &request.name);
		self.in_progress.pop();
		Ok(())
	}

	fn generate_leaf(&mut self, index: &IntermediateIndex, leaf: &LeafCertificate) -> Result<()> {
		let name = leaf.name.as_deref().filter(|n| !n.is_empty());
		self.ensure_parent(
			index,
			Tier::Leaf,
			name,
			leaf.issuer_is_root,
			leaf.issuer_name.as_deref(),
		)?;

		let request = validate::leaf(leaf)?;
		info!(
			"Generating leaf certificate {} issued by {}...",
			request.name, request.issuer_name
		);
		self.persist_config(
			Tier::Leaf,
			&request.name,
			leaf.overwrite_config,
			leaf.config.as_ref(),
		)?;
		self.backend.generate_leaf(&request)?;
		self.leaves += 1;
		Ok(())
	}

	/// Generate `parent` first when it is a declared intermediate, and warn
	/// when it is unknown to this run.
	fn ensure_parent(
		&mut self,
		index: &IntermediateIndex,
		tier: Tier,
		dependent: Option<&str>,
		parent_is_root: bool,
		parent: Option<&str>,
	) -> Result<()> {
		// a missing parent name is reported by validation
		let Some(parent) = parent.filter(|p| !p.is_empty()) else {
			return Ok(());
		};

		if !parent_is_root && !self.ledger.is_generated(Tier::Intermediate, parent) {
			if let Some(parent_ca) = index.get(parent) {
				debug!("Generating parent chain {parent} first");
				self.generate_intermediate(index, parent_ca)?;
			}
		}

		if !self.ledger.is_known_ca(parent) {
			warn!(
				"The {tier} {} references a ca chain that was not generated: {parent}. It may exist on the system, but it was not generated by this run.",
				dependent.unwrap_or("<unnamed>")
			);
			self.unresolved.push(UnresolvedParent {
				tier,
				dependent: dependent.map(str::to_string),
				parent: parent.to_string(),
			});
		}
		Ok(())
	}

	/// Render and write the config of `name`, unless a config is already in
	/// place and overwriting was not asked for.
	fn persist_config(
		&self,
		tier: Tier,
		name: &str,
		overwrite: bool,
		policy: Option<&PolicyAttributes>,
	) -> Result<()> {
		let path = self.layout.path(tier, name);
		if path.exists() && !overwrite {
			debug!("Keeping existing config {}", path.display());
			return Ok(());
		}

		let policy = policy.ok_or(Error::MissingRequiredField {
			tier,
			field: "config",
		})?;
		let contents = match tier {
			Tier::Root | Tier::Intermediate => render::ca(policy)?,
			Tier::Leaf => render::leaf(policy)?,
		};
		if self.layout.write(&path, &contents)? {
			debug!("Wrote config {}", path.display());
		}
		Ok(())
	}
}
