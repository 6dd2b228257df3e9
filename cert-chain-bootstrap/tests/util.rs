#![allow(dead_code)]

use cert_chain_bootstrap::backend::{IntermediateRequest, LeafRequest, RootRequest};
use cert_chain_bootstrap::{
	CertificateBackend, ChainDocument, ChainResolver, ConfigLayout, Error, ReferenceLoader, Result,
};
use std::path::Path;

/// One recorded collaborator invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
	Root(Vec<String>),
	Intermediate(Vec<String>),
	Leaf(Vec<String>),
}

impl Invocation {
	/// Name of the generated entity.
	pub fn name(&self) -> &str {
		match self {
			Invocation::Root(args) => &args[0],
			Invocation::Intermediate(args) | Invocation::Leaf(args) => &args[3],
		}
	}
}

/// In-memory backend recording every invocation, optionally failing on a name.
#[derive(Debug, Default)]
pub struct RecordingBackend {
	pub invocations: Vec<Invocation>,
	pub fail_on: Option<String>,
}

impl RecordingBackend {
	pub fn failing_on(name: &str) -> Self {
		Self {
			fail_on: Some(name.into()),
			..Default::default()
		}
	}

	pub fn names(&self) -> Vec<&str> {
		self.invocations.iter().map(Invocation::name).collect()
	}

	fn record(&mut self, invocation: Invocation) -> Result<()> {
		if self.fail_on.as_deref() == Some(invocation.name()) {
			return Err(Error::ExternalCollaboratorFailure {
				program: "fake".into(),
				reason: format!("refusing to generate {}", invocation.name()),
			});
		}
		self.invocations.push(invocation);
		Ok(())
	}
}

impl CertificateBackend for RecordingBackend {
	fn generate_root(&mut self, request: &RootRequest) -> Result<()> {
		self.record(Invocation::Root(request.args()))
	}
	fn generate_intermediate(&mut self, request: &IntermediateRequest) -> Result<()> {
		self.record(Invocation::Intermediate(request.args()))
	}
	fn generate_leaf(&mut self, request: &LeafRequest) -> Result<()> {
		self.record(Invocation::Leaf(request.args()))
	}
}

/// Parse a json chain document.
pub fn document(json: serde_json::Value) -> ChainDocument {
	serde_json::from_value(json).unwrap()
}

/// A resolver writing configs to `dir` and resolving references against it.
pub fn resolver(dir: &Path, backend: RecordingBackend) -> ChainResolver<RecordingBackend> {
	ChainResolver::new(
		ReferenceLoader::new(dir),
		ConfigLayout::new(dir, "test"),
		backend,
	)
}
