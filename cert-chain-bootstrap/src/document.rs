//! Loading the top-level chain document.

use std::{fs, path::Path};

use serde::{de::DeserializeOwned, Deserialize};
use tracing::info;

use crate::entity::{EntitySource, IntermediateCa, LeafCertificate, RootCa};
use crate::{Error, Result};

/// Structured formats a chain document or a referenced definition may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
	/// `.json`
	Json,
	/// `.yaml` or `.yml`
	Yaml,
}

impl Format {
	/// Detect the format from the file extension alone.
	pub fn from_path(path: &Path) -> Option<Self> {
		match path.extension()?.to_str()? {
			"json" => Some(Format::Json),
			"yaml" | "yml" => Some(Format::Yaml),
			_ => None,
		}
	}

	/// Parse `contents` in this format.
	pub fn parse<T: DeserializeOwned>(self, contents: &str) -> Result<T> {
		Ok(match self {
			Format::Json => serde_json::from_str(contents)?,
			Format::Yaml => serde_yaml::from_str(contents)?,
		})
	}
}

/// Read `path` and parse it as `format`.
pub(crate) fn read_structured<T: DeserializeOwned>(path: &Path, format: Format) -> Result<T> {
	let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
	format.parse(&contents)
}

/// The top-level declaration of every certificate to bootstrap, per tier.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ChainDocument {
	#[serde(default)]
	root_ca: Option<Vec<EntitySource<RootCa>>>,
	#[serde(default)]
	intermediate_ca: Option<Vec<EntitySource<IntermediateCa>>>,
	#[serde(default, alias = "leaf_certs")]
	leaf_certificate: Option<Vec<EntitySource<LeafCertificate>>>,
}

impl ChainDocument {
	/// Build a document from already parsed tiers.
	pub fn new(
		root_ca: Vec<EntitySource<RootCa>>,
		intermediate_ca: Vec<EntitySource<IntermediateCa>>,
		leaf_certificate: Vec<EntitySource<LeafCertificate>>,
	) -> Self {
		Self {
			root_ca: Some(root_ca),
			intermediate_ca: Some(intermediate_ca),
			leaf_certificate: Some(leaf_certificate),
		}
	}

	/// Load a json or yaml chain document.
	pub fn from_path(path: &Path) -> Result<Self> {
		if !path.exists() {
			return Err(Error::DocumentNotFound(path.to_path_buf()));
		}
		let format = Format::from_path(path)
			.ok_or_else(|| Error::UnsupportedDocumentFormat(path.to_path_buf()))?;
		info!("Reading configuration file {}", path.display());
		read_structured(path, format)
	}

	/// Root CA declarations, in order.
	pub fn root_ca(&self) -> &[EntitySource<RootCa>] {
		self.root_ca.as_deref().unwrap_or_default()
	}

	/// Intermediate CA declarations, in order.
	pub fn intermediate_ca(&self) -> &[EntitySource<IntermediateCa>] {
		self.intermediate_ca.as_deref().unwrap_or_default()
	}

	/// Leaf certificate declarations, in order.
	pub fn leaf_certificate(&self) -> &[EntitySource<LeafCertificate>] {
		self.leaf_certificate.as_deref().unwrap_or_default()
	}
}
