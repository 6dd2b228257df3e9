//! `$ref` indirection between chain documents and entity files.

use std::{
	collections::HashSet,
	fs,
	path::{Path, PathBuf, MAIN_SEPARATOR},
};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::document::{read_structured, Format};
use crate::entity::EntitySource;
use crate::{Error, Result};

/// Resolves `$ref` indirections to the entity records they point at.
///
/// Relative references are resolved against the directory of the top-level
/// chain document, including references found inside referenced files.
#[derive(Clone, Debug)]
pub struct ReferenceLoader {
	base_dir: PathBuf,
}

impl ReferenceLoader {
	/// Resolve relative references against `base_dir`.
	pub fn new(base_dir: impl Into<PathBuf>) -> Self {
		Self {
			base_dir: base_dir.into(),
		}
	}

	/// Resolve relative references against the directory containing `document`.
	pub fn for_document(document: &Path) -> Result<Self> {
		let document = fs::canonicalize(document).map_err(|e| Error::io(document, e))?;
		let base_dir = document
			.parent()
			.map(Path::to_path_buf)
			.unwrap_or_else(|| PathBuf::from(MAIN_SEPARATOR.to_string()));
		Ok(Self::new(base_dir))
	}

	/// Where `reference` points to.
	pub fn locate(&self, reference: &str) -> PathBuf {
		if reference.starts_with('/') || reference.starts_with(MAIN_SEPARATOR) {
			PathBuf::from(reference)
		} else {
			self.base_dir.join(reference)
		}
	}

	/// Produce the concrete entity for `source`, following references.
	pub fn resolve<T>(&self, source: &EntitySource<T>) -> Result<T>
	where
		T: DeserializeOwned + Clone,
	{
		match source {
			EntitySource::Inline(entity) => Ok(entity.clone()),
			EntitySource::Reference { path } => self.follow(path, &mut HashSet::new()),
		}
	}

	fn follow<T: DeserializeOwned>(
		&self,
		reference: &str,
		visited: &mut HashSet<PathBuf>,
	) -> Result<T> {
		let path = self.locate(reference);
		if !path.exists() {
			return Err(Error::ReferenceNotFound(path));
		}
		let path = fs::canonicalize(&path).map_err(|e| Error::io(&path, e))?;
		if !visited.insert(path.clone()) {
			return Err(Error::CircularReference(path));
		}
		let format =
			Format::from_path(&path).ok_or_else(|| Error::UnsupportedReferenceFormat(path.clone()))?;

		debug!(?format, "Loading certificate definition from {}", path.display());
		match read_structured::<EntitySource<T>>(&path, format)? {
			EntitySource::Inline(entity) => Ok(entity),
			EntitySource::Reference { path: next } => self.follow(&next, visited),
		}
	}
}
