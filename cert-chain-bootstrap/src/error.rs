//! Error types for chain bootstrapping.
//!
//! Every variant is fatal to a run. The only non-fatal condition, a parent
//! that was not generated in this run, is reported as a warning by the
//! resolver instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::entity::Tier;

/// The main error type for chain bootstrapping.
#[derive(Error, Debug)]
pub enum Error {
	/// The top-level chain document does not exist
	#[error("configuration document {} does not exist", .0.display())]
	DocumentNotFound(PathBuf),

	/// The top-level chain document is neither json nor yaml
	#[error("configuration document {} is not a json or yaml file", .0.display())]
	UnsupportedDocumentFormat(PathBuf),

	/// A `$ref` points at a file that does not exist
	#[error("referenced certificate definition {} does not exist", .0.display())]
	ReferenceNotFound(PathBuf),

	/// A `$ref` points at a file that is neither json nor yaml
	#[error("referenced certificate definition {} is not a json or yaml file", .0.display())]
	UnsupportedReferenceFormat(PathBuf),

	/// A chain of `$ref` indirections leads back to a file already visited
	#[error("certificate definition {} references itself", .0.display())]
	CircularReference(PathBuf),

	/// A mandatory field of an entity is absent or empty
	#[error("the {tier} configuration is missing the required key `{field}`")]
	MissingRequiredField {
		/// Tier of the offending entity
		tier: Tier,
		/// Document key of the absent field
		field: &'static str,
	},

	/// A password-like field is shorter than [`crate::validate::MIN_PASSWORD_LEN`]
	#[error("the {tier} `{field}` must be at least 8 characters long")]
	WeakPassword {
		/// Tier of the offending entity
		tier: Tier,
		/// Document key of the weak password
		field: &'static str,
	},

	/// The policy has no common name
	#[error("common name is required")]
	MissingCommonName,

	/// The country is not a two character code
	#[error("country must be a two character code, got `{0}`")]
	InvalidCountryCode(String),

	/// A leaf certificate asks for `CA:TRUE` in its basic constraints
	#[error("basic constraints of a leaf certificate cannot assert CA:TRUE")]
	IllegalCaAssertion,

	/// A CA path length is negative
	#[error("path length must be greater than or equal to 0, got {0}")]
	InvalidPathLength(i64),

	/// Intermediate CAs name each other as parents
	#[error("circular ca chain reference: {}", .0.join(" -> "))]
	CircularChainReference(Vec<String>),

	/// A generation script is not present
	#[error("generation script {} does not exist", .0.display())]
	MissingCollaborator(PathBuf),

	/// A generation script could not be run or exited unsuccessfully
	#[error("`{program}` failed: {reason}")]
	ExternalCollaboratorFailure {
		/// Script that was invoked
		program: String,
		/// Exit status or spawn error
		reason: String,
	},

	/// Filesystem error while reading a document or writing a config
	#[error("I/O error on {}: {source}", path.display())]
	Io {
		/// File being accessed
		path: PathBuf,
		/// Underlying error
		source: std::io::Error,
	},

	/// Malformed json document
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	/// Malformed yaml document
	#[error("yaml error: {0}")]
	Yaml(#[from] serde_yaml::Error),
}

impl Error {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Error::Io {
			path: path.into(),
			source,
		}
	}
}

/// A specialized `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
