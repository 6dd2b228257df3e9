//! Where rendered OpenSSL configs live on disk.

use std::{
	fs,
	path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::entity::Tier;
use crate::{Error, Result};

/// Where rendered OpenSSL configs are written, keyed by tier and name.
///
/// The generation scripts look configs up by these exact file names.
#[derive(Clone, Debug)]
pub struct ConfigLayout {
	dir: PathBuf,
	prefix: String,
}

impl ConfigLayout {
	/// Configs named `<prefix>-<kind>-<name>.conf` inside `dir`.
	pub fn new(dir: impl Into<PathBuf>, prefix: &str) -> Self {
		Self {
			dir: dir.into(),
			prefix: prefix.into(),
		}
	}

	/// Create the config directory if it does not exist yet.
	pub fn prepare(&self) -> Result<()> {
		if !self.dir.exists() {
			info!("Creating config directory {}", self.dir.display());
			fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
		}
		Ok(())
	}

	/// Config path of the `tier` entity called `name`.
	pub fn path(&self, tier: Tier, name: &str) -> PathBuf {
		let kind = match tier {
			Tier::Root => "root-ca",
			Tier::Intermediate => "ca",
			Tier::Leaf => "all-authority",
		};
		self.dir.join(format!("{}-{kind}-{name}.conf", self.prefix))
	}

	/// Write `contents` to `path` unless it already holds exactly that.
	/// Returns whether the file was written.
	pub fn write(&self, path: &Path, contents: &str) -> Result<bool> {
		if let Ok(existing) = fs::read_to_string(path) {
			if existing == contents {
				debug!("{} is up to date", path.display());
				return Ok(false);
			}
		}
		fs::write(path, contents).map_err(|e| Error::io(path, e))?;
		Ok(true)
	}
}
