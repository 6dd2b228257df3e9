//! The external programs that actually generate keys and certificates.
//!
//! Each generation step is a positional-argument invocation; a zero exit
//! status is success, anything else fails the whole run. Scripts are executed
//! directly so that their shebang picks the interpreter, unless an explicit
//! shell is configured.

use std::{
	path::{Path, PathBuf},
	process::Command,
};

use tracing::debug;

use crate::{Error, Result};

/// Arguments for generating a root CA.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootRequest {
	pub name: String,
	pub password: String,
	pub pfx_password: String,
	pub insert_into_trusted_store: bool,
	pub skip_dhparam: bool,
	pub has_extension_file: bool,
}

impl RootRequest {
	/// `name password pfx_password trusted_store skip_dhparam extension_file`
	pub fn args(&self) -> Vec<String> {
		vec![
			self.name.clone(),
			self.password.clone(),
			self.pfx_password.clone(),
			flag(self.insert_into_trusted_store),
			flag(self.skip_dhparam),
			flag(self.has_extension_file),
		]
	}
}

/// Arguments for generating an intermediate CA under `parent_name`.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntermediateRequest {
	pub is_last_in_chain: bool,
	pub parent_name: String,
	pub parent_password: String,
	pub name: String,
	pub password: String,
	pub pfx_password: String,
	pub insert_into_trusted_store: bool,
	pub skip_dhparam: bool,
	pub keep_certificate_request_file: bool,
}

impl IntermediateRequest {
	/// `last_in_chain parent parent_password name password pfx_password
	/// trusted_store skip_dhparam keep_csr`
	pub fn args(&self) -> Vec<String> {
		vec![
			flag(self.is_last_in_chain),
			self.parent_name.clone(),
			self.parent_password.clone(),
			self.name.clone(),
			self.password.clone(),
			self.pfx_password.clone(),
			flag(self.insert_into_trusted_store),
			flag(self.skip_dhparam),
			flag(self.keep_certificate_request_file),
		]
	}
}

/// Arguments for generating a leaf certificate issued by `issuer_name`.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafRequest {
	pub issuer_is_root: bool,
	pub issuer_name: String,
	pub issuer_password: String,
	pub name: String,
	pub password: String,
	pub pfx_password: String,
	pub skip_dhparam: bool,
	pub keep_certificate_request_file: bool,
}

impl LeafRequest {
	/// `issuer_is_root issuer issuer_password name password pfx_password
	/// skip_dhparam keep_csr`
	pub fn args(&self) -> Vec<String> {
		vec![
			flag(self.issuer_is_root),
			self.issuer_name.clone(),
			self.issuer_password.clone(),
			self.name.clone(),
			self.password.clone(),
			self.pfx_password.clone(),
			flag(self.skip_dhparam),
			flag(self.keep_certificate_request_file),
		]
	}
}

fn flag(value: bool) -> String {
	let value = if value { "YES" } else { "NO" };
	value.to_string()
}

/// Generates the certificates of each tier.
pub trait CertificateBackend {
	/// Generate a self-signed root CA.
	fn generate_root(&mut self, request: &RootRequest) -> Result<()>;
	/// Generate an intermediate CA signed by its parent.
	fn generate_intermediate(&mut self, request: &IntermediateRequest) -> Result<()>;
	/// Generate a leaf certificate signed by its issuer.
	fn generate_leaf(&mut self, request: &LeafRequest) -> Result<()>;
}

impl<B: CertificateBackend + ?Sized> CertificateBackend for &mut B {
	fn generate_root(&mut self, request: &RootRequest) -> Result<()> {
		(**self).generate_root(request)
	}
	fn generate_intermediate(&mut self, request: &IntermediateRequest) -> Result<()> {
		(**self).generate_intermediate(request)
	}
	fn generate_leaf(&mut self, request: &LeafRequest) -> Result<()> {
		(**self).generate_leaf(request)
	}
}

/// Runs the generation shell scripts.
#[derive(Clone, Debug)]
pub struct ScriptBackend {
	scripts_dir: PathBuf,
	shell: Option<String>,
	root_script: String,
	intermediate_script: String,
	leaf_script: String,
}

impl ScriptBackend {
	/// Scripts with their default names, looked up in `scripts_dir`.
	pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
		Self {
			scripts_dir: scripts_dir.into(),
			shell: None,
			root_script: "generate-root-ca.sh".into(),
			intermediate_script: "generate-intermediate-ca.sh".into(),
			leaf_script: "generate-certs-v2.sh".into(),
		}
	}
	/// Run the scripts with `shell` instead of executing them directly.
	pub fn shell(mut self, shell: &str) -> Self {
		self.shell = Some(shell.into());
		self
	}
	/// File name of the root CA script.
	pub fn root_script(mut self, name: &str) -> Self {
		self.root_script = name.into();
		self
	}
	/// File name of the intermediate CA script.
	pub fn intermediate_script(mut self, name: &str) -> Self {
		self.intermediate_script = name.into();
		self
	}
	/// File name of the leaf certificate script.
	pub fn leaf_script(mut self, name: &str) -> Self {
		self.leaf_script = name.into();
		self
	}

	fn script(&self, name: &str) -> PathBuf {
		self.scripts_dir.join(name)
	}

	/// Fail unless every script is present.
	pub fn check(&self) -> Result<()> {
		for name in [&self.root_script, &self.intermediate_script, &self.leaf_script] {
			let path = self.script(name);
			if !path.is_file() {
				return Err(Error::MissingCollaborator(path));
			}
		}
		Ok(())
	}

	fn run(&self, script: &Path, args: &[String]) -> Result<()> {
		let program = script.display().to_string();
		let mut command = match &self.shell {
			Some(shell) => {
				debug!(%shell, "Running {program}");
				let mut command = Command::new(shell);
				command.arg(script);
				command
			},
			None => {
				debug!("Running {program}");
				Command::new(script)
			},
		};
		let status = command
			.args(args)
			.status()
			.map_err(|e| Error::ExternalCollaboratorFailure {
				program: program.clone(),
				reason: e.to_string(),
			})?;

		if status.success() {
			Ok(())
		} else {
			Err(Error::ExternalCollaboratorFailure {
				program,
				reason: status.to_string(),
			})
		}
	}
}

impl CertificateBackend for ScriptBackend {
	fn generate_root(&mut self, request: &RootRequest) -> Result<()> {
		self.run(&self.script(&self.root_script), &request.args())
	}
	fn generate_intermediate(&mut self, request: &IntermediateRequest) -> Result<()> {
		self.run(&self.script(&self.intermediate_script), &request.args())
	}
	fn generate_leaf(&mut self, request: &LeafRequest) -> Result<()> {
		self.run(&self.script(&self.leaf_script), &request.args())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::prelude::*;

	#[cfg(unix)]
	fn executable(temp: &assert_fs::TempDir, name: &str, body: &str) -> anyhow::Result<()> {
		use std::os::unix::fs::PermissionsExt;

		let script = temp.child(name);
		script.write_str(body)?;
		std::fs::set_permissions(script.path(), std::fs::Permissions::from_mode(0o755))?;
		Ok(())
	}

	fn root_request() -> RootRequest {
		RootRequest {
			name: "root1".into(),
			password: "12345678".into(),
			pfx_password: "87654321".into(),
			insert_into_trusted_store: true,
			skip_dhparam: false,
			has_extension_file: true,
		}
	}

	#[test]
	fn root_argument_order() {
		assert_eq!(
			root_request().args(),
			["root1", "12345678", "87654321", "YES", "NO", "YES"]
		);
	}

	#[test]
	fn intermediate_argument_order() {
		let request = IntermediateRequest {
			is_last_in_chain: true,
			parent_name: "root1".into(),
			parent_password: "parentpw".into(),
			name: "inter1".into(),
			password: "password".into(),
			pfx_password: "pfxpassw".into(),
			insert_into_trusted_store: false,
			skip_dhparam: true,
			keep_certificate_request_file: false,
		};
		assert_eq!(
			request.args(),
			["YES", "root1", "parentpw", "inter1", "password", "pfxpassw", "NO", "YES", "NO"]
		);
	}

	#[test]
	fn leaf_argument_order() {
		let request = LeafRequest {
			issuer_is_root: false,
			issuer_name: "inter1".into(),
			issuer_password: "issuerpw".into(),
			name: "web".into(),
			password: "password".into(),
			pfx_password: "pfxpassw".into(),
			skip_dhparam: false,
			keep_certificate_request_file: true,
		};
		assert_eq!(
			request.args(),
			["NO", "inter1", "issuerpw", "web", "password", "pfxpassw", "NO", "YES"]
		);
	}

	#[test]
	fn check_reports_missing_script() -> anyhow::Result<()> {
		let temp = assert_fs::TempDir::new()?;
		temp.child("generate-root-ca.sh").write_str("exit 0\n")?;
		temp.child("generate-intermediate-ca.sh").write_str("exit 0\n")?;

		let backend = ScriptBackend::new(temp.path());
		match backend.check() {
			Err(Error::MissingCollaborator(path)) => {
				assert_eq!(path, temp.path().join("generate-certs-v2.sh"))
			},
			other => panic!("unexpected {other:?}"),
		}

		temp.child("generate-certs-v2.sh").write_str("exit 0\n")?;
		backend.check()?;
		Ok(())
	}

	#[cfg(unix)]
	#[test]
	fn script_receives_positional_arguments() -> anyhow::Result<()> {
		let temp = assert_fs::TempDir::new()?;
		let out = temp.child("args.txt");
		executable(
			&temp,
			"root.sh",
			&format!("#!/bin/sh\necho \"$@\" > '{}'\n", out.path().display()),
		)?;

		let mut backend = ScriptBackend::new(temp.path()).root_script("root.sh");
		backend.generate_root(&root_request())?;
		out.assert("root1 12345678 87654321 YES NO YES\n");
		Ok(())
	}

	#[cfg(unix)]
	#[test]
	fn non_zero_exit_fails() -> anyhow::Result<()> {
		let temp = assert_fs::TempDir::new()?;
		executable(&temp, "leaf.sh", "#!/bin/sh\nexit 3\n")?;

		let mut backend = ScriptBackend::new(temp.path()).leaf_script("leaf.sh");
		let request = LeafRequest {
			issuer_is_root: true,
			issuer_name: "root1".into(),
			issuer_password: "12345678".into(),
			name: "web".into(),
			password: "12345678".into(),
			pfx_password: "12345678".into(),
			skip_dhparam: false,
			keep_certificate_request_file: false,
		};
		match backend.generate_leaf(&request) {
			Err(Error::ExternalCollaboratorFailure { program, .. }) => {
				assert!(program.ends_with("leaf.sh"))
			},
			other => panic!("unexpected {other:?}"),
		}
		Ok(())
	}

	#[cfg(unix)]
	#[test]
	fn shebang_selects_the_interpreter() -> anyhow::Result<()> {
		let temp = assert_fs::TempDir::new()?;
		executable(
			&temp,
			"generate-root-ca.sh",
			"#!/bin/bash\n[[ \"$1\" == root1 && \"$6\" == YES ]] || exit 9\n",
		)?;

		let mut backend = ScriptBackend::new(temp.path());
		backend.generate_root(&root_request())?;
		Ok(())
	}

	#[cfg(unix)]
	#[test]
	fn explicit_shell_runs_plain_scripts() -> anyhow::Result<()> {
		let temp = assert_fs::TempDir::new()?;
		let out = temp.child("ran.txt");
		temp.child("root.sh")
			.write_str(&format!("echo \"$1\" > '{}'\n", out.path().display()))?;

		let mut backend = ScriptBackend::new(temp.path())
			.shell("sh")
			.root_script("root.sh");
		backend.generate_root(&root_request())?;
		out.assert("root1\n");
		Ok(())
	}
}
