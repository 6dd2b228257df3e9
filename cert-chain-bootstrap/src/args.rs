//! Command Line argument parsing
#![allow(missing_docs)]

use std::path::PathBuf;

use bpaf::Bpaf;

#[derive(Clone, Debug, Bpaf)]
#[bpaf(options, version)]
/// Bootstrap root, intermediate and leaf certificate chains
pub struct Options {
	/// Directory rendered OpenSSL configs are written to
	#[bpaf(long, argument("DIR"), fallback(PathBuf::from("bin")))]
	pub config_dir: PathBuf,
	/// Prefix of rendered config file names
	#[bpaf(long, fallback("mfdlabs".into()), display_fallback)]
	pub config_prefix: String,
	/// Directory holding the generation scripts
	#[bpaf(long, argument("DIR"), fallback(PathBuf::from(".")))]
	pub scripts_dir: PathBuf,
	/// Run the generation scripts with this interpreter instead of their shebang
	#[bpaf(long, argument("SHELL"))]
	pub shell: Option<String>,
	/// Root CA generation script
	#[bpaf(long, fallback("generate-root-ca.sh".into()), display_fallback)]
	pub root_script: String,
	/// Intermediate CA generation script
	#[bpaf(long, fallback("generate-intermediate-ca.sh".into()), display_fallback)]
	pub intermediate_script: String,
	/// Leaf certificate generation script
	#[bpaf(long, fallback("generate-certs-v2.sh".into()), display_fallback)]
	pub leaf_script: String,
	/// Log debug output (overridden by RUST_LOG)
	#[bpaf(short, long)]
	pub verbose: bool,
	/// Chain document, json or yaml
	#[bpaf(positional("CONFIG"))]
	pub config: PathBuf,
}
