use anyhow::Context;
use cert_chain_bootstrap::{
	ChainDocument, ChainResolver, ConfigLayout, ReferenceLoader, ScriptBackend, Tier,
};
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
mod args;

fn start_logger(default_level: LevelFilter) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.init();
}

fn main() -> anyhow::Result<()> {
	let opts = args::options().run();
	start_logger(if opts.verbose {
		LevelFilter::DEBUG
	} else {
		LevelFilter::INFO
	});

	let document = ChainDocument::from_path(&opts.config)
		.with_context(|| format!("failed to load {}", opts.config.display()))?;
	let loader = ReferenceLoader::for_document(&opts.config)?;

	let mut backend = ScriptBackend::new(&opts.scripts_dir)
		.root_script(&opts.root_script)
		.intermediate_script(&opts.intermediate_script)
		.leaf_script(&opts.leaf_script);
	if let Some(shell) = &opts.shell {
		backend = backend.shell(shell);
	}
	backend.check()?;

	let layout = ConfigLayout::new(&opts.config_dir, &opts.config_prefix);
	layout.prepare()?;

	let mut resolver = ChainResolver::new(loader, layout, backend);
	resolver.run(&document)?;

	let ledger = resolver.ledger();
	info!(
		"Generated {} root CA(s), {} intermediate CA(s) and {} leaf certificate(s)",
		ledger.len(Tier::Root),
		ledger.len(Tier::Intermediate),
		resolver.leaves_generated()
	);
	Ok(())
}
