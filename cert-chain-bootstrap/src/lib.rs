#![warn(missing_docs)]
//! Bootstraps certificate chains (root CA → intermediate CAs → leaf
//! certificates) from a declarative json or yaml document.
//!
//! For every declared entity this crate renders the OpenSSL request config
//! the generation scripts expect, then runs the matching script, making sure
//! each CA is generated before anything it signs. Keys and certificates are
//! produced by the scripts themselves, behind [`CertificateBackend`].
//!
//! ```no_run
//! # use std::path::Path;
//! use cert_chain_bootstrap::{ChainDocument, ChainResolver, ConfigLayout, ReferenceLoader, ScriptBackend};
//! # fn main() -> cert_chain_bootstrap::Result<()> {
//! let path = Path::new("chain.yaml");
//! let document = ChainDocument::from_path(path)?;
//! let backend = ScriptBackend::new(".");
//! backend.check()?;
//! let layout = ConfigLayout::new("bin", "mfdlabs");
//! layout.prepare()?;
//!
//! let mut resolver = ChainResolver::new(ReferenceLoader::for_document(path)?, layout, backend);
//! resolver.run(&document)?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod document;
pub mod entity;
mod error;
mod layout;
mod ledger;
mod reference;
pub mod render;
mod resolver;
pub mod validate;

pub use backend::{CertificateBackend, ScriptBackend};
pub use document::{ChainDocument, Format};
pub use entity::{EntitySource, Tier};
pub use error::{Error, Result};
pub use layout::ConfigLayout;
pub use ledger::GenerationLedger;
pub use reference::ReferenceLoader;
pub use resolver::{ChainResolver, UnresolvedParent};
