//! Required-field and password checks, run before any side effect.
//!
//! All presence checks of an entity run before any password check, so the
//! first violation reported is deterministic.

use crate::backend::{IntermediateRequest, LeafRequest, RootRequest};
use crate::entity::{IntermediateCa, LeafCertificate, RootCa, Tier};
use crate::{Error, Result};

/// Minimum length of every password-like field.
pub const MIN_PASSWORD_LEN: usize = 8;

fn required<'a>(tier: Tier, field: &'static str, value: &'a Option<String>) -> Result<&'a str> {
	value
		.as_deref()
		.filter(|v| !v.is_empty())
		.ok_or(Error::MissingRequiredField { tier, field })
}

fn strong(tier: Tier, field: &'static str, password: &str) -> Result<()> {
	if password.chars().count() < MIN_PASSWORD_LEN {
		return Err(Error::WeakPassword { tier, field });
	}
	Ok(())
}

/// Validate a root CA and build its generation request.
pub fn root(entity: &RootCa) -> Result<RootRequest> {
	let tier = Tier::Root;
	let name = required(tier, "name", &entity.name)?;
	let password = required(tier, "password", &entity.password)?;
	let pfx_password = required(tier, "pfx_password", &entity.pfx_password)?;

	strong(tier, "password", password)?;
	strong(tier, "pfx_password", pfx_password)?;

	Ok(RootRequest {
		name: name.into(),
		password: password.into(),
		pfx_password: pfx_password.into(),
		insert_into_trusted_store: entity.should_insert_into_trusted_store,
		skip_dhparam: !entity.generate_dhparam,
		has_extension_file: entity.has_extension_file,
	})
}

/// Validate an intermediate CA and build its generation request.
pub fn intermediate(entity: &IntermediateCa) -> Result<IntermediateRequest> {
	let tier = Tier::Intermediate;
	let name = required(tier, "name", &entity.name)?;
	let password = required(tier, "password", &entity.password)?;
	let pfx_password = required(tier, "pfx_password", &entity.pfx_password)?;
	let parent_name = required(tier, "ca_chain_name", &entity.parent_chain_name)?;
	let parent_password = required(tier, "ca_chain_password", &entity.parent_chain_password)?;

	strong(tier, "password", password)?;
	strong(tier, "pfx_password", pfx_password)?;
	strong(tier, "ca_chain_password", parent_password)?;

	Ok(IntermediateRequest {
		is_last_in_chain: entity.is_last_in_chain,
		parent_name: parent_name.into(),
		parent_password: parent_password.into(),
		name: name.into(),
		password: password.into(),
		pfx_password: pfx_password.into(),
		insert_into_trusted_store: entity.should_insert_into_trusted_store,
		skip_dhparam: !entity.generate_dhparam,
		keep_certificate_request_file: entity.keep_certificate_request_file,
	})
}

/// Validate a leaf certificate and build its generation request.
pub fn leaf(entity: &LeafCertificate) -> Result<LeafRequest> {
	let tier = Tier::Leaf;
	let name = required(tier, "name", &entity.name)?;
	let password = required(tier, "password", &entity.password)?;
	let pfx_password = required(tier, "pfx_password", &entity.pfx_password)?;
	let issuer_name = required(tier, "ca_name", &entity.issuer_name)?;
	let issuer_password = required(tier, "ca_password", &entity.issuer_password)?;

	strong(tier, "password", password)?;
	strong(tier, "pfx_password", pfx_password)?;
	strong(tier, "ca_password", issuer_password)?;

	Ok(LeafRequest {
		issuer_is_root: entity.issuer_is_root,
		issuer_name: issuer_name.into(),
		issuer_password: issuer_password.into(),
		name: name.into(),
		password: password.into(),
		pfx_password: pfx_password.into(),
		skip_dhparam: !entity.generate_dhparam,
		keep_certificate_request_file: entity.keep_certificate_request_file,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn root_ca(password: &str) -> RootCa {
		serde_json::from_value(serde_json::json!({
			"name": "root1",
			"password": password,
			"pfx_password": "12345678",
		}))
		.unwrap()
	}

	fn intermediate_ca() -> IntermediateCa {
		serde_json::from_value(serde_json::json!({
			"ca_chain_name": "root1",
			"ca_chain_password": "12345678",
			"name": "inter1",
			"password": "12345678",
			"pfx_password": "12345678",
		}))
		.unwrap()
	}

	#[test]
	fn password_boundary() {
		assert!(root(&root_ca("12345678")).is_ok());
		assert!(matches!(
			root(&root_ca("1234567")),
			Err(Error::WeakPassword {
				tier: Tier::Root,
				field: "password"
			})
		));
	}

	#[test]
	fn root_request_flags() -> Result<()> {
		let mut entity = root_ca("12345678");
		let request = root(&entity)?;
		assert_eq!(
			request.args(),
			["root1", "12345678", "12345678", "NO", "NO", "NO"]
		);

		entity.generate_dhparam = false;
		entity.should_insert_into_trusted_store = true;
		let request = root(&entity)?;
		assert!(request.skip_dhparam);
		assert!(request.insert_into_trusted_store);
		Ok(())
	}

	#[test]
	fn empty_field_counts_as_missing() {
		let mut entity = root_ca("12345678");
		entity.name = Some(String::new());
		assert!(matches!(
			root(&entity),
			Err(Error::MissingRequiredField {
				tier: Tier::Root,
				field: "name"
			})
		));
	}

	#[test]
	fn presence_is_checked_before_strength() {
		let mut entity = intermediate_ca();
		entity.password = Some("short".into());
		entity.parent_chain_password = None;
		assert!(matches!(
			intermediate(&entity),
			Err(Error::MissingRequiredField {
				tier: Tier::Intermediate,
				field: "ca_chain_password"
			})
		));
	}

	#[test]
	fn password_fields_are_checked_in_order() {
		let mut entity = intermediate_ca();
		entity.pfx_password = Some("short".into());
		entity.parent_chain_password = Some("short".into());
		assert!(matches!(
			intermediate(&entity),
			Err(Error::WeakPassword {
				field: "pfx_password",
				..
			})
		));

		entity.pfx_password = Some("12345678".into());
		assert!(matches!(
			intermediate(&entity),
			Err(Error::WeakPassword {
				field: "ca_chain_password",
				..
			})
		));
	}

	#[test]
	fn leaf_requires_issuer() {
		let entity: LeafCertificate = serde_json::from_value(serde_json::json!({
			"name": "web",
			"password": "12345678",
			"pfx_password": "12345678",
			"ca_password": "12345678",
		}))
		.unwrap();
		assert!(matches!(
			leaf(&entity),
			Err(Error::MissingRequiredField {
				tier: Tier::Leaf,
				field: "ca_name"
			})
		));
	}

	#[test]
	fn leaf_request() -> Result<()> {
		let entity: LeafCertificate = serde_json::from_value(serde_json::json!({
			"is_ca_root_ca": true,
			"ca_name": "root1",
			"ca_password": "12345678",
			"name": "web",
			"password": "abcdefgh",
			"pfx_password": "ABCDEFGH",
			"generate_dhparam": false,
			"keep_certificate_request_file": true,
		}))?;
		assert_eq!(
			leaf(&entity)?.args(),
			["YES", "root1", "12345678", "web", "abcdefgh", "ABCDEFGH", "YES", "YES"]
		);
		Ok(())
	}
}
