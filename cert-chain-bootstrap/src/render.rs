//! OpenSSL request configuration rendering.
//!
//! Rendering is pure: the same [`PolicyAttributes`] always produce the same
//! text, which is what lets an unchanged config file be left in place.

use crate::entity::PolicyAttributes;
use crate::{Error, Result};

const DEFAULT_LEAF_KEY_USAGE: &[&str] = &["digitalSignature", "keyEncipherment"];
const DEFAULT_LEAF_EXTENDED_KEY_USAGE: &[&str] = &["serverAuth", "clientAuth"];
const DEFAULT_CA_KEY_USAGE: &[&str] = &["keyCertSign", "cRLSign"];

const CRITICAL: &str = "critical";

/// Which extension set follows the shared header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flavor {
	/// Request and subject sections only
	Shared,
	/// Certificate authority extensions
	Ca,
	/// End-entity extensions
	Leaf,
}

/// Render `policy` as the `flavor` config.
pub fn render(policy: &PolicyAttributes, flavor: Flavor) -> Result<String> {
	match flavor {
		Flavor::Shared => shared(policy),
		Flavor::Ca => ca(policy),
		Flavor::Leaf => leaf(policy),
	}
}

/// Request preamble, subject fields, and the opening of the extensions section.
pub fn shared(policy: &PolicyAttributes) -> Result<String> {
	let mut out = String::from(
		"[req]\n\
		 distinguished_name = issued_to_name\n\
		 req_extensions = config_extensions\n\
		 prompt = no\n\
		 \n\
		 [issued_to_name]\n",
	);

	if let Some(country) = present(&policy.country) {
		if country.chars().count() != 2 {
			return Err(Error::InvalidCountryCode(country.into()));
		}
		field(&mut out, "countryName", &country.to_uppercase());
	}
	if let Some(state) = present(&policy.state) {
		field(&mut out, "stateOrProvinceName", state);
	}
	if let Some(locality) = present(&policy.locality) {
		field(&mut out, "localityName", locality);
	}
	if let Some(organization) = present(&policy.organization) {
		field(&mut out, "organizationName", organization);
	}
	if let Some(unit) = present(&policy.organizational_unit) {
		field(&mut out, "organizationalUnitName", unit);
	}
	let common_name = present(&policy.common_name).ok_or(Error::MissingCommonName)?;
	field(&mut out, "commonName", common_name);
	if let Some(email) = present(&policy.email) {
		field(&mut out, "emailAddress", email);
	}

	out.push_str("\n[config_extensions]\n");
	Ok(out)
}

/// Shared header followed by end-entity extensions.
pub fn leaf(policy: &PolicyAttributes) -> Result<String> {
	let mut out = shared(policy)?;

	list(
		&mut out,
		"keyUsage",
		policy.critical_key_usage,
		or_default(&policy.key_usage, DEFAULT_LEAF_KEY_USAGE),
	);
	list(
		&mut out,
		"extendedKeyUsage",
		policy.critical_extended_key_usage,
		or_default(&policy.extended_key_usage, DEFAULT_LEAF_EXTENDED_KEY_USAGE),
	);

	if policy.basic_constraints.iter().any(|c| asserts_ca(c)) {
		return Err(Error::IllegalCaAssertion);
	}
	let mut constraints = vec!["CA:FALSE"];
	constraints.extend(policy.basic_constraints.iter().map(String::as_str));
	list(
		&mut out,
		"basicConstraints",
		policy.critical_basic_constraints,
		constraints,
	);

	policies(&mut out, policy);

	if let Some(san) = policy
		.subject_alternative_name
		.as_ref()
		.filter(|san| !san.is_empty())
	{
		list(
			&mut out,
			"subjectAltName",
			policy.critical_subject_alternative_name,
			vec!["@subject_alt_names"],
		);
		out.push_str("\n[subject_alt_names]\n");
		for (i, name) in san.dns_names.iter().enumerate() {
			field(&mut out, &format!("DNS.{i}"), name);
		}
		for (i, ip) in san.ip_addresses.iter().enumerate() {
			field(&mut out, &format!("IP.{i}"), &ip.to_string());
		}
	}

	Ok(out)
}

/// Shared header followed by certificate authority extensions.
pub fn ca(policy: &PolicyAttributes) -> Result<String> {
	let mut out = shared(policy)?;

	list(
		&mut out,
		"keyUsage",
		policy.critical_key_usage,
		or_default(&policy.key_usage, DEFAULT_CA_KEY_USAGE),
	);

	let path_len = match policy.path_length {
		Some(n) if n < 0 => return Err(Error::InvalidPathLength(n)),
		Some(n) => Some(format!("pathlen:{n}")),
		None => None,
	};
	let mut constraints = vec!["CA:TRUE"];
	constraints.extend(path_len.as_deref());
	list(
		&mut out,
		"basicConstraints",
		policy.critical_basic_constraints,
		constraints,
	);

	if !policy.extended_key_usage.is_empty() {
		list(
			&mut out,
			"extendedKeyUsage",
			policy.critical_extended_key_usage,
			policy.extended_key_usage.iter().map(String::as_str).collect(),
		);
	}

	policies(&mut out, policy);

	Ok(out)
}

fn policies(out: &mut String, policy: &PolicyAttributes) {
	if !policy.policies.is_empty() {
		list(
			out,
			"certificatePolicies",
			policy.critical_policies,
			policy.policies.iter().map(String::as_str).collect(),
		);
	}
}

/// Empty strings count as absent.
fn present(value: &Option<String>) -> Option<&str> {
	value.as_deref().filter(|v| !v.is_empty())
}

fn or_default<'a>(values: &'a [String], default: &'a [&'a str]) -> Vec<&'a str> {
	if values.is_empty() {
		default.to_vec()
	} else {
		values.iter().map(String::as_str).collect()
	}
}

fn asserts_ca(constraint: &str) -> bool {
	let normalized: String = constraint.chars().filter(|c| !c.is_whitespace()).collect();
	normalized.eq_ignore_ascii_case("CA:TRUE")
}

fn field(out: &mut String, key: &str, value: &str) {
	out.push_str(key);
	out.push_str(" = ");
	out.push_str(value);
	out.push('\n');
}

fn list(out: &mut String, key: &str, critical: bool, values: Vec<&str>) {
	let mut parts = Vec::with_capacity(values.len() + 1);
	if critical {
		parts.push(CRITICAL);
	}
	parts.extend(values);
	field(out, key, &parts.join(","));
}
