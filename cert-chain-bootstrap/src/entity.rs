//! Certificate entity records as they appear in a chain document.
//!
//! Identity and password fields are kept optional here so that absence is
//! reported by [`crate::validate`] with the tier and field name instead of a
//! generic deserialization error.

use std::{fmt, net::IpAddr};

use serde::{
	de::{self, DeserializeOwned, Error as _, Visitor},
	Deserialize, Deserializer,
};

/// The three tiers of a certificate chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
	/// Self-signed root certificate authority
	Root,
	/// Certificate authority signed by a root or another intermediate
	Intermediate,
	/// End-entity certificate
	Leaf,
}

impl fmt::Display for Tier {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Tier::Root => write!(f, "root ca"),
			Tier::Intermediate => write!(f, "intermediate ca"),
			Tier::Leaf => write!(f, "leaf certificate"),
		}
	}
}

/// An entity declared inline, or an indirection to a document holding it.
///
/// A mapping with a `$ref` key is always a reference, whatever else it holds.
#[derive(Clone, Debug, PartialEq)]
pub enum EntitySource<T> {
	/// `{ "$ref": "<path>" }`
	Reference {
		/// Absolute path, or path relative to the top-level document
		path: String,
	},
	/// The record itself
	Inline(T),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for EntitySource<T> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = serde_json::Value::deserialize(deserializer)?;
		if let Some(path) = value.get("$ref") {
			let path = path
				.as_str()
				.ok_or_else(|| D::Error::custom("`$ref` must be a path string"))?;
			return Ok(EntitySource::Reference { path: path.into() });
		}
		T::deserialize(value)
			.map(EntitySource::Inline)
			.map_err(D::Error::custom)
	}
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
	type Value = Option<String>;

	fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str("a string or a number")
	}
	fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
		Ok(Some(v.into()))
	}
	fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
		Ok(Some(v))
	}
	fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
		Ok(Some(v.to_string()))
	}
	fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
		Ok(Some(v.to_string()))
	}
	fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
		Ok(Some(v.to_string()))
	}
	fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
		Ok(None)
	}
	fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
		Ok(None)
	}
	fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
		deserializer.deserialize_any(self)
	}
}

/// Accept numbers where a name or password is expected, as unquoted yaml
/// scalars such as `password: 12345678` parse as integers.
fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	deserializer.deserialize_option(ScalarVisitor)
}

fn default_generate_dhparam() -> bool {
	true
}

/// A self-signed root certificate authority.
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RootCa {
	#[serde(default, deserialize_with = "scalar")]
	pub name: Option<String>,
	#[serde(default, deserialize_with = "scalar")]
	pub password: Option<String>,
	#[serde(default, deserialize_with = "scalar")]
	pub pfx_password: Option<String>,
	#[serde(default, alias = "insert_into_trusted_store")]
	pub should_insert_into_trusted_store: bool,
	#[serde(default = "default_generate_dhparam")]
	pub generate_dhparam: bool,
	#[serde(default)]
	pub has_extension_file: bool,
	#[serde(default)]
	pub overwrite_config: bool,
	pub config: Option<PolicyAttributes>,
}

/// A certificate authority signed by the CA named in `parent_chain_name`.
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct IntermediateCa {
	/// The parent is a root CA, so no intermediate lookup is needed.
	#[serde(default, rename = "is_last_chain_root_ca", alias = "is_last_in_chain")]
	pub is_last_in_chain: bool,
	#[serde(
		default,
		rename = "ca_chain_name",
		alias = "parent_chain_name",
		deserialize_with = "scalar"
	)]
	pub parent_chain_name: Option<String>,
	#[serde(
		default,
		rename = "ca_chain_password",
		alias = "parent_chain_password",
		deserialize_with = "scalar"
	)]
	pub parent_chain_password: Option<String>,
	#[serde(default, deserialize_with = "scalar")]
	pub name: Option<String>,
	#[serde(default, deserialize_with = "scalar")]
	pub password: Option<String>,
	#[serde(default, deserialize_with = "scalar")]
	pub pfx_password: Option<String>,
	#[serde(default, alias = "insert_into_trusted_store")]
	pub should_insert_into_trusted_store: bool,
	#[serde(default = "default_generate_dhparam")]
	pub generate_dhparam: bool,
	#[serde(default)]
	pub keep_certificate_request_file: bool,
	#[serde(default)]
	pub overwrite_config: bool,
	pub config: Option<PolicyAttributes>,
}

/// An end-entity certificate signed by the CA named in `issuer_name`.
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LeafCertificate {
	/// The issuer is a root CA, so no intermediate lookup is needed.
	#[serde(default, rename = "is_ca_root_ca", alias = "issuer_is_root")]
	pub issuer_is_root: bool,
	#[serde(default, rename = "ca_name", alias = "issuer_name", deserialize_with = "scalar")]
	pub issuer_name: Option<String>,
	#[serde(
		default,
		rename = "ca_password",
		alias = "issuer_password",
		deserialize_with = "scalar"
	)]
	pub issuer_password: Option<String>,
	#[serde(default, deserialize_with = "scalar")]
	pub name: Option<String>,
	#[serde(default, deserialize_with = "scalar")]
	pub password: Option<String>,
	#[serde(default, deserialize_with = "scalar")]
	pub pfx_password: Option<String>,
	#[serde(default = "default_generate_dhparam")]
	pub generate_dhparam: bool,
	#[serde(default)]
	pub keep_certificate_request_file: bool,
	#[serde(default)]
	pub overwrite_config: bool,
	pub config: Option<PolicyAttributes>,
}

/// Subject and extension attributes rendered into an OpenSSL request config.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyAttributes {
	pub country: Option<String>,
	pub state: Option<String>,
	pub locality: Option<String>,
	pub organization: Option<String>,
	pub organizational_unit: Option<String>,
	pub common_name: Option<String>,
	pub email: Option<String>,
	pub key_usage: Vec<String>,
	pub critical_key_usage: bool,
	pub extended_key_usage: Vec<String>,
	pub critical_extended_key_usage: bool,
	pub basic_constraints: Vec<String>,
	pub critical_basic_constraints: bool,
	pub policies: Vec<String>,
	pub critical_policies: bool,
	/// Only meaningful for CAs. Signed so that a negative value can be
	/// reported instead of failing deserialization.
	pub path_length: Option<i64>,
	pub subject_alternative_name: Option<SubjectAlternativeName>,
	pub critical_subject_alternative_name: bool,
}

impl PolicyAttributes {
	/// Attributes with only a common name set.
	pub fn with_common_name(common_name: &str) -> Self {
		Self {
			common_name: Some(common_name.into()),
			..Default::default()
		}
	}
}

/// DNS names and IP addresses a leaf certificate is valid for.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubjectAlternativeName {
	pub dns_names: Vec<String>,
	pub ip_addresses: Vec<IpAddr>,
}

impl SubjectAlternativeName {
	/// True when there is nothing to render.
	pub fn is_empty(&self) -> bool {
		self.dns_names.is_empty() && self.ip_addresses.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reference_takes_precedence_over_inline() {
		let source: EntitySource<RootCa> =
			serde_json::from_str(r#"{ "$ref": "roots/main.yaml" }"#).unwrap();
		assert_eq!(
			source,
			EntitySource::Reference {
				path: "roots/main.yaml".into()
			}
		);
	}

	#[test]
	fn reference_wins_over_other_keys() {
		let source: EntitySource<RootCa> =
			serde_json::from_str(r#"{ "$ref": "a.json", "name": "ignored" }"#).unwrap();
		assert_eq!(source, EntitySource::Reference { path: "a.json".into() });

		let err = serde_json::from_str::<EntitySource<RootCa>>(r#"{ "$ref": 3 }"#).unwrap_err();
		assert!(err.to_string().contains("$ref"));
	}

	#[test]
	fn inline_type_errors_name_the_problem() {
		let err = serde_json::from_str::<EntitySource<RootCa>>(r#"{ "name": ["root1"] }"#)
			.unwrap_err();
		assert!(err.to_string().contains("a string or a number"), "{err}");
	}

	#[test]
	fn numeric_identity_fields_are_stringified() {
		let leaf: LeafCertificate = serde_json::from_str(
			r#"{ "ca_name": 2024, "ca_password": 12345678, "name": "web", "password": null, "pfx_password": 1.5 }"#,
		)
		.unwrap();
		assert_eq!(leaf.issuer_name.as_deref(), Some("2024"));
		assert_eq!(leaf.issuer_password.as_deref(), Some("12345678"));
		assert_eq!(leaf.password, None);
		assert_eq!(leaf.pfx_password.as_deref(), Some("1.5"));
	}

	#[test]
	fn root_defaults() {
		let root: RootCa = serde_json::from_str(r#"{ "name": "root1" }"#).unwrap();
		assert_eq!(root.name.as_deref(), Some("root1"));
		assert!(root.generate_dhparam);
		assert!(!root.should_insert_into_trusted_store);
		assert!(!root.has_extension_file);
		assert!(!root.overwrite_config);
		assert_eq!(root.config, None);
	}

	#[test]
	fn intermediate_document_keys() {
		let ca: IntermediateCa = serde_json::from_str(
			r#"{
				"is_last_chain_root_ca": true,
				"ca_chain_name": "root1",
				"ca_chain_password": "12345678",
				"name": "inter1"
			}"#,
		)
		.unwrap();
		assert!(ca.is_last_in_chain);
		assert_eq!(ca.parent_chain_name.as_deref(), Some("root1"));
		assert_eq!(ca.parent_chain_password.as_deref(), Some("12345678"));
	}

	#[test]
	fn leaf_document_keys() {
		let leaf: LeafCertificate = serde_json::from_str(
			r#"{ "is_ca_root_ca": false, "ca_name": "inter1", "ca_password": "12345678" }"#,
		)
		.unwrap();
		assert!(!leaf.issuer_is_root);
		assert_eq!(leaf.issuer_name.as_deref(), Some("inter1"));
	}

	#[test]
	fn sans_parse_ip_addresses() {
		let san: SubjectAlternativeName = serde_json::from_str(
			r#"{ "dns_names": ["localhost"], "ip_addresses": ["127.0.0.1", "::1"] }"#,
		)
		.unwrap();
		assert_eq!(san.dns_names, vec!["localhost".to_string()]);
		assert_eq!(
			san.ip_addresses,
			vec![
				"127.0.0.1".parse::<IpAddr>().unwrap(),
				"::1".parse::<IpAddr>().unwrap()
			]
		);
		assert!(!san.is_empty());
		assert!(SubjectAlternativeName::default().is_empty());
	}
}
