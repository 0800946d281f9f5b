//! HTTP proof oracle.
//!
//! Sends `POST {url}` with `{"index": n}` and expects a JSON object whose
//! `proof_bytes` field holds the proof, either as a hex string or as an
//! array of byte values.

use crate::{OracleError, OracleFactory, OracleInterface, OracleRegistry};
use async_trait::async_trait;
use relayer_types::{
	decode_hex, http_url, ConfigSchema, Field, FieldType, ImplementationRegistry, Proof,
	ProofRequest, Schema, ValidationError,
};
use serde::Deserialize;
use std::time::Duration;

/// Longest response excerpt carried into an error message.
const MAX_ERROR_BODY_LEN: usize = 256;

/// Shape of the oracle's success body. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct OracleResponse {
	#[serde(default)]
	proof_bytes: Option<ProofBytes>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProofBytes {
	Hex(String),
	Raw(Vec<u8>),
}

/// Oracle client talking to a fixed proof-service endpoint.
pub struct HttpOracle {
	client: reqwest::Client,
	url: String,
}

impl HttpOracle {
	/// Creates a client for `url`. Without `timeout` the transport default applies.
	pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, OracleError> {
		let mut builder = reqwest::Client::builder();
		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}
		let client = builder
			.build()
			.map_err(|e| OracleError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			url: url.into(),
		})
	}

	fn decode_proof(index: u64, field: Option<ProofBytes>) -> Result<Proof, OracleError> {
		let bytes = match field {
			None => return Err(OracleError::MissingProof(index)),
			Some(ProofBytes::Hex(hex_str)) => {
				if hex_str.trim().is_empty() {
					return Err(OracleError::MissingProof(index));
				}
				decode_hex(&hex_str).map_err(|e| {
					OracleError::InvalidResponse(format!("proof_bytes is not valid hex: {}", e))
				})?
			},
			Some(ProofBytes::Raw(bytes)) => bytes,
		};

		if bytes.is_empty() {
			return Err(OracleError::MissingProof(index));
		}

		Ok(Proof::new(bytes))
	}
}

/// Configuration schema for the HTTP oracle.
pub struct HttpOracleSchema;

impl ConfigSchema for HttpOracleSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("url", FieldType::String).with_validator(http_url)],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl OracleInterface for HttpOracle {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpOracleSchema)
	}

	async fn fetch_proof(&self, index: u64) -> Result<Proof, OracleError> {
		let response = self
			.client
			.post(&self.url)
			.json(&ProofRequest { index })
			.send()
			.await
			.map_err(|e| OracleError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let body = response
				.text()
				.await
				.unwrap_or_default()
				.chars()
				.take(MAX_ERROR_BODY_LEN)
				.collect();
			return Err(OracleError::Status {
				status: status.as_u16(),
				body,
			});
		}

		let body: OracleResponse = response
			.json()
			.await
			.map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

		Self::decode_proof(index, body.proof_bytes)
	}
}

/// Factory function to create an HTTP oracle from configuration.
///
/// Configuration parameters:
/// - `url`: proof service endpoint (required)
/// - `timeout_seconds`: request timeout (optional, transport default otherwise)
pub fn create_oracle(config: &toml::Value) -> Result<Box<dyn OracleInterface>, OracleError> {
	HttpOracleSchema
		.validate(config)
		.map_err(|e| OracleError::Configuration(e.to_string()))?;

	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| OracleError::Configuration("url is required".to_string()))?;

	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|secs| Duration::from_secs(secs as u64));

	Ok(Box::new(HttpOracle::new(url, timeout)?))
}

/// Registry for the HTTP oracle implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = OracleFactory;

	fn factory() -> Self::Factory {
		create_oracle
	}
}

impl OracleRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use wiremock::matchers::{body_json, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn oracle_for(server: &MockServer) -> HttpOracle {
		HttpOracle::new(format!("{}/proof", server.uri()), None).unwrap()
	}

	#[tokio::test]
	async fn test_fetch_hex_proof() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/proof"))
			.and(body_json(json!({ "index": 7 })))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "proof_bytes": "0xabcdef" })))
			.expect(1)
			.mount(&server)
			.await;

		let proof = oracle_for(&server).fetch_proof(7).await.unwrap();
		assert_eq!(proof.as_bytes(), &[0xab, 0xcd, 0xef]);
	}

	#[tokio::test]
	async fn test_fetch_byte_array_proof() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/proof"))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(json!({ "proof_bytes": [1, 2, 3], "extra": true })),
			)
			.mount(&server)
			.await;

		let proof = oracle_for(&server).fetch_proof(1).await.unwrap();
		assert_eq!(proof.as_bytes(), &[1, 2, 3]);
	}

	#[tokio::test]
	async fn test_missing_proof_field() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "pending" })))
			.mount(&server)
			.await;

		let err = oracle_for(&server).fetch_proof(3).await.unwrap_err();
		assert!(matches!(err, OracleError::MissingProof(3)));
	}

	#[tokio::test]
	async fn test_empty_proof_field() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "proof_bytes": "" })))
			.mount(&server)
			.await;

		let err = oracle_for(&server).fetch_proof(3).await.unwrap_err();
		assert!(matches!(err, OracleError::MissingProof(3)));

		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "proof_bytes": "0x" })))
			.mount(&server)
			.await;

		let err = oracle_for(&server).fetch_proof(3).await.unwrap_err();
		assert!(matches!(err, OracleError::MissingProof(3)));
	}

	#[tokio::test]
	async fn test_non_hex_proof_rejected() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "proof_bytes": "not-hex" })))
			.mount(&server)
			.await;

		let err = oracle_for(&server).fetch_proof(3).await.unwrap_err();
		assert!(matches!(err, OracleError::InvalidResponse(_)));
	}

	#[tokio::test]
	async fn test_error_status() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(404).set_body_string("unknown index"))
			.mount(&server)
			.await;

		let err = oracle_for(&server).fetch_proof(9).await.unwrap_err();
		match err {
			OracleError::Status { status, body } => {
				assert_eq!(status, 404);
				assert_eq!(body, "unknown index");
			},
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_non_json_body() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
			.mount(&server)
			.await;

		let err = oracle_for(&server).fetch_proof(9).await.unwrap_err();
		assert!(matches!(err, OracleError::InvalidResponse(_)));
	}

	#[tokio::test]
	async fn test_unreachable_service() {
		let oracle = HttpOracle::new("http://127.0.0.1:1/proof", Some(Duration::from_secs(2))).unwrap();
		let err = oracle.fetch_proof(1).await.unwrap_err();
		assert!(matches!(err, OracleError::Network(_)));
	}

	#[test]
	fn test_factory_validates_config() {
		let valid: toml::Value = toml::from_str(
			r#"
url = "http://localhost:8080/proof"
timeout_seconds = 15
"#,
		)
		.unwrap();
		assert!(create_oracle(&valid).is_ok());

		let missing_url: toml::Value = toml::from_str("timeout_seconds = 15").unwrap();
		assert!(matches!(
			create_oracle(&missing_url),
			Err(OracleError::Configuration(_))
		));

		let bad_url: toml::Value = toml::from_str(r#"url = "localhost:8080""#).unwrap();
		assert!(create_oracle(&bad_url).is_err());
	}
}
