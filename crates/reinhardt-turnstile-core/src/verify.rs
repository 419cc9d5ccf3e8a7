//! Site-verify wire types.
//!
//! The token produced by the widget must be checked server-side against the
//! siteverify endpoint. Only the request and response shapes live here; the
//! HTTP relay is left to the application.

use serde::{Deserialize, Serialize};

/// Verification endpoint.
pub const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Form body of a verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteVerifyRequest {
	/// Widget secret key.
	pub secret: String,
	/// Token returned by the widget.
	pub response: String,
	/// Visitor IP address.
	#[serde(rename = "remoteip", skip_serializing_if = "Option::is_none")]
	pub remote_ip: Option<String>,
	/// UUID making the request safely retryable.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub idempotency_key: Option<String>,
}

impl SiteVerifyRequest {
	/// Request for `token` signed with `secret`.
	pub fn new(secret: impl Into<String>, token: impl Into<String>) -> Self {
		Self {
			secret: secret.into(),
			response: token.into(),
			remote_ip: None,
			idempotency_key: None,
		}
	}

	/// Set the visitor IP.
	pub fn with_remote_ip(mut self, ip: impl Into<String>) -> Self {
		self.remote_ip = Some(ip.into());
		self
	}

	/// Set the idempotency key.
	pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
		self.idempotency_key = Some(key.into());
		self
	}

	/// `application/x-www-form-urlencoded` body.
	pub fn to_form_body(&self) -> Result<String, serde_urlencoded::ser::Error> {
		serde_urlencoded::to_string(self)
	}
}

/// Error code reported by the verification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SiteVerifyErrorCode {
	/// The secret parameter was not passed.
	MissingInputSecret,
	/// The secret parameter was invalid or did not exist.
	InvalidInputSecret,
	/// The response parameter was not passed.
	MissingInputResponse,
	/// The response parameter is invalid or has expired.
	InvalidInputResponse,
	/// The widget id in the secret is invalid.
	InvalidWidgetId,
	/// The parsed secret is invalid.
	InvalidParsedSecret,
	/// The request was malformed.
	BadRequest,
	/// The token was already validated.
	TimeoutOrDuplicate,
	/// Server-side failure; the request can be retried.
	InternalError,
	/// A code this crate does not know.
	#[serde(other)]
	Unknown,
}

/// Challenge metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteVerifyMetadata {
	/// Whether an interactive challenge was issued.
	#[serde(default)]
	pub interactive: bool,
}

/// Body of a verification response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteVerifyResponse {
	/// Whether the token is valid.
	pub success: bool,
	/// Reasons for failure.
	#[serde(rename = "error-codes", default)]
	pub error_codes: Vec<SiteVerifyErrorCode>,
	/// ISO timestamp of the solve.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub challenge_ts: Option<String>,
	/// Hostname the challenge was served on.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hostname: Option<String>,
	/// `action` passed to the widget.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
	/// `cData` passed to the widget.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cdata: Option<String>,
	/// Challenge metadata.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<SiteVerifyMetadata>,
	/// Free-form messages.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub messages: Vec<String>,
}

impl SiteVerifyResponse {
	/// HTTP status a relay should answer with: 200 on success, 400 otherwise.
	pub fn status_code(&self) -> u16 {
		if self.success { 200 } else { 400 }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_form_body_encodes_token() {
		let body = SiteVerifyRequest::new("0x4AAA", "a b&c")
			.with_remote_ip("203.0.113.7")
			.to_form_body()
			.unwrap();
		assert_eq!(body, "secret=0x4AAA&response=a+b%26c&remoteip=203.0.113.7");
	}

	#[rstest]
	fn test_success_response() {
		let response: SiteVerifyResponse = serde_json::from_str(
			r#"{
				"success": true,
				"error-codes": [],
				"challenge_ts": "2024-01-01T00:00:00.000Z",
				"hostname": "example.com",
				"action": "login",
				"cdata": "session-1",
				"metadata": {"interactive": false}
			}"#,
		)
		.unwrap();

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.hostname.as_deref(), Some("example.com"));
		assert_eq!(response.metadata, Some(SiteVerifyMetadata { interactive: false }));
	}

	#[rstest]
	#[case("timeout-or-duplicate", SiteVerifyErrorCode::TimeoutOrDuplicate)]
	#[case("invalid-input-secret", SiteVerifyErrorCode::InvalidInputSecret)]
	#[case("something-new", SiteVerifyErrorCode::Unknown)]
	fn test_failure_response(#[case] code: &str, #[case] expected: SiteVerifyErrorCode) {
		let json = format!(r#"{{"success": false, "error-codes": ["{}"]}}"#, code);
		let response: SiteVerifyResponse = serde_json::from_str(&json).unwrap();

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.error_codes, vec![expected]);
	}
}
