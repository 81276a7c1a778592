// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Google OAuth 2.0 / OpenID Connect client.
//!
//! # Flow
//!
//! 1. **Authorization URL**: built with a `state` (CSRF protection) and a
//!    `nonce` (echoed back inside the ID token for replay protection).
//!    `prompt=select_account` lets users pick between several Google accounts.
//! 2. **Callback**: Google sends the browser to `redirect_uri` with `code` and
//!    `state`, or with `error` (for example `redirect_uri_mismatch`).
//! 3. **Code exchange**: the code is swapped for an access token and an ID token.
//! 4. **Identity**: claims are decoded from the ID token and checked against
//!    the client id, issuer, expiry and nonce.
//!
//! # Security Considerations
//!
//! - `client_secret`, access tokens and ID tokens are [`SecretString`]s and are
//!   never recorded by tracing spans.
//! - The ID token signature is not verified here; the token is received
//!   directly from Google's token endpoint over TLS.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cohort_common_secret::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
	/// The HTTP request to Google failed (network error, timeout, etc.).
	#[error("HTTP request failed: {0}")]
	HttpRequest(#[from] reqwest::Error),

	/// The response from Google could not be parsed as expected.
	#[error("failed to parse response: {0}")]
	ParseError(String),

	/// Google returned an error response (invalid code, expired token, etc.).
	#[error("Google API error: {0}")]
	GoogleError(String),

	/// The ID token is malformed or its claims do not match this client.
	#[error("invalid ID token: {0}")]
	InvalidIdToken(String),

	#[error("invalid endpoint URL: {0}")]
	InvalidEndpoint(#[from] url::ParseError),
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
	pub client_id: String,
	pub client_secret: SecretString,
	/// Callback URL registered with Google.
	pub redirect_uri: String,
	/// OAuth scopes to request (must include "openid" for OIDC).
	pub scopes: Vec<String>,
}

impl GoogleOAuthConfig {
	/// Join scopes into a space-separated string for the authorization URL.
	pub fn scopes_string(&self) -> String {
		self.scopes.join(" ")
	}
}

impl From<cohort_config::GoogleConfig> for GoogleOAuthConfig {
	fn from(config: cohort_config::GoogleConfig) -> Self {
		Self {
			client_id: config.client_id,
			client_secret: config.client_secret,
			redirect_uri: config.redirect_uri,
			scopes: config.scopes,
		}
	}
}

/// Google endpoint URLs. Overridden in tests to point at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
	pub authorize: String,
	pub token: String,
	pub userinfo: String,
	pub revoke: String,
}

impl Default for GoogleEndpoints {
	fn default() -> Self {
		Self {
			authorize: GOOGLE_AUTHORIZE_URL.to_string(),
			token: GOOGLE_TOKEN_URL.to_string(),
			userinfo: GOOGLE_USERINFO_URL.to_string(),
			revoke: GOOGLE_REVOKE_URL.to_string(),
		}
	}
}

impl GoogleEndpoints {
	/// All endpoints under one base URL, using Google's paths.
	pub fn with_base_url(base: &str) -> Self {
		let base = base.trim_end_matches('/');
		Self {
			authorize: format!("{base}/o/oauth2/v2/auth"),
			token: format!("{base}/token"),
			userinfo: format!("{base}/v1/userinfo"),
			revoke: format!("{base}/revoke"),
		}
	}
}

// =============================================================================
// Response types
// =============================================================================

/// Response from Google's token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTokenResponse {
	pub access_token: SecretString,
	pub id_token: SecretString,
	pub token_type: String,
	/// Token lifetime in seconds.
	pub expires_in: u64,
	#[serde(default)]
	pub refresh_token: Option<SecretString>,
	#[serde(default)]
	pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleUserInfo {
	pub sub: String,
	pub email: Option<String>,
	#[serde(default)]
	pub email_verified: bool,
	pub name: Option<String>,
	pub picture: Option<String>,
}

/// Claims from a decoded Google ID token (JWT payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleIdTokenClaims {
	pub iss: String,
	/// Google's stable user id.
	pub sub: String,
	pub aud: String,
	pub exp: u64,
	pub iat: u64,
	pub email: Option<String>,
	pub email_verified: Option<bool>,
	pub name: Option<String>,
	pub picture: Option<String>,
	pub nonce: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
	error: String,
	error_description: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
	config: GoogleOAuthConfig,
	endpoints: GoogleEndpoints,
	http_client: reqwest::Client,
}

impl GoogleOAuthClient {
	pub fn new(config: GoogleOAuthConfig) -> Result<Self, OAuthError> {
		Self::with_endpoints(config, GoogleEndpoints::default())
	}

	#[tracing::instrument(skip_all, name = "GoogleOAuthClient::new")]
	pub fn with_endpoints(
		config: GoogleOAuthConfig,
		endpoints: GoogleEndpoints,
	) -> Result<Self, OAuthError> {
		let http_client = reqwest::Client::builder()
			.user_agent(user_agent())
			.build()?;

		Ok(Self {
			config,
			endpoints,
			http_client,
		})
	}

	pub fn config(&self) -> &GoogleOAuthConfig {
		&self.config
	}

	/// Build the Google authorization URL for the given `state` and `nonce`.
	#[tracing::instrument(skip(self, state, nonce), fields(client_id = %self.config.client_id))]
	pub fn authorization_url(&self, state: &str, nonce: &str) -> Result<String, OAuthError> {
		let url = Url::parse_with_params(
			&self.endpoints.authorize,
			&[
				("client_id", self.config.client_id.as_str()),
				("redirect_uri", self.config.redirect_uri.as_str()),
				("response_type", "code"),
				("scope", self.config.scopes_string().as_str()),
				("state", state),
				("nonce", nonce),
				("prompt", "select_account"),
			],
		)?;

		Ok(url.to_string())
	}

	/// Exchange an authorization code for tokens.
	///
	/// # Errors
	///
	/// - [`OAuthError::HttpRequest`]: Network error or timeout.
	/// - [`OAuthError::GoogleError`]: Google rejected the code (expired, invalid, etc.).
	/// - [`OAuthError::ParseError`]: Unexpected response format.
	#[tracing::instrument(skip(self, code), name = "GoogleOAuthClient::exchange_code")]
	pub async fn exchange_code(&self, code: &str) -> Result<GoogleTokenResponse, OAuthError> {
		tracing::debug!("exchanging authorization code for tokens");

		let response = self
			.http_client
			.post(&self.endpoints.token)
			.form(&[
				("client_id", self.config.client_id.as_str()),
				("client_secret", self.config.client_secret.expose().as_str()),
				("code", code),
				("redirect_uri", self.config.redirect_uri.as_str()),
				("grant_type", "authorization_code"),
			])
			.send()
			.await?;

		let body = response.text().await?;

		if let Ok(error_response) = serde_json::from_str::<GoogleErrorResponse>(&body) {
			if !error_response.error.is_empty() {
				let message = error_response
					.error_description
					.unwrap_or(error_response.error);
				return Err(OAuthError::GoogleError(message));
			}
		}

		serde_json::from_str(&body)
			.map_err(|e| OAuthError::ParseError(format!("failed to parse token response: {e}")))
	}

	#[tracing::instrument(skip(self, access_token), name = "GoogleOAuthClient::get_user_info")]
	pub async fn get_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, OAuthError> {
		tracing::debug!("fetching Google user info");

		let response = self
			.http_client
			.get(&self.endpoints.userinfo)
			.bearer_auth(access_token)
			.send()
			.await?;

		if !response.status().is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(OAuthError::GoogleError(format!(
				"failed to get user info: {body}"
			)));
		}

		response
			.json()
			.await
			.map_err(|e| OAuthError::ParseError(format!("failed to parse user info response: {e}")))
	}

	/// Revoke an access or refresh token.
	#[tracing::instrument(skip(self, token), name = "GoogleOAuthClient::revoke_token")]
	pub async fn revoke_token(&self, token: &str) -> Result<(), OAuthError> {
		let response = self
			.http_client
			.post(&self.endpoints.revoke)
			.form(&[("token", token)])
			.send()
			.await?;

		if response.status().is_success() {
			tracing::debug!("token revoked");
			return Ok(());
		}

		let body = response.text().await.unwrap_or_default();
		match serde_json::from_str::<GoogleErrorResponse>(&body) {
			// An already revoked or expired token leaves nothing to revoke.
			Ok(err) if err.error == "invalid_token" => Ok(()),
			Ok(err) => Err(OAuthError::GoogleError(
				err.error_description.unwrap_or(err.error),
			)),
			Err(_) => Err(OAuthError::GoogleError(format!(
				"failed to revoke token: {body}"
			))),
		}
	}

	/// Decode the JWT payload of an ID token. Does not check the claims; see
	/// [`Self::verify_claims`].
	#[tracing::instrument(skip(self, id_token), name = "GoogleOAuthClient::decode_id_token")]
	pub fn decode_id_token(&self, id_token: &str) -> Result<GoogleIdTokenClaims, OAuthError> {
		let parts: Vec<&str> = id_token.split('.').collect();
		if parts.len() != 3 {
			return Err(OAuthError::InvalidIdToken(
				"ID token must have 3 parts".to_string(),
			));
		}

		let decoded = URL_SAFE_NO_PAD
			.decode(parts[1])
			.map_err(|e| OAuthError::InvalidIdToken(format!("failed to decode payload: {e}")))?;

		serde_json::from_slice(&decoded)
			.map_err(|e| OAuthError::InvalidIdToken(format!("failed to parse claims: {e}")))
	}

	/// Check audience, issuer, expiry (against `now`, seconds since the Unix
	/// epoch) and nonce.
	pub fn verify_claims(
		&self,
		claims: &GoogleIdTokenClaims,
		expected_nonce: &str,
		now: u64,
	) -> Result<(), OAuthError> {
		if claims.aud != self.config.client_id {
			return Err(OAuthError::InvalidIdToken("audience mismatch".to_string()));
		}
		if !GOOGLE_ISSUERS.contains(&claims.iss.as_str()) {
			return Err(OAuthError::InvalidIdToken(format!(
				"unexpected issuer '{}'",
				claims.iss
			)));
		}
		if claims.exp <= now {
			return Err(OAuthError::InvalidIdToken("token expired".to_string()));
		}
		if claims.nonce.as_deref() != Some(expected_nonce) {
			return Err(OAuthError::InvalidIdToken("nonce mismatch".to_string()));
		}
		Ok(())
	}
}

/// `cohort/{version}`
pub fn user_agent() -> String {
	format!("cohort/{}", env!("CARGO_PKG_VERSION"))
}
