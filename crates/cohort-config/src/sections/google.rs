// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Google sign-in configuration section.

use cohort_common_secret::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

fn default_scopes() -> Vec<String> {
	vec![
		"openid".to_string(),
		"email".to_string(),
		"profile".to_string(),
	]
}

/// Google OAuth settings as read from a single source (all optional).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleConfigLayer {
	pub client_id: Option<String>,
	pub client_secret: Option<SecretString>,
	pub redirect_uri: Option<String>,
	pub scopes: Option<Vec<String>>,
}

impl GoogleConfigLayer {
	/// Merge with another layer, preferring values from `other`.
	pub fn merge(&mut self, other: GoogleConfigLayer) {
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.client_secret.is_some() {
			self.client_secret = other.client_secret;
		}
		if other.redirect_uri.is_some() {
			self.redirect_uri = other.redirect_uri;
		}
		if other.scopes.is_some() {
			self.scopes = other.scopes;
		}
	}

	/// Build the resolved config. `Ok(None)` when no client id is configured.
	pub fn build(self) -> Result<Option<GoogleConfig>, ConfigError> {
		let Some(client_id) = self.client_id.filter(|s| !s.is_empty()) else {
			return Ok(None);
		};

		let client_secret = self
			.client_secret
			.filter(|s| !s.is_empty())
			.ok_or_else(|| {
				ConfigError::Validation(
					"Google client_secret is required when client_id is set".to_string(),
				)
			})?;

		let redirect_uri = self
			.redirect_uri
			.filter(|s| !s.is_empty())
			.ok_or_else(|| {
				ConfigError::Validation(
					"Google redirect_uri is required when client_id is set".to_string(),
				)
			})?;

		Ok(Some(GoogleConfig {
			client_id,
			client_secret,
			redirect_uri,
			scopes: self.scopes.unwrap_or_else(default_scopes),
		}))
	}
}

/// Validated Google OAuth configuration.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
	pub client_id: String,
	pub client_secret: SecretString,
	/// Callback URL registered with Google; its host must be an authorized domain.
	pub redirect_uri: String,
	pub scopes: Vec<String>,
}
