// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sign-in policy.

use serde::Deserialize;

fn default_authorized_domains() -> Vec<String> {
	vec!["localhost".to_string()]
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Hosts allowed to receive sign-in callbacks.
	pub authorized_domains: Vec<String>,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			authorized_domains: default_authorized_domains(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub authorized_domains: Option<Vec<String>>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.authorized_domains.is_some() {
			self.authorized_domains = other.authorized_domains;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		let authorized_domains = self
			.authorized_domains
			.map(|domains| {
				domains
					.into_iter()
					.map(|d| d.trim().to_ascii_lowercase())
					.filter(|d| !d.is_empty())
					.collect()
			})
			.unwrap_or_else(default_authorized_domains);

		AuthConfig { authorized_domains }
	}
}
