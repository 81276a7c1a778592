// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{AuthConfigLayer, DatabaseConfigLayer, GoogleConfigLayer, LoggingConfigLayer};

/// One source's view of the configuration; every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CohortConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub google: Option<GoogleConfigLayer>,
	#[serde(default)]
	pub auth: Option<AuthConfigLayer>,
}

impl CohortConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: CohortConfigLayer) {
		merge_option(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_option(&mut self.google, other.google, GoogleConfigLayer::merge);
		merge_option(&mut self.auth, other.auth, AuthConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_adds_missing_sections() {
		let mut base = CohortConfigLayer::default();
		base.merge(CohortConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite::memory:".to_string()),
			}),
			..Default::default()
		});
		assert_eq!(
			base.database.unwrap().url.as_deref(),
			Some("sqlite::memory:")
		);
	}

	#[test]
	fn test_merge_other_overwrites_per_field() {
		let mut base: CohortConfigLayer = toml::from_str(
			r#"
			[google]
			client_id = "from-file"
			redirect_uri = "https://cohort.example.com/auth/callback"
			"#,
		)
		.unwrap();
		base.merge(CohortConfigLayer {
			google: Some(GoogleConfigLayer {
				client_id: Some("from-env".to_string()),
				..Default::default()
			}),
			..Default::default()
		});

		let google = base.google.unwrap();
		assert_eq!(google.client_id.as_deref(), Some("from-env"));
		assert_eq!(
			google.redirect_uri.as_deref(),
			Some("https://cohort.example.com/auth/callback")
		);
	}

	#[test]
	fn test_merge_empty_keeps_base() {
		let mut base = CohortConfigLayer {
			auth: Some(AuthConfigLayer {
				authorized_domains: Some(vec!["cohort.example.com".to_string()]),
			}),
			..Default::default()
		};
		base.merge(CohortConfigLayer::default());
		assert!(base.auth.is_some());
		assert!(base.google.is_none());
	}
}
