// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for Cohort.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`COHORT_*`)
//!
//! # Usage
//!
//! ```ignore
//! use cohort_config::load_config;
//!
//! let config = load_config()?;
//! println!("Events stored at {}", config.database.url);
//! ```

pub mod env;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use env::{load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::CohortConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};
use url::Url;

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct CohortConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	/// `None` when Google sign-in is not configured.
	pub google: Option<GoogleConfig>,
	pub auth: AuthConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`COHORT_*`)
/// 2. Config file (`/etc/cohort/cohort.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<CohortConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<CohortConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<CohortConfig, ConfigError> {
	let mut merged = CohortConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<CohortConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = CohortConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: CohortConfigLayer) -> Result<CohortConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let auth = layer.auth.unwrap_or_default().finalize();
	let google = layer.google.unwrap_or_default().build()?;

	validate_config(&auth, google.as_ref())?;

	info!(
		database = %database.url,
		log_format = ?logging.format,
		google_configured = google.is_some(),
		authorized_domains = auth.authorized_domains.len(),
		"Cohort configuration loaded"
	);

	Ok(CohortConfig {
		database,
		logging,
		google,
		auth,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(auth: &AuthConfig, google: Option<&GoogleConfig>) -> Result<(), ConfigError> {
	if auth.authorized_domains.is_empty() {
		return Err(ConfigError::Validation(
			"auth.authorized_domains must list at least one domain".to_string(),
		));
	}

	if let Some(google) = google {
		let host = redirect_host(&google.redirect_uri).ok_or_else(|| ConfigError::InvalidValue {
			key: "google.redirect_uri".to_string(),
			message: format!("'{}' is not an absolute http(s) URL", google.redirect_uri),
		})?;

		if !auth.authorized_domains.iter().any(|d| d == &host) {
			return Err(ConfigError::Validation(format!(
				"google.redirect_uri host '{host}' is not listed in auth.authorized_domains"
			)));
		}
	}

	Ok(())
}

fn redirect_host(uri: &str) -> Option<String> {
	Url::parse(uri)
		.ok()
		.filter(|u| matches!(u.scheme(), "http" | "https"))
		.and_then(|u| u.host_str().map(str::to_ascii_lowercase))
}
