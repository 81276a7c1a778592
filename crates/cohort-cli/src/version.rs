// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Build information.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
	pub version: &'static str,
	pub git_sha: &'static str,
	pub platform: String,
}

impl BuildInfo {
	pub fn current() -> Self {
		Self {
			version: env!("CARGO_PKG_VERSION"),
			git_sha: option_env!("COHORT_GIT_SHA").unwrap_or("unknown"),
			platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn current_reports_package_version() {
		let info = BuildInfo::current();
		assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
		assert!(info.platform.contains(std::env::consts::OS));
	}
}
