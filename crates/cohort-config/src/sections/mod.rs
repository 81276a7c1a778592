// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

pub mod auth;
pub mod database;
pub mod google;
pub mod logging;

pub use auth::{AuthConfig, AuthConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use google::{GoogleConfig, GoogleConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
