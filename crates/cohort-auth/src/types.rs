// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity types shared by the sign-in coordinator and identity providers.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for UserId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for UserId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

// =============================================================================
// Session claims and profiles
// =============================================================================

/// Claims about the signed-in user as asserted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
	pub uid: UserId,
	pub display_name: Option<String>,
	pub email: Option<String>,
	pub photo_url: Option<String>,
}

/// Stored user profile, keyed by the identity provider's user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	pub id: UserId,
	pub name: Option<String>,
	pub email: Option<String>,
	pub avatar: Option<String>,
}

impl From<&AuthUser> for UserProfile {
	fn from(user: &AuthUser) -> Self {
		Self {
			id: user.uid.clone(),
			name: user.display_name.clone(),
			email: user.email.clone(),
			avatar: user.photo_url.clone(),
		}
	}
}

// =============================================================================
// Session state
// =============================================================================

/// Authentication state broadcast by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
	/// The provider has not yet determined whether a session exists.
	#[default]
	Unresolved,
	SignedOut,
	SignedIn(AuthUser),
}

impl AuthState {
	pub fn is_resolved(&self) -> bool {
		!matches!(self, AuthState::Unresolved)
	}
}
