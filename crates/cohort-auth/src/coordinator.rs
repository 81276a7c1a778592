// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sign-in orchestration.
//!
//! [`SignInCoordinator`] tries a popup challenge first and falls back to a
//! full-page redirect when the popup is blocked. A successful challenge is
//! only reported once the user's profile exists in the `users` collection.
//! Every operation returns a plain result record; provider and store
//! failures are logged and replaced by a fixed user-facing message.

use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::profile::{ProfileDirectory, ProfileError};
use crate::provider::{IdentityProvider, ProviderError, RedirectOutcome};
use crate::types::{AuthState, AuthUser, UserId, UserProfile};

/// User-facing sign-in failures. `Display` is the message shown to users and
/// the value the error serializes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignInError {
	#[error("This domain is not authorized for authentication. Please contact support.")]
	UnauthorizedDomain,

	#[error("Unable to start authentication. Please try again.")]
	StartFailed,

	#[error("Authentication failed. Please try again.")]
	RedirectFailed,

	#[error("Failed to sign out. Please try again.")]
	SignOutFailed,

	#[error(transparent)]
	Profile(#[from] ProfileError),
}

impl Serialize for SignInError {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInResult {
	pub user: Option<UserProfile>,
	pub error: Option<SignInError>,
}

impl SignInResult {
	fn signed_in(user: UserProfile) -> Self {
		Self {
			user: Some(user),
			error: None,
		}
	}

	/// Redirect started; the outcome arrives through `handle_redirect_result`.
	fn deferred() -> Self {
		Self {
			user: None,
			error: None,
		}
	}

	fn failed(error: SignInError) -> Self {
		Self {
			user: None,
			error: Some(error),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectStatus {
	Completed,
	Pending,
	#[serde(rename = "none")]
	NoRedirect,
	Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectResult {
	pub status: RedirectStatus,
	pub user: Option<UserProfile>,
	pub error: Option<SignInError>,
}

impl RedirectResult {
	fn empty(status: RedirectStatus) -> Self {
		Self {
			status,
			user: None,
			error: None,
		}
	}

	fn failed(error: SignInError) -> Self {
		Self {
			status: RedirectStatus::Failed,
			user: None,
			error: Some(error),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignOutResult {
	pub error: Option<SignInError>,
}

pub struct SignInCoordinator {
	provider: Arc<dyn IdentityProvider>,
	profiles: ProfileDirectory,
}

impl SignInCoordinator {
	pub fn new(provider: Arc<dyn IdentityProvider>, profiles: ProfileDirectory) -> Self {
		Self { provider, profiles }
	}

	/// Popup sign-in with redirect fallback.
	///
	/// Exactly one of `user` and `error` is set, except when the popup was
	/// blocked and a redirect was started, in which case both are `None`.
	#[tracing::instrument(skip(self))]
	pub async fn sign_in_with_google(&self) -> SignInResult {
		let err = match self.provider.sign_in_with_popup().await {
			Ok(user) => {
				return match self.materialize_profile(&user).await {
					Ok(profile) => SignInResult::signed_in(profile),
					Err(e) => SignInResult::failed(e),
				};
			}
			Err(err) => err,
		};

		if !err.is_popup_blocked() {
			return SignInResult::failed(classify_start_error(&err));
		}

		tracing::info!("popup blocked, falling back to redirect sign-in");
		match self.provider.sign_in_with_redirect().await {
			Ok(()) => SignInResult::deferred(),
			Err(err) => SignInResult::failed(classify_start_error(&err)),
		}
	}

	/// Collect the outcome of a redirect started by an earlier
	/// `sign_in_with_google` call.
	#[tracing::instrument(skip(self))]
	pub async fn handle_redirect_result(&self) -> RedirectResult {
		let user = match self.provider.redirect_result().await {
			Ok(RedirectOutcome::Completed(user)) => user,
			Ok(RedirectOutcome::Pending) => return RedirectResult::empty(RedirectStatus::Pending),
			Ok(RedirectOutcome::None) => return RedirectResult::empty(RedirectStatus::NoRedirect),
			Err(err) => {
				tracing::warn!(kind = ?err.kind, error = %err.message, "redirect sign-in failed");
				return RedirectResult::failed(SignInError::RedirectFailed);
			}
		};

		match self.materialize_profile(&user).await {
			Ok(profile) => RedirectResult {
				status: RedirectStatus::Completed,
				user: Some(profile),
				error: None,
			},
			Err(e) => RedirectResult::failed(e),
		}
	}

	#[tracing::instrument(skip(self))]
	pub async fn sign_out_user(&self) -> SignOutResult {
		match self.provider.sign_out().await {
			Ok(()) => SignOutResult { error: None },
			Err(err) => {
				tracing::warn!(kind = ?err.kind, error = %err.message, "sign-out failed");
				SignOutResult {
					error: Some(SignInError::SignOutFailed),
				}
			}
		}
	}

	/// Wait for the provider's first resolved state, then look up the
	/// signed-in user's profile. Falls back to a profile built from session
	/// claims when none is stored or the lookup fails.
	#[tracing::instrument(skip(self))]
	pub async fn get_current_user(&self) -> Option<UserProfile> {
		let mut rx = self.provider.subscribe();
		let state = match rx.wait_for(AuthState::is_resolved).await {
			Ok(state) => state.clone(),
			Err(_) => {
				tracing::warn!("auth state channel closed before resolving");
				return None;
			}
		};
		drop(rx);

		let AuthState::SignedIn(user) = state else {
			return None;
		};

		match self.profiles.get_user_profile(&user.uid).await {
			Ok(Some(profile)) => Some(profile),
			Ok(None) => Some(UserProfile::from(&user)),
			Err(_) => {
				tracing::debug!("using session claims as profile");
				Some(UserProfile::from(&user))
			}
		}
	}

	pub async fn create_user_profile(&self, user: &AuthUser) -> Result<UserProfile, ProfileError> {
		self.profiles.create_user_profile(user).await
	}

	pub async fn get_user_profile(&self, id: &UserId) -> Result<Option<UserProfile>, ProfileError> {
		self.profiles.get_user_profile(id).await
	}

	async fn materialize_profile(&self, user: &AuthUser) -> Result<UserProfile, SignInError> {
		self.profiles
			.create_user_profile(user)
			.await
			.map_err(SignInError::from)
	}
}

fn classify_start_error(err: &ProviderError) -> SignInError {
	tracing::warn!(kind = ?err.kind, error = %err.message, "sign-in failed");
	if err.is_unauthorized_domain() {
		SignInError::UnauthorizedDomain
	} else {
		SignInError::StartFailed
	}
}
