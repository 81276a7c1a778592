// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sign-in orchestration and user profiles for Cohort.
//!
//! - [`IdentityProvider`]: popup and redirect challenges, sign-out, session state
//! - [`ProfileDirectory`]: profiles in the `users` document collection
//! - [`SignInCoordinator`]: popup-then-redirect sign-in with profile creation,
//!   returning serializable result records with fixed user-facing messages

pub mod coordinator;
pub mod profile;
pub mod provider;
pub mod types;

pub use coordinator::{
	RedirectResult, RedirectStatus, SignInCoordinator, SignInError, SignInResult, SignOutResult,
};
pub use profile::{ProfileDirectory, ProfileError, USERS_COLLECTION};
pub use provider::{IdentityProvider, ProviderError, ProviderErrorKind, RedirectOutcome};
pub use types::{AuthState, AuthUser, UserId, UserProfile};
