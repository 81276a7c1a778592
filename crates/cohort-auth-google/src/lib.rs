// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Google sign-in for Cohort.
//!
//! [`GoogleIdentityProvider`] implements [`cohort_auth::IdentityProvider`] on
//! top of the OAuth 2.0 authorization code flow with OpenID Connect:
//!
//! 1. A random `state` and `nonce` are stored as a [`PendingChallenges`] entry
//!    bound to the popup or redirect mode.
//! 2. The authorization URL is opened through the host's [`BrowserWindow`].
//! 3. The callback's `state` is consumed, the code is exchanged, and the ID
//!    token's audience, issuer, expiry and nonce are checked.
//!
//! The redirect URI's host must be one of the configured authorized domains.

pub mod browser;
pub mod client;
pub mod provider;
pub mod state;

pub use browser::{BrowserWindow, CallbackParams, PopupError};
pub use client::{
	user_agent, GoogleEndpoints, GoogleIdTokenClaims, GoogleOAuthClient, GoogleOAuthConfig,
	GoogleTokenResponse, GoogleUserInfo, OAuthError,
};
pub use provider::GoogleIdentityProvider;
pub use state::{generate_nonce, generate_state, ChallengeMode, PendingChallenge, PendingChallenges};
