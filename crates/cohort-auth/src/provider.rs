// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity provider abstraction.
//!
//! An [`IdentityProvider`] performs the interactive challenge (popup or full
//! page redirect), ends sessions, and publishes the current [`AuthState`] on a
//! `tokio::sync::watch` channel. Providers classify their failures with
//! [`ProviderErrorKind`] so the coordinator can pick a fallback or a message
//! without inspecting error strings.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::types::{AuthState, AuthUser};

/// Classification of identity provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// The host refused to open a popup window.
	PopupBlocked,
	/// The application's origin is not allowed to receive sign-in callbacks.
	UnauthorizedDomain,
	/// The user dismissed the popup before finishing.
	PopupClosed,
	Network,
	InvalidCredential,
	Other,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct ProviderError {
	pub kind: ProviderErrorKind,
	pub message: String,
}

impl ProviderError {
	pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}

	pub fn popup_blocked() -> Self {
		Self::new(ProviderErrorKind::PopupBlocked, "popup blocked")
	}

	pub fn unauthorized_domain(message: impl Into<String>) -> Self {
		Self::new(ProviderErrorKind::UnauthorizedDomain, message)
	}

	pub fn is_popup_blocked(&self) -> bool {
		self.kind == ProviderErrorKind::PopupBlocked
	}

	pub fn is_unauthorized_domain(&self) -> bool {
		self.kind == ProviderErrorKind::UnauthorizedDomain
	}
}

/// Result of collecting a redirect sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
	/// No redirect was started, or its result was already collected.
	None,
	/// A redirect was started but its callback has not arrived yet.
	Pending,
	Completed(AuthUser),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
	async fn sign_in_with_popup(&self) -> Result<AuthUser, ProviderError>;

	/// Start a full-page redirect challenge. Returns once navigation has been
	/// requested; the outcome is collected later with [`Self::redirect_result`].
	async fn sign_in_with_redirect(&self) -> Result<(), ProviderError>;

	async fn redirect_result(&self) -> Result<RedirectOutcome, ProviderError>;

	async fn sign_out(&self) -> Result<(), ProviderError>;

	/// Subscribe to authentication state. The current value is always
	/// observable on the returned receiver.
	fn subscribe(&self) -> watch::Receiver<AuthState>;
}
