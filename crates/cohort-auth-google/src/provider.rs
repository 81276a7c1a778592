// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! [`IdentityProvider`] backed by Google sign-in.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use cohort_auth::{
	AuthState, AuthUser, IdentityProvider, ProviderError, ProviderErrorKind, RedirectOutcome, UserId,
};
use cohort_common_secret::SecretString;
use tokio::sync::{watch, Mutex};
use url::Url;

use crate::browser::{BrowserWindow, CallbackParams, PopupError};
use crate::client::{GoogleIdTokenClaims, GoogleOAuthClient, OAuthError};
use crate::state::{generate_nonce, generate_state, ChallengeMode, PendingChallenges};

impl From<OAuthError> for ProviderError {
	fn from(err: OAuthError) -> Self {
		let kind = match &err {
			OAuthError::HttpRequest(_) => ProviderErrorKind::Network,
			OAuthError::GoogleError(_) | OAuthError::InvalidIdToken(_) => {
				ProviderErrorKind::InvalidCredential
			}
			OAuthError::ParseError(_) | OAuthError::InvalidEndpoint(_) => ProviderErrorKind::Other,
		};
		ProviderError::new(kind, err.to_string())
	}
}

impl From<PopupError> for ProviderError {
	fn from(err: PopupError) -> Self {
		let kind = match err {
			PopupError::Blocked => ProviderErrorKind::PopupBlocked,
			PopupError::Closed => ProviderErrorKind::PopupClosed,
			PopupError::Failed(_) => ProviderErrorKind::Other,
		};
		ProviderError::new(kind, err.to_string())
	}
}

pub struct GoogleIdentityProvider {
	client: GoogleOAuthClient,
	browser: Arc<dyn BrowserWindow>,
	authorized_domains: Vec<String>,
	pending: PendingChallenges,
	callback: Mutex<Option<CallbackParams>>,
	access_token: Mutex<Option<SecretString>>,
	session: watch::Sender<AuthState>,
}

impl GoogleIdentityProvider {
	/// Create a provider with no active session.
	pub fn new(
		client: GoogleOAuthClient,
		browser: Arc<dyn BrowserWindow>,
		authorized_domains: Vec<String>,
	) -> Self {
		Self {
			client,
			browser,
			authorized_domains: authorized_domains
				.into_iter()
				.map(|d| d.to_ascii_lowercase())
				.collect(),
			pending: PendingChallenges::new(),
			callback: Mutex::new(None),
			access_token: Mutex::new(None),
			session: watch::Sender::new(AuthState::SignedOut),
		}
	}

	/// Hand over the query parameters from the redirect URI after a
	/// full-page redirect. Completed by the next `redirect_result` call.
	#[tracing::instrument(skip_all)]
	pub async fn receive_callback(&self, params: CallbackParams) {
		*self.callback.lock().await = Some(params);
	}

	pub fn pending_challenges(&self) -> &PendingChallenges {
		&self.pending
	}

	fn ensure_authorized_domain(&self) -> Result<(), ProviderError> {
		let redirect_uri = &self.client.config().redirect_uri;
		let host = Url::parse(redirect_uri)
			.ok()
			.and_then(|u| u.host_str().map(str::to_ascii_lowercase));

		match host {
			Some(host) if self.authorized_domains.iter().any(|d| *d == host) => Ok(()),
			Some(host) => {
				tracing::warn!(%host, "redirect host is not an authorized domain");
				Err(ProviderError::unauthorized_domain(format!(
					"{host} is not an authorized domain"
				)))
			}
			None => Err(ProviderError::unauthorized_domain(
				"redirect URI has no host",
			)),
		}
	}

	async fn start_challenge(&self, mode: ChallengeMode) -> Result<(String, String), ProviderError> {
		self.ensure_authorized_domain()?;

		let state = generate_state();
		let nonce = generate_nonce();
		let url = self.client.authorization_url(&state, &nonce)?;
		self.pending.store(state.clone(), mode, nonce).await;
		Ok((state, url))
	}

	async fn complete(
		&self,
		params: CallbackParams,
		mode: ChallengeMode,
	) -> Result<AuthUser, ProviderError> {
		if let Some(error) = params.error {
			if let Some(state) = &params.state {
				self.pending.discard(state).await;
			}
			let message = params.error_description.unwrap_or_else(|| error.clone());
			return Err(match error.as_str() {
				"redirect_uri_mismatch" => ProviderError::unauthorized_domain(message),
				"access_denied" => ProviderError::new(ProviderErrorKind::PopupClosed, message),
				_ => ProviderError::new(ProviderErrorKind::Other, message),
			});
		}

		let state = params.state.ok_or_else(|| {
			ProviderError::new(ProviderErrorKind::InvalidCredential, "callback has no state")
		})?;
		let challenge = self
			.pending
			.validate_and_consume(&state, mode)
			.await
			.ok_or_else(|| {
				ProviderError::new(
					ProviderErrorKind::InvalidCredential,
					"unknown or expired sign-in state",
				)
			})?;
		let code = params.code.ok_or_else(|| {
			ProviderError::new(ProviderErrorKind::InvalidCredential, "callback has no code")
		})?;

		let tokens = self.client.exchange_code(&code).await?;
		let claims = self.client.decode_id_token(tokens.id_token.expose())?;
		self.client
			.verify_claims(&claims, &challenge.nonce, unix_now())?;

		let mut user = auth_user_from_claims(claims);
		if user.display_name.is_none() || user.email.is_none() || user.photo_url.is_none() {
			self.fill_from_userinfo(&mut user, tokens.access_token.expose())
				.await;
		}
		*self.access_token.lock().await = Some(tokens.access_token);
		self.session.send_replace(AuthState::SignedIn(user.clone()));

		tracing::info!(user_id = %user.uid, "google sign-in completed");
		Ok(user)
	}

	/// ID tokens omit profile claims when the matching scopes were not
	/// granted at issue time. Fill the gaps from the userinfo endpoint; a
	/// failed lookup keeps whatever the token carried.
	async fn fill_from_userinfo(&self, user: &mut AuthUser, access_token: &str) {
		let info = match self.client.get_user_info(access_token).await {
			Ok(info) => info,
			Err(e) => {
				tracing::warn!(error = %e, "userinfo lookup failed, using ID token claims only");
				return;
			}
		};
		if info.sub != user.uid.as_str() {
			tracing::warn!("userinfo subject does not match ID token");
			return;
		}

		user.display_name = user.display_name.take().or(info.name);
		user.email = user.email.take().or(info.email);
		user.photo_url = user.photo_url.take().or(info.picture);
	}
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
	#[tracing::instrument(skip(self))]
	async fn sign_in_with_popup(&self) -> Result<AuthUser, ProviderError> {
		let (state, url) = self.start_challenge(ChallengeMode::Popup).await?;

		match self.browser.open_popup(&url).await {
			Ok(params) => self.complete(params, ChallengeMode::Popup).await,
			Err(err) => {
				self.pending.discard(&state).await;
				Err(err.into())
			}
		}
	}

	#[tracing::instrument(skip(self))]
	async fn sign_in_with_redirect(&self) -> Result<(), ProviderError> {
		let (state, url) = self.start_challenge(ChallengeMode::Redirect).await?;

		if let Err(err) = self.browser.redirect_to(&url).await {
			self.pending.discard(&state).await;
			return Err(err.into());
		}
		Ok(())
	}

	#[tracing::instrument(skip(self))]
	async fn redirect_result(&self) -> Result<RedirectOutcome, ProviderError> {
		let callback = self.callback.lock().await.take();

		match callback {
			Some(params) => self
				.complete(params, ChallengeMode::Redirect)
				.await
				.map(RedirectOutcome::Completed),
			None if self.pending.has_pending(ChallengeMode::Redirect).await => {
				Ok(RedirectOutcome::Pending)
			}
			None => Ok(RedirectOutcome::None),
		}
	}

	/// Revoke the access token, then clear the session. On failure the
	/// session is left as it was.
	#[tracing::instrument(skip(self))]
	async fn sign_out(&self) -> Result<(), ProviderError> {
		let mut access_token = self.access_token.lock().await;
		if let Some(token) = access_token.as_ref() {
			self.client.revoke_token(token.expose()).await?;
		}
		*access_token = None;

		self.session.send_replace(AuthState::SignedOut);
		tracing::info!("signed out");
		Ok(())
	}

	fn subscribe(&self) -> watch::Receiver<AuthState> {
		self.session.subscribe()
	}
}

fn auth_user_from_claims(claims: GoogleIdTokenClaims) -> AuthUser {
	AuthUser {
		uid: UserId::new(claims.sub),
		display_name: claims.name,
		email: claims.email,
		photo_url: claims.picture,
	}
}

fn unix_now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or_default()
}
