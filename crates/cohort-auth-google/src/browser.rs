// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The host's window capability: popups and full-page navigation.

use async_trait::async_trait;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PopupError {
	#[error("popup blocked")]
	Blocked,

	#[error("popup closed before sign-in finished")]
	Closed,

	#[error("window operation failed: {0}")]
	Failed(String),
}

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
	pub code: Option<String>,
	pub state: Option<String>,
	pub error: Option<String>,
	pub error_description: Option<String>,
}

impl CallbackParams {
	/// Parse the callback parameters from a full callback URL.
	pub fn from_url(url: &str) -> Result<Self, url::ParseError> {
		let url = Url::parse(url)?;
		let mut params = Self::default();
		for (key, value) in url.query_pairs() {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};
			*slot = Some(value.into_owned());
		}
		Ok(params)
	}
}

#[async_trait]
pub trait BrowserWindow: Send + Sync {
	/// Open `url` in a popup and wait until it lands on the redirect URI.
	async fn open_popup(&self, url: &str) -> Result<CallbackParams, PopupError>;

	/// Navigate the current page to `url`. The callback comes back on a later
	/// page load through `GoogleIdentityProvider::receive_callback`.
	async fn redirect_to(&self, url: &str) -> Result<(), PopupError>;
}
