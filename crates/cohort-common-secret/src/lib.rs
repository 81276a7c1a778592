// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for credentials handled by Cohort.
//!
//! OAuth client secrets, access tokens, ID tokens and refresh tokens all pass
//! through [`Secret<T>`]. The wrapper:
//!
//! - prints `[REDACTED]` for both `Debug` and `Display`, so `tracing` fields
//!   recorded with `%` or `?` never carry the value
//! - serializes as `"[REDACTED]"` so config dumps stay clean
//! - zeroizes the inner value on drop
//! - only hands out the value through an explicit [`Secret::expose`]
//!
//! ```
//! use cohort_common_secret::SecretString;
//!
//! let client_secret = SecretString::new("GOCSPX-abc".to_string());
//! assert_eq!(format!("{client_secret}"), "[REDACTED]");
//! assert_eq!(client_secret.expose(), "GOCSPX-abc");
//! ```

use std::fmt;
use zeroize::Zeroize;

/// Placeholder written wherever a secret would otherwise be printed.
pub const REDACTED: &str = "[REDACTED]";

/// A value that must not leak into logs, debug output or serialized config.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

/// Secret strings are the only kind Cohort stores today.
pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Borrow the wrapped value. Every call site is a deliberate disclosure.
	pub fn expose(&self) -> &T {
		&self.inner
	}

	/// Copy the wrapped value out, leaving the original to be zeroized on drop.
	pub fn into_inner(self) -> T
	where
		T: Clone,
	{
		self.inner.clone()
	}
}

impl SecretString {
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

#[cfg(feature = "serde")]
mod serde_impl {
	use super::{Secret, REDACTED};
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	impl<T> Serialize for Secret<T>
	where
		T: Zeroize,
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de, T> Deserialize<'de> for Secret<T>
	where
		T: Deserialize<'de> + Zeroize,
	{
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			T::deserialize(deserializer).map(Secret::new)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_and_display_hide_client_secret() {
		let secret = Secret::new("GOCSPX-client-secret".to_string());

		assert_eq!(format!("{secret}"), REDACTED);
		assert!(!format!("{secret:?}").contains("GOCSPX"));
	}

	#[test]
	fn optional_token_debug_is_redacted() {
		let refresh: Option<SecretString> = Some(Secret::new("1//refresh".to_string()));
		let debug = format!("{refresh:?}");
		assert!(debug.contains(REDACTED));
		assert!(!debug.contains("1//refresh"));
	}

	#[test]
	fn expose_and_into_inner_return_value() {
		let secret = Secret::new("ya29.token".to_string());
		assert_eq!(secret.expose(), "ya29.token");
		assert_eq!(secret.clone().into_inner(), "ya29.token");
		assert!(!secret.is_empty());
	}

	#[test]
	fn serialize_is_redacted_and_deserialize_keeps_value() {
		let secret = Secret::new("ya29.token".to_string());
		assert_eq!(serde_json::to_string(&secret).unwrap(), "\"[REDACTED]\"");

		let parsed: SecretString = serde_json::from_str("\"from-config\"").unwrap();
		assert_eq!(parsed.expose(), "from-config");
	}

	proptest! {
		#[test]
		fn display_never_contains_value(inner in "[a-zA-Z0-9._/-]{4,40}") {
			prop_assume!(!REDACTED.contains(inner.as_str()));
			let secret = Secret::new(inner.clone());
			let shown = secret.to_string();
			let serialized = serde_json::to_string(&secret).unwrap();
			prop_assert!(!shown.contains(&inner));
			prop_assert!(!serialized.contains(&inner));
		}
	}
}
