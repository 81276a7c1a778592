// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pending sign-in challenges, keyed by OAuth `state`.
//!
//! - States are random and single-use: consuming one removes it even when
//!   validation fails.
//! - States expire after 10 minutes.
//! - Each state is bound to the challenge kind that created it, so a popup
//!   callback cannot complete a redirect and vice versa.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

const STATE_EXPIRY_SECONDS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeMode {
	Popup,
	Redirect,
}

#[derive(Debug, Clone)]
pub struct PendingChallenge {
	pub mode: ChallengeMode,
	pub nonce: String,
	pub created_at: Instant,
}

impl PendingChallenge {
	fn is_expired(&self, expiry: Duration) -> bool {
		self.created_at.elapsed() >= expiry
	}
}

#[derive(Debug, Clone)]
pub struct PendingChallenges {
	states: Arc<RwLock<HashMap<String, PendingChallenge>>>,
	expiry: Duration,
}

impl Default for PendingChallenges {
	fn default() -> Self {
		Self::new()
	}
}

impl PendingChallenges {
	pub fn new() -> Self {
		Self::with_expiry(Duration::from_secs(STATE_EXPIRY_SECONDS))
	}

	pub fn with_expiry(expiry: Duration) -> Self {
		Self {
			states: Arc::new(RwLock::new(HashMap::new())),
			expiry,
		}
	}

	/// Record a new challenge. Expired entries are dropped under the same
	/// lock, so abandoned redirects do not accumulate.
	#[instrument(skip(self, state, nonce))]
	pub async fn store(&self, state: String, mode: ChallengeMode, nonce: String) {
		let mut states = self.states.write().await;
		prune_expired(&mut states, self.expiry);
		states.insert(
			state,
			PendingChallenge {
				mode,
				nonce,
				created_at: Instant::now(),
			},
		);
		tracing::debug!(total_states = states.len(), "stored sign-in state");
	}

	/// Remove `state` and return its challenge if it is unexpired and was
	/// created for `expected_mode`.
	#[instrument(skip(self, state))]
	pub async fn validate_and_consume(
		&self,
		state: &str,
		expected_mode: ChallengeMode,
	) -> Option<PendingChallenge> {
		let mut states = self.states.write().await;

		let Some(entry) = states.remove(state) else {
			tracing::debug!("sign-in state not found");
			return None;
		};

		if entry.is_expired(self.expiry) {
			tracing::debug!("sign-in state expired");
			return None;
		}

		if entry.mode != expected_mode {
			tracing::warn!(actual_mode = ?entry.mode, "sign-in state mode mismatch");
			return None;
		}

		Some(entry)
	}

	/// Drop a state whose challenge never reached Google (e.g. blocked popup).
	pub async fn discard(&self, state: &str) {
		self.states.write().await.remove(state);
	}

	/// Whether an unexpired challenge of `mode` is outstanding.
	pub async fn has_pending(&self, mode: ChallengeMode) -> bool {
		self.states
			.read()
			.await
			.values()
			.any(|entry| entry.mode == mode && !entry.is_expired(self.expiry))
	}

	pub async fn len(&self) -> usize {
		self.states.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.states.read().await.is_empty()
	}
}

fn prune_expired(states: &mut HashMap<String, PendingChallenge>, expiry: Duration) {
	let before = states.len();
	states.retain(|_, entry| !entry.is_expired(expiry));
	let removed = before - states.len();
	if removed > 0 {
		tracing::debug!(removed, remaining = states.len(), "pruned expired sign-in states");
	}
}

/// Random `state` parameter (UUID v4, 122 bits of randomness).
pub fn generate_state() -> String {
	uuid::Uuid::new_v4().to_string()
}

/// Random OIDC `nonce`.
pub fn generate_nonce() -> String {
	uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::collections::HashSet;

	#[tokio::test]
	async fn state_is_single_use() {
		let pending = PendingChallenges::new();
		let state = generate_state();
		pending
			.store(state.clone(), ChallengeMode::Redirect, "n".to_string())
			.await;

		let entry = pending
			.validate_and_consume(&state, ChallengeMode::Redirect)
			.await
			.unwrap();
		assert_eq!(entry.nonce, "n");
		assert!(pending
			.validate_and_consume(&state, ChallengeMode::Redirect)
			.await
			.is_none());
	}

	#[tokio::test]
	async fn mode_mismatch_consumes_and_rejects() {
		let pending = PendingChallenges::new();
		pending
			.store("s".to_string(), ChallengeMode::Popup, "n".to_string())
			.await;

		assert!(pending
			.validate_and_consume("s", ChallengeMode::Redirect)
			.await
			.is_none());
		assert!(pending.is_empty().await);
	}

	#[tokio::test]
	async fn expired_states_are_rejected() {
		let pending = PendingChallenges::with_expiry(Duration::ZERO);
		pending
			.store("a".to_string(), ChallengeMode::Redirect, "n".to_string())
			.await;
		assert!(!pending.has_pending(ChallengeMode::Redirect).await);
		assert!(pending
			.validate_and_consume("a", ChallengeMode::Redirect)
			.await
			.is_none());

		pending
			.store("b".to_string(), ChallengeMode::Popup, "n".to_string())
			.await;
		assert!(pending
			.validate_and_consume("b", ChallengeMode::Popup)
			.await
			.is_none());
	}

	#[tokio::test]
	async fn store_prunes_abandoned_challenges() {
		let pending = PendingChallenges::with_expiry(Duration::from_millis(20));
		for _ in 0..3 {
			pending
				.store(generate_state(), ChallengeMode::Redirect, generate_nonce())
				.await;
		}
		assert_eq!(pending.len().await, 3);

		tokio::time::sleep(Duration::from_millis(40)).await;
		pending
			.store("fresh".to_string(), ChallengeMode::Popup, "n".to_string())
			.await;

		assert_eq!(pending.len().await, 1);
		assert!(pending.has_pending(ChallengeMode::Popup).await);
		assert!(!pending.has_pending(ChallengeMode::Redirect).await);
	}

	#[tokio::test]
	async fn has_pending_is_per_mode() {
		let pending = PendingChallenges::new();
		pending
			.store("s".to_string(), ChallengeMode::Popup, "n".to_string())
			.await;
		assert!(pending.has_pending(ChallengeMode::Popup).await);
		assert!(!pending.has_pending(ChallengeMode::Redirect).await);

		pending.discard("s").await;
		assert!(!pending.has_pending(ChallengeMode::Popup).await);
	}

	proptest! {
		#[test]
		fn generated_states_are_unique(count in 2usize..64) {
			let states: HashSet<String> = (0..count).map(|_| generate_state()).collect();
			prop_assert_eq!(states.len(), count);
		}
	}
}
