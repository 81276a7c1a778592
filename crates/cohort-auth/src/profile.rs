// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User profiles in the `users` collection.

use std::sync::Arc;

use cohort_db::DocumentStore;

use crate::types::{AuthUser, UserId, UserProfile};

pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
	#[error("Failed to create user profile")]
	CreateFailed,

	#[error("Failed to fetch user profile")]
	FetchFailed,
}

#[derive(Clone)]
pub struct ProfileDirectory {
	store: Arc<dyn DocumentStore>,
}

impl ProfileDirectory {
	pub fn new(store: Arc<dyn DocumentStore>) -> Self {
		Self { store }
	}

	/// Store a profile for `user` unless one exists, then return the stored
	/// profile. An existing profile is returned unchanged.
	#[tracing::instrument(skip(self, user), fields(user_id = %user.uid))]
	pub async fn create_user_profile(&self, user: &AuthUser) -> Result<UserProfile, ProfileError> {
		let profile = UserProfile::from(user);
		let data = serde_json::to_value(&profile).map_err(|e| {
			tracing::error!(error = %e, "failed to encode user profile");
			ProfileError::CreateFailed
		})?;

		let created = self
			.store
			.create_document_if_absent(USERS_COLLECTION, user.uid.as_str(), &data)
			.await
			.map_err(|e| {
				tracing::error!(error = %e, "failed to store user profile");
				ProfileError::CreateFailed
			})?;

		if created {
			tracing::info!("user profile created");
			return Ok(profile);
		}

		match self.get_user_profile(&user.uid).await {
			Ok(Some(existing)) => Ok(existing),
			Ok(None) => {
				tracing::error!("user profile vanished after create-if-absent");
				Err(ProfileError::CreateFailed)
			}
			Err(_) => Err(ProfileError::CreateFailed),
		}
	}

	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn get_user_profile(&self, id: &UserId) -> Result<Option<UserProfile>, ProfileError> {
		let doc = self
			.store
			.get_document(USERS_COLLECTION, id.as_str())
			.await
			.map_err(|e| {
				tracing::warn!(error = %e, "failed to fetch user profile");
				ProfileError::FetchFailed
			})?;

		let Some(doc) = doc else {
			return Ok(None);
		};

		let mut data = doc.data;
		if let Some(obj) = data.as_object_mut() {
			obj.insert("id".to_string(), serde_json::Value::String(doc.id));
		}

		serde_json::from_value(data).map(Some).map_err(|e| {
			tracing::warn!(error = %e, "stored user profile is malformed");
			ProfileError::FetchFailed
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use cohort_db::testing::{create_test_repository, UnavailableStore};
	use serde_json::json;

	fn ada() -> AuthUser {
		AuthUser {
			uid: UserId::new("uid-ada"),
			display_name: Some("Ada Lovelace".to_string()),
			email: Some("ada@example.com".to_string()),
			photo_url: None,
		}
	}

	async fn directory() -> (ProfileDirectory, Arc<dyn DocumentStore>) {
		let store: Arc<dyn DocumentStore> = Arc::new(create_test_repository().await);
		(ProfileDirectory::new(Arc::clone(&store)), store)
	}

	#[tokio::test]
	async fn create_then_get_round_trips() {
		let (profiles, _) = directory().await;

		let created = profiles.create_user_profile(&ada()).await.unwrap();
		assert_eq!(created.name.as_deref(), Some("Ada Lovelace"));

		let fetched = profiles
			.get_user_profile(&UserId::new("uid-ada"))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(fetched, created);
	}

	#[tokio::test]
	async fn existing_profile_is_not_overwritten() {
		let (profiles, store) = directory().await;
		store
			.create_document_if_absent(
				USERS_COLLECTION,
				"uid-ada",
				&json!({"id": "uid-ada", "name": "Countess", "email": null, "avatar": null}),
			)
			.await
			.unwrap();

		let profile = profiles.create_user_profile(&ada()).await.unwrap();
		assert_eq!(profile.name.as_deref(), Some("Countess"));
	}

	#[tokio::test]
	async fn missing_profile_is_none() {
		let (profiles, _) = directory().await;
		assert!(profiles
			.get_user_profile(&UserId::new("nobody"))
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn store_failures_map_to_fixed_messages() {
		let profiles = ProfileDirectory::new(Arc::new(UnavailableStore));

		let err = profiles.create_user_profile(&ada()).await.unwrap_err();
		assert_eq!(err.to_string(), "Failed to create user profile");

		let err = profiles
			.get_user_profile(&UserId::new("uid-ada"))
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Failed to fetch user profile");
	}
}
