//! Admin client for the Supabase management surfaces
//!
//! Covers the three admin operations the deployment actually needs: user
//! lookup/maintenance through the GoTrue admin API and Edge Function
//! invocation. Every request carries the service-role key in both the
//! `apikey` and `Authorization` headers, the way `supabase-js` sends them.

use reqwest::StatusCode;
use serde_json::json;
use supaops_common::scrub_secrets;
use supaops_config::SupabaseConfig;
use uuid::Uuid;

use crate::error::{SupabaseError, SupabaseResult};
use crate::models::{AdminUser, UserPage};

const USER_PAGE_SIZE: u32 = 1000;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for Supabase admin operations
pub struct SupabaseAdminClient {
    base_url: String,
    service_role_key: String,
    client: reqwest::Client,
}

impl SupabaseAdminClient {
    /// Create a client from configuration, failing fast when the project
    /// URL or service-role key is missing
    ///
    /// # Errors
    /// Returns a configuration error naming the missing variable, or a
    /// transport error if the HTTP client cannot be built
    pub fn new(config: &SupabaseConfig) -> SupabaseResult<Self> {
        let (url, key) = config.require_admin()?;
        Self::with_credentials(url, key)
    }

    /// Create a client from explicit credentials
    ///
    /// # Errors
    /// Returns a transport error if the HTTP client cannot be built
    pub fn with_credentials(base_url: &str, service_role_key: &str) -> SupabaseResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key: service_role_key.to_string(),
            client,
        })
    }

    /// Find a user by email, case-insensitively
    ///
    /// The admin API has no server-side email filter, so pages are walked
    /// and matched client-side.
    ///
    /// # Errors
    /// Returns auth, transport, or decode errors from the listing endpoint
    pub async fn find_user_by_email(&self, email: &str) -> SupabaseResult<Option<AdminUser>> {
        let needle = email.to_lowercase();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}/auth/v1/admin/users?page={page}&per_page={USER_PAGE_SIZE}",
                self.base_url
            );
            let response = self.send(self.client.get(&url)).await?;
            let body: UserPage = decode(response).await?;

            if body.users.is_empty() {
                return Ok(None);
            }

            let found = body.users.into_iter().find(|user| {
                user.email
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase() == needle)
            });
            if found.is_some() {
                return Ok(found);
            }

            page = page.saturating_add(1);
        }
    }

    /// Set the role claim in a user's `app_metadata`
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown user id, or auth/transport errors
    pub async fn set_user_role(&self, user_id: Uuid, role: &str) -> SupabaseResult<AdminUser> {
        let url = format!("{}/auth/v1/admin/users/{user_id}", self.base_url);
        let response = self
            .send(
                self.client
                    .put(&url)
                    .json(&json!({ "app_metadata": { "role": role } })),
            )
            .await?;
        tracing::info!(%user_id, role, "user role updated");
        decode(response).await
    }

    /// Set a new password for a user
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown user id, or auth/transport errors
    pub async fn reset_password(
        &self,
        user_id: Uuid,
        new_password: &str,
    ) -> SupabaseResult<AdminUser> {
        let url = format!("{}/auth/v1/admin/users/{user_id}", self.base_url);
        let response = self
            .send(
                self.client
                    .put(&url)
                    .json(&json!({ "password": new_password })),
            )
            .await?;
        tracing::info!(%user_id, "user password reset");
        decode(response).await
    }

    /// Invoke an Edge Function with a JSON payload
    ///
    /// # Errors
    /// Returns `NotFound` for an undeployed function, or auth/transport
    /// errors; the function's own JSON response is returned as-is
    pub async fn invoke_function(
        &self,
        name: &str,
        payload: serde_json::Value,
    ) -> SupabaseResult<serde_json::Value> {
        let url = format!("{}/functions/v1/{name}", self.base_url);
        let response = self.send(self.client.post(&url).json(&payload)).await?;
        tracing::info!(function = name, "edge function invoked");
        decode(response).await
    }

    /// Attach auth headers, send, and map non-success statuses
    async fn send(&self, request: reqwest::RequestBuilder) -> SupabaseResult<reqwest::Response> {
        let response = request
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = scrub_secrets(&response.text().await.unwrap_or_default());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SupabaseError::Auth { message })
            }
            StatusCode::NOT_FOUND => Err(SupabaseError::NotFound { message }),
            _ => Err(SupabaseError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> SupabaseResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| SupabaseError::InvalidResponse {
        message: e.to_string(),
    })
}
