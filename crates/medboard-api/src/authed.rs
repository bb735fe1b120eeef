//! Authenticated request pipeline
//!
//! Wraps every outgoing request with the current bearer credential. On a
//! 401, and only then, it triggers one coordinated renewal and replays the
//! request once with the fresh credential. The bound is structural: there is
//! no retry loop to run away.

use std::sync::Arc;

use medboard_auth::RefreshCoordinator;

use crate::client::ApiClient;
use crate::Result;

#[derive(Clone)]
pub struct AuthedClient {
    client: Arc<ApiClient>,
    coordinator: Arc<RefreshCoordinator>,
}

impl AuthedClient {
    pub fn new(client: Arc<ApiClient>, coordinator: Arc<RefreshCoordinator>) -> Self {
        Self {
            client,
            coordinator,
        }
    }

    /// The underlying transport client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.send(reqwest::Method::GET, path, None::<&()>).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        self.send(reqwest::Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T>(&self, path: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.send(reqwest::Method::DELETE, path, None::<&()>).await
    }

    async fn send<B, T>(&self, method: reqwest::Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        match self.dispatch(method.clone(), path, body).await {
            Err(e) if e.is_unauthorized() && self.client.store().refresh_token().is_some() => {
                tracing::debug!(path, "Request rejected with 401, attempting renewal");
                match self.coordinator.refresh().await {
                    // Replay once with the renewed credential; the replay's
                    // outcome is final
                    Some(_) => self.dispatch(method, path, body).await,
                    // Renewal failed (session dropped): surface the
                    // original failure unchanged
                    None => Err(e),
                }
            }
            outcome => outcome,
        }
    }

    /// Build and execute a single attempt, reading the bearer credential at
    /// build time so a replay picks up the renewed token
    async fn dispatch<B, T>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let mut request = self.client.request(method, path);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.client.execute(request).await
    }
}
