//! REST client for the MedBoard backend

use async_trait::async_trait;
use reqwest::{header, Client, ClientBuilder};
use std::time::Duration;
use url::Url;

use medboard_auth::{AuthBackend, AuthError, TokenPair};
use medboard_session::SessionStore;

use crate::error::ApiError;
use crate::types::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};
use crate::Result;

/// MedBoard API client
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: SessionStore,
}

impl ApiClient {
    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session store backing the bearer credential
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Create a request builder carrying the current bearer credential
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.endpoint(method, path);

        if let Some(access_token) = self.store.access_token() {
            request = request.header(header::AUTHORIZATION, format!("Bearer {access_token}"));
        }

        request
    }

    /// Create a request builder with no credential attached
    fn endpoint(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.http.request(method, url)
    }

    /// Execute a request and map non-success statuses to typed errors
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            Err(ApiError::from_status(status, message))
        }
    }

    /// Exchange credentials for a token pair.
    ///
    /// The caller (the console facade) is responsible for committing the
    /// result to the session store.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let request = self.endpoint(reqwest::Method::POST, "/login").json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        });
        self.execute(request).await
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    /// Renewal call; carries the refresh token in the body, never a bearer
    /// header. Any non-success response reads as an authoritative rejection.
    async fn refresh(&self, refresh_token: &str) -> medboard_auth::Result<TokenPair> {
        let request = self.endpoint(reqwest::Method::POST, "/refresh").json(&RefreshRequest {
            refresh_token: refresh_token.to_string(),
        });

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(format!("{status}: {body}")));
        }

        let tokens: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        Ok(TokenPair {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    store: Option<SessionStore>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ApiClientBuilder {
    /// Set the backend base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the session store the bearer credential is read from
    pub fn store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| ApiError::Configuration("base_url is required".into()))?;

        // Validate, then store without a trailing slash
        let base_url = Url::parse(&base_url)
            .map_err(|e| ApiError::Configuration(format!("invalid base_url: {e}")))?
            .to_string()
            .trim_end_matches('/')
            .to_string();

        let store = self
            .store
            .ok_or_else(|| ApiError::Configuration("session store is required".into()))?;

        let mut http = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        http = http.user_agent(
            self.user_agent
                .unwrap_or_else(|| "medboard-console/0.1.0".to_string()),
        );

        Ok(ApiClient {
            http: http.build()?,
            base_url,
            store,
        })
    }
}
