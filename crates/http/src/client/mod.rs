//! Dashboard HTTP client
//!
//! [`ApiClient`] is the single pre-configured request sender used by every
//! consumer. Each call is described by an [`ApiRequest`], dispatched once by
//! the [`Transport`] with the stored bearer token, and then handed to the
//! response interceptor, which owns the single reissue-and-retry on 401.

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod products;
pub mod request;
pub mod session;
pub mod users;

pub use config::ClientConfig;
pub use error::ClientError;
pub use interceptor::InterceptState;
pub use request::{ApiRequest, FormField, RequestBody, Upload};
pub use session::{SessionController, SessionEvent, SessionStatus, SignedIn, routes};

use dashboard_core::{MemoryTokenStore, TokenStore};
use reqwest::{Client, ClientBuilder, Response, header};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Sends [`ApiRequest`]s exactly once against the configured base URL
#[derive(Debug)]
pub struct Transport {
    client: Client,
    base_url: String,
}

impl Transport {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let url = format!("{}{}", self.base_url, request.path());
        let mut builder = self.client.request(request.method().clone(), url);

        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        request.apply(builder)
    }

    /// Send a request once; network failures and timeouts surface as
    /// [`ClientError::Request`], every HTTP status is returned as a response.
    pub async fn dispatch(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<Response, ClientError> {
        debug!(
            method = %request.method(),
            path = request.path(),
            authenticated = bearer.is_some(),
            retried = request.is_retried(),
            "Dispatching request"
        );
        let response = self.build(request, bearer)?.send().await?;
        debug!(status = response.status().as_u16(), path = request.path(), "Response received");
        Ok(response)
    }
}

/// Turn a non-2xx response into a typed error
pub(crate) async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::from_response(status, &body))
}

/// Decode a JSON body, mapping error statuses first
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// `prefix/id` with the id percent-encoded
pub(crate) fn resource_path(prefix: &str, id: &str) -> Result<String, ClientError> {
    if id.trim().is_empty() {
        return Err(ClientError::Validation("An id is required".into()));
    }
    let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    Ok(format!("{prefix}/{encoded}"))
}

/// Dashboard API client
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<Transport>,
    session: Arc<SessionController>,
}

impl ApiClient {
    /// Create a client with default configuration and an in-memory token store
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Session state shared by every clone of this client
    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Send a request through the response interceptor.
    ///
    /// The response is returned unchanged for any status other than an
    /// unrecoverable 401, which yields [`ClientError::SessionExpired`].
    pub async fn send(&self, request: ApiRequest) -> Result<Response, ClientError> {
        interceptor::run(&self.transport, &self.session, request).await
    }

    /// Send a request and decode the JSON response
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        decode(response).await
    }

    /// Send a request whose success response has no body
    pub async fn execute_empty(&self, request: ApiRequest) -> Result<(), ClientError> {
        let response = self.send(request).await?;
        ensure_success(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.transport.base_url)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl ApiClientBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Per-request timeout; [`Duration::ZERO`] disables it
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Where the credential pair is persisted; defaults to memory
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Apply every setting from a [`ClientConfig`]
    pub fn config(self, config: &ClientConfig) -> Self {
        self.base_url(config.base_url.clone())
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
    }

    pub fn build(self) -> Result<ApiClient, ClientError> {
        let defaults = ClientConfig::default();

        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;
        url::Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url {base_url}: {e}")))?;

        // Paths always start with a slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let timeout = self.timeout.unwrap_or_else(|| defaults.timeout());
        let mut client =
            ClientBuilder::new().user_agent(self.user_agent.unwrap_or(defaults.user_agent));
        // A zero timeout means none
        if !timeout.is_zero() {
            client = client.timeout(timeout);
        }
        let client = client.build()?;

        let transport = Arc::new(Transport { client, base_url });
        let store = self
            .token_store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let session = Arc::new(SessionController::new(Arc::clone(&transport), store));

        Ok(ApiClient { transport, session })
    }
}
