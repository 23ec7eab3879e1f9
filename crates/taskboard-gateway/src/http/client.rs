use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use taskboard_core::{AppConfig, BoardError, BoardResult, GatewayError, GatewayResult};

use crate::session::SessionContext;

/// Shared HTTP plumbing for every gateway: base URL, credentials and the
/// mapping of failed responses onto [`GatewayError`].
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpClient {
    pub fn new(config: &AppConfig, session: SessionContext) -> BoardResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BoardError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request with the session's credentials attached.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        authorize(self.client.request(method, self.url(path)), &self.session)
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> GatewayResult<T> {
        let response = dispatch(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Server(Some(format!("Malformed response: {}", e))))
    }

    pub async fn send_empty(&self, request: RequestBuilder) -> GatewayResult<()> {
        dispatch(request).await.map(|_| ())
    }
}

pub fn authorize(request: RequestBuilder, session: &SessionContext) -> RequestBuilder {
    request.bearer_auth(session.token())
}

async fn dispatch(request: RequestBuilder) -> GatewayResult<Response> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!("Store answered {}: {}", status, body);
    Err(GatewayError::from_status(status.as_u16(), error_message(&body)))
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty())
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        return GatewayError::Network(Some("The request timed out".into()));
    }
    tracing::warn!("Request failed before reaching the store: {}", e);
    GatewayError::Network(None)
}
