use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::domain::{ApiError, ApiRequest, Backend, Method, SchemaError, TransportKind};
use crate::interface_adapters::protocol::ErrorBody;

// Thin reqwest client for the admin REST API.
#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // Appends `path` to the base URL, keeping any path prefix it carries.
    fn url(&self, path: &str, query: &[(String, String)]) -> Result<Url, ApiError> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        let mut url = Url::parse(&joined).map_err(|err| ApiError::Transport {
            kind: TransportKind::Other,
            message: format!("invalid request url {joined}: {err}"),
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    let kind = if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Other
    };
    ApiError::Transport {
        kind,
        message: err.to_string(),
    }
}

/// Maps a non-2xx status and its body to an [`ApiError`].
pub fn classify(status: StatusCode, body: &[u8]) -> ApiError {
    let error = ErrorBody::parse(body);
    if status == StatusCode::CONFLICT {
        ApiError::Conflict {
            message: error.message(),
        }
    } else if status.is_client_error() {
        ApiError::Business {
            status: status.as_u16(),
            code: error.code(),
            message: error.message(),
        }
    } else {
        ApiError::Server {
            status: status.as_u16(),
            message: error.message(),
        }
    }
}

// 2xx bodies: empty means no content, anything else must be JSON.
fn decode_success(body: &[u8]) -> Result<Option<Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|err| ApiError::Schema(SchemaError::not_json(err.to_string())))
}

#[async_trait]
impl Backend for HttpBackend {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn execute(&self, request: ApiRequest) -> Result<Option<Value>, ApiError> {
        let url = self.url(&request.path, &request.query)?;
        let mut builder = self.http.request(http_method(request.method), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|err| {
            let err = transport_error(err);
            tracing::error!(error = %err, "request failed before a response arrived");
            err
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if status.is_success() {
            return decode_success(&body);
        }

        // Keep upstream status and message so callers can explain the failure.
        let err = classify(status, &body);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %err, "server error");
        } else {
            tracing::debug!(status = status.as_u16(), error = %err, "request rejected");
        }
        Err(err)
    }
}
