use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::domain::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

// Transport-neutral description of one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

// Port the use cases call to reach the backend. Returns the decoded JSON body
// of a 2xx response (`None` when the body is empty) or a classified error.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<Option<Value>, ApiError>;
}

// Port for reading the current time in milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}
