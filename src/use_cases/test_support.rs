use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::domain::{ApiError, ApiRequest, Backend, Clock, Method, TransportKind};

// Hand-driven time source so freshness assertions are deterministic.
#[derive(Clone, Default)]
pub(crate) struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub(crate) fn at(millis: u64) -> Self {
        Self(Arc::new(AtomicU64::new(millis)))
    }

    pub(crate) fn advance(&self, millis: u64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub transport: bool,
}

// Scripted response. A route without a query answers any query on its path.
#[derive(Clone)]
struct Route {
    method: Method,
    path: String,
    query: Option<Vec<(String, String)>>,
    result: Result<Option<Value>, ApiError>,
}

impl Route {
    fn matches(&self, request: &ApiRequest) -> bool {
        self.method == request.method && self.path == request.path
    }
}

// Scripted backend that records every request it receives.
#[derive(Clone, Default)]
pub(crate) struct RecordingBackend {
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
    gate: Arc<Mutex<Option<oneshot::Receiver<()>>>>,
    failures: FailureFlags,
}

impl RecordingBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    // Replaces any earlier response for the same method and path.
    pub(crate) fn respond(
        &self,
        method: Method,
        path: impl Into<String>,
        result: Result<Option<Value>, ApiError>,
    ) {
        self.route(Route {
            method,
            path: path.into(),
            query: None,
            result,
        });
    }

    pub(crate) fn respond_json(&self, method: Method, path: impl Into<String>, body: Value) {
        self.respond(method, path, Ok(Some(body)));
    }

    // Answers only requests whose query equals `query` exactly.
    pub(crate) fn respond_to_query(
        &self,
        method: Method,
        path: impl Into<String>,
        query: &[(&str, &str)],
        body: Value,
    ) {
        let query = query
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        self.route(Route {
            method,
            path: path.into(),
            query: Some(query),
            result: Ok(Some(body)),
        });
    }

    fn route(&self, route: Route) {
        let mut routes = self.routes.lock().expect("routes mutex poisoned");
        routes.retain(|existing| {
            !(existing.method == route.method
                && existing.path == route.path
                && existing.query == route.query)
        });
        routes.push(route);
    }

    // The next request picks its response immediately but only returns once
    // the sender fires or is dropped.
    pub(crate) fn hold_next(&self) -> oneshot::Sender<()> {
        let (open, gate) = oneshot::channel();
        *self.gate.lock().expect("gate mutex poisoned") = Some(gate);
        open
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .expect("requests mutex poisoned")
            .clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().expect("requests mutex poisoned").len()
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn execute(&self, request: ApiRequest) -> Result<Option<Value>, ApiError> {
        self.requests
            .lock()
            .expect("requests mutex poisoned")
            .push(request.clone());

        if self.failures.transport {
            return Err(ApiError::Transport {
                kind: TransportKind::Connect,
                message: "connection refused".to_string(),
            });
        }

        let result = {
            let routes = self.routes.lock().expect("routes mutex poisoned");
            let exact = routes
                .iter()
                .find(|route| route.matches(&request) && route.query.as_ref() == Some(&request.query));
            exact
                .or_else(|| {
                    routes
                        .iter()
                        .find(|route| route.matches(&request) && route.query.is_none())
                })
                .map(|route| route.result.clone())
                .unwrap_or(Err(ApiError::Business {
                    status: 404,
                    code: None,
                    message: Some(format!("no route for {} {}", request.method, request.path)),
                }))
        };

        let gate = self.gate.lock().expect("gate mutex poisoned").take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        result
    }
}
