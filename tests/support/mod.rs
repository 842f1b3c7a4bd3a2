// Mock admin backend shared by the integration tests in one test binary.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, Mutex, OnceLock},
    time::Duration,
};

use acm_client::{ClientConfig, HttpApi, Portal};
use axum::{
    Json, Router,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::{Value, json};

pub const TOKEN: &str = "secret-token";

static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();
// Requests served per route name.
static HITS: LazyLock<Mutex<HashMap<&'static str, usize>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

pub fn hits(route: &str) -> usize {
    HITS.lock()
        .expect("hits mutex poisoned")
        .get(route)
        .copied()
        .unwrap_or(0)
}

fn hit(route: &'static str) {
    *HITS
        .lock()
        .expect("hits mutex poisoned")
        .entry(route)
        .or_default() += 1;
}

fn envelope(result: Value) -> Value {
    json!({"status": 200, "code": "OK", "message": "", "result": result})
}

fn page(items: Value) -> Value {
    let total = items.as_array().map(Vec::len).unwrap_or(0);
    envelope(json!({
        "items": items,
        "page": 0,
        "size": 20,
        "totalElements": total,
        "totalPages": if total == 0 { 0 } else { 1 }
    }))
}

fn failure(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"status": status.as_u16(), "code": code, "message": message, "result": null})),
    )
        .into_response()
}

async fn crops() -> Json<Value> {
    Json(envelope(json!([
        {"id": 1, "cropName": "Rice", "description": null},
        {"id": 2, "cropName": "Corn"}
    ])))
}

async fn suppliers(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    hit("suppliers");
    let name = params
        .get("keyword")
        .cloned()
        .unwrap_or_else(|| "Agro Supplies".to_string());
    Json(page(json!([{"id": 1, "name": name, "licenseNo": null}])))
}

async fn delete_supplier(Path(id): Path<i64>) -> Response {
    if id == 1 {
        return failure(StatusCode::CONFLICT, "ERR_CONFLICT", "Supplier has supply lots");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn create_supply_lot() -> Response {
    failure(
        StatusCode::BAD_REQUEST,
        "ERR_RESTRICTED",
        "Restricted item requires a licensed supplier",
    )
}

fn document(id: i64, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "documentUrl": format!("https://docs.example.com/{id}.pdf"),
        "documentType": "POLICY",
        "status": status
    })
}

async fn documents() -> Json<Value> {
    hit("documents");
    Json(page(json!([
        document(1, "Safety", "ACTIVE"),
        document(2, "Archive", "INACTIVE")
    ])))
}

async fn create_document(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let title = body["title"].as_str().unwrap_or("Untitled");
    (StatusCode::CREATED, Json(envelope(document(3, title, "ACTIVE"))))
}

async fn farm(Path(_id): Path<i64>) -> Response {
    failure(StatusCode::INTERNAL_SERVER_ERROR, "ERR_INTERNAL", "database unavailable")
}

async fn seasons() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        "<html>maintenance</html>",
    )
        .into_response()
}

async fn plots(headers: HeaderMap) -> Response {
    let expected = format!("Bearer {TOKEN}");
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected);
    if !authorized {
        return failure(StatusCode::UNAUTHORIZED, "ERR_UNAUTHENTICATED", "Unauthenticated");
    }
    Json(page(json!([{"id": 5, "plotName": "North field", "area": 1.5}]))).into_response()
}

async fn locations(Path(warehouse_id): Path<i64>) -> Json<Value> {
    Json(envelope(json!([
        {"id": 10, "warehouseId": warehouse_id, "zone": "A", "aisle": "1", "shelf": null, "bin": null}
    ])))
}

async fn on_hand(
    Path(_lot_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let quantity = match params.get("warehouseId").map(String::as_str) {
        Some("1") => 42.5,
        _ => 0.0,
    };
    Json(envelope(json!(quantity)))
}

async fn farmer_suppliers() -> Json<Value> {
    hit("farmer_suppliers");
    Json(page(json!([{"id": 4, "name": "Village Co-op", "licenseNo": "L-44"}])))
}

async fn farmer_movements(Path(warehouse_id): Path<i64>) -> Json<Value> {
    Json(page(json!([
        {"id": 1, "supplyLotId": 2, "warehouseId": warehouse_id, "movementType": "IN", "quantity": 30}
    ])))
}

// Echoes the filters it received so callers can see what was sent.
async fn yield_report(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let crop = params.get("cropId").cloned().unwrap_or_default();
    let from = params.get("fromDate").cloned().unwrap_or_default();
    Json(envelope(json!([{
        "seasonId": 1,
        "seasonName": format!("crop {crop} from {from}"),
        "cropName": "Rice",
        "expectedYieldKg": 1000,
        "actualYieldKg": 1100,
        "variancePercent": 10.0
    }])))
}

async fn create_supply_item() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"status": 400, "code": "ERR_VALIDATION", "message": {"name": "must not be blank"}})),
    )
        .into_response()
}

fn router() -> Router {
    Router::new()
        .route("/api/v1/admin/crops", get(crops))
        .route("/api/v1/admin/suppliers", get(suppliers))
        .route("/api/v1/admin/suppliers/{id}", delete(delete_supplier))
        .route("/api/v1/admin/suppliers/lots", post(create_supply_lot))
        .route("/api/v1/admin/suppliers/items", post(create_supply_item))
        .route("/api/v1/admin/documents", get(documents).post(create_document))
        .route("/api/v1/admin/farms/{id}", get(farm))
        .route("/api/v1/admin/seasons", get(seasons))
        .route("/api/v1/admin/plots", get(plots))
        .route("/api/v1/admin/warehouses/{id}/locations", get(locations))
        .route("/api/v1/inventory/lots/{id}/on-hand", get(on_hand))
        .route("/api/v1/admin/reports/yield", get(yield_report))
        .route("/api/v1/farmer/suppliers", get(farmer_suppliers))
        .route("/api/v1/farmer/warehouses/{id}/movements", get(farmer_movements))
}

// Ensure the mock backend is running and return its base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // An OS thread keeps the server alive across individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));
                axum::serve(listener, router()).await.expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };
    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");
    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("mock backend did not become ready at {addr}");
}

pub fn config_for(base_url: &str, token: Option<&str>) -> ClientConfig {
    ClientConfig {
        api_url: base_url.parse().expect("valid base url"),
        timeout: Duration::from_secs(2),
        cache_fresh_for: Duration::from_secs(30),
        page_size: 20,
        api_token: token.map(str::to_string),
        portal: Portal::Admin,
    }
}

// Client against the mock backend, authenticated with `TOKEN`.
pub fn client() -> HttpApi {
    client_for(Portal::Admin)
}

pub fn client_for(portal: Portal) -> HttpApi {
    let base_url = ensure_server();
    let config = ClientConfig {
        portal,
        ..config_for(base_url, Some(TOKEN))
    };
    acm_client::build(&config).expect("client should build")
}
