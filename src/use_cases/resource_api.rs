use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::catalog::{report_schema, schema_for};
use crate::domain::resources::{
    farm_plots_path, farmer_roles_path, lot_movements_path, on_hand_path, plot_seasons_path,
    role_path,
};
use crate::domain::{
    ApiError, ApiRequest, Backend, Clock, FieldPath, FieldType, Method, Operation, Page, Portal,
    Record, ReportKind, Resource, Schema, SchemaError,
};
use crate::use_cases::envelope;
use crate::use_cases::query_cache::{QueryCache, QueryKey};

pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Parameters of a list request.
///
/// Unset or blank values are never sent. Parameters are emitted sorted by
/// name so equal queries share one cache entry. `page`, `size`, `keyword`
/// and `q` passed through [`ListQuery::filter`] set the dedicated value
/// instead of adding a second parameter with the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    page: Option<u64>,
    size: Option<u64>,
    keyword: Option<String>,
    q: Option<String>,
    filters: BTreeMap<String, String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn q(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn filter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let name = name.into();
        let value = value.to_string();
        match name.as_str() {
            "page" | "size" => match value.trim().parse::<u64>() {
                Ok(number) if name == "page" => self.page = Some(number),
                Ok(number) => self.size = Some(number),
                Err(_) => tracing::debug!(%name, %value, "ignoring non-numeric paging filter"),
            },
            "keyword" => self.keyword = Some(value),
            "q" => self.q = Some(value),
            _ => {
                self.filters.insert(name, value);
            }
        }
        self
    }

    // Search and filter parameters, without paging.
    pub fn filter_params(&self) -> Vec<(String, String)> {
        let mut params: BTreeMap<String, String> = self
            .filters
            .iter()
            .map(|(name, value)| (name.clone(), value.trim().to_string()))
            .collect();
        if let Some(keyword) = &self.keyword {
            params.insert("keyword".to_string(), keyword.trim().to_string());
        }
        if let Some(q) = &self.q {
            params.insert("q".to_string(), q.trim().to_string());
        }
        params.retain(|_, value| !value.is_empty());
        params.into_iter().collect()
    }

    pub fn params(&self, default_size: u64) -> Vec<(String, String)> {
        let mut params = self.filter_params();
        params.push(("page".to_string(), self.page.unwrap_or(0).to_string()));
        params.push((
            "size".to_string(),
            self.size.unwrap_or(default_size).to_string(),
        ));
        params.sort();
        params
    }

    pub fn canonical(&self, default_size: u64) -> String {
        join(&self.params(default_size))
    }
}

// Form-encodes the pairs, so `&` and `=` inside a value cannot forge another
// parameter. Key prefixes below use `?` and `/`, which never appear unencoded.
fn join(params: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

// Result of a server-side report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportData {
    Rows(Vec<Record>),
    Summary(Record),
}

#[derive(Debug, Clone, PartialEq)]
enum Cached {
    Record(Record),
    Records(Vec<Record>),
    Page(Page<Record>),
}

impl Cached {
    fn kind(&self) -> &'static str {
        match self {
            Cached::Record(_) => "record",
            Cached::Records(_) => "array",
            Cached::Page(_) => "page",
        }
    }
}

#[derive(Clone)]
enum Shape {
    Record(Schema),
    Records(Schema),
    Page(Schema),
}

fn decode(shape: &Shape, payload: &Value) -> Result<Cached, SchemaError> {
    Ok(match shape {
        Shape::Record(schema) => Cached::Record(envelope::parse_record(payload, schema)?.result),
        Shape::Records(schema) => Cached::Records(envelope::parse_list(payload, schema)?.result),
        Shape::Page(schema) => Cached::Page(envelope::parse_page(payload, schema)?.result),
    })
}

fn cached_mismatch(expected: &'static str, found: &Cached) -> ApiError {
    ApiError::Schema(SchemaError::mismatch(
        FieldPath::root(),
        expected,
        found.kind(),
    ))
}

fn unsupported(resource: Resource, operation: &'static str) -> ApiError {
    ApiError::Unsupported {
        resource: resource.plural_label(),
        operation,
    }
}

// Catalog schema for collections every portal can read through a parent.
fn item_schema(resource: Resource, operation: &'static str) -> Result<Schema, ApiError> {
    schema_for(resource).ok_or_else(|| unsupported(resource, operation))
}

// Validates a response body, logging the failing path.
fn checked<T>(
    request: &ApiRequest,
    payload: Option<Value>,
    parse: impl FnOnce(&Value) -> Result<T, SchemaError>,
) -> Result<T, ApiError> {
    let payload = payload.unwrap_or(Value::Null);
    parse(&payload).map_err(|err| {
        tracing::warn!(
            method = %request.method,
            path = %request.path,
            error = %err,
            "response failed validation"
        );
        ApiError::Schema(err)
    })
}

fn record_of(request: &ApiRequest, payload: Option<Value>, schema: &Schema) -> Result<Record, ApiError> {
    checked(request, payload, |payload| {
        envelope::parse_record(payload, schema).map(|envelope| envelope.result)
    })
}

/// Typed access to the ACM REST API through one [`Portal`].
///
/// Reads go through a [`QueryCache`]; mutations call the backend directly and
/// then invalidate the keys they affect. Each instance talks to a single
/// portal, so admin and farmer data never share cache entries.
pub struct ResourceApi<B, C> {
    backend: Arc<B>,
    cache: QueryCache<Cached, C>,
    page_size: u64,
    portal: Portal,
}

impl<B, C> ResourceApi<B, C>
where
    B: Backend + 'static,
    C: Clock,
{
    pub fn new(backend: B, clock: C, fresh_for: Duration, page_size: u64) -> Self {
        Self {
            backend: Arc::new(backend),
            cache: QueryCache::new(clock, fresh_for),
            page_size,
            portal: Portal::Admin,
        }
    }

    pub fn with_portal(mut self, portal: Portal) -> Self {
        self.portal = portal;
        self
    }

    pub fn portal(&self) -> Portal {
        self.portal
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    fn schema(&self, resource: Resource, operation: Operation) -> Result<Schema, ApiError> {
        if !self.portal.supports(resource, operation) {
            return Err(unsupported(resource, operation.name()));
        }
        item_schema(resource, operation.name())
    }

    // Operations that only exist on the admin surface.
    fn admin_only(&self, resource: Resource, operation: &'static str) -> Result<(), ApiError> {
        match self.portal {
            Portal::Admin => Ok(()),
            Portal::Farmer => Err(unsupported(resource, operation)),
        }
    }

    fn loader(
        &self,
        request: ApiRequest,
        shape: Shape,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Cached, ApiError>> + use<B, C> {
        let backend = Arc::clone(&self.backend);
        move || {
            async move {
                let payload = backend.execute(request.clone()).await?;
                checked(&request, payload, |payload| decode(&shape, payload))
            }
            .boxed()
        }
    }

    async fn read(&self, key: QueryKey, request: ApiRequest, shape: Shape) -> Result<Cached, ApiError> {
        let loader = self.loader(request, shape);
        self.cache.fetch(key, loader).await
    }

    async fn read_page(&self, key: QueryKey, request: ApiRequest, schema: Schema) -> Result<Page<Record>, ApiError> {
        match self.read(key, request, Shape::Page(schema)).await? {
            Cached::Page(page) => Ok(page),
            other => Err(cached_mismatch("page", &other)),
        }
    }

    async fn read_records(&self, key: QueryKey, request: ApiRequest, schema: Schema) -> Result<Vec<Record>, ApiError> {
        match self.read(key, request, Shape::Records(schema)).await? {
            Cached::Records(records) => Ok(records),
            other => Err(cached_mismatch("array", &other)),
        }
    }

    #[tracing::instrument(skip(self, query), fields(portal = %self.portal))]
    pub async fn list(&self, resource: Resource, query: &ListQuery) -> Result<Page<Record>, ApiError> {
        let schema = self.schema(resource, Operation::List)?;
        let params = query.params(self.page_size);
        let key = QueryKey::list(resource, join(&params));
        let request = ApiRequest::get(self.portal.path(resource)).with_query(params);
        self.read_page(key, request, schema).await
    }

    /// Refetches a list page even when a fresh copy is cached.
    #[tracing::instrument(skip(self, query), fields(portal = %self.portal))]
    pub async fn reload(&self, resource: Resource, query: &ListQuery) -> Result<Page<Record>, ApiError> {
        let schema = self.schema(resource, Operation::List)?;
        let params = query.params(self.page_size);
        let key = QueryKey::list(resource, join(&params));
        let request = ApiRequest::get(self.portal.path(resource)).with_query(params);
        let loader = self.loader(request, Shape::Page(schema));
        match self.cache.refresh(key, loader).await? {
            Cached::Page(page) => Ok(page),
            other => Err(cached_mismatch("page", &other)),
        }
    }

    #[tracing::instrument(skip(self, query), fields(portal = %self.portal))]
    pub async fn list_all(&self, resource: Resource, query: &ListQuery) -> Result<Vec<Record>, ApiError> {
        let schema = self.schema(resource, Operation::ListAll)?;
        let params = query.filter_params();
        let key = QueryKey::list(resource, format!("all?{}", join(&params)));
        let request = ApiRequest::get(self.portal.path(resource)).with_query(params);
        self.read_records(key, request, schema).await
    }

    #[tracing::instrument(skip(self), fields(portal = %self.portal))]
    pub async fn get(&self, resource: Resource, id: i64) -> Result<Record, ApiError> {
        let schema = self.schema(resource, Operation::Get)?;
        let key = QueryKey::detail(resource, id);
        let request = ApiRequest::get(self.portal.item_path(resource, id));
        match self.read(key, request, Shape::Record(schema)).await? {
            Cached::Record(record) => Ok(record),
            other => Err(cached_mismatch("record", &other)),
        }
    }

    #[tracing::instrument(skip(self, body), fields(portal = %self.portal))]
    pub async fn create(&self, resource: Resource, body: Value) -> Result<Record, ApiError> {
        let schema = self.schema(resource, Operation::Create)?;
        let request = ApiRequest::new(Method::Post, self.portal.create_path(resource)).with_body(body);
        let record = self.mutate(resource, None, request, &schema).await?;
        tracing::info!(id = ?record.id(), "created");
        Ok(record)
    }

    #[tracing::instrument(skip(self, body), fields(portal = %self.portal))]
    pub async fn update(&self, resource: Resource, id: i64, body: Value) -> Result<Record, ApiError> {
        let schema = self.schema(resource, Operation::Update)?;
        let request = ApiRequest::new(Method::Put, self.portal.item_path(resource, id)).with_body(body);
        self.mutate(resource, Some(id), request, &schema).await
    }

    #[tracing::instrument(skip(self), fields(portal = %self.portal))]
    pub async fn update_status(&self, resource: Resource, id: i64, status: &str) -> Result<Record, ApiError> {
        let schema = self.schema(resource, Operation::UpdateStatus)?;
        let request = ApiRequest::new(Method::Patch, self.portal.status_path(resource, id))
            .with_body(json!({ "status": status }));
        self.mutate(resource, Some(id), request, &schema).await
    }

    // Delete responses carry no entity; any body is ignored.
    #[tracing::instrument(skip(self), fields(portal = %self.portal))]
    pub async fn delete(&self, resource: Resource, id: i64) -> Result<(), ApiError> {
        if !self.portal.supports(resource, Operation::Delete) {
            return Err(unsupported(resource, Operation::Delete.name()));
        }
        let request = ApiRequest::new(Method::Delete, self.portal.item_path(resource, id));
        self.backend.execute(request).await?;
        self.invalidate_after(resource, Some(id)).await;
        tracing::info!(id, "deleted");
        Ok(())
    }

    pub async fn locations(&self, warehouse_id: i64) -> Result<Vec<Record>, ApiError> {
        let schema = item_schema(Resource::StockLocations, "list")?;
        let key = QueryKey::list(Resource::StockLocations, format!("warehouse/{warehouse_id}"));
        let request = ApiRequest::get(self.portal.locations_path(warehouse_id));
        self.read_records(key, request, schema).await
    }

    pub async fn warehouse_movements(
        &self,
        warehouse_id: i64,
        query: &ListQuery,
    ) -> Result<Page<Record>, ApiError> {
        let schema = item_schema(Resource::StockMovements, "list")?;
        let params = query.params(self.page_size);
        let key = QueryKey::list(
            Resource::StockMovements,
            format!("warehouse/{warehouse_id}?{}", join(&params)),
        );
        let request =
            ApiRequest::get(self.portal.warehouse_movements_path(warehouse_id)).with_query(params);
        self.read_page(key, request, schema).await
    }

    // Live stock figure; not cached.
    pub async fn on_hand(
        &self,
        lot_id: i64,
        warehouse_id: i64,
        location_id: Option<i64>,
    ) -> Result<f64, ApiError> {
        let mut query = vec![("warehouseId".to_string(), warehouse_id.to_string())];
        if let Some(location_id) = location_id {
            query.push(("locationId".to_string(), location_id.to_string()));
        }
        let request = ApiRequest::get(on_hand_path(lot_id)).with_query(query);
        let payload = self.backend.execute(request.clone()).await?;
        let value = checked(&request, payload, |payload| {
            envelope::parse_value(payload, &FieldType::Number)
        })?;
        value.result.as_f64().ok_or_else(|| {
            ApiError::Schema(SchemaError::mismatch(
                FieldPath::root().field("result"),
                "number",
                "non-finite number",
            ))
        })
    }

    /// Fetches a server-side report. Only the filters the report understands
    /// are sent; paging is never sent.
    #[tracing::instrument(skip(self, filters), fields(report = kind.name()))]
    pub async fn report(&self, kind: ReportKind, filters: &ListQuery) -> Result<ReportData, ApiError> {
        self.admin_only(Resource::Reports, "report")?;
        let (query, ignored): (Vec<_>, Vec<_>) = filters
            .filter_params()
            .into_iter()
            .partition(|(name, _)| kind.accepts(name));
        if !ignored.is_empty() {
            let names: Vec<&str> = ignored.iter().map(|(name, _)| name.as_str()).collect();
            tracing::debug!(?names, "report does not take these filters; ignoring them");
        }

        let key = QueryKey::custom(Resource::Reports, format!("{}?{}", kind.name(), join(&query)));
        let request = ApiRequest::get(kind.path()).with_query(query);
        let schema = report_schema(kind);

        if kind.returns_rows() {
            self.read_records(key, request, schema)
                .await
                .map(ReportData::Rows)
        } else {
            match self.read(key, request, Shape::Record(schema)).await? {
                Cached::Record(record) => Ok(ReportData::Summary(record)),
                other => Err(cached_mismatch("record", &other)),
            }
        }
    }

    /// Replaces a farmer's roles with `roles` (role codes).
    #[tracing::instrument(skip(self))]
    pub async fn update_farmer_roles(&self, farmer_id: i64, roles: &[&str]) -> Result<Record, ApiError> {
        self.admin_only(Resource::Farmers, "update roles")?;
        let schema = item_schema(Resource::Farmers, "update roles")?;
        let request = ApiRequest::new(Method::Put, farmer_roles_path(farmer_id))
            .with_body(json!({ "roles": roles }));
        self.mutate(Resource::Farmers, Some(farmer_id), request, &schema)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_role(&self, code: &str) -> Result<(), ApiError> {
        self.admin_only(Resource::Roles, "delete")?;
        let code = code.trim();
        if code.is_empty() {
            return Err(unsupported(Resource::Roles, "delete without a code"));
        }
        let request = ApiRequest::new(Method::Delete, role_path(code));
        self.backend.execute(request).await?;
        self.invalidate_after(Resource::Roles, None).await;
        tracing::info!(code, "role deleted");
        Ok(())
    }

    pub async fn plot_seasons(&self, plot_id: i64) -> Result<Vec<Record>, ApiError> {
        self.admin_only(Resource::Seasons, "list by plot")?;
        let schema = item_schema(Resource::Seasons, "list by plot")?;
        let key = QueryKey::list(Resource::Seasons, format!("plot/{plot_id}"));
        let request = ApiRequest::get(plot_seasons_path(plot_id));
        self.read_records(key, request, schema).await
    }

    pub async fn lot_movements(&self, lot_id: i64, query: &ListQuery) -> Result<Page<Record>, ApiError> {
        self.admin_only(Resource::StockMovements, "list by lot")?;
        let schema = item_schema(Resource::StockMovements, "list by lot")?;
        let params = query.params(self.page_size);
        let key = QueryKey::list(
            Resource::StockMovements,
            format!("lot/{lot_id}?{}", join(&params)),
        );
        let request = ApiRequest::get(lot_movements_path(lot_id)).with_query(params);
        self.read_page(key, request, schema).await
    }

    /// Adds a plot to a farm. Plot listings and the farm itself are refetched.
    #[tracing::instrument(skip(self, body))]
    pub async fn create_plot(&self, farm_id: i64, body: Value) -> Result<Record, ApiError> {
        self.admin_only(Resource::Plots, "create")?;
        let schema = item_schema(Resource::Plots, "create")?;
        let request = ApiRequest::new(Method::Post, farm_plots_path(farm_id)).with_body(body);
        let payload = self.backend.execute(request.clone()).await?;
        self.invalidate_after(Resource::Plots, None).await;
        self.cache
            .invalidate_key(&QueryKey::detail(Resource::Farms, farm_id))
            .await;
        let plot = record_of(&request, payload, &schema)?;
        tracing::info!(id = ?plot.id(), "plot created");
        Ok(plot)
    }

    /// Drops every cached read of `resource`.
    pub async fn invalidate(&self, resource: Resource) -> usize {
        self.cache.invalidate_resource(resource).await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    // Invalidation runs on any 2xx answer, before the body is validated.
    async fn mutate(
        &self,
        resource: Resource,
        id: Option<i64>,
        request: ApiRequest,
        schema: &Schema,
    ) -> Result<Record, ApiError> {
        let payload = self.backend.execute(request.clone()).await?;
        self.invalidate_after(resource, id).await;
        record_of(&request, payload, schema)
    }

    async fn invalidate_after(&self, resource: Resource, id: Option<i64>) {
        let mut dropped = self.cache.invalidate_lists(resource).await;
        if let Some(id) = id {
            let key = QueryKey::detail(resource, id);
            dropped += usize::from(self.cache.invalidate_key(&key).await);
        }
        for dependent in resource.dependents() {
            dropped += self.cache.invalidate_lists(*dependent).await;
        }
        tracing::debug!(%resource, dropped, "invalidated cached queries");
    }
}
