pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use domain::{ApiError, Page, Portal, Record, ReportKind, Resource, SchemaError};
pub use frameworks::client::{HttpApi, build, connect};
pub use frameworks::config::ClientConfig;
pub use frameworks::telemetry::init_tracing;
pub use use_cases::{FetchState, ListQuery, ResourceApi};
