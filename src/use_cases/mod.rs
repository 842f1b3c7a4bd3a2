// Use cases: response validation, caching and the typed resource API.

pub mod envelope;
pub mod fetch_state;
pub mod notifications;
pub mod query_cache;
pub mod reports;
pub mod resource_api;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_support;

pub use fetch_state::FetchState;
pub use notifications::{Action, Notification, Severity, notify, success};
pub use query_cache::{QueryCache, QueryKey, QueryScope};
pub use resource_api::{DEFAULT_PAGE_SIZE, ListQuery, ReportData, ResourceApi};
pub use validate::{validate, validate_list, validate_page, validate_value};
