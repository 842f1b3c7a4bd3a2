// Domain layer: records, schemas, errors and the ports use cases depend on.

pub mod catalog;
pub mod errors;
pub mod page;
pub mod ports;
pub mod record;
pub mod resources;
pub mod schema;

pub use errors::{ApiError, FieldPath, PathSegment, SchemaError, SchemaErrorKind, TransportKind};
pub use page::Page;
pub use ports::{ApiRequest, Backend, Clock, Method};
pub use record::{FieldValue, Record};
pub use resources::{Operation, Portal, ReportKind, Resource};
pub use schema::{Field, FieldType, Presence, Schema};
