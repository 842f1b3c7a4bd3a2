// Unwrapping of the `{ status, code, message, result }` wrapper every endpoint returns.

use serde_json::Value;
use std::sync::LazyLock;

use crate::domain::{
    Field, FieldPath, FieldType, FieldValue, Page, Record, Schema, SchemaError,
};
use crate::use_cases::validate::{
    validate_list_at, validate_object, validate_page_at, validate_value_at,
};

static ENVELOPE: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Envelope")
        .field(Field::new("status", FieldType::Integer).optional())
        .field(
            Field::new("code", FieldType::OneOf(vec![FieldType::String, FieldType::Integer]))
                .optional(),
        )
        .field(Field::new("message", FieldType::String).default(""))
        .field(Field::new("result", FieldType::Any).nullable())
        .build()
});

// Envelope metadata around an already-validated result.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub status: Option<i64>,
    pub code: Option<String>,
    pub message: String,
    pub result: T,
}

impl<T> Envelope<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            status: self.status,
            code: self.code,
            message: self.message,
            result: f(self.result),
        }
    }
}

// Checks the wrapper and returns the raw `result` for shape-specific validation.
pub fn open(payload: &Value) -> Result<Envelope<&Value>, SchemaError> {
    let meta = validate_object(payload, &ENVELOPE, &FieldPath::root())?;
    let result = payload.get("result").unwrap_or(&Value::Null);

    let code = meta.get("code").and_then(|code| match code {
        FieldValue::String(text) => Some(text.clone()),
        FieldValue::Integer(number) => Some(number.to_string()),
        _ => None,
    });

    Ok(Envelope {
        status: meta.i64("status"),
        code,
        message: meta.str("message").unwrap_or_default().to_string(),
        result,
    })
}

fn result_path() -> FieldPath {
    FieldPath::root().field("result")
}

pub fn parse_record(payload: &Value, schema: &Schema) -> Result<Envelope<Record>, SchemaError> {
    let envelope = open(payload)?;
    let record = validate_object(envelope.result, schema, &result_path())?;
    Ok(envelope.map(|_| record))
}

pub fn parse_page(payload: &Value, item_schema: &Schema) -> Result<Envelope<Page<Record>>, SchemaError> {
    let envelope = open(payload)?;
    let page = validate_page_at(envelope.result, item_schema, &result_path())?;
    Ok(envelope.map(|_| page))
}

pub fn parse_list(payload: &Value, item_schema: &Schema) -> Result<Envelope<Vec<Record>>, SchemaError> {
    let envelope = open(payload)?;
    let items = validate_list_at(envelope.result, item_schema, &result_path())?;
    Ok(envelope.map(|_| items))
}

pub fn parse_value(payload: &Value, ty: &FieldType) -> Result<Envelope<FieldValue>, SchemaError> {
    let envelope = open(payload)?;
    let value = validate_value_at(envelope.result, ty, &result_path())?;
    Ok(envelope.map(|_| value))
}
