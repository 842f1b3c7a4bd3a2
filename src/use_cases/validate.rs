// Schema-driven validation of untyped JSON into records and page containers.
//
// Every function here is pure: the payload is only read, and the result either
// conforms to the schema exactly or the first violation is reported with its path.

use serde_json::{Map, Value};

use crate::domain::{FieldPath, FieldType, FieldValue, Page, Presence, Record, Schema, SchemaError};

/// Validates an object payload against `schema`.
///
/// Required fields must be present and type-correct, absent optional fields
/// take their declared default (or stay absent), and unknown fields are dropped.
pub fn validate(payload: &Value, schema: &Schema) -> Result<Record, SchemaError> {
    validate_object(payload, schema, &FieldPath::root())
}

/// Validates a page container `{ items, page, size, totalElements, totalPages }`.
///
/// Items are validated in order and the first failure is reported under
/// `items[<index>]`. Missing or null pagination counts default to 0.
pub fn validate_page(payload: &Value, item_schema: &Schema) -> Result<Page<Record>, SchemaError> {
    validate_page_at(payload, item_schema, &FieldPath::root())
}

/// Validates a bare JSON array of objects.
pub fn validate_list(payload: &Value, item_schema: &Schema) -> Result<Vec<Record>, SchemaError> {
    validate_list_at(payload, item_schema, &FieldPath::root())
}

/// Validates a single value of any declared type (e.g. a numeric result).
pub fn validate_value(payload: &Value, ty: &FieldType) -> Result<FieldValue, SchemaError> {
    validate_value_at(payload, ty, &FieldPath::root())
}

pub(crate) fn validate_object(
    payload: &Value,
    schema: &Schema,
    path: &FieldPath,
) -> Result<Record, SchemaError> {
    let object = as_object(payload, path, || format!("object<{}>", schema.name()))?;

    let mut record = Record::new();
    for field in schema.fields() {
        let field_path = path.field(field.name);
        match object.get(field.name) {
            Some(Value::Null) if field.nullable => record.insert(field.name, FieldValue::Null),
            // Unset optionals arrive as null from the backend; treat them as absent.
            Some(Value::Null) if field.presence != Presence::Required => {
                fill_absent(&mut record, field.name, &field.presence);
            }
            Some(value) => {
                let value = validate_value_at(value, &field.ty, &field_path)?;
                record.insert(field.name, value);
            }
            None if field.presence == Presence::Required => {
                return Err(SchemaError::missing(field_path, field.expected()));
            }
            None => fill_absent(&mut record, field.name, &field.presence),
        }
    }

    Ok(record)
}

fn fill_absent(record: &mut Record, name: &str, presence: &Presence) {
    if let Presence::Default(value) = presence {
        record.insert(name, value.clone());
    }
}

pub(crate) fn validate_page_at(
    payload: &Value,
    item_schema: &Schema,
    path: &FieldPath,
) -> Result<Page<Record>, SchemaError> {
    let object = as_object(payload, path, || {
        format!("page<{}>", item_schema.name())
    })?;

    let items_path = path.field("items");
    let items = match object.get("items") {
        Some(items) => validate_list_at(items, item_schema, &items_path)?,
        None => {
            return Err(SchemaError::missing(
                items_path,
                format!("array<object<{}>>", item_schema.name()),
            ));
        }
    };

    let page = Page {
        items,
        page: count(object, "page", path)?,
        size: count(object, "size", path)?,
        total_elements: count(object, "totalElements", path)?,
        total_pages: count(object, "totalPages", path)?,
    };

    page.check_invariants()
        .map_err(|detail| SchemaError::page_invariant(path.clone(), detail))?;

    Ok(page)
}

pub(crate) fn validate_list_at(
    payload: &Value,
    item_schema: &Schema,
    path: &FieldPath,
) -> Result<Vec<Record>, SchemaError> {
    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(SchemaError::mismatch(
                path.clone(),
                format!("array<object<{}>>", item_schema.name()),
                describe(other),
            ));
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_object(item, item_schema, &path.index(index)))
        .collect()
}

pub(crate) fn validate_value_at(
    payload: &Value,
    ty: &FieldType,
    path: &FieldPath,
) -> Result<FieldValue, SchemaError> {
    let mismatch = || SchemaError::mismatch(path.clone(), ty.to_string(), describe(payload));

    match (ty, payload) {
        (FieldType::Any, value) => Ok(FieldValue::Json(value.clone())),
        (FieldType::String, Value::String(value)) => Ok(FieldValue::String(value.clone())),
        (FieldType::Boolean, Value::Bool(value)) => Ok(FieldValue::Bool(*value)),
        (FieldType::Number, Value::Number(value)) => Ok(FieldValue::Number(value.clone())),
        (FieldType::Integer, Value::Number(value)) => {
            whole_number(value).map(FieldValue::Integer).ok_or_else(|| {
                SchemaError::mismatch(path.clone(), "integer", format!("number {value}"))
            })
        }
        (FieldType::Object(schema), value) => validate_object(value, schema, path).map(FieldValue::Object),
        (FieldType::Array(item), Value::Array(values)) => values
            .iter()
            .enumerate()
            .map(|(index, value)| validate_value_at(value, item, &path.index(index)))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::Array),
        (FieldType::Map(item), Value::Object(entries)) => {
            let mut record = Record::new();
            for (key, value) in entries {
                record.insert(key.clone(), validate_value_at(value, item, &path.field(key))?);
            }
            Ok(FieldValue::Object(record))
        }
        (FieldType::OneOf(options), value) => options
            .iter()
            .find_map(|option| validate_value_at(value, option, path).ok())
            .ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

fn as_object<'a>(
    payload: &'a Value,
    path: &FieldPath,
    expected: impl FnOnce() -> String,
) -> Result<&'a Map<String, Value>, SchemaError> {
    match payload {
        Value::Object(object) => Ok(object),
        other => Err(SchemaError::mismatch(path.clone(), expected(), describe(other))),
    }
}

// Accepts integers and floats with no fractional part inside the i64 range.
fn whole_number(value: &serde_json::Number) -> Option<i64> {
    if let Some(int) = value.as_i64() {
        return Some(int);
    }
    let float = value.as_f64()?;
    if float.fract() == 0.0 && float >= i64::MIN as f64 && float < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

fn count(object: &Map<String, Value>, name: &str, path: &FieldPath) -> Result<u64, SchemaError> {
    let expected = "non-negative integer";
    match object.get(name) {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(value)) => whole_number(value)
            .and_then(|count| u64::try_from(count).ok())
            .ok_or_else(|| SchemaError::mismatch(path.field(name), expected, format!("number {value}"))),
        Some(other) => Err(SchemaError::mismatch(path.field(name), expected, describe(other))),
    }
}

pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}
