use crate::domain::record::FieldValue;
use std::fmt;
use std::sync::Arc;

// Declared JSON type of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    // Whole number; `1.0` is accepted, `1.5` is not.
    Integer,
    Number,
    Boolean,
    Object(Schema),
    Array(Box<FieldType>),
    // String-keyed object whose values all share one type.
    Map(Box<FieldType>),
    // First matching alternative wins.
    OneOf(Vec<FieldType>),
    Any,
}

impl FieldType {
    pub fn array_of(item: FieldType) -> Self {
        FieldType::Array(Box::new(item))
    }

    pub fn map_of(value: FieldType) -> Self {
        FieldType::Map(Box::new(value))
    }

    pub fn object(schema: Schema) -> Self {
        FieldType::Object(schema)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Object(schema) => write!(f, "object<{}>", schema.name()),
            FieldType::Array(item) => write!(f, "array<{item}>"),
            FieldType::Map(value) => write!(f, "map<{value}>"),
            FieldType::OneOf(options) => {
                for (index, option) in options.iter().enumerate() {
                    if index > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{option}")?;
                }
                Ok(())
            }
            FieldType::Any => write!(f, "any"),
        }
    }
}

// What happens when the field is absent from the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    // Left out of the record.
    Optional,
    // Filled with the declared value.
    Default(FieldValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub nullable: bool,
    pub presence: Presence,
}

impl Field {
    pub fn new(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            nullable: false,
            presence: Presence::Required,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    pub fn default(mut self, value: impl Into<FieldValue>) -> Self {
        self.presence = Presence::Default(value.into());
        self
    }

    // Describes the accepted shape for error messages, e.g. `string | null`.
    pub fn expected(&self) -> String {
        if self.nullable {
            format!("{} | null", self.ty)
        } else {
            self.ty.to_string()
        }
    }
}

#[derive(Debug)]
struct SchemaInner {
    name: &'static str,
    fields: Vec<Field>,
}

// Declarative description of an object shape. Cheap to clone so nested
// schemas can be shared between catalog entries.
#[derive(Debug, Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.name == other.inner.name && self.inner.fields == other.inner.fields)
    }
}

impl Schema {
    pub fn builder(name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            name,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.inner.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.inner.fields.iter().find(|field| field.name == name)
    }
}

pub struct SchemaBuilder {
    name: &'static str,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: Field) -> Self {
        // Later declarations replace earlier ones with the same name.
        self.fields.retain(|existing| existing.name != field.name);
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            inner: Arc::new(SchemaInner {
                name: self.name,
                fields: self.fields,
            }),
        }
    }
}
