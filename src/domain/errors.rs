use std::fmt;

// One step in the location of a field inside a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

// Location of a field, rendered like `result.items[0].name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn field(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Field(name.to_string()));
        Self { segments }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    // Name of the innermost field, skipping trailing indices.
    pub fn last_field(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            PathSegment::Field(name) => Some(name.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    // Index of the first array element on the path, if any.
    pub fn first_index(&self) -> Option<usize> {
        self.segments.iter().find_map(|segment| match segment {
            PathSegment::Index(index) => Some(*index),
            PathSegment::Field(_) => None,
        })
    }

    // Re-roots this path under `prefix`.
    pub fn within(&self, prefix: &FieldPath) -> Self {
        let mut segments = prefix.segments.clone();
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "$");
        }
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if position == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaErrorKind {
    Missing { expected: String },
    TypeMismatch { expected: String, actual: String },
    PageInvariant(String),
    // Body could not be parsed as JSON at all.
    NotJson(String),
}

// Payload does not match the declared shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    pub path: FieldPath,
    pub kind: SchemaErrorKind,
}

impl SchemaError {
    pub fn missing(path: FieldPath, expected: impl Into<String>) -> Self {
        Self {
            path,
            kind: SchemaErrorKind::Missing {
                expected: expected.into(),
            },
        }
    }

    pub fn mismatch(path: FieldPath, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            path,
            kind: SchemaErrorKind::TypeMismatch {
                expected: expected.into(),
                actual: actual.into(),
            },
        }
    }

    pub fn page_invariant(path: FieldPath, detail: impl Into<String>) -> Self {
        Self {
            path,
            kind: SchemaErrorKind::PageInvariant(detail.into()),
        }
    }

    pub fn not_json(detail: impl Into<String>) -> Self {
        Self {
            path: FieldPath::root(),
            kind: SchemaErrorKind::NotJson(detail.into()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.kind, SchemaErrorKind::Missing { .. })
    }

    pub fn within(self, prefix: &FieldPath) -> Self {
        Self {
            path: self.path.within(prefix),
            kind: self.kind,
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SchemaErrorKind::Missing { expected } => {
                write!(f, "{}: missing required field (expected {expected})", self.path)
            }
            SchemaErrorKind::TypeMismatch { expected, actual } => {
                write!(f, "{}: expected {expected}, got {actual}", self.path)
            }
            SchemaErrorKind::PageInvariant(detail) => {
                write!(f, "{}: invalid page container: {detail}", self.path)
            }
            SchemaErrorKind::NotJson(detail) => write!(f, "response is not json: {detail}"),
        }
    }
}

impl std::error::Error for SchemaError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    Other,
}

// Every way a backend call can fail. Cloneable so one failed in-flight
// request can be handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Schema(SchemaError),
    Transport {
        kind: TransportKind,
        message: String,
    },
    // 4xx other than 409: a domain rule rejected the request.
    Business {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },
    // 409: referential constraint or concurrent modification.
    Conflict {
        message: Option<String>,
    },
    Server {
        status: u16,
        message: Option<String>,
    },
    // The resource has no endpoint for the requested operation.
    Unsupported {
        resource: &'static str,
        operation: &'static str,
    },
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Server { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Business { status, .. } | ApiError::Server { status, .. } => Some(*status),
            ApiError::Conflict { .. } => Some(409),
            _ => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Business { message, .. }
            | ApiError::Conflict { message }
            | ApiError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        ApiError::Schema(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Schema(err) => write!(f, "invalid response: {err}"),
            ApiError::Transport { kind, message } => {
                write!(f, "transport error ({kind:?}): {message}")
            }
            ApiError::Business {
                status, message, ..
            } => match message {
                Some(message) => write!(f, "request rejected {status}: {message}"),
                None => write!(f, "request rejected {status}"),
            },
            ApiError::Conflict { message } => match message {
                Some(message) => write!(f, "conflict: {message}"),
                None => write!(f, "conflict"),
            },
            ApiError::Server { status, message } => match message {
                Some(message) => write!(f, "server error {status}: {message}"),
                None => write!(f, "server error {status}"),
            },
            ApiError::Unsupported {
                resource,
                operation,
            } => write!(f, "{resource} does not support {operation}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Schema(err) => Some(err),
            _ => None,
        }
    }
}
