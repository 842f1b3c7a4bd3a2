// Translation of API failures and successful mutations into user-facing messages.

use crate::domain::{ApiError, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Load,
    Create,
    Update,
    UpdateStatus,
    Delete,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Load => "load",
            Action::Create => "create",
            Action::Update => "update",
            Action::UpdateStatus => "update the status of",
            Action::Delete => "delete",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Action::Load => "loaded",
            Action::Create => "created",
            Action::Update => "updated",
            Action::UpdateStatus => "status updated",
            Action::Delete => "deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Notification {
    fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            description: description.into(),
        }
    }
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn conflict_reason(resource: Resource, action: Action) -> String {
    match resource {
        Resource::Suppliers => "This supplier still has supply lots. Remove them first.".to_string(),
        Resource::SupplyItems => "This supply item is still used by supply lots.".to_string(),
        Resource::SupplyLots => "This supply lot already has stock movements.".to_string(),
        Resource::Incidents => {
            "This incident was modified by another user. Please reload.".to_string()
        }
        Resource::Crops => "This crop still has varieties or seasons.".to_string(),
        other => format!(
            "Cannot {} this {}: it has dependent records.",
            action.verb(),
            other.label()
        ),
    }
}

// Known backend rule violations, matched case-insensitively.
fn known_business_reason(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    if lower.contains("license") || lower.contains("restricted") {
        Some("Restricted items can only be supplied by a licensed supplier.")
    } else if lower.contains("duplicate") || lower.contains("already exists") {
        Some("A record with the same details already exists.")
    } else if lower.contains("insufficient stock") || lower.contains("insufficient quantity") {
        Some("There is not enough stock on hand for this movement.")
    } else if lower.contains("not found") {
        Some("The record no longer exists. It may have been deleted.")
    } else {
        None
    }
}

/// Builds the message shown when `action` on `resource` fails with `error`.
///
/// Schema failures stay generic; their details only reach the logs.
pub fn notify(error: &ApiError, resource: Resource, action: Action) -> Notification {
    let label = resource.label();
    let failed = format!("Failed to {} {}", action.verb(), label);

    match error {
        ApiError::Schema(_) => Notification::error(
            format!("Failed to load {}", resource.plural_label()),
            "The server returned data in an unexpected format.",
        ),
        ApiError::Transport { .. } | ApiError::Server { .. } => Notification::error(
            failed,
            "Could not reach the server. Check your connection and try again.",
        ),
        ApiError::Conflict { .. } => Notification::error(failed, conflict_reason(resource, action)),
        ApiError::Business { message, .. } => {
            let message = message.as_deref().map(str::trim).filter(|m| !m.is_empty());
            let description = match message {
                Some(message) => known_business_reason(message)
                    .map(str::to_string)
                    .unwrap_or_else(|| message.to_string()),
                None => format!("{failed}."),
            };
            Notification::error(failed, description)
        }
        ApiError::Unsupported { .. } => Notification {
            severity: Severity::Warning,
            title: failed,
            description: error.to_string(),
        },
    }
}

pub fn success(resource: Resource, action: Action) -> Notification {
    Notification {
        severity: Severity::Success,
        title: format!("{} {}", capitalized(resource.label()), action.past_tense()),
        description: String::new(),
    }
}
