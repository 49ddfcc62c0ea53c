//! Analysis records - the inspector's report model.
//!
//! Every type here is a derived, read-only snapshot:
//! - [`RequestAnalysis`] / [`NotificationAnalysis`] per analyzed contract
//! - [`MiddlewareReport`] / [`MiddlewareConfig`] per pipeline component
//! - [`MediatorStats`] as the one-line aggregate
//!
//! Records are recomputed on every inspection call and never cached by the
//! core; they serialize with `serde` so operators can export them.

use serde::Serialize;

use crate::contract::descriptor::{Role, short_type_name};
use crate::contract::order::Order;

/// Handler multiplicity for one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// No handler registered.
    Missing,
    /// Exactly one handler, the dispatchable case for requests.
    Single,
    /// Two or more handlers.
    Multiple,
}

impl Cardinality {
    pub fn of(count: usize) -> Self {
        match count {
            0 => Self::Missing,
            1 => Self::Single,
            _ => Self::Multiple,
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Missing => "missing",
            Self::Single => "single",
            Self::Multiple => "multiple",
        };
        write!(f, "{label}")
    }
}

/// How a notification reaches its audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryPattern {
    /// Nobody listens.
    None,
    /// Registered handlers only.
    HandlersOnly,
    /// Runtime subscribers only.
    SubscribersOnly,
    /// Both handlers and subscribers.
    Hybrid,
}

impl DeliveryPattern {
    pub fn derive(handlers: usize, subscribers: usize) -> Self {
        match (handlers, subscribers) {
            (0, 0) => Self::None,
            (_, 0) => Self::HandlersOnly,
            (0, _) => Self::SubscribersOnly,
            _ => Self::Hybrid,
        }
    }
}

impl std::fmt::Display for DeliveryPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::HandlersOnly => "handlers-only",
            Self::SubscribersOnly => "subscribers-only",
            Self::Hybrid => "hybrid",
        };
        write!(f, "{label}")
    }
}

/// Presentation block attached to detailed analyses.
///
/// Summary and detailed analyses agree on every count; this block only adds
/// identity fields for human consumption.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisDetail {
    /// Fully qualified type path.
    pub full_path: String,
    /// Module portion of the path, empty for bare names.
    pub module_path: String,
    /// Type parameters of the contract, shortened.
    pub type_params: Vec<String>,
    /// Response type for requests; absent for commands and notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Registered handler type names, registration order.
    pub handlers: Vec<String>,
}

/// One analyzed request contract.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAnalysis {
    /// Short type name.
    pub name: String,
    /// Structural role, query or command.
    pub role: Role,
    /// Handlers currently resolvable for the contract.
    pub handler_count: usize,
    /// Multiplicity bucket for `handler_count`.
    pub cardinality: Cardinality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<AnalysisDetail>,
}

/// One analyzed notification contract.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationAnalysis {
    /// Short type name.
    pub name: String,
    /// Handlers resolvable through the provider.
    pub handler_count: usize,
    pub handler_cardinality: Cardinality,
    /// Manual subscribers reaching this type, catch-alls included.
    pub subscriber_count: usize,
    pub subscriber_cardinality: Cardinality,
    /// Combined delivery shape.
    pub pattern: DeliveryPattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<AnalysisDetail>,
}

/// One middleware in the order dispatch would run it.
#[derive(Debug, Clone, Serialize)]
pub struct MiddlewareReport {
    /// Short component type name.
    pub name: String,
    /// Type parameters of the component, shortened.
    pub type_params: Vec<String>,
    /// Effective order used for ranking.
    pub order: Order,
    /// Human-readable order, sentinel-aware.
    pub order_label: String,
    /// Applicability scope label.
    pub scope: String,
}

/// Declared-versus-effective configuration of one middleware.
#[derive(Debug, Clone, Serialize)]
pub struct MiddlewareConfig {
    /// Short component type name.
    pub name: String,
    /// Order the component declared, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared: Option<Order>,
    /// Order ranking actually uses, fallback applied.
    pub effective: Order,
    /// Applicability scope label.
    pub scope: String,
    /// Registration position, the tiebreaker among equal orders.
    pub sequence: usize,
}

/// Aggregate counts over the mediator surface.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MediatorStats {
    /// Query contracts.
    pub queries: usize,
    /// Command contracts.
    pub commands: usize,
    /// Stream request contracts.
    pub streams: usize,
    /// Notification contracts with at least one handler.
    pub notifications: usize,
    /// Handler registrations across all contracts.
    pub handlers: usize,
    /// Live manual subscriptions.
    pub subscribers: usize,
    /// Request pipeline components.
    pub request_middleware: usize,
    /// Notification pipeline components.
    pub notification_middleware: usize,
}

impl std::fmt::Display for MediatorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Contracts: {} queries, {} commands, {} streams, {} notifications; \
             {} handlers, {} subscribers; middleware: {} request, {} notification",
            self.queries,
            self.commands,
            self.streams,
            self.notifications,
            self.handlers,
            self.subscribers,
            self.request_middleware,
            self.notification_middleware
        )
    }
}

// ============================================================================
// Name parsing
// ============================================================================

/// Module portion of a type path, generic arguments ignored.
pub(crate) fn module_path_of(full: &str) -> String {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(split) => head[..split].to_string(),
        None => String::new(),
    }
}

/// Type parameters of a path, each shortened, outermost angle pair only.
pub(crate) fn type_params_of(full: &str) -> Vec<String> {
    let Some(open) = full.find('<') else {
        return Vec::new();
    };
    let Some(close) = full.rfind('>') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }

    let body = &full[open + 1..close];
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (index, ch) in body.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.push(short_type_name(body[start..index].trim()));
                start = index + 1;
            }
            _ => {}
        }
    }
    let tail = body[start..].trim();
    if !tail.is_empty() {
        params.push(short_type_name(tail));
    }
    params
}

/// Grouping role for inspection output.
///
/// Structural roles pass through untouched; only a type whose role could not
/// be established structurally falls back to its name ("Query" or "Command"
/// substring). Dispatch never consults this.
pub(crate) fn grouped_role(role: Role, name: &str) -> Role {
    if role != Role::Unknown {
        return role;
    }
    if name.contains("Query") {
        Role::Query
    } else if name.contains("Command") {
        Role::Command
    } else {
        Role::Unknown
    }
}
