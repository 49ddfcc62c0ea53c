//! Unified error types for the Courier core engine.
//!
//! Handler and middleware failures travel as [`BoxError`] so application
//! code can surface any error type; the engine wraps them in
//! [`DispatchError`] / [`PublishError`] at the mediator boundary.

use thiserror::Error;

/// Boxed error type carried by handlers, middleware, and subscribers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Request Dispatch Errors
// =============================================================================

/// Errors produced by request and stream dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the request type.
    #[error("no handler registered for request '{request}'")]
    HandlerNotFound {
        /// The request type that could not be routed.
        request: &'static str,
    },

    /// More than one handler is registered for a request type that
    /// requires exactly one.
    #[error("{count} handlers registered for request '{request}', exactly one is required")]
    AmbiguousHandler {
        /// The over-registered request type.
        request: &'static str,
        /// How many handlers were found.
        count: usize,
    },

    /// A provider returned an entry that is not a handler for the
    /// requested contract.
    #[error("provider returned an incompatible instance for contract '{contract}'")]
    InvalidRegistration {
        /// The contract whose resolution failed.
        contract: &'static str,
    },

    /// The pipeline delivered a request of the wrong type to the handler
    /// terminal. Only reachable when middleware substitutes the envelope.
    #[error("pipeline delivered a '{found}' to the handler terminal, expected '{expected}'")]
    RequestMismatch {
        /// The request type the handler was registered for.
        expected: &'static str,
        /// The type actually found in the envelope.
        found: &'static str,
    },

    /// The pipeline produced a reply of the wrong type.
    #[error("pipeline produced a '{found}' reply, expected '{expected}'")]
    ReplyMismatch {
        /// The reply type the caller asked for.
        expected: &'static str,
        /// The reply type actually produced.
        found: &'static str,
    },

    /// The handler or a middleware component failed.
    #[error("dispatch failed: {0}")]
    Failed(#[from] BoxError),
}

// =============================================================================
// Publish Errors
// =============================================================================

/// Errors produced by notification fan-out.
#[derive(Debug, Error)]
pub enum PublishError {
    /// A notification middleware component failed before the fan-out
    /// completed.
    #[error("notification pipeline failed: {0}")]
    Pipeline(#[source] BoxError),

    /// One or more processors failed; every processor was still attempted.
    #[error(transparent)]
    Processors(#[from] ProcessorFailures),
}

impl PublishError {
    /// The individual processor failures, empty for pipeline errors.
    pub fn failures(&self) -> &[ProcessorFailure] {
        match self {
            PublishError::Pipeline(_) => &[],
            PublishError::Processors(failures) => &failures.failures,
        }
    }
}

/// Aggregate of every processor failure from a single fan-out.
#[derive(Debug, Error)]
#[error("{} of {attempted} notification processors failed", .failures.len())]
pub struct ProcessorFailures {
    /// How many processors the fan-out attempted.
    pub attempted: usize,
    /// The failures, in fan-out order.
    pub failures: Vec<ProcessorFailure>,
}

impl ProcessorFailures {
    /// The first failure in fan-out order.
    pub fn first(&self) -> Option<&ProcessorFailure> {
        self.failures.first()
    }
}

/// A single processor failure within a fan-out.
#[derive(Debug, Error)]
#[error("{kind} '{processor}' failed: {error}")]
pub struct ProcessorFailure {
    /// Short name of the failing processor.
    pub processor: String,
    /// Whether the processor was a registered handler or a subscriber.
    pub kind: ProcessorKind,
    /// The underlying failure.
    #[source]
    pub error: BoxError,
}

/// Which delivery path a notification processor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    /// Resolved from the provider at publish time.
    Handler,
    /// Attached at runtime through a subscription.
    Subscriber,
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessorKind::Handler => f.write_str("handler"),
            ProcessorKind::Subscriber => f.write_str("subscriber"),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for request dispatch.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for notification fan-out.
pub type PublishResult = Result<(), PublishError>;
