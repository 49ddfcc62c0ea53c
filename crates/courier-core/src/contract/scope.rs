//! Applicability scopes for middleware.
//!
//! A [`Scope`] decides which messages a middleware component runs for. It is
//! plain data matched against the [`TypeDescriptor`] on the envelope, so the
//! inspector can report exactly what dispatch will do without executing
//! anything.

use super::descriptor::{TypeDescriptor, TypeKey};

/// Which messages a middleware component applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Runs for every message on the pipeline.
    All,
    /// Runs only for one concrete message type.
    Exact(TypeKey),
    /// Runs for every message whose marker set contains the marker type.
    Marked(TypeKey),
}

impl Scope {
    /// Scope limited to the message type `T`.
    pub fn exact<T: 'static>() -> Self {
        Scope::Exact(TypeKey::of::<T>())
    }

    /// Scope limited to messages marked with `M`.
    pub fn marked<M: 'static>() -> Self {
        Scope::Marked(TypeKey::of::<M>())
    }

    /// Whether a message with this descriptor falls inside the scope.
    pub fn admits(&self, descriptor: &TypeDescriptor) -> bool {
        match self {
            Scope::All => true,
            Scope::Exact(key) => descriptor.type_id() == key.id(),
            Scope::Marked(key) => descriptor.markers().contains_id(key.id()),
        }
    }

    /// Human-readable form used by reports.
    pub fn label(&self) -> String {
        match self {
            Scope::All => "all".to_string(),
            Scope::Exact(key) => format!("only {}", key.short_name()),
            Scope::Marked(key) => format!("marked {}", key.short_name()),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}
