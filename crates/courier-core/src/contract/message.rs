//! Message contracts for the mediator.
//!
//! Everything that flows through a [`Mediator`](crate::dispatch::Mediator)
//! implements one of three traits:
//!
//! - [`Request`] - routed to exactly one handler, produces a single reply
//! - [`StreamRequest`] - routed to exactly one handler, produces a stream
//! - [`Notification`] - fanned out to any number of processors, no reply
//!
//! A request whose `Response` is `()` is treated as a command; any other
//! response type makes it a query. The distinction is derived from the
//! contract shape at registration time, never from naming conventions.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_core::contract::{MarkerSet, Notification, Request};
//!
//! struct GetUser { id: u64 }
//!
//! impl Request for GetUser {
//!     type Response = User; // non-unit response: this is a query
//! }
//!
//! struct Audited;
//!
//! struct DeleteUser { id: u64 }
//!
//! impl Request for DeleteUser {
//!     type Response = (); // unit response: this is a command
//!
//!     fn markers() -> MarkerSet {
//!         MarkerSet::new().with::<Audited>()
//!     }
//! }
//!
//! struct UserDeleted { id: u64 }
//!
//! impl Notification for UserDeleted {}
//! ```

use std::any::TypeId;

use super::descriptor::TypeKey;

// ============================================================================
// Message Traits
// ============================================================================

/// A message dispatched to exactly one handler, yielding a single reply.
///
/// Implementors with `Response = ()` are classified as commands, everything
/// else as queries. Both kinds travel through the same request pipeline.
pub trait Request: Send + Sync + 'static {
    /// The reply type produced by the handler.
    type Response: Send + 'static;

    /// Constraint markers attached to this request type.
    ///
    /// Markers carry no data; middleware scoped with
    /// [`Scope::marked`](super::scope::Scope::marked) only runs for
    /// messages whose marker set contains the scope's marker type.
    fn markers() -> MarkerSet {
        MarkerSet::new()
    }
}

/// A message dispatched to exactly one handler, yielding a stream of items.
///
/// The request pipeline wraps stream *establishment*: middleware observes
/// the call that produces the stream, not the individual items flowing
/// through it afterwards.
pub trait StreamRequest: Send + Sync + 'static {
    /// The item type yielded by the established stream.
    type Item: Send + 'static;

    /// Constraint markers attached to this stream request type.
    fn markers() -> MarkerSet {
        MarkerSet::new()
    }
}

/// A message fanned out to every registered handler and live subscriber.
///
/// Publishing a notification with no processors at all is a quiet no-op,
/// not an error.
pub trait Notification: Send + Sync + 'static {
    /// Constraint markers attached to this notification type.
    fn markers() -> MarkerSet {
        MarkerSet::new()
    }
}

// ============================================================================
// Marker Sets
// ============================================================================

/// The set of constraint markers a message type declares.
///
/// Markers are plain Rust types used only for their identity; the set stores
/// their [`TypeKey`]s. Scoped middleware consults the set through the
/// descriptor cached at registration, so membership checks never touch the
/// message value itself.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    keys: Vec<TypeKey>,
}

impl MarkerSet {
    /// Creates an empty marker set.
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Adds a marker type, ignoring duplicates.
    pub fn with<M: 'static>(mut self) -> Self {
        let key = TypeKey::of::<M>();
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self
    }

    /// Whether the set contains the marker type `M`.
    pub fn contains<M: 'static>(&self) -> bool {
        self.contains_id(TypeId::of::<M>())
    }

    /// Whether the set contains a marker with the given type id.
    pub fn contains_id(&self, id: TypeId) -> bool {
        self.keys.iter().any(|key| key.id() == id)
    }

    /// Iterates over the marker keys in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeKey> {
        self.keys.iter()
    }

    /// Number of markers in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Audited;
    struct Cached;

    #[test]
    fn markers_deduplicate_and_answer_membership() {
        let set = MarkerSet::new().with::<Audited>().with::<Audited>().with::<Cached>();
        assert_eq!(set.len(), 2);
        assert!(set.contains::<Audited>());
        assert!(set.contains::<Cached>());
        assert!(!set.contains::<String>());
    }

    #[test]
    fn empty_set_contains_nothing() {
        let set = MarkerSet::new();
        assert!(set.is_empty());
        assert!(!set.contains::<Audited>());
    }
}
