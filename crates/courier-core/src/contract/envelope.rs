//! Type-erased envelopes for pipeline traversal.
//!
//! Middleware runs before the concrete message type is known, so messages
//! cross the pipeline inside erased envelopes that carry their
//! [`TypeDescriptor`] alongside the value:
//!
//! - [`BoxedRequest`] - an owned request or stream request on its way to
//!   the single handler
//! - [`BoxedReply`] - the erased reply travelling back out
//! - [`BoxedNotification`] - a shared notification fanned out to many
//!   processors cheaply via `Arc`
//!
//! Downcasting never panics; mismatches hand the envelope back so callers
//! can keep routing or report a typed error.

use std::any::{Any, TypeId};
use std::sync::Arc;

use super::descriptor::TypeDescriptor;
use super::message::{Notification, Request, StreamRequest};

// ============================================================================
// Boxed Request
// ============================================================================

/// An owned, type-erased request travelling through the pipeline.
pub struct BoxedRequest {
    value: Box<dyn Any + Send>,
    descriptor: Arc<TypeDescriptor>,
}

impl BoxedRequest {
    /// Wraps a request, deriving a fresh descriptor for its type.
    pub fn new<R: Request>(request: R) -> Self {
        Self::erased(request, Arc::new(TypeDescriptor::request::<R>()))
    }

    /// Wraps a stream request, deriving a fresh descriptor for its type.
    pub fn new_stream<R: StreamRequest>(request: R) -> Self {
        Self::erased(request, Arc::new(TypeDescriptor::stream::<R>()))
    }

    /// Wraps a value with a descriptor already cached by the registry.
    pub(crate) fn erased<T: Send + 'static>(value: T, descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            value: Box::new(value),
            descriptor,
        }
    }

    /// Metadata for the wrapped type.
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Full path name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name()
    }

    /// Whether the wrapped value is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.as_ref().type_id() == TypeId::of::<T>()
    }

    /// Borrows the wrapped value as a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Recovers the wrapped value, returning the envelope untouched on a
    /// type mismatch.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let Self { value, descriptor } = self;
        match value.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(value) => Err(Self { value, descriptor }),
        }
    }
}

impl std::fmt::Debug for BoxedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedRequest")
            .field("type", &self.descriptor.short_name())
            .field("role", &self.descriptor.role())
            .finish()
    }
}

// ============================================================================
// Boxed Reply
// ============================================================================

/// The erased reply produced by the handler terminal.
pub struct BoxedReply {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl BoxedReply {
    /// Wraps a reply value.
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Full path name of the wrapped reply type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the wrapped reply is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.as_ref().type_id() == TypeId::of::<T>()
    }

    /// Borrows the wrapped reply as a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Recovers the reply, returning the envelope untouched on a type
    /// mismatch.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let Self { value, type_name } = self;
        match value.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(value) => Err(Self { value, type_name }),
        }
    }
}

impl std::fmt::Debug for BoxedReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedReply")
            .field("type", &self.type_name)
            .finish()
    }
}

// ============================================================================
// Boxed Notification
// ============================================================================

/// A shared, type-erased notification.
///
/// Cloning is an `Arc` bump; every processor in a fan-out observes the same
/// notification value.
#[derive(Clone)]
pub struct BoxedNotification {
    value: Arc<dyn Any + Send + Sync>,
    descriptor: Arc<TypeDescriptor>,
}

impl BoxedNotification {
    /// Wraps a notification, deriving a fresh descriptor for its type.
    pub fn new<N: Notification>(notification: N) -> Self {
        Self::erased(notification, Arc::new(TypeDescriptor::notification::<N>()))
    }

    pub(crate) fn erased<N: Notification>(notification: N, descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            value: Arc::new(notification),
            descriptor,
        }
    }

    /// Metadata for the wrapped type.
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Full path name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name()
    }

    /// Whether the wrapped notification is an `N`.
    pub fn is<N: 'static>(&self) -> bool {
        self.value.as_ref().type_id() == TypeId::of::<N>()
    }

    /// Borrows the wrapped notification as an `N`.
    pub fn downcast_ref<N: 'static>(&self) -> Option<&N> {
        self.value.downcast_ref()
    }

    /// Returns a shared handle to the wrapped notification as an `N`.
    pub fn downcast<N: Send + Sync + 'static>(&self) -> Option<Arc<N>> {
        Arc::clone(&self.value).downcast::<N>().ok()
    }
}

impl std::fmt::Debug for BoxedNotification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedNotification")
            .field("type", &self.descriptor.short_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::descriptor::Role;

    struct Fetch(u32);
    impl Request for Fetch {
        type Response = String;
    }

    struct Tick(&'static str);
    impl Notification for Tick {}

    #[test]
    fn request_envelope_roundtrips() {
        let envelope = BoxedRequest::new(Fetch(7));
        assert!(envelope.is::<Fetch>());
        assert_eq!(envelope.descriptor().role(), Role::Query);
        assert_eq!(envelope.downcast_ref::<Fetch>().map(|f| f.0), Some(7));

        let fetch = envelope.downcast::<Fetch>().map(|f| f.0);
        assert_eq!(fetch.ok(), Some(7));
    }

    #[test]
    fn mismatched_downcast_returns_the_envelope() {
        let envelope = BoxedRequest::new(Fetch(1));
        let envelope = match envelope.downcast::<String>() {
            Ok(_) => panic!("downcast to a foreign type must fail"),
            Err(envelope) => envelope,
        };
        assert!(envelope.is::<Fetch>());
    }

    #[test]
    fn reply_envelope_reports_its_type() {
        let reply = BoxedReply::new(42u32);
        assert!(reply.is::<u32>());
        assert!(reply.type_name().ends_with("u32"));
        assert!(reply.downcast::<String>().is_err());
    }

    #[test]
    fn notification_clones_share_the_value() {
        let envelope = BoxedNotification::new(Tick("boot"));
        let clone = envelope.clone();

        let first = envelope.downcast::<Tick>().unwrap();
        let second = clone.downcast::<Tick>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.0, "boot");
    }
}
