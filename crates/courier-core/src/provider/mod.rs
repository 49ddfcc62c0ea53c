//! Handler resolution seam.
//!
//! The mediator never stores concrete handler types; it resolves them
//! through a [`ServiceProvider`] keyed by *closed contract* - the `TypeId`
//! of the handler trait object for one message type, e.g.
//! `TypeId::of::<dyn RequestHandler<GetUser>>()`. The bundled
//! [`ServiceRegistry`] is the default provider; hosts with their own
//! container can implement the trait and answer the same keys.
//!
//! Entries are double-erased: a [`ServiceArc`] is an `Arc<dyn Any>` whose
//! pointee is the typed `Arc<dyn …Handler<_>>`. [`wrap_service`] and
//! [`unwrap_service`] are the two halves of that trick.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_core::provider::{ServiceArc, ServiceProvider, wrap_service};
//!
//! struct StaticProvider {
//!     ping: ServiceArc,
//! }
//!
//! impl ServiceProvider for StaticProvider {
//!     fn resolve_many(&self, contract: TypeId) -> Vec<ServiceArc> {
//!         if contract == TypeId::of::<dyn RequestHandler<Ping>>() {
//!             vec![self.ping.clone()]
//!         } else {
//!             Vec::new()
//!         }
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::sync::Arc;

pub mod registry;

pub use registry::{ServiceRegistry, TypeRecord};

/// An erased service instance as stored by providers.
pub type ServiceArc = Arc<dyn Any + Send + Sync>;

/// Source of handler instances, keyed by closed contract.
///
/// Implementations must return instances in registration order; request
/// cardinality and fan-out ordering are both derived from it.
pub trait ServiceProvider: Send + Sync {
    /// All instances registered under the contract key.
    fn resolve_many(&self, contract: TypeId) -> Vec<ServiceArc>;

    /// First instance registered under the contract key, if any.
    ///
    /// Request dispatch never uses this (it needs the full list to reject
    /// ambiguous registrations); it exists for hosts probing a contract.
    fn try_resolve(&self, contract: TypeId) -> Option<ServiceArc> {
        self.resolve_many(contract).into_iter().next()
    }
}

/// Erases a typed handler for storage in a provider.
pub fn wrap_service<T: ?Sized + Send + Sync + 'static>(service: Arc<T>) -> ServiceArc {
    Arc::new(service)
}

/// Recovers the typed handler from an erased entry.
///
/// Returns `None` when the entry was not wrapped as an `Arc<T>`.
pub fn unwrap_service<T: ?Sized + 'static>(entry: &ServiceArc) -> Option<Arc<T>> {
    entry.downcast_ref::<Arc<T>>().map(Arc::clone)
}
