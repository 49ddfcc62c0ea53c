//! The bundled service registry.
//!
//! [`ServiceRegistry`] is the default [`ServiceProvider`]: a frozen map from
//! closed contract keys to handler instances, built once through the
//! [`MediatorBuilder`](crate::dispatch::MediatorBuilder) and never mutated
//! afterwards. Alongside the instances it keeps the *catalog* - one
//! [`TypeRecord`] per registered contract - which is what the inspector
//! reads to enumerate the surface without resolving anything.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::contract::descriptor::{Classification, Role, TypeDescriptor, short_type_name};
use crate::contract::handler::{NotificationHandler, RequestHandler, StreamHandler};
use crate::contract::message::{Notification, Request, StreamRequest};

use super::{ServiceArc, ServiceProvider, wrap_service};

// ============================================================================
// Catalog Records
// ============================================================================

/// One registered contract: the message type, its metadata, and the names
/// of the handlers attached to it.
#[derive(Debug, Clone)]
pub struct TypeRecord {
    descriptor: Arc<TypeDescriptor>,
    contract: TypeId,
    handler_names: Vec<String>,
}

impl TypeRecord {
    /// Metadata for the message type.
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// The closed contract key handlers are resolved under.
    pub fn contract(&self) -> TypeId {
        self.contract
    }

    /// Short names of the registered handlers, in registration order.
    pub fn handler_names(&self) -> &[String] {
        &self.handler_names
    }
}

// ============================================================================
// Service Registry
// ============================================================================

/// The default provider plus the registration catalog.
#[derive(Default)]
pub struct ServiceRegistry {
    entries: HashMap<TypeId, Vec<ServiceArc>>,
    records: Vec<TypeRecord>,
    request_descriptors: HashMap<TypeId, Arc<TypeDescriptor>>,
    stream_descriptors: HashMap<TypeId, Arc<TypeDescriptor>>,
    notification_descriptors: HashMap<TypeId, Arc<TypeDescriptor>>,
}

impl ServiceRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a request handler under `dyn RequestHandler<R>`.
    ///
    /// A second registration for the same request type is accepted here and
    /// logged; dispatch will refuse the contract until the surplus handler
    /// is removed.
    pub(crate) fn register_request_handler<R, H>(&mut self, handler: H)
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let typed: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        let descriptor = Arc::clone(
            self.request_descriptors
                .entry(TypeId::of::<R>())
                .or_insert_with(|| Arc::new(TypeDescriptor::request::<R>())),
        );
        self.attach(
            TypeId::of::<dyn RequestHandler<R>>(),
            wrap_service(typed),
            descriptor,
            short_type_name(type_name::<H>()),
            true,
        );
    }

    /// Registers a stream handler under `dyn StreamHandler<R>`.
    pub(crate) fn register_stream_handler<R, H>(&mut self, handler: H)
    where
        R: StreamRequest,
        H: StreamHandler<R> + 'static,
    {
        let typed: Arc<dyn StreamHandler<R>> = Arc::new(handler);
        let descriptor = Arc::clone(
            self.stream_descriptors
                .entry(TypeId::of::<R>())
                .or_insert_with(|| Arc::new(TypeDescriptor::stream::<R>())),
        );
        self.attach(
            TypeId::of::<dyn StreamHandler<R>>(),
            wrap_service(typed),
            descriptor,
            short_type_name(type_name::<H>()),
            true,
        );
    }

    /// Registers a notification handler under `dyn NotificationHandler<N>`.
    ///
    /// Any number of handlers may share a notification type.
    pub(crate) fn register_notification_handler<N, H>(&mut self, handler: H)
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        let typed: Arc<dyn NotificationHandler<N>> = Arc::new(handler);
        let descriptor = Arc::clone(
            self.notification_descriptors
                .entry(TypeId::of::<N>())
                .or_insert_with(|| Arc::new(TypeDescriptor::notification::<N>())),
        );
        self.attach(
            TypeId::of::<dyn NotificationHandler<N>>(),
            wrap_service(typed),
            descriptor,
            short_type_name(type_name::<H>()),
            false,
        );
    }

    fn attach(
        &mut self,
        contract: TypeId,
        entry: ServiceArc,
        descriptor: Arc<TypeDescriptor>,
        handler_name: String,
        single: bool,
    ) {
        self.entries.entry(contract).or_default().push(entry);
        match self.records.iter_mut().find(|record| record.contract == contract) {
            Some(record) => {
                record.handler_names.push(handler_name);
                if single {
                    warn!(
                        request = %record.descriptor.short_name(),
                        handlers = record.handler_names.len(),
                        "multiple handlers registered for a single-handler contract"
                    );
                }
            }
            None => self.records.push(TypeRecord {
                descriptor,
                contract,
                handler_names: vec![handler_name],
            }),
        }
    }

    /// The registration catalog, in registration order.
    pub fn records(&self) -> &[TypeRecord] {
        &self.records
    }

    /// The catalog entry for a handler contract, if anything registered it.
    pub fn record_for(&self, contract: TypeId) -> Option<&TypeRecord> {
        self.records.iter().find(|record| record.contract == contract)
    }

    /// Cached descriptor for a request type, derived fresh if the type was
    /// never registered.
    pub fn request_descriptor<R: Request>(&self) -> Arc<TypeDescriptor> {
        self.request_descriptors
            .get(&TypeId::of::<R>())
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::new(TypeDescriptor::request::<R>()))
    }

    /// Cached descriptor for a stream request type.
    pub fn stream_descriptor<R: StreamRequest>(&self) -> Arc<TypeDescriptor> {
        self.stream_descriptors
            .get(&TypeId::of::<R>())
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::new(TypeDescriptor::stream::<R>()))
    }

    /// Cached descriptor for a notification type.
    pub fn notification_descriptor<N: Notification>(&self) -> Arc<TypeDescriptor> {
        self.notification_descriptors
            .get(&TypeId::of::<N>())
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::new(TypeDescriptor::notification::<N>()))
    }

    /// Every role a type id is registered under; empty for strangers.
    pub fn classify(&self, type_id: TypeId) -> Classification {
        let mut classification = Classification::default();
        for record in &self.records {
            if record.descriptor.type_id() == type_id {
                classification.push(&record.descriptor);
            }
        }
        classification
    }

    /// Number of registered contracts with the given role.
    pub fn count_role(&self, role: Role) -> usize {
        self.records
            .iter()
            .filter(|record| record.descriptor.role() == role)
            .count()
    }
}

impl ServiceProvider for ServiceRegistry {
    fn resolve_many(&self, contract: TypeId) -> Vec<ServiceArc> {
        self.entries.get(&contract).cloned().unwrap_or_default()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("contracts", &self.records.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::error::BoxError;
    use tokio_util::sync::CancellationToken;

    struct Ping;
    impl Request for Ping {
        type Response = u32;
    }

    struct Tick;
    impl Notification for Tick {}

    async fn answer(_request: Ping, _cancel: CancellationToken) -> Result<u32, BoxError> {
        Ok(1)
    }

    async fn observe(_tick: std::sync::Arc<Tick>, _cancel: CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }

    #[test]
    fn registration_builds_catalog_and_entries() {
        let mut registry = ServiceRegistry::new();
        registry.register_request_handler::<Ping, _>(answer);
        registry.register_notification_handler::<Tick, _>(observe);
        registry.register_notification_handler::<Tick, _>(observe);

        assert_eq!(registry.records().len(), 2);
        assert_eq!(
            registry
                .resolve_many(TypeId::of::<dyn NotificationHandler<Tick>>())
                .len(),
            2
        );
        assert_eq!(
            registry
                .resolve_many(TypeId::of::<dyn RequestHandler<Ping>>())
                .len(),
            1
        );
        assert_eq!(registry.count_role(Role::Query), 1);
        assert_eq!(registry.count_role(Role::Notification), 1);

        assert!(registry.try_resolve(TypeId::of::<dyn RequestHandler<Ping>>()).is_some());
        assert!(registry.try_resolve(TypeId::of::<Ping>()).is_none());
    }

    #[test]
    fn descriptors_are_cached_per_type() {
        let mut registry = ServiceRegistry::new();
        registry.register_request_handler::<Ping, _>(answer);

        let first = registry.request_descriptor::<Ping>();
        let second = registry.request_descriptor::<Ping>();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn classification_is_empty_for_strangers() {
        let registry = ServiceRegistry::new();
        assert!(registry.classify(TypeId::of::<Ping>()).is_unknown());
    }

    #[test]
    fn hybrid_types_report_every_role() {
        struct Pulse;
        impl Request for Pulse {
            type Response = ();
        }
        impl Notification for Pulse {}

        let mut registry = ServiceRegistry::new();
        registry.register_request_handler::<Pulse, _>(
            |_request: Pulse, _cancel: CancellationToken| async { Ok(()) },
        );
        registry.register_notification_handler::<Pulse, _>(
            |_pulse: std::sync::Arc<Pulse>, _cancel: CancellationToken| async { Ok(()) },
        );

        let classification = registry.classify(TypeId::of::<Pulse>());
        assert_eq!(classification.roles(), &[Role::Command, Role::Notification]);
    }
}
