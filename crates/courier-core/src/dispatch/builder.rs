//! Mediator construction.
//!
//! All handlers and middleware are declared up front; [`MediatorBuilder::build`]
//! freezes the surface into an immutable [`Mediator`]. Only subscribers can be
//! attached afterwards.

use std::any::type_name;
use std::sync::Arc;

use tracing::debug;

use crate::contract::descriptor::short_type_name;
use crate::contract::handler::{NotificationHandler, RequestHandler, StreamHandler};
use crate::contract::message::{Notification, Request, StreamRequest};
use crate::contract::order::Order;
use crate::provider::registry::ServiceRegistry;

use super::mediator::Mediator;
use super::middleware::{Middleware, NotificationMiddleware, RequestMiddleware, Scoped};
use super::pipeline::PipelineSet;

/// Builder for [`Mediator`].
///
/// Registration order is significant twice over: handlers fan out in the
/// order they were added, and middleware sharing an order value runs in
/// registration order.
pub struct MediatorBuilder {
    registry: ServiceRegistry,
    pipelines: PipelineSet,
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self {
            registry: ServiceRegistry::new(),
            pipelines: PipelineSet::new(Order::DEFAULT),
        }
    }

    /// Registers the handler for a request type.
    ///
    /// Exactly one handler per request type is expected; a duplicate is
    /// accepted here but makes every dispatch of that type fail with
    /// an ambiguity error.
    pub fn handler<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        self.registry.register_request_handler::<R, H>(handler);
        self
    }

    /// Registers the handler for a stream request type.
    pub fn stream_handler<R, H>(mut self, handler: H) -> Self
    where
        R: StreamRequest,
        H: StreamHandler<R> + 'static,
    {
        self.registry.register_stream_handler::<R, H>(handler);
        self
    }

    /// Registers a notification handler; a type may have any number.
    pub fn notification_handler<N, H>(mut self, handler: H) -> Self
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        self.registry.register_notification_handler::<N, H>(handler);
        self
    }

    /// Adds request middleware.
    ///
    /// Order and scope are read from the component once, here; later
    /// mutation of the component does not reorder the pipeline.
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        let name = short_type_name(type_name::<M>());
        self.pipelines.push_request(Arc::new(middleware), name);
        self
    }

    /// Adds middleware that only runs for one request type.
    ///
    /// The component keeps its typed signature; other request types pass
    /// it by untouched.
    pub fn request_middleware<R, M>(mut self, middleware: M) -> Self
    where
        R: Request,
        M: RequestMiddleware<R> + 'static,
    {
        let name = short_type_name(type_name::<M>());
        self.pipelines
            .push_request(Arc::new(Scoped::new(middleware)), name);
        self
    }

    /// Adds notification middleware, wrapping the fan-out.
    pub fn notification_middleware<M>(mut self, middleware: M) -> Self
    where
        M: NotificationMiddleware + 'static,
    {
        let name = short_type_name(type_name::<M>());
        self.pipelines
            .push_notification(Arc::new(middleware), name);
        self
    }

    /// Order assigned to middleware that declares none. Defaults to zero.
    pub fn fallback_order(mut self, order: impl Into<Order>) -> Self {
        self.pipelines.fallback = order.into();
        self
    }

    /// Freezes the surface and hands out the mediator.
    pub fn build(self) -> Mediator {
        debug!(
            contracts = self.registry.records().len(),
            request_middleware = self.pipelines.request.len(),
            notification_middleware = self.pipelines.notification.len(),
            "mediator built"
        );
        Mediator::from_parts(self.registry, self.pipelines)
    }
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
