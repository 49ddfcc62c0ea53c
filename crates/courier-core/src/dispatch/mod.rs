//! Dispatch layer - Routing, pipelines, and fan-out.
//!
//! This module contains the moving parts of the mediator:
//! - Mediator surface and its builder
//! - Middleware pipeline assembly and ordering
//! - Notification fan-out over handlers and subscribers
//! - Handler resolution against the service provider

pub mod builder;
pub mod builtin;
pub mod mediator;
pub mod middleware;
pub(crate) mod pipeline;
pub(crate) mod publish;
pub(crate) mod resolve;
pub mod subscribers;

pub use builder::MediatorBuilder;
pub use builtin::TraceMiddleware;
pub use mediator::Mediator;
pub use middleware::{
    Gated, Middleware, Next, NotificationMiddleware, PublishNext, RequestMiddleware, RequestNext,
    Scoped,
};
pub use subscribers::{SubscriberCensus, SubscriptionId};
