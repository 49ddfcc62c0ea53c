//! # Courier
//!
//! An in-process mediator for Rust: typed requests, notifications, streams,
//! and ordered middleware.
//!
//! ## Overview
//!
//! Courier decouples callers from handlers. A caller constructs a plain
//! message value and hands it to the mediator; the mediator routes requests
//! to exactly one handler, fans notifications out to every interested
//! processor, and threads both through an ordered middleware pipeline.
//!
//! ## Architecture
//!
//! Every message flows through the central mediator:
//!
//! ```text
//! ┌──────────┐     ┌──────────────────────────────┐     ┌──────────────┐
//! │  Caller  │────▶│ Mediator                     │────▶│ Handler      │
//! │          │     │ (middleware ▸ routing ▸ fan) │────▶│ Subscriber   │
//! └──────────┘     └──────────────────────────────┘────▶│ Subscriber   │
//!                                                       └──────────────┘
//! ```
//!
//! - **Requests**: one value in, one handler, one reply (`send`)
//! - **Streams**: one value in, a lazy sequence of replies (`stream`)
//! - **Notifications**: one value in, every handler and subscriber (`publish`)
//! - **Middleware**: ordered, scoped components wrapping every dispatch
//! - **Inspector**: read-only statistics over the registered surface
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! struct GetGreeting { name: String }
//!
//! impl Request for GetGreeting {
//!     type Response = String;
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mediator = Mediator::builder()
//!         .handler::<GetGreeting, _>(|request: GetGreeting, _cancel: CancellationToken| {
//!             async move { Ok(format!("hello, {}", request.name)) }
//!         })
//!         .build();
//!
//!     let greeting = mediator.send(GetGreeting { name: "courier".into() }).await?;
//!     println!("{greeting}");
//!     Ok(())
//! }
//! ```

pub use courier_core as core;

pub use courier_core::{
    AnySubscriber, BoxError, BoxedNotification, BoxedReply, BoxedRequest, Cardinality,
    DeliveryPattern, DispatchError, DispatchResult, Gated, Inspector, MarkerSet, Mediator,
    MediatorBuilder, MediatorStats, Middleware, MiddlewareConfig, MiddlewareReport, Next,
    Notification, NotificationAnalysis, NotificationHandler, NotificationMiddleware, Order,
    ProcessorFailure, ProcessorFailures, ProcessorKind, PublishError, PublishNext, PublishResult,
    Request, RequestAnalysis, RequestHandler, RequestMiddleware, RequestNext, RequestStream, Role,
    Scope, Scoped, ServiceProvider, ServiceRegistry, StreamHandler, StreamRequest, Subscriber,
    SubscriptionId, TraceMiddleware, TypeDescriptor,
};

/// Prelude module for convenient imports.
///
/// This module provides all commonly used types for building on the mediator:
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    // Mediator - main entry point
    pub use courier_core::{Mediator, MediatorBuilder};

    // Message traits - the contracts handlers implement against
    pub use courier_core::{Notification, Request, StreamRequest};

    // Handler traits - for manual implementations beyond closures
    pub use courier_core::{
        NotificationHandler, RequestHandler, RequestStream, StreamHandler, Subscriber,
    };

    // Middleware - pipeline components and continuations
    pub use courier_core::{
        Middleware, Next, NotificationMiddleware, Order, PublishNext, RequestMiddleware,
        RequestNext, Scope,
    };

    // Errors - what send and publish return
    pub use courier_core::{
        BoxError, DispatchError, DispatchResult, PublishError, PublishResult,
    };

    // Inspection - read-only surface reports
    pub use courier_core::{Inspector, MediatorStats};
}
