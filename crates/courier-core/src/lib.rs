//! # Courier Core
//!
//! The core engine of the Courier mediator.
//!
//! This crate provides in-process message dispatch: typed requests routed to
//! exactly one handler, notifications fanned out to every interested
//! processor, streaming requests, and an ordered middleware pipeline around
//! all of it.
//!
//! ## Architecture Layers
//!
//! Courier Core is organized into three architectural layers:
//!
//! ### Contract Layer
//!
//! The shared vocabulary:
//! - **Message Traits**: Requests, stream requests, notifications
//!   ([`Request`], [`StreamRequest`], [`Notification`])
//! - **Type Metadata**: Role classification and markers ([`TypeDescriptor`],
//!   [`Role`], [`MarkerSet`])
//! - **Envelopes**: Type-erased pipeline currency ([`BoxedRequest`],
//!   [`BoxedNotification`])
//! - **Errors**: The dispatch and fan-out taxonomy ([`DispatchError`],
//!   [`PublishError`])
//!
//! ### Dispatch Layer
//!
//! The moving parts:
//! - **Mediator Surface**: Send, stream, publish, subscribe ([`Mediator`],
//!   [`MediatorBuilder`])
//! - **Middleware**: Ordered, scoped, gateable pipeline components
//!   ([`Middleware`], [`Scoped`], [`Gated`])
//! - **Fan-out**: Best-effort notification delivery with aggregated failures
//!
//! ### Inspection Layer
//!
//! The read-only side channel:
//! - **Analysis Records**: Per-contract cardinality and delivery patterns
//!   ([`RequestAnalysis`], [`NotificationAnalysis`])
//! - **Middleware Reports**: Execution order as dispatch would run it
//!   ([`MiddlewareReport`])
//! - **Statistics**: One-line surface summary ([`MediatorStats`])
//!
//! ## Hub-and-Spoke Dispatch
//!
//! Every message flows through the central [`Mediator`]:
//!
//! ```text
//! ┌──────────┐     ┌──────────────────────┐     ┌─────────────┐
//! │  Caller  │────▶│       Mediator       │────▶│   Handler   │
//! │          │     │ (pipeline + routing) │────▶│ Subscriber  │
//! └──────────┘     └──────────────────────┘────▶│ Subscriber  │
//!                                               └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use courier_core::{Mediator, Request, Notification};
//! use tokio_util::sync::CancellationToken;
//!
//! struct GetUser { id: u32 }
//!
//! impl Request for GetUser {
//!     type Response = String;
//! }
//!
//! struct UserSeen { id: u32 }
//!
//! impl Notification for UserSeen {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mediator = Mediator::builder()
//!         .handler::<GetUser, _>(|request: GetUser, _cancel: CancellationToken| async move {
//!             Ok(format!("user-{}", request.id))
//!         })
//!         .notification_handler::<UserSeen, _>(
//!             |seen: std::sync::Arc<UserSeen>, _cancel: CancellationToken| async move {
//!                 println!("seen: {}", seen.id);
//!                 Ok(())
//!             },
//!         )
//!         .build();
//!
//!     let name = mediator.send(GetUser { id: 7 }).await?;
//!     mediator.publish(UserSeen { id: 7 }).await?;
//!     println!("{name}");
//!     Ok(())
//! }
//! ```

// Architectural layers
pub mod contract;
pub mod dispatch;
pub mod inspect;
pub mod provider;

// Re-export contract types
pub use contract::{
    AnySubscriber, BoxError, BoxedNotification, BoxedReply, BoxedRequest, Classification,
    DispatchError, DispatchResult, MarkerSet, Notification, NotificationHandler, Order,
    ProcessorFailure, ProcessorFailures, ProcessorKind, PublishError, PublishResult, Request,
    RequestHandler, RequestStream, Role, Scope, StreamHandler, StreamRequest, Subscriber,
    TypeDescriptor, TypeKey,
};

// Re-export dispatch types
pub use dispatch::{
    Gated, Mediator, MediatorBuilder, Middleware, Next, NotificationMiddleware, PublishNext,
    RequestMiddleware, RequestNext, Scoped, SubscriberCensus, SubscriptionId, TraceMiddleware,
};

// Re-export inspection types
pub use inspect::{
    AnalysisDetail, Cardinality, DeliveryPattern, Inspector, MediatorStats, MiddlewareConfig,
    MiddlewareReport, NotificationAnalysis, RequestAnalysis,
};

// Re-export provider types
pub use provider::{
    ServiceArc, ServiceProvider, ServiceRegistry, TypeRecord, unwrap_service, wrap_service,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::contract::{
        BoxError, DispatchError, DispatchResult, Notification, NotificationHandler, Order,
        PublishError, PublishResult, Request, RequestHandler, RequestStream, Scope, StreamHandler,
        StreamRequest, Subscriber,
    };
    pub use super::dispatch::{
        Mediator, MediatorBuilder, Middleware, Next, NotificationMiddleware, PublishNext,
        RequestMiddleware, RequestNext,
    };
    pub use super::inspect::{Inspector, MediatorStats};
}
