//! Middleware contracts for both pipelines.
//!
//! Middleware wraps dispatch as nested continuations: each component
//! receives the erased message and a [`Next`] (or [`PublishNext`]) that
//! runs the remainder of the chain. Components declare their own placement
//! through [`order`](Middleware::order) and their applicability through
//! [`scope`](Middleware::scope); both are captured once at registration.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_core::contract::{BoxedReply, BoxedRequest, BoxError, Order};
//! use courier_core::dispatch::{Middleware, Next};
//!
//! struct Timing;
//!
//! #[async_trait]
//! impl Middleware for Timing {
//!     fn order(&self) -> Option<Order> {
//!         Some(Order::new(-100))
//!     }
//!
//!     async fn handle(
//!         &self,
//!         request: BoxedRequest,
//!         next: Next,
//!         cancel: CancellationToken,
//!     ) -> Result<BoxedReply, BoxError> {
//!         let started = std::time::Instant::now();
//!         let reply = next.run(request, cancel).await;
//!         tracing::debug!(elapsed = ?started.elapsed(), "request finished");
//!         reply
//!     }
//! }
//! ```

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::contract::descriptor::TypeDescriptor;
use crate::contract::envelope::{BoxedNotification, BoxedReply, BoxedRequest};
use crate::contract::error::{BoxError, DispatchError};
use crate::contract::message::Request;
use crate::contract::order::Order;
use crate::contract::scope::Scope;

// ============================================================================
// Continuations
// ============================================================================

pub(crate) type Link =
    Arc<dyn Fn(BoxedRequest, CancellationToken) -> BoxFuture<'static, Result<BoxedReply, BoxError>> + Send + Sync>;

pub(crate) type PublishLink =
    Arc<dyn Fn(BoxedNotification, CancellationToken) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// The remainder of a request pipeline.
///
/// Consumed by [`run`](Next::run); a middleware that drops it without
/// running it short-circuits the dispatch and must produce the reply
/// itself.
pub struct Next {
    link: Link,
}

impl Next {
    pub(crate) fn new(link: Link) -> Self {
        Self { link }
    }

    /// Runs the rest of the chain, handler included.
    pub async fn run(
        self,
        request: BoxedRequest,
        cancel: CancellationToken,
    ) -> Result<BoxedReply, BoxError> {
        (self.link)(request, cancel).await
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Next")
    }
}

/// The remainder of a notification pipeline.
pub struct PublishNext {
    link: PublishLink,
}

impl PublishNext {
    pub(crate) fn new(link: PublishLink) -> Self {
        Self { link }
    }

    /// Runs the rest of the chain, fan-out included.
    pub async fn run(
        self,
        notification: BoxedNotification,
        cancel: CancellationToken,
    ) -> Result<(), BoxError> {
        (self.link)(notification, cancel).await
    }
}

impl std::fmt::Debug for PublishNext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PublishNext")
    }
}

// ============================================================================
// Middleware Traits
// ============================================================================

/// A component on the request pipeline.
///
/// Runs for queries, commands, and stream establishment alike, before the
/// handler terminal. Components see the erased envelope; use
/// [`Scoped`] to write middleware against one concrete request type.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Declared placement, or `None` to take the pipeline's fallback order.
    fn order(&self) -> Option<Order> {
        None
    }

    /// Which messages this component runs for.
    fn scope(&self) -> Scope {
        Scope::All
    }

    /// Wraps the rest of the chain.
    async fn handle(
        &self,
        request: BoxedRequest,
        next: Next,
        cancel: CancellationToken,
    ) -> Result<BoxedReply, BoxError>;
}

/// A component on the notification pipeline.
///
/// Wraps the whole fan-out, not individual processors.
#[async_trait]
pub trait NotificationMiddleware: Send + Sync {
    /// Declared placement, or `None` to take the pipeline's fallback order.
    fn order(&self) -> Option<Order> {
        None
    }

    /// Which notifications this component runs for.
    fn scope(&self) -> Scope {
        Scope::All
    }

    /// Wraps the rest of the chain.
    async fn handle(
        &self,
        notification: BoxedNotification,
        next: PublishNext,
        cancel: CancellationToken,
    ) -> Result<(), BoxError>;
}

// ============================================================================
// Typed Request Middleware
// ============================================================================

/// Middleware written against one concrete request type.
///
/// Registered through
/// [`MediatorBuilder::request_middleware`](crate::dispatch::MediatorBuilder::request_middleware),
/// which wraps it in [`Scoped`] so the erased pipeline only routes matching
/// envelopes to it.
#[async_trait]
pub trait RequestMiddleware<R: Request>: Send + Sync {
    /// Declared placement, or `None` to take the pipeline's fallback order.
    fn order(&self) -> Option<Order> {
        None
    }

    /// Wraps the rest of the chain with typed access to the request.
    async fn handle(
        &self,
        request: R,
        next: RequestNext<R>,
        cancel: CancellationToken,
    ) -> Result<R::Response, BoxError>;
}

/// The remainder of the chain as seen by typed middleware.
pub struct RequestNext<R: Request> {
    inner: Next,
    descriptor: Arc<TypeDescriptor>,
    _marker: PhantomData<fn(R) -> R::Response>,
}

impl<R: Request> RequestNext<R> {
    /// Runs the rest of the chain and recovers the typed response.
    pub async fn run(self, request: R, cancel: CancellationToken) -> Result<R::Response, BoxError> {
        let envelope = BoxedRequest::erased(request, self.descriptor);
        let reply = self.inner.run(envelope, cancel).await?;
        reply.downcast::<R::Response>().map_err(|reply| {
            BoxError::from(DispatchError::ReplyMismatch {
                expected: type_name::<R::Response>(),
                found: reply.type_name(),
            })
        })
    }
}

/// Adapter that mounts a [`RequestMiddleware`] on the erased pipeline.
///
/// Scope is pinned to `R`; order is delegated to the wrapped component.
/// Envelopes of any other type pass straight through untouched.
pub struct Scoped<R, M> {
    inner: M,
    _marker: PhantomData<fn(R)>,
}

impl<R, M> Scoped<R, M>
where
    R: Request,
    M: RequestMiddleware<R>,
{
    /// Wraps a typed middleware for registration.
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<R, M> Middleware for Scoped<R, M>
where
    R: Request,
    M: RequestMiddleware<R> + 'static,
{
    fn order(&self) -> Option<Order> {
        self.inner.order()
    }

    fn scope(&self) -> Scope {
        Scope::exact::<R>()
    }

    async fn handle(
        &self,
        request: BoxedRequest,
        next: Next,
        cancel: CancellationToken,
    ) -> Result<BoxedReply, BoxError> {
        let descriptor = Arc::clone(request.descriptor());
        match request.downcast::<R>() {
            Ok(typed) => {
                let next = RequestNext {
                    inner: next,
                    descriptor,
                    _marker: PhantomData,
                };
                let response = self.inner.handle(typed, next, cancel).await?;
                Ok(BoxedReply::new(response))
            }
            Err(request) => next.run(request, cancel).await,
        }
    }
}

// ============================================================================
// Conditional Gate
// ============================================================================

/// Wraps a middleware behind a predicate.
///
/// When the predicate rejects the request, the wrapped component is skipped
/// and the chain continues as if it were absent. Order and scope are
/// delegated to the wrapped component, so gating never changes placement.
pub struct Gated<M> {
    inner: M,
    predicate: Arc<dyn Fn(&BoxedRequest) -> bool + Send + Sync>,
}

impl<M> Gated<M> {
    /// Gates on the erased envelope.
    pub fn new(inner: M, predicate: impl Fn(&BoxedRequest) -> bool + Send + Sync + 'static) -> Self {
        Self {
            inner,
            predicate: Arc::new(predicate),
        }
    }

    /// Gates on one concrete request type.
    ///
    /// Envelopes of any other type are rejected by the gate, so the wrapped
    /// component only ever sees `R` values the predicate admitted.
    pub fn for_request<R: Request>(
        inner: M,
        predicate: impl Fn(&R) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::new(inner, move |request| {
            request.downcast_ref::<R>().map(|typed| predicate(typed)).unwrap_or(false)
        })
    }
}

#[async_trait]
impl<M: Middleware> Middleware for Gated<M> {
    fn order(&self) -> Option<Order> {
        self.inner.order()
    }

    fn scope(&self) -> Scope {
        self.inner.scope()
    }

    async fn handle(
        &self,
        request: BoxedRequest,
        next: Next,
        cancel: CancellationToken,
    ) -> Result<BoxedReply, BoxError> {
        if (self.predicate)(&request) {
            self.inner.handle(request, next, cancel).await
        } else {
            next.run(request, cancel).await
        }
    }
}
