//! Handler and subscriber traits.
//!
//! This module defines the processing seams of the mediator:
//!
//! - [`RequestHandler`] - the single handler for a [`Request`]
//! - [`StreamHandler`] - the single handler for a [`StreamRequest`]
//! - [`NotificationHandler`] - a registered processor for a [`Notification`]
//! - [`Subscriber`] / [`AnySubscriber`] - processors attached at runtime
//!
//! Every trait is also implemented for plain async closures of the matching
//! shape, so simple handlers need no struct:
//!
//! ```rust,ignore
//! let mediator = MediatorBuilder::new()
//!     .handler::<GetUser, _>(|request: GetUser, _cancel| async move {
//!         Ok(User::lookup(request.id))
//!     })
//!     .build();
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use super::envelope::BoxedNotification;
use super::error::BoxError;
use super::message::{Notification, Request, StreamRequest};

/// The stream produced by a [`StreamHandler`]: items arrive lazily and each
/// one can fail on its own.
pub type RequestStream<T> = BoxStream<'static, Result<T, BoxError>>;

// ============================================================================
// Request Handling
// ============================================================================

/// Processes a [`Request`] and produces its reply.
///
/// Exactly one handler may be registered per request type; the mediator
/// refuses to dispatch when none or several are present.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    /// Handles the request.
    ///
    /// The token is a cooperation signal: long-running handlers should
    /// check it or race against `cancelled()`.
    async fn handle(&self, request: R, cancel: CancellationToken) -> Result<R::Response, BoxError>;
}

#[async_trait]
impl<R, F, Fut> RequestHandler<R> for F
where
    R: Request,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R::Response, BoxError>> + Send + 'static,
{
    async fn handle(&self, request: R, cancel: CancellationToken) -> Result<R::Response, BoxError> {
        self(request, cancel).await
    }
}

/// Processes a [`StreamRequest`] by establishing its item stream.
///
/// Establishment runs through the request pipeline; the returned stream is
/// consumed by the caller afterwards, outside the pipeline.
#[async_trait]
pub trait StreamHandler<R: StreamRequest>: Send + Sync {
    /// Establishes the stream for the request.
    async fn handle(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> Result<RequestStream<R::Item>, BoxError>;
}

#[async_trait]
impl<R, F, Fut> StreamHandler<R> for F
where
    R: StreamRequest,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RequestStream<R::Item>, BoxError>> + Send + 'static,
{
    async fn handle(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> Result<RequestStream<R::Item>, BoxError> {
        self(request, cancel).await
    }
}

// ============================================================================
// Notification Processing
// ============================================================================

/// A registered processor for a [`Notification`].
///
/// Any number of handlers may be registered per notification type; all of
/// them receive every published value, sharing it through `Arc`.
#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync {
    /// Processes the notification.
    async fn handle(&self, notification: Arc<N>, cancel: CancellationToken) -> Result<(), BoxError>;
}

#[async_trait]
impl<N, F, Fut> NotificationHandler<N> for F
where
    N: Notification,
    F: Fn(Arc<N>, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn handle(&self, notification: Arc<N>, cancel: CancellationToken) -> Result<(), BoxError> {
        self(notification, cancel).await
    }
}

/// A runtime-attached processor for a single notification type.
///
/// Subscribers run after registered handlers, in subscription order, and
/// are removed with the [`SubscriptionId`](crate::dispatch::SubscriptionId)
/// returned at attach time.
#[async_trait]
pub trait Subscriber<N: Notification>: Send + Sync {
    /// Receives one published notification.
    async fn receive(&self, notification: Arc<N>, cancel: CancellationToken)
    -> Result<(), BoxError>;
}

#[async_trait]
impl<N, F, Fut> Subscriber<N> for F
where
    N: Notification,
    F: Fn(Arc<N>, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn receive(
        &self,
        notification: Arc<N>,
        cancel: CancellationToken,
    ) -> Result<(), BoxError> {
        self(notification, cancel).await
    }
}

/// A runtime-attached processor that observes every notification type.
///
/// Receives the erased envelope; use
/// [`BoxedNotification::downcast`] to pick out the types of interest.
#[async_trait]
pub trait AnySubscriber: Send + Sync {
    /// Receives one published notification of any type.
    async fn receive(
        &self,
        notification: BoxedNotification,
        cancel: CancellationToken,
    ) -> Result<(), BoxError>;
}

#[async_trait]
impl<F, Fut> AnySubscriber for F
where
    F: Fn(BoxedNotification, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn receive(
        &self,
        notification: BoxedNotification,
        cancel: CancellationToken,
    ) -> Result<(), BoxError> {
        self(notification, cancel).await
    }
}
