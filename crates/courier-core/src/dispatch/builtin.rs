//! Built-in middleware components.

use std::time::Instant;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::contract::envelope::{BoxedNotification, BoxedReply, BoxedRequest};
use crate::contract::error::BoxError;
use crate::contract::order::Order;

use super::middleware::{Middleware, Next, NotificationMiddleware, PublishNext};

/// Logs every message crossing a pipeline, with outcome and timing.
///
/// Implements both middleware traits, so one instance can be registered on
/// the request pipeline, the notification pipeline, or both. Declares
/// [`Order::FIRST`] to observe the whole chain from the outside.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceMiddleware;

impl TraceMiddleware {
    /// Creates the middleware.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for TraceMiddleware {
    fn order(&self) -> Option<Order> {
        Some(Order::FIRST)
    }

    async fn handle(
        &self,
        request: BoxedRequest,
        next: Next,
        cancel: CancellationToken,
    ) -> Result<BoxedReply, BoxError> {
        let message = request.descriptor().short_name();
        let role = request.descriptor().role();
        let started = Instant::now();
        debug!(message = %message, role = %role, "dispatch started");

        let outcome = next.run(request, cancel).await;
        match &outcome {
            Ok(_) => debug!(
                message = %message,
                elapsed = ?started.elapsed(),
                "dispatch completed"
            ),
            Err(error) => warn!(
                message = %message,
                elapsed = ?started.elapsed(),
                error = %error,
                "dispatch failed"
            ),
        }
        outcome
    }
}

#[async_trait]
impl NotificationMiddleware for TraceMiddleware {
    fn order(&self) -> Option<Order> {
        Some(Order::FIRST)
    }

    async fn handle(
        &self,
        notification: BoxedNotification,
        next: PublishNext,
        cancel: CancellationToken,
    ) -> Result<(), BoxError> {
        let message = notification.descriptor().short_name();
        let started = Instant::now();
        debug!(message = %message, "fan-out started");

        let outcome = next.run(notification, cancel).await;
        match &outcome {
            Ok(()) => debug!(
                message = %message,
                elapsed = ?started.elapsed(),
                "fan-out completed"
            ),
            Err(error) => warn!(
                message = %message,
                elapsed = ?started.elapsed(),
                error = %error,
                "fan-out failed"
            ),
        }
        outcome
    }
}
