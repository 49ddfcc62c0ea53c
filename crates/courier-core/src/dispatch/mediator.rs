//! The mediator surface.
//!
//! [`Mediator`] is a cheap-to-clone handle over the frozen registration
//! surface plus the live subscriber set. One instance serves every caller
//! concurrently; sends build their pipeline chain per call from shared
//! parts and keep no dispatch state on the mediator itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_core::dispatch::MediatorBuilder;
//!
//! let mediator = MediatorBuilder::new()
//!     .handler::<GetUser, _>(GetUserHandler::new(store))
//!     .notification_handler::<UserSeen, _>(AuditTrail::default())
//!     .build();
//!
//! let user = mediator.send(GetUser { id: 7 }).await?;
//! mediator.publish(UserSeen { id: 7 }).await?;
//! ```

use std::any::{TypeId, type_name};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, span};

use crate::contract::envelope::{BoxedNotification, BoxedRequest};
use crate::contract::error::{BoxError, DispatchError, DispatchResult, PublishResult};
use crate::contract::handler::{AnySubscriber, NotificationHandler, RequestStream, Subscriber};
use crate::contract::message::{Notification, Request, StreamRequest};
use crate::inspect::{Inspector, MediatorStats};
use crate::provider::registry::ServiceRegistry;

use super::builder::MediatorBuilder;
use super::pipeline::{self, PipelineSet};
use super::publish;
use super::resolve;
use super::subscribers::{SubscriberSet, SubscriptionId};

pub(crate) struct MediatorInner {
    pub(crate) registry: ServiceRegistry,
    pub(crate) pipelines: PipelineSet,
    pub(crate) subscribers: SubscriberSet,
}

/// The dispatch façade: requests in, replies out, notifications around.
#[derive(Clone)]
pub struct Mediator {
    inner: Arc<MediatorInner>,
}

impl Mediator {
    /// Starts a builder.
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    pub(crate) fn from_parts(registry: ServiceRegistry, pipelines: PipelineSet) -> Self {
        Self {
            inner: Arc::new(MediatorInner {
                registry,
                pipelines,
                subscribers: SubscriberSet::new(),
            }),
        }
    }

    /// Dispatches a request to its single handler.
    pub async fn send<R: Request>(&self, request: R) -> DispatchResult<R::Response> {
        self.send_with(request, CancellationToken::new()).await
    }

    /// Dispatches a request with a caller-supplied cancellation token.
    ///
    /// Cardinality is enforced before the pipeline runs: zero handlers is
    /// [`DispatchError::HandlerNotFound`], several is
    /// [`DispatchError::AmbiguousHandler`].
    pub async fn send_with<R: Request>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> DispatchResult<R::Response> {
        let descriptor = self.inner.registry.request_descriptor::<R>();
        let span = span!(Level::DEBUG, "send", request = %descriptor.short_name());
        let _enter = span.enter();

        let handler = resolve::resolve_request::<R>(&self.inner.registry)?;
        let plan = pipeline::plan(
            &self.inner.pipelines.request,
            &descriptor,
            self.inner.pipelines.fallback,
        );
        debug!(middleware = plan.len(), "dispatching request");

        let chain = pipeline::assemble(&plan, pipeline::request_terminal::<R>(handler));
        let envelope = BoxedRequest::erased(request, Arc::clone(&descriptor));
        let reply = chain(envelope, cancel).await.map_err(into_dispatch_error)?;
        reply
            .downcast::<R::Response>()
            .map_err(|reply| DispatchError::ReplyMismatch {
                expected: type_name::<R::Response>(),
                found: reply.type_name(),
            })
    }

    /// Dispatches a stream request and returns the established stream.
    pub async fn stream<R: StreamRequest>(
        &self,
        request: R,
    ) -> DispatchResult<RequestStream<R::Item>> {
        self.stream_with(request, CancellationToken::new()).await
    }

    /// Dispatches a stream request with a caller-supplied token.
    ///
    /// The request pipeline wraps establishment only; the returned stream
    /// is consumed outside it. The token is handed to the handler, which
    /// usually threads it into the stream it builds.
    pub async fn stream_with<R: StreamRequest>(
        &self,
        request: R,
        cancel: CancellationToken,
    ) -> DispatchResult<RequestStream<R::Item>> {
        let descriptor = self.inner.registry.stream_descriptor::<R>();
        let span = span!(Level::DEBUG, "stream", request = %descriptor.short_name());
        let _enter = span.enter();

        let handler = resolve::resolve_stream::<R>(&self.inner.registry)?;
        let plan = pipeline::plan(
            &self.inner.pipelines.request,
            &descriptor,
            self.inner.pipelines.fallback,
        );
        debug!(middleware = plan.len(), "establishing stream");

        let chain = pipeline::assemble(&plan, pipeline::stream_terminal::<R>(handler));
        let envelope = BoxedRequest::erased(request, Arc::clone(&descriptor));
        let reply = chain(envelope, cancel).await.map_err(into_dispatch_error)?;
        reply
            .downcast::<RequestStream<R::Item>>()
            .map_err(|reply| DispatchError::ReplyMismatch {
                expected: type_name::<RequestStream<R::Item>>(),
                found: reply.type_name(),
            })
    }

    /// Publishes a notification to every handler and matching subscriber.
    pub async fn publish<N: Notification>(&self, notification: N) -> PublishResult {
        self.publish_with(notification, CancellationToken::new()).await
    }

    /// Publishes with a caller-supplied cancellation token.
    ///
    /// Handlers run first in registration order, then subscribers in
    /// subscription order. Every processor is attempted; failures are
    /// aggregated into [`PublishError::Processors`]. No processors at all
    /// is a quiet success.
    pub async fn publish_with<N: Notification>(
        &self,
        notification: N,
        cancel: CancellationToken,
    ) -> PublishResult {
        let descriptor = self.inner.registry.notification_descriptor::<N>();
        let span = span!(Level::DEBUG, "publish", notification = %descriptor.short_name());
        let _enter = span.enter();

        let handlers = resolve::resolve_notification::<N>(&self.inner.registry);
        let names = self
            .inner
            .registry
            .record_for(TypeId::of::<dyn NotificationHandler<N>>())
            .map(|record| record.handler_names().to_vec())
            .unwrap_or_default();
        let mut processors = publish::handler_processors::<N>(handlers, &names);

        let entries = self.inner.subscribers.matching(TypeId::of::<N>());
        processors.extend(publish::subscriber_processors(entries));

        let plan = pipeline::plan(
            &self.inner.pipelines.notification,
            &descriptor,
            self.inner.pipelines.fallback,
        );
        debug!(
            processors = processors.len(),
            middleware = plan.len(),
            "fanning out notification"
        );

        let chain = pipeline::assemble_publish(&plan, publish::fanout_terminal(processors));
        let envelope = BoxedNotification::erased(notification, Arc::clone(&descriptor));
        chain(envelope, cancel)
            .await
            .map_err(publish::into_publish_error)
    }

    /// Attaches a subscriber for one notification type.
    pub fn subscribe<N, S>(&self, subscriber: S) -> SubscriptionId
    where
        N: Notification,
        S: Subscriber<N> + 'static,
    {
        self.inner.subscribers.subscribe::<N, S>(subscriber)
    }

    /// Attaches a subscriber observing every notification type.
    pub fn subscribe_any<S>(&self, subscriber: S) -> SubscriptionId
    where
        S: AnySubscriber + 'static,
    {
        self.inner.subscribers.subscribe_any(subscriber)
    }

    /// Detaches a subscription; `false` when the id is unknown.
    ///
    /// A publish already in flight keeps its snapshot and may still
    /// deliver to the detached subscriber once.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.unsubscribe(id)
    }

    /// Number of live subscriptions of any kind.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Read-only view over the registration surface.
    ///
    /// The inspector snapshots subscriber counts at this call; registered
    /// contracts and middleware are frozen anyway.
    pub fn inspector(&self) -> Inspector<'_> {
        Inspector::new(
            &self.inner.registry,
            &self.inner.pipelines,
            self.inner.subscribers.census(),
        )
    }

    /// Aggregate counts over the whole surface.
    pub fn stats(&self) -> MediatorStats {
        self.inspector().stats()
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("contracts", &self.inner.registry.records().len())
            .field("subscribers", &self.inner.subscribers.len())
            .finish()
    }
}

fn into_dispatch_error(error: BoxError) -> DispatchError {
    match error.downcast::<DispatchError>() {
        Ok(inner) => *inner,
        Err(error) => DispatchError::Failed(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use futures::StreamExt;
    use parking_lot::Mutex;

    use crate::contract::envelope::BoxedReply;
    use crate::contract::error::{ProcessorKind, PublishError};
    use crate::contract::message::MarkerSet;
    use crate::contract::order::Order;
    use crate::contract::scope::Scope;
    use crate::dispatch::middleware::{Middleware, Next, NotificationMiddleware, PublishNext};

    struct Add(u32, u32);
    impl Request for Add {
        type Response = u32;
    }

    struct Record(&'static str);
    impl Request for Record {
        type Response = ();
    }

    struct Orphan;
    impl Request for Orphan {
        type Response = ();
    }

    struct Saved(&'static str);
    impl Notification for Saved {}

    struct Countdown(u32);
    impl StreamRequest for Countdown {
        type Item = u32;
    }

    struct Audited;

    struct Sensitive(u32);
    impl Request for Sensitive {
        type Response = u32;

        fn markers() -> MarkerSet {
            MarkerSet::new().with::<Audited>()
        }
    }

    struct Step {
        tag: &'static str,
        order: Option<Order>,
        scope: Scope,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Middleware for Step {
        fn order(&self) -> Option<Order> {
            self.order
        }

        fn scope(&self) -> Scope {
            self.scope.clone()
        }

        async fn handle(
            &self,
            request: BoxedRequest,
            next: Next,
            cancel: CancellationToken,
        ) -> Result<BoxedReply, BoxError> {
            self.log.lock().push(self.tag);
            next.run(request, cancel).await
        }
    }

    async fn add(request: Add, _cancel: CancellationToken) -> Result<u32, BoxError> {
        Ok(request.0 + request.1)
    }

    #[tokio::test]
    async fn send_routes_to_the_single_handler() {
        let mediator = Mediator::builder().handler::<Add, _>(add).build();
        assert_eq!(mediator.send(Add(2, 3)).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn commands_reply_with_unit() {
        let seen = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&seen);
        let mediator = Mediator::builder()
            .handler::<Record, _>(move |_request: Record, _cancel: CancellationToken| {
                let probe = Arc::clone(&probe);
                async move {
                    probe.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .build();

        mediator.send(Record("write")).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_and_surplus_handlers_fail_before_the_pipeline() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mediator = Mediator::builder()
            .middleware(Step {
                tag: "outer",
                order: None,
                scope: Scope::All,
                log: Arc::clone(&log),
            })
            .handler::<Add, _>(add)
            .handler::<Add, _>(add)
            .build();

        let err = mediator.send(Orphan).await.unwrap_err();
        assert!(matches!(err, DispatchError::HandlerNotFound { .. }));

        let err = mediator.send(Add(1, 1)).await.unwrap_err();
        assert!(matches!(err, DispatchError::AmbiguousHandler { count: 2, .. }));

        // neither dispatch reached the pipeline
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn middleware_runs_in_declared_order_around_the_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler_log = Arc::clone(&log);
        let mediator = Mediator::builder()
            .middleware(Step {
                tag: "second",
                order: Some(Order::new(10)),
                scope: Scope::All,
                log: Arc::clone(&log),
            })
            .middleware(Step {
                tag: "first",
                order: Some(Order::new(-10)),
                scope: Scope::All,
                log: Arc::clone(&log),
            })
            .handler::<Record, _>(move |_request: Record, _cancel: CancellationToken| {
                let log = Arc::clone(&handler_log);
                async move {
                    log.lock().push("handler");
                    Ok(())
                }
            })
            .build();

        mediator.send(Record("go")).await.unwrap();
        assert_eq!(*log.lock(), vec!["first", "second", "handler"]);
    }

    #[tokio::test]
    async fn marker_scoped_middleware_skips_unmarked_requests() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mediator = Mediator::builder()
            .middleware(Step {
                tag: "audit",
                order: None,
                scope: Scope::marked::<Audited>(),
                log: Arc::clone(&log),
            })
            .handler::<Add, _>(add)
            .handler::<Sensitive, _>(|request: Sensitive, _cancel: CancellationToken| async move {
                Ok(request.0)
            })
            .build();

        mediator.send(Add(1, 2)).await.unwrap();
        assert!(log.lock().is_empty());

        mediator.send(Sensitive(9)).await.unwrap();
        assert_eq!(*log.lock(), vec!["audit"]);
    }

    #[tokio::test]
    async fn handler_errors_surface_as_failed() {
        let mediator = Mediator::builder()
            .handler::<Add, _>(|_request: Add, _cancel: CancellationToken| async {
                Err::<u32, _>(BoxError::from("backend down"))
            })
            .build();

        let err = mediator.send(Add(0, 0)).await.unwrap_err();
        match err {
            DispatchError::Failed(inner) => assert_eq!(inner.to_string(), "backend down"),
            other => panic!("expected Failed, got {other}"),
        }
    }

    #[tokio::test]
    async fn cancelled_tokens_reach_the_handler() {
        let mediator = Mediator::builder()
            .handler::<Add, _>(|request: Add, cancel: CancellationToken| async move {
                if cancel.is_cancelled() {
                    Err(BoxError::from("cancelled before work"))
                } else {
                    Ok(request.0 + request.1)
                }
            })
            .build();

        let token = CancellationToken::new();
        token.cancel();
        let err = mediator.send_with(Add(1, 1), token).await.unwrap_err();
        assert!(matches!(err, DispatchError::Failed(_)));

        assert_eq!(mediator.send(Add(1, 1)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn generic_requests_resolve_by_their_closed_type() {
        struct Tagged<T>(T);
        impl Request for Tagged<u32> {
            type Response = u32;
        }
        impl Request for Tagged<&'static str> {
            type Response = String;
        }

        let mediator = Mediator::builder()
            .handler::<Tagged<u32>, _>(
                |request: Tagged<u32>, _cancel: CancellationToken| async move {
                    Ok(request.0 * 2)
                },
            )
            .handler::<Tagged<&'static str>, _>(
                |request: Tagged<&'static str>, _cancel: CancellationToken| async move {
                    Ok(request.0.to_uppercase())
                },
            )
            .build();

        assert_eq!(mediator.send(Tagged(21u32)).await.unwrap(), 42);
        assert_eq!(mediator.send(Tagged("pong")).await.unwrap(), "PONG");
    }

    #[tokio::test]
    async fn validation_middleware_rejects_before_the_handler() {
        #[derive(Debug, thiserror::Error)]
        #[error("addends must stay under 100")]
        struct OutOfRange;

        struct CheckAddends;

        #[async_trait]
        impl Middleware for CheckAddends {
            async fn handle(
                &self,
                request: BoxedRequest,
                next: Next,
                cancel: CancellationToken,
            ) -> Result<BoxedReply, BoxError> {
                let valid = request
                    .downcast_ref::<Add>()
                    .is_none_or(|add| add.0 < 100 && add.1 < 100);
                if valid {
                    next.run(request, cancel).await
                } else {
                    Err(BoxError::from(OutOfRange))
                }
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&calls);
        let mediator = Mediator::builder()
            .middleware(CheckAddends)
            .handler::<Add, _>(move |request: Add, _cancel: CancellationToken| {
                let probe = Arc::clone(&probe);
                async move {
                    probe.fetch_add(1, Ordering::SeqCst);
                    Ok(request.0 + request.1)
                }
            })
            .build();

        assert_eq!(mediator.send(Add(2, 3)).await.unwrap(), 5);

        let err = mediator.send(Add(500, 1)).await.unwrap_err();
        match err {
            DispatchError::Failed(inner) => {
                assert!(inner.downcast_ref::<OutOfRange>().is_some());
            }
            other => panic!("expected Failed, got {other}"),
        }
        // The rejected dispatch never reached the handler.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn publish_runs_handlers_then_subscribers_in_order() {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&log);
        let second = Arc::clone(&log);
        let mediator = Mediator::builder()
            .notification_handler::<Saved, _>(move |_saved: Arc<Saved>, _cancel: CancellationToken| {
                let log = Arc::clone(&first);
                async move {
                    log.lock().push("handler-a");
                    Ok(())
                }
            })
            .notification_handler::<Saved, _>(move |_saved: Arc<Saved>, _cancel: CancellationToken| {
                let log = Arc::clone(&second);
                async move {
                    log.lock().push("handler-b");
                    Ok(())
                }
            })
            .build();

        let sub_log = Arc::clone(&log);
        mediator.subscribe::<Saved, _>(move |_saved: Arc<Saved>, _cancel: CancellationToken| {
            let log = Arc::clone(&sub_log);
            async move {
                log.lock().push("subscriber");
                Ok(())
            }
        });

        mediator.publish(Saved("doc")).await.unwrap();
        assert_eq!(*log.lock(), vec!["handler-a", "handler-b", "subscriber"]);
    }

    #[tokio::test]
    async fn publish_attempts_everyone_and_aggregates_failures() {
        let delivered = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&delivered);
        let mediator = Mediator::builder()
            .notification_handler::<Saved, _>(|_saved: Arc<Saved>, _cancel: CancellationToken| async {
                Err::<(), _>(BoxError::from("handler refused"))
            })
            .notification_handler::<Saved, _>(move |_saved: Arc<Saved>, _cancel: CancellationToken| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .build();

        mediator.subscribe::<Saved, _>(|_saved: Arc<Saved>, _cancel: CancellationToken| async {
            Err::<(), _>(BoxError::from("subscriber refused"))
        });

        let err = mediator.publish(Saved("doc")).await.unwrap_err();
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        match err {
            PublishError::Processors(failures) => {
                assert_eq!(failures.attempted, 3);
                assert_eq!(failures.failures.len(), 2);
                assert_eq!(failures.failures[0].kind, ProcessorKind::Handler);
                assert_eq!(failures.failures[1].kind, ProcessorKind::Subscriber);
            }
            other => panic!("expected aggregated failures, got {other}"),
        }
    }

    #[tokio::test]
    async fn publish_without_processors_is_quiet() {
        let mediator = Mediator::builder().build();
        mediator.publish(Saved("nobody cares")).await.unwrap();
    }

    #[tokio::test]
    async fn notification_middleware_wraps_the_whole_fanout() {
        struct Envelope {
            log: Arc<Mutex<Vec<&'static str>>>,
        }

        #[async_trait]
        impl NotificationMiddleware for Envelope {
            async fn handle(
                &self,
                notification: BoxedNotification,
                next: PublishNext,
                cancel: CancellationToken,
            ) -> Result<(), BoxError> {
                self.log.lock().push("before");
                next.run(notification, cancel).await?;
                self.log.lock().push("after");
                Ok(())
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let handler_log = Arc::clone(&log);
        let mediator = Mediator::builder()
            .notification_middleware(Envelope {
                log: Arc::clone(&log),
            })
            .notification_handler::<Saved, _>(move |_saved: Arc<Saved>, _cancel: CancellationToken| {
                let log = Arc::clone(&handler_log);
                async move {
                    log.lock().push("handler");
                    Ok(())
                }
            })
            .build();

        let subscriber_log = Arc::clone(&log);
        mediator.subscribe::<Saved, _>(move |_saved: Arc<Saved>, _cancel: CancellationToken| {
            let log = Arc::clone(&subscriber_log);
            async move {
                log.lock().push("subscriber");
                Ok(())
            }
        });

        mediator.publish(Saved("doc")).await.unwrap();
        assert_eq!(*log.lock(), vec!["before", "handler", "subscriber", "after"]);
    }

    #[tokio::test]
    async fn notification_middleware_failures_are_pipeline_errors() {
        struct Refuse;

        #[async_trait]
        impl NotificationMiddleware for Refuse {
            async fn handle(
                &self,
                _notification: BoxedNotification,
                _next: PublishNext,
                _cancel: CancellationToken,
            ) -> Result<(), BoxError> {
                Err(BoxError::from("sealed"))
            }
        }

        let called = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&called);
        let mediator = Mediator::builder()
            .notification_middleware(Refuse)
            .notification_handler::<Saved, _>(move |_saved: Arc<Saved>, _cancel: CancellationToken| {
                let probe = Arc::clone(&probe);
                async move {
                    probe.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .build();

        let err = mediator.publish(Saved("doc")).await.unwrap_err();
        assert!(matches!(err, PublishError::Pipeline(_)));
        // The refusal happened before the fan-out terminal.
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsubscribed_subscribers_stop_receiving() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mediator = Mediator::builder().build();

        let counter = Arc::clone(&seen);
        let id = mediator.subscribe::<Saved, _>(move |_saved: Arc<Saved>, _cancel: CancellationToken| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        mediator.publish(Saved("one")).await.unwrap();
        assert!(mediator.unsubscribe(id));
        mediator.publish(Saved("two")).await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(mediator.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn wildcard_subscribers_observe_every_type() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mediator = Mediator::builder().build();

        let counter = Arc::clone(&seen);
        mediator.subscribe_any(move |notification: BoxedNotification, _cancel: CancellationToken| {
            let counter = Arc::clone(&counter);
            async move {
                if notification.downcast_ref::<Saved>().is_some() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }
        });

        mediator.publish(Saved("x")).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn streams_establish_through_the_pipeline_and_yield_lazily() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mediator = Mediator::builder()
            .middleware(Step {
                tag: "establish",
                order: None,
                scope: Scope::All,
                log: Arc::clone(&log),
            })
            .stream_handler::<Countdown, _>(|request: Countdown, _cancel: CancellationToken| async move {
                let stream = futures::stream::iter((0..request.0).rev().map(Ok));
                Ok(Box::pin(stream) as RequestStream<u32>)
            })
            .build();

        let stream = mediator.stream(Countdown(3)).await.unwrap();
        // middleware saw establishment exactly once, before consumption
        assert_eq!(*log.lock(), vec!["establish"]);

        let items: Vec<u32> = stream.map(|item| item.unwrap()).collect().await;
        assert_eq!(items, vec![2, 1, 0]);
        assert_eq!(*log.lock(), vec!["establish"]);
    }

    #[tokio::test]
    async fn stream_handlers_thread_the_cancel_token_into_the_stream() {
        let mediator = Mediator::builder()
            .stream_handler::<Countdown, _>(
                |request: Countdown, cancel: CancellationToken| async move {
                    let stream =
                        futures::stream::iter((0..request.0).map(Ok)).take_while(move |_| {
                            let live = !cancel.is_cancelled();
                            async move { live }
                        });
                    Ok(Box::pin(stream) as RequestStream<u32>)
                },
            )
            .build();

        let token = CancellationToken::new();
        let mut stream = mediator
            .stream_with(Countdown(100), token.clone())
            .await
            .unwrap();

        assert_eq!(stream.next().await.transpose().unwrap(), Some(0));
        token.cancel();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn stream_establishment_errors_are_dispatch_errors() {
        let mediator = Mediator::builder()
            .stream_handler::<Countdown, _>(|_request: Countdown, _cancel: CancellationToken| async {
                Err::<RequestStream<u32>, _>(BoxError::from("no feed"))
            })
            .build();

        let err = mediator.stream(Countdown(1)).await.err().unwrap();
        assert!(matches!(err, DispatchError::Failed(_)));

        let err = Mediator::builder()
            .build()
            .stream(Countdown(1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DispatchError::HandlerNotFound { .. }));
    }

    #[tokio::test]
    async fn clones_share_the_same_surface() {
        let mediator = Mediator::builder().handler::<Add, _>(add).build();
        let clone = mediator.clone();

        let id = clone.subscribe::<Saved, _>(|_saved: Arc<Saved>, _cancel: CancellationToken| async {
            Ok(())
        });
        assert_eq!(mediator.subscriber_count(), 1);
        assert!(mediator.unsubscribe(id));
        assert_eq!(clone.send(Add(4, 4)).await.unwrap(), 8);
    }
}
