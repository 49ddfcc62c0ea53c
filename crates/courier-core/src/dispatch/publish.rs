//! Notification fan-out.
//!
//! A publish sweeps one roster: the handlers resolved from the provider
//! (registration order) followed by the matching subscribers (subscription
//! order). Every processor is attempted regardless of earlier failures;
//! whatever failed is reported together in a
//! [`ProcessorFailures`] aggregate once the sweep completes.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::contract::envelope::BoxedNotification;
use crate::contract::error::{
    BoxError, ProcessorFailure, ProcessorFailures, ProcessorKind, PublishError,
};
use crate::contract::handler::NotificationHandler;
use crate::contract::message::Notification;

use super::middleware::PublishLink;
use super::subscribers::{ProcessorFn, SubscriberEntry};

/// One processor prepared for a sweep.
pub(crate) struct Processor {
    pub(crate) name: String,
    pub(crate) kind: ProcessorKind,
    pub(crate) invoke: ProcessorFn,
}

/// Erases resolved handlers into processors, keeping registration order.
///
/// `names` comes from the registration catalog; positions beyond it (a
/// custom provider returning more instances than the catalog knows) get a
/// positional placeholder.
pub(crate) fn handler_processors<N: Notification>(
    handlers: Vec<Arc<dyn NotificationHandler<N>>>,
    names: &[String],
) -> Vec<Processor> {
    handlers
        .into_iter()
        .enumerate()
        .map(|(position, handler)| {
            let invoke: ProcessorFn = Arc::new(move |notification: BoxedNotification, cancel| {
                let handler = Arc::clone(&handler);
                Box::pin(async move {
                    match notification.downcast::<N>() {
                        Some(typed) => handler.handle(typed, cancel).await,
                        None => Ok(()),
                    }
                })
            });
            Processor {
                name: names
                    .get(position)
                    .cloned()
                    .unwrap_or_else(|| format!("handler #{position}")),
                kind: ProcessorKind::Handler,
                invoke,
            }
        })
        .collect()
}

/// Erases subscriber entries into processors, keeping subscription order.
pub(crate) fn subscriber_processors(entries: Vec<Arc<SubscriberEntry>>) -> Vec<Processor> {
    entries
        .into_iter()
        .map(|entry| Processor {
            name: entry.name.clone(),
            kind: ProcessorKind::Subscriber,
            invoke: Arc::clone(&entry.invoke),
        })
        .collect()
}

/// The innermost link of a notification chain: sweep every processor and
/// aggregate whatever failed.
pub(crate) fn fanout_terminal(processors: Vec<Processor>) -> PublishLink {
    let processors = Arc::new(processors);
    Arc::new(move |notification, cancel| {
        let processors = Arc::clone(&processors);
        Box::pin(async move {
            let attempted = processors.len();
            let mut failures = Vec::new();
            for processor in processors.iter() {
                debug!(
                    processor = %processor.name,
                    kind = %processor.kind,
                    "delivering notification"
                );
                if let Err(error) = (processor.invoke)(notification.clone(), cancel.clone()).await {
                    warn!(
                        processor = %processor.name,
                        kind = %processor.kind,
                        error = %error,
                        "notification processor failed"
                    );
                    failures.push(ProcessorFailure {
                        processor: processor.name.clone(),
                        kind: processor.kind,
                        error,
                    });
                }
            }
            if failures.is_empty() {
                Ok(())
            } else {
                Err(BoxError::from(ProcessorFailures { attempted, failures }))
            }
        })
    })
}

/// Splits chain errors back into the public taxonomy.
pub(crate) fn into_publish_error(error: BoxError) -> PublishError {
    match error.downcast::<ProcessorFailures>() {
        Ok(failures) => PublishError::Processors(*failures),
        Err(error) => PublishError::Pipeline(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    struct Tick;
    impl Notification for Tick {}

    fn tallying(name: &str, counter: &Arc<AtomicUsize>, fail: bool) -> Processor {
        let counter = Arc::clone(counter);
        let invoke: ProcessorFn = Arc::new(move |_notification, _cancel| {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err(BoxError::from("processor refused"))
                } else {
                    Ok(())
                }
            })
        });
        Processor {
            name: name.to_string(),
            kind: ProcessorKind::Handler,
            invoke,
        }
    }

    #[tokio::test]
    async fn sweep_attempts_every_processor_and_aggregates() {
        let counter = Arc::new(AtomicUsize::new(0));
        let terminal = fanout_terminal(vec![
            tallying("first", &counter, true),
            tallying("second", &counter, false),
            tallying("third", &counter, true),
        ]);

        let error = terminal(BoxedNotification::new(Tick), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        match into_publish_error(error) {
            PublishError::Processors(failures) => {
                assert_eq!(failures.attempted, 3);
                let names: Vec<&str> =
                    failures.failures.iter().map(|f| f.processor.as_str()).collect();
                assert_eq!(names, vec!["first", "third"]);
            }
            other => panic!("expected aggregated processor failures, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_roster_is_a_quiet_success() {
        let terminal = fanout_terminal(Vec::new());
        let outcome = terminal(BoxedNotification::new(Tick), CancellationToken::new()).await;
        assert!(outcome.is_ok());
    }

    #[test]
    fn foreign_chain_errors_map_to_pipeline() {
        let error = into_publish_error(BoxError::from("middleware exploded"));
        assert!(matches!(error, PublishError::Pipeline(_)));
    }
}
