//! Runtime subscriber set.
//!
//! Subscribers attach to a live mediator and detach with the
//! [`SubscriptionId`] handed back at attach time. The set is read on every
//! publish and mutated rarely, so entries live in a copy-on-write
//! `Arc<Vec<_>>` behind an `RwLock`: readers clone the `Arc`, writers clone
//! the vector. A publish that is already sweeping keeps its snapshot;
//! subscribing or unsubscribing mid-flight affects the next publish only.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::BoxFuture;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::contract::descriptor::short_type_name;
use crate::contract::envelope::BoxedNotification;
use crate::contract::error::BoxError;
use crate::contract::handler::{AnySubscriber, Subscriber};
use crate::contract::message::Notification;

/// Erased invocation of one notification processor.
pub(crate) type ProcessorFn = Arc<
    dyn Fn(BoxedNotification, CancellationToken) -> BoxFuture<'static, Result<(), BoxError>>
        + Send
        + Sync,
>;

/// Token identifying one live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub(crate) struct SubscriberEntry {
    pub(crate) id: SubscriptionId,
    /// `None` for wildcard subscribers.
    pub(crate) target: Option<TypeId>,
    pub(crate) name: String,
    pub(crate) invoke: ProcessorFn,
}

#[derive(Default)]
pub(crate) struct SubscriberSet {
    entries: RwLock<Arc<Vec<Arc<SubscriberEntry>>>>,
    next_id: AtomicU64,
}

impl SubscriberSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Attaches a typed subscriber.
    pub(crate) fn subscribe<N, S>(&self, subscriber: S) -> SubscriptionId
    where
        N: Notification,
        S: Subscriber<N> + 'static,
    {
        let subscriber = Arc::new(subscriber);
        let invoke: ProcessorFn = Arc::new(move |notification: BoxedNotification, cancel| {
            let subscriber = Arc::clone(&subscriber);
            Box::pin(async move {
                match notification.downcast::<N>() {
                    Some(typed) => subscriber.receive(typed, cancel).await,
                    // the target filter keeps foreign types away; ignore
                    // rather than fail if one slips through
                    None => Ok(()),
                }
            })
        });
        self.insert(
            Some(TypeId::of::<N>()),
            short_type_name(type_name::<S>()),
            invoke,
        )
    }

    /// Attaches a wildcard subscriber observing every notification type.
    pub(crate) fn subscribe_any<S>(&self, subscriber: S) -> SubscriptionId
    where
        S: AnySubscriber + 'static,
    {
        let subscriber = Arc::new(subscriber);
        let invoke: ProcessorFn = Arc::new(move |notification, cancel| {
            let subscriber = Arc::clone(&subscriber);
            Box::pin(async move { subscriber.receive(notification, cancel).await })
        });
        self.insert(None, short_type_name(type_name::<S>()), invoke)
    }

    fn insert(&self, target: Option<TypeId>, name: String, invoke: ProcessorFn) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = Arc::new(SubscriberEntry {
            id,
            target,
            name,
            invoke,
        });
        let mut guard = self.entries.write();
        Arc::make_mut(&mut *guard).push(entry);
        id
    }

    /// Detaches a subscription; `false` when the id is unknown or already
    /// removed.
    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut guard = self.entries.write();
        let entries = Arc::make_mut(&mut *guard);
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Snapshot of the entries a notification of `type_id` reaches, in
    /// subscription order.
    pub(crate) fn matching(&self, type_id: TypeId) -> Vec<Arc<SubscriberEntry>> {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.target.is_none_or(|target| target == type_id))
            .map(Arc::clone)
            .collect()
    }

    /// Number of live subscriptions of any kind.
    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Aggregated counts for the inspector.
    pub(crate) fn census(&self) -> SubscriberCensus {
        let guard = self.entries.read();
        let mut by_type: HashMap<TypeId, usize> = HashMap::new();
        let mut wildcard = 0;
        for entry in guard.iter() {
            match entry.target {
                Some(target) => *by_type.entry(target).or_default() += 1,
                None => wildcard += 1,
            }
        }
        SubscriberCensus {
            total: guard.len(),
            by_type,
            wildcard,
        }
    }
}

// ============================================================================
// Census
// ============================================================================

/// Point-in-time subscriber counts, consumed by the inspector.
#[derive(Debug, Clone, Default)]
pub struct SubscriberCensus {
    by_type: HashMap<TypeId, usize>,
    wildcard: usize,
    total: usize,
}

impl SubscriberCensus {
    /// Subscribers targeting exactly this type.
    pub fn targeted(&self, type_id: TypeId) -> usize {
        self.by_type.get(&type_id).copied().unwrap_or(0)
    }

    /// Subscribers a publish of this type would reach, wildcards included.
    pub fn reach(&self, type_id: TypeId) -> usize {
        self.targeted(type_id) + self.wildcard
    }

    /// Wildcard subscribers.
    pub fn wildcard(&self) -> usize {
        self.wildcard
    }

    /// All live subscriptions.
    pub fn total(&self) -> usize {
        self.total
    }
}
