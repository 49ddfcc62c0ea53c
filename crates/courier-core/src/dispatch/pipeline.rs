//! Pipeline planning and assembly.
//!
//! A pipeline run has two phases:
//!
//! 1. **Plan** - filter the registered components down to those whose scope
//!    admits the message, then stable-sort by `(effective order,
//!    registration sequence)`. Components without a declared order take the
//!    pipeline's fallback order.
//! 2. **Assemble** - fold the plan right-to-left around the handler
//!    terminal, producing one callable chain where each component wraps
//!    everything after it.
//!
//! The inspector reads the same `rank` path as dispatch, so reported
//! ordering is the executed ordering by construction.

use std::any::type_name;
use std::sync::Arc;

use crate::contract::descriptor::TypeDescriptor;
use crate::contract::envelope::{BoxedReply, BoxedRequest};
use crate::contract::error::{BoxError, DispatchError};
use crate::contract::handler::{RequestHandler, StreamHandler};
use crate::contract::message::{Request, StreamRequest};
use crate::contract::order::Order;
use crate::contract::scope::Scope;

use super::middleware::{Link, Middleware, Next, NotificationMiddleware, PublishLink, PublishNext};

// ============================================================================
// Registrations
// ============================================================================

/// A middleware component with the placement data captured when it was
/// registered. Order and scope are read once, here, so a component cannot
/// drift between planning runs.
pub(crate) struct Registered<C: ?Sized> {
    pub(crate) component: Arc<C>,
    pub(crate) name: String,
    pub(crate) declared: Option<Order>,
    pub(crate) scope: Scope,
    pub(crate) sequence: usize,
}

impl<C: ?Sized> Clone for Registered<C> {
    fn clone(&self) -> Self {
        Self {
            component: Arc::clone(&self.component),
            name: self.name.clone(),
            declared: self.declared,
            scope: self.scope.clone(),
            sequence: self.sequence,
        }
    }
}

impl<C: ?Sized> Registered<C> {
    /// The order planning actually uses.
    pub(crate) fn effective(&self, fallback: Order) -> Order {
        self.declared.unwrap_or(fallback)
    }
}

/// Both middleware tables plus the fallback order, frozen at build time.
pub(crate) struct PipelineSet {
    pub(crate) request: Vec<Registered<dyn Middleware>>,
    pub(crate) notification: Vec<Registered<dyn NotificationMiddleware>>,
    pub(crate) fallback: Order,
}

impl PipelineSet {
    pub(crate) fn new(fallback: Order) -> Self {
        Self {
            request: Vec::new(),
            notification: Vec::new(),
            fallback,
        }
    }

    pub(crate) fn push_request(&mut self, component: Arc<dyn Middleware>, name: String) {
        let declared = component.order();
        let scope = component.scope();
        let sequence = self.request.len();
        self.request.push(Registered {
            component,
            name,
            declared,
            scope,
            sequence,
        });
    }

    pub(crate) fn push_notification(
        &mut self,
        component: Arc<dyn NotificationMiddleware>,
        name: String,
    ) {
        let declared = component.order();
        let scope = component.scope();
        let sequence = self.notification.len();
        self.notification.push(Registered {
            component,
            name,
            declared,
            scope,
            sequence,
        });
    }
}

// ============================================================================
// Planning
// ============================================================================

fn rank<C: ?Sized>(mut items: Vec<&Registered<C>>, fallback: Order) -> Vec<&Registered<C>> {
    items.sort_by_key(|registered| (registered.effective(fallback), registered.sequence));
    items
}

/// Every registration in execution order, ignoring scopes. Report path.
pub(crate) fn ordered<C: ?Sized>(
    registrations: &[Registered<C>],
    fallback: Order,
) -> Vec<&Registered<C>> {
    rank(registrations.iter().collect(), fallback)
}

/// The registrations that will run for one message, in execution order.
pub(crate) fn plan<'a, C: ?Sized>(
    registrations: &'a [Registered<C>],
    descriptor: &TypeDescriptor,
    fallback: Order,
) -> Vec<&'a Registered<C>> {
    rank(
        registrations
            .iter()
            .filter(|registered| registered.scope.admits(descriptor))
            .collect(),
        fallback,
    )
}

// ============================================================================
// Assembly
// ============================================================================

/// Folds a request plan around its terminal, innermost last.
pub(crate) fn assemble(plan: &[&Registered<dyn Middleware>], terminal: Link) -> Link {
    let mut chain = terminal;
    for registered in plan.iter().rev() {
        let component = Arc::clone(&registered.component);
        let inner = chain;
        chain = Arc::new(move |request, cancel| {
            let component = Arc::clone(&component);
            let next = Next::new(Arc::clone(&inner));
            Box::pin(async move { component.handle(request, next, cancel).await })
        });
    }
    chain
}

/// Folds a notification plan around the fan-out terminal.
pub(crate) fn assemble_publish(
    plan: &[&Registered<dyn NotificationMiddleware>],
    terminal: PublishLink,
) -> PublishLink {
    let mut chain = terminal;
    for registered in plan.iter().rev() {
        let component = Arc::clone(&registered.component);
        let inner = chain;
        chain = Arc::new(move |notification, cancel| {
            let component = Arc::clone(&component);
            let next = PublishNext::new(Arc::clone(&inner));
            Box::pin(async move { component.handle(notification, next, cancel).await })
        });
    }
    chain
}

// ============================================================================
// Terminals
// ============================================================================

/// The innermost link of a request chain: downcast and invoke the handler.
pub(crate) fn request_terminal<R: Request>(handler: Arc<dyn RequestHandler<R>>) -> Link {
    Arc::new(move |request: BoxedRequest, cancel| {
        let handler = Arc::clone(&handler);
        Box::pin(async move {
            let found = request.type_name();
            match request.downcast::<R>() {
                Ok(typed) => {
                    let response = handler.handle(typed, cancel).await?;
                    Ok(BoxedReply::new(response))
                }
                Err(_) => Err(BoxError::from(DispatchError::RequestMismatch {
                    expected: type_name::<R>(),
                    found,
                })),
            }
        })
    })
}

/// The innermost link of a stream chain: the established stream rides back
/// through the pipeline inside the reply envelope.
pub(crate) fn stream_terminal<R: StreamRequest>(handler: Arc<dyn StreamHandler<R>>) -> Link {
    Arc::new(move |request: BoxedRequest, cancel| {
        let handler = Arc::clone(&handler);
        Box::pin(async move {
            let found = request.type_name();
            match request.downcast::<R>() {
                Ok(typed) => {
                    let stream = handler.handle(typed, cancel).await?;
                    Ok(BoxedReply::new(stream))
                }
                Err(_) => Err(BoxError::from(DispatchError::RequestMismatch {
                    expected: type_name::<R>(),
                    found,
                })),
            }
        })
    })
}
