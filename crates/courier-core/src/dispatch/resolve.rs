//! Handler resolution with cardinality enforcement.
//!
//! Requests and stream requests demand exactly one handler; resolution
//! fails loudly on zero or several. Notifications accept any number,
//! including none. Both paths go through the [`ServiceProvider`] seam, so a
//! host-supplied provider is enforced identically to the bundled registry.

use std::any::{TypeId, type_name};
use std::sync::Arc;

use tracing::warn;

use crate::contract::error::DispatchError;
use crate::contract::handler::{NotificationHandler, RequestHandler, StreamHandler};
use crate::contract::message::{Notification, Request, StreamRequest};
use crate::provider::{ServiceProvider, unwrap_service};

/// Resolves the single handler for a request type.
pub(crate) fn resolve_request<R: Request>(
    provider: &dyn ServiceProvider,
) -> Result<Arc<dyn RequestHandler<R>>, DispatchError> {
    let entries = provider.resolve_many(TypeId::of::<dyn RequestHandler<R>>());
    match entries.len() {
        0 => Err(DispatchError::HandlerNotFound {
            request: type_name::<R>(),
        }),
        1 => unwrap_service::<dyn RequestHandler<R>>(&entries[0]).ok_or(
            DispatchError::InvalidRegistration {
                contract: type_name::<dyn RequestHandler<R>>(),
            },
        ),
        count => Err(DispatchError::AmbiguousHandler {
            request: type_name::<R>(),
            count,
        }),
    }
}

/// Resolves the single handler for a stream request type.
pub(crate) fn resolve_stream<R: StreamRequest>(
    provider: &dyn ServiceProvider,
) -> Result<Arc<dyn StreamHandler<R>>, DispatchError> {
    let entries = provider.resolve_many(TypeId::of::<dyn StreamHandler<R>>());
    match entries.len() {
        0 => Err(DispatchError::HandlerNotFound {
            request: type_name::<R>(),
        }),
        1 => unwrap_service::<dyn StreamHandler<R>>(&entries[0]).ok_or(
            DispatchError::InvalidRegistration {
                contract: type_name::<dyn StreamHandler<R>>(),
            },
        ),
        count => Err(DispatchError::AmbiguousHandler {
            request: type_name::<R>(),
            count,
        }),
    }
}

/// Resolves every handler for a notification type, registration order
/// preserved. Incompatible entries are skipped with a warning instead of
/// failing the publish.
pub(crate) fn resolve_notification<N: Notification>(
    provider: &dyn ServiceProvider,
) -> Vec<Arc<dyn NotificationHandler<N>>> {
    provider
        .resolve_many(TypeId::of::<dyn NotificationHandler<N>>())
        .iter()
        .filter_map(|entry| {
            let handler = unwrap_service::<dyn NotificationHandler<N>>(entry);
            if handler.is_none() {
                warn!(
                    notification = type_name::<N>(),
                    "skipping incompatible notification handler entry"
                );
            }
            handler
        })
        .collect()
}
