//! Contract layer - message traits, metadata, envelopes, and errors.
//!
//! This module contains the vocabulary the rest of the engine is built on:
//! - Message traits for requests, stream requests, and notifications
//! - Registration-time type metadata and role classification
//! - Type-erased envelopes for pipeline traversal
//! - The error taxonomy shared by dispatch and fan-out

pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod message;
pub mod order;
pub mod scope;

pub use descriptor::{Classification, Role, TypeDescriptor, TypeKey};
pub use envelope::{BoxedNotification, BoxedReply, BoxedRequest};
pub use error::{
    BoxError, DispatchError, DispatchResult, ProcessorFailure, ProcessorFailures, ProcessorKind,
    PublishError, PublishResult,
};
pub use handler::{
    AnySubscriber, NotificationHandler, RequestHandler, RequestStream, StreamHandler, Subscriber,
};
pub use message::{MarkerSet, Notification, Request, StreamRequest};
pub use order::Order;
pub use scope::Scope;
