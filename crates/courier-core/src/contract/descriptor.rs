//! Registration-time metadata about message types.
//!
//! A [`TypeDescriptor`] is computed once when a type is registered and
//! travels with every envelope dispatched for that type. Middleware scoping,
//! logging, and the inspector all read the descriptor instead of probing the
//! message value, so dispatch never pays for metadata twice.

use std::any::{TypeId, type_name};

use serde::Serialize;

use super::message::{MarkerSet, Notification, Request, StreamRequest};

// ============================================================================
// Type Keys
// ============================================================================

/// A type identity paired with its compiler-reported name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Captures the key of `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// The type id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The full path name as reported by the compiler.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name with module paths stripped, including inside generics.
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }
}

// ============================================================================
// Roles
// ============================================================================

/// The dispatch role a registered type plays.
///
/// Roles are derived from contract shape: a [`Request`] with a unit response
/// is a [`Role::Command`], any other response makes it a [`Role::Query`].
/// Names never participate in role derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Request with a non-unit response.
    Query,
    /// Request with a unit response.
    Command,
    /// Fan-out message without a reply.
    Notification,
    /// Request producing a stream of items.
    Stream,
    /// Not registered with the mediator.
    Unknown,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Role::Query => "query",
            Role::Command => "command",
            Role::Notification => "notification",
            Role::Stream => "stream",
            Role::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Type Descriptors
// ============================================================================

/// Everything the engine knows about a registered message type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    role: Role,
    response: Option<TypeKey>,
    markers: MarkerSet,
}

impl TypeDescriptor {
    /// Builds the descriptor for a request type.
    pub fn request<R: Request>() -> Self {
        let role = if TypeId::of::<R::Response>() == TypeId::of::<()>() {
            Role::Command
        } else {
            Role::Query
        };
        Self {
            key: TypeKey::of::<R>(),
            role,
            response: Some(TypeKey::of::<R::Response>()),
            markers: R::markers(),
        }
    }

    /// Builds the descriptor for a stream request type.
    ///
    /// `response` holds the stream's item type.
    pub fn stream<R: StreamRequest>() -> Self {
        Self {
            key: TypeKey::of::<R>(),
            role: Role::Stream,
            response: Some(TypeKey::of::<R::Item>()),
            markers: R::markers(),
        }
    }

    /// Builds the descriptor for a notification type.
    pub fn notification<N: Notification>() -> Self {
        Self {
            key: TypeKey::of::<N>(),
            role: Role::Notification,
            response: None,
            markers: N::markers(),
        }
    }

    /// The described type's key.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The described type's id.
    pub fn type_id(&self) -> TypeId {
        self.key.id()
    }

    /// The described type's full path name.
    pub fn type_name(&self) -> &'static str {
        self.key.name()
    }

    /// The described type's name without module paths.
    pub fn short_name(&self) -> String {
        self.key.short_name()
    }

    /// The role derived from the contract shape.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The reply type for requests, the item type for streams, `None` for
    /// notifications.
    pub fn response(&self) -> Option<TypeKey> {
        self.response
    }

    /// Markers declared by the type.
    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }
}

// ============================================================================
// Classification
// ============================================================================

/// The roles a given type id plays across the whole registration surface.
///
/// Looking up a type the mediator has never seen yields an empty
/// classification rather than an error.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    roles: Vec<Role>,
    response: Option<TypeKey>,
}

impl Classification {
    pub(crate) fn push(&mut self, descriptor: &TypeDescriptor) {
        if !self.roles.contains(&descriptor.role()) {
            self.roles.push(descriptor.role());
        }
        if self.response.is_none() {
            self.response = descriptor.response();
        }
    }

    /// Roles in registration order; empty for unknown types.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// The reply/item type, when any registered role has one.
    pub fn response(&self) -> Option<TypeKey> {
        self.response
    }

    /// Whether the type is not registered in any role.
    pub fn is_unknown(&self) -> bool {
        self.roles.is_empty()
    }
}

// ============================================================================
// Name Shortening
// ============================================================================

/// Strips module paths from a compiler type name, including the paths of
/// generic arguments: `app::users::Fetch<app::Page>` becomes `Fetch<Page>`.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            while out.chars().next_back().is_some_and(|p| p.is_alphanumeric() || p == '_') {
                out.pop();
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fetch;
    impl Request for Fetch {
        type Response = u32;
    }

    struct Store;
    impl Request for Store {
        type Response = ();
    }

    struct Audited;

    struct Tick;
    impl Notification for Tick {
        fn markers() -> MarkerSet {
            MarkerSet::new().with::<Audited>()
        }
    }

    struct Feed;
    impl StreamRequest for Feed {
        type Item = String;
    }

    #[test]
    fn role_follows_response_shape() {
        assert_eq!(TypeDescriptor::request::<Fetch>().role(), Role::Query);
        assert_eq!(TypeDescriptor::request::<Store>().role(), Role::Command);
        assert_eq!(TypeDescriptor::stream::<Feed>().role(), Role::Stream);
        assert_eq!(TypeDescriptor::notification::<Tick>().role(), Role::Notification);
    }

    #[test]
    fn descriptor_captures_markers_and_response() {
        let tick = TypeDescriptor::notification::<Tick>();
        assert!(tick.markers().contains::<Audited>());
        assert!(tick.response().is_none());

        let fetch = TypeDescriptor::request::<Fetch>();
        assert_eq!(fetch.response().map(|key| key.id()), Some(TypeId::of::<u32>()));
    }

    #[test]
    fn short_names_drop_paths_inside_generics() {
        assert_eq!(short_type_name("app::users::Fetch"), "Fetch");
        assert_eq!(short_type_name("app::Wrap<app::inner::Item>"), "Wrap<Item>");
        assert_eq!(
            short_type_name("map::Map<alloc::string::String, core::option::Option<u8>>"),
            "Map<String, Option<u8>>"
        );
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn classification_collects_roles_without_duplicates() {
        let mut classification = Classification::default();
        classification.push(&TypeDescriptor::request::<Fetch>());
        classification.push(&TypeDescriptor::request::<Fetch>());
        assert_eq!(classification.roles(), &[Role::Query]);
        assert!(!classification.is_unknown());
        assert!(Classification::default().is_unknown());
    }
}
