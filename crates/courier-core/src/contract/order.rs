//! Pipeline placement values.
//!
//! Middleware declares where it wants to sit in a pipeline through an
//! [`Order`]. Lower orders run earlier (closer to the caller), higher orders
//! run later (closer to the handler). Components that declare no order are
//! placed at the configured fallback order, and ties are broken by
//! registration sequence.

use serde::{Deserialize, Serialize};

/// Placement of a middleware component within a pipeline.
///
/// Plain integers compare the obvious way; [`Order::FIRST`] and
/// [`Order::LAST`] are saturated sentinels that sort before/after every
/// plain value. The `Display` impl renders the sentinels as words rather
/// than raw integer extremes, so reports stay readable:
///
/// ```rust,ignore
/// assert_eq!(Order::FIRST.to_string(), "minimum possible order");
/// assert_eq!(Order::new(40).to_string(), "40");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Order(i32);

impl Order {
    /// Sorts before every other order.
    pub const FIRST: Order = Order(i32::MIN);

    /// Sorts after every other order.
    pub const LAST: Order = Order(i32::MAX);

    /// The neutral placement used when nothing else is configured.
    pub const DEFAULT: Order = Order(0);

    /// Creates an order from a raw placement value.
    pub const fn new(value: i32) -> Self {
        Order(value)
    }

    /// Returns the raw placement value.
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Whether this is one of the saturated sentinels.
    pub const fn is_sentinel(self) -> bool {
        self.0 == i32::MIN || self.0 == i32::MAX
    }
}

impl Default for Order {
    fn default() -> Self {
        Order::DEFAULT
    }
}

impl From<i32> for Order {
    fn from(value: i32) -> Self {
        Order(value)
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Order::FIRST => f.write_str("minimum possible order"),
            Order::LAST => f.write_str("maximum possible order"),
            Order(value) => write!(f, "{value}"),
        }
    }
}
