/*!
 * Core Types
 * Common types shared by the monitors, actors and trace sinks
 */

use serde::{Deserialize, Serialize};

/// Payload carried by a buffered item
pub type Value = i64;

/// Type tag attached to every item (consumers demand by tag)
pub type TypeTag = u32;

/// Producer, consumer or player identifier
pub type ActorId = u32;

/// Common result type for monitor operations
pub type MonitorResult<T> = Result<T, super::errors::MonitorError>;

/// A typed item stored in one ring slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub value: Value,
    pub kind: TypeTag,
}

impl Item {
    #[inline]
    pub const fn new(value: Value, kind: TypeTag) -> Self {
        Self { value, kind }
    }
}

/// One cell of the ring; `None` is the empty marker
pub type Slot = Option<Item>;

/// What a consumer is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "demand", content = "kind", rename_all = "snake_case")]
pub enum Demand {
    /// Oldest item, whatever its type
    Any,
    /// Oldest item carrying this type tag
    Type(TypeTag),
}

impl Demand {
    /// Check whether an item satisfies this demand
    #[inline(always)]
    pub fn accepts(&self, item: &Item) -> bool {
        match self {
            Demand::Any => true,
            Demand::Type(kind) => item.kind == *kind,
        }
    }
}

impl From<TypeTag> for Demand {
    fn from(kind: TypeTag) -> Self {
        Demand::Type(kind)
    }
}

impl std::fmt::Display for Demand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Demand::Any => write!(f, "any"),
            Demand::Type(kind) => write!(f, "type {}", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_accepts() {
        let item = Item::new(10, 1);
        assert!(Demand::Any.accepts(&item));
        assert!(Demand::Type(1).accepts(&item));
        assert!(!Demand::Type(0).accepts(&item));
    }

    #[test]
    fn test_demand_from_tag() {
        assert_eq!(Demand::from(3), Demand::Type(3));
        assert_eq!(Demand::Type(3).to_string(), "type 3");
    }
}
