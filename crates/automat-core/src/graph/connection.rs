//! Labelled edges between Locations.

use std::fmt;

use super::location::LocationId;

/// Handle of a [`Connection`] inside an [`Automat`](super::Automat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) u32);

impl ConnectionId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

/// Whether an argument resolved through a connection chases Pointers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerBehavior {
    /// Resolve to the object at the end of the Pointer chain.
    #[default]
    FollowPointers,
    /// Resolve to the object stored at the connection's target.
    TerminateHere,
}

/// A labelled, directed edge.
///
/// The label is the name of the [`Argument`](crate::Argument) on the `from`
/// side that this edge satisfies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub(crate) from: LocationId,
    pub(crate) to: LocationId,
    pub(crate) label: String,
    pub(crate) pointer_behavior: PointerBehavior,
}

impl Connection {
    /// Source Location.
    pub fn from(&self) -> LocationId {
        self.from
    }

    /// Target Location.
    pub fn to(&self) -> LocationId {
        self.to
    }

    /// Argument name this edge satisfies.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Pointer handling for arguments resolved through this edge.
    pub fn pointer_behavior(&self) -> PointerBehavior {
        self.pointer_behavior
    }
}
