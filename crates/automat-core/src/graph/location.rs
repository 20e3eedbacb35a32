//! Graph nodes.
//!
//! A [`Location`] holds at most one [`Object`], a name, the ids of its
//! connections in both directions and the observer sets used for update and
//! error propagation. Locations are owned by the [`Automat`](super::Automat)
//! arena and referenced everywhere else by [`LocationId`].

use std::collections::BTreeSet;
use std::fmt;

use crate::error::Error;
use crate::object::Object;

use super::connection::ConnectionId;

/// Handle of a Location inside an [`Automat`](super::Automat).
///
/// Ids are assigned sequentially and never reused within one Automat, so a
/// stale id simply stops resolving once its Location is removed. Ordering
/// follows creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(pub(crate) u32);

impl LocationId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocationId({})", self.0)
    }
}

/// Position of a Location inside its parent Machine.
///
/// The runtime only stores and copies it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Vec2 {
    /// Creates a position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A node of the dataflow graph.
pub struct Location {
    pub(crate) id: LocationId,
    pub(crate) parent: Option<LocationId>,
    /// Child Locations, in creation order. Only populated while the held
    /// object is a Machine.
    pub(crate) children: Vec<LocationId>,
    pub(crate) object: Option<Box<dyn Object>>,
    pub(crate) name: String,
    pub(crate) position: Vec2,
    pub(crate) error: Option<Error>,
    pub(crate) outgoing: Vec<ConnectionId>,
    pub(crate) incoming: Vec<ConnectionId>,
    /// Locations notified when this one changes.
    pub(crate) update_observers: BTreeSet<LocationId>,
    /// Locations whose changes this one listens to.
    pub(crate) observing_updates: BTreeSet<LocationId>,
    pub(crate) error_observers: BTreeSet<LocationId>,
    pub(crate) observing_errors: BTreeSet<LocationId>,
}

impl Location {
    pub(crate) fn new(id: LocationId, parent: Option<LocationId>) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            object: None,
            name: String::new(),
            position: Vec2::default(),
            error: None,
            outgoing: Vec::new(),
            incoming: Vec::new(),
            update_observers: BTreeSet::new(),
            observing_updates: BTreeSet::new(),
            error_observers: BTreeSet::new(),
            observing_errors: BTreeSet::new(),
        }
    }

    /// This Location's id.
    pub fn id(&self) -> LocationId {
        self.id
    }

    /// Enclosing Location, `None` for the root.
    pub fn parent(&self) -> Option<LocationId> {
        self.parent
    }

    /// Child Locations in creation order.
    pub fn children(&self) -> &[LocationId] {
        &self.children
    }

    /// Held object, if any.
    pub fn object(&self) -> Option<&dyn Object> {
        self.object.as_deref()
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position inside the parent Machine.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Error recorded directly on this Location.
    pub fn own_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Outgoing connections, in insertion order.
    pub fn outgoing(&self) -> &[ConnectionId] {
        &self.outgoing
    }

    /// Incoming connections, in insertion order.
    pub fn incoming(&self) -> &[ConnectionId] {
        &self.incoming
    }

    /// Locations that receive an update task when this one changes.
    pub fn update_observers(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.update_observers.iter().copied()
    }

    /// Locations this one receives update tasks from.
    pub fn observing_updates(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.observing_updates.iter().copied()
    }

    /// Locations that receive an errored task when this one fails.
    pub fn error_observers(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.error_observers.iter().copied()
    }

    /// Locations whose failures this one listens to.
    pub fn observing_errors(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.observing_errors.iter().copied()
    }
}
