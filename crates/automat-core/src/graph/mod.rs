//! The Location arena.
//!
//! [`Automat`] owns every [`Location`] and [`Connection`] of a graph and is the
//! single context through which objects read and mutate it. Objects never hold
//! references into the arena; they receive `&Automat` or `&mut Automat`
//! together with the [`LocationId`] they live at.
//!
//! # Ownership
//!
//! - A Location exclusively owns its object. Connections, observer sets and
//!   arguments only store ids.
//! - A Connection is stored once. Its id appears in exactly the `outgoing`
//!   list of `from` and the `incoming` list of `to`; [`Automat::connect`],
//!   [`Automat::disconnect`] and [`Automat::remove_location`] are the only
//!   operations that touch those lists.
//! - While an object callback runs, the object is moved out of its Location
//!   (see [`Automat::with_object`]) so the callback can receive `&mut Automat`.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut rt = Automat::new();
//! let root = rt.root();
//! rt.insert(root, Box::new(Machine::new("Demo")))?;
//! let a = rt.create(root, &Integer::default(), "a")?;
//! let b = rt.create(root, &Text::default(), "b")?;
//! rt.connect(b, a, "target")?;
//! ```

mod connection;
mod location;
mod mutation;
mod values;

use thiserror::Error;

use crate::machine::Machine;
use crate::object::Object;
use crate::scheduler::Scheduler;

pub use connection::{Connection, ConnectionId, PointerBehavior};
pub use location::{Location, LocationId, Vec2};
pub use values::FollowedPointers;

/// Errors returned by graph operations on invalid handles.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The Location does not exist (never created or already removed).
    #[error("location {0} not found")]
    LocationNotFound(LocationId),
    /// The Connection does not exist.
    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),
    /// Children can only be created inside a Location holding a Machine.
    #[error("location {0} does not hold a machine")]
    NotAMachine(LocationId),
    /// The Pointer chain starting at this Location loops back on itself.
    #[error("pointer cycle detected starting at {0}")]
    PointerCycle(LocationId),
    /// The root Location lives as long as the Automat.
    #[error("the root location cannot be removed")]
    RootRemoval,
}

/// Graph context: Location and Connection arenas plus the task scheduler.
///
/// An `Automat` is owned by exactly one thread at a time. Every Automat has an
/// empty, parentless root Location; a Machine placed there becomes the
/// top-level container.
pub struct Automat {
    pub(crate) locations: Vec<Option<Location>>,
    pub(crate) connections: Vec<Option<Connection>>,
    root: LocationId,
    pub(crate) scheduler: Scheduler,
    /// Locations whose object is moved out for a callback, innermost last.
    busy: Vec<LocationId>,
}

impl Default for Automat {
    fn default() -> Self {
        Self::new()
    }
}

impl Automat {
    /// Creates an Automat holding only the empty root Location.
    pub fn new() -> Self {
        let root = LocationId(0);
        Self {
            locations: vec![Some(Location::new(root, None))],
            connections: Vec::new(),
            root,
            scheduler: Scheduler::default(),
            busy: Vec::new(),
        }
    }

    /// The root Location.
    pub fn root(&self) -> LocationId {
        self.root
    }

    /// Looks up a Location.
    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub(crate) fn location_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.locations.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Looks up a Connection.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Iterates over every live Location in creation order.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter().flatten()
    }

    /// Iterates over every live Connection with its id.
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|c| (ConnectionId(index as u32), c)))
    }

    /// Number of live Locations, including the root.
    pub fn location_count(&self) -> usize {
        self.locations().count()
    }

    /// Parent of `id`.
    pub fn parent(&self, id: LocationId) -> Option<LocationId> {
        self.location(id)?.parent
    }

    /// Children of `id`, empty when `id` is unknown.
    pub fn children(&self, id: LocationId) -> &[LocationId] {
        self.location(id).map_or(&[], |location| location.children.as_slice())
    }

    /// First child of `machine` called `name`.
    pub fn child(&self, machine: LocationId, name: &str) -> Option<LocationId> {
        self.children(machine)
            .iter()
            .copied()
            .find(|&child| self.name(child) == name)
    }

    /// Display name of `id`, empty when unknown.
    pub fn name(&self, id: LocationId) -> &str {
        self.location(id).map_or("", |location| location.name.as_str())
    }

    /// Whether the object of `id` is moved out for a callback right now.
    pub fn is_busy(&self, id: LocationId) -> bool {
        self.busy.contains(&id)
    }

    /// Object held directly by `id`.
    ///
    /// Returns `None` while the object is being called back.
    pub fn object(&self, id: LocationId) -> Option<&dyn Object> {
        self.location(id)?.object.as_deref()
    }

    /// Object held directly by `id`, narrowed to `T`.
    pub fn object_as<T: Object>(&self, id: LocationId) -> Option<&T> {
        self.object(id)?.as_any().downcast_ref::<T>()
    }

    /// Mutable object held directly by `id`, narrowed to `T`.
    pub fn object_as_mut<T: Object>(&mut self, id: LocationId) -> Option<&mut T> {
        self.location_mut(id)?
            .object
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Machine held by `id`.
    pub fn machine(&self, id: LocationId) -> Option<&Machine> {
        self.object(id)?.as_machine()
    }

    /// Mutable Machine held by `id`.
    pub fn machine_mut(&mut self, id: LocationId) -> Option<&mut Machine> {
        self.location_mut(id)?.object.as_deref_mut()?.as_machine_mut()
    }

    /// Short human readable description of `id` for messages and logs.
    pub fn describe(&self, id: LocationId) -> String {
        let Some(location) = self.location(id) else {
            return id.to_string();
        };
        match (&location.name, location.object.as_deref()) {
            (name, _) if !name.is_empty() => name.clone(),
            (_, Some(object)) => object.name().to_string(),
            _ => "Location".to_string(),
        }
    }

    /// Calls `f` with the object of `id` moved out of its slot.
    ///
    /// This is how object callbacks get `&mut Automat` alongside `&mut self`.
    /// The object is put back afterwards unless the callback stored a new
    /// one in the same Location or removed the Location. Returns `None`
    /// when `id` holds no object, including while `id` is itself busy.
    pub fn with_object<R>(
        &mut self,
        id: LocationId,
        f: impl FnOnce(&mut dyn Object, &mut Automat) -> R,
    ) -> Option<R> {
        let mut object = self.location_mut(id)?.object.take()?;
        self.busy.push(id);
        let result = f(&mut *object, self);
        self.busy.pop();
        if let Some(location) = self.location_mut(id) {
            if location.object.is_none() {
                location.object = Some(object);
            } else {
                tracing::debug!(location = %id, "object replaced during callback, dropping the previous one");
            }
        }
        Some(result)
    }

    /// Outgoing connections of `id` labelled `label`, in insertion order.
    pub fn outgoing_labelled<'a>(
        &'a self,
        id: LocationId,
        label: &'a str,
    ) -> impl Iterator<Item = (ConnectionId, &'a Connection)> + 'a {
        self.location(id)
            .into_iter()
            .flat_map(|location| location.outgoing.iter().copied())
            .filter_map(move |cid| self.connection(cid).map(|c| (cid, c)))
            .filter(move |(_, c)| c.label == label)
    }

    /// Whether `id` has an incoming connection labelled `label`.
    pub fn has_incoming(&self, id: LocationId, label: &str) -> bool {
        self.location(id).is_some_and(|location| {
            location
                .incoming
                .iter()
                .filter_map(|&cid| self.connection(cid))
                .any(|c| c.label == label)
        })
    }
}
