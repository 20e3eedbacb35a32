//! Structural mutations: Locations, objects, connections and observer links.

use crate::machine::PendingChild;
use crate::object::Object;

use super::{
    Automat, Connection, ConnectionId, GraphError, Location, LocationId, PointerBehavior, Vec2,
};

impl Automat {
    // --- Locations ---

    fn alloc_location(&mut self, parent: Option<LocationId>) -> LocationId {
        let id = LocationId(self.locations.len() as u32);
        self.locations.push(Some(Location::new(id, parent)));
        id
    }

    /// Adds an empty child Location called `name` to `parent`.
    pub fn add_location(&mut self, parent: LocationId, name: &str) -> Result<LocationId, GraphError> {
        if self.location(parent).is_none() {
            return Err(GraphError::LocationNotFound(parent));
        }
        let id = self.alloc_location(Some(parent));
        if let Some(location) = self.location_mut(id) {
            location.name = name.to_string();
        }
        if let Some(parent_location) = self.location_mut(parent) {
            parent_location.children.push(id);
        }
        tracing::debug!("add_location: {id} \"{name}\" in {parent}");
        Ok(id)
    }

    /// Creates a child of `machine` holding a clone of `prototype`.
    pub fn create(
        &mut self,
        machine: LocationId,
        prototype: &dyn Object,
        name: &str,
    ) -> Result<LocationId, GraphError> {
        if self.location(machine).is_none() {
            return Err(GraphError::LocationNotFound(machine));
        }
        if self.machine(machine).is_none() {
            return Err(GraphError::NotAMachine(machine));
        }
        let object = prototype.clone_object(self);
        let id = self.add_location(machine, name)?;
        self.insert(id, object)?;
        Ok(id)
    }

    pub(crate) fn materialize_child(&mut self, parent: LocationId, child: PendingChild) {
        let Ok(id) = self.add_location(parent, &child.name) else {
            return;
        };
        self.set_position(id, child.position);
        if let Some(object) = child.object {
            // `id` was just allocated, so the insert cannot fail.
            let _ = self.insert(id, object);
        }
    }

    pub(crate) fn detach_children(&mut self, parent: LocationId) -> Vec<PendingChild> {
        let children = self.children(parent).to_vec();
        let mut detached = Vec::with_capacity(children.len());
        for child in children {
            let (name, position) = match self.location(child) {
                Some(location) => (location.name.clone(), location.position),
                None => continue,
            };
            let object = self.take_object(child).ok().flatten();
            let _ = self.remove_location(child);
            detached.push(PendingChild {
                name,
                position,
                object,
            });
        }
        detached
    }

    /// Stores `object` at `id`, returning the object it replaced.
    ///
    /// The replaced object is told it left (`relocate(Some(id), None)`) and
    /// the new one that it arrived (`relocate(None, Some(id))`).
    pub fn insert(
        &mut self,
        id: LocationId,
        mut object: Box<dyn Object>,
    ) -> Result<Option<Box<dyn Object>>, GraphError> {
        let previous = self.take_object(id)?;
        object.relocate(self, None, Some(id));
        let location = self
            .location_mut(id)
            .ok_or(GraphError::LocationNotFound(id))?;
        tracing::debug!("insert: {} into {id}", object.name());
        location.object = Some(object);
        Ok(previous)
    }

    /// Moves the object out of `id`.
    pub fn take_object(&mut self, id: LocationId) -> Result<Option<Box<dyn Object>>, GraphError> {
        let location = self
            .location_mut(id)
            .ok_or(GraphError::LocationNotFound(id))?;
        let Some(mut object) = location.object.take() else {
            return Ok(None);
        };
        object.relocate(self, Some(id), None);
        Ok(Some(object))
    }

    /// Removes `id` together with its subtree.
    ///
    /// Children go first; then the object is taken out, every connection
    /// touching `id` is cut and the observer links on both sides are
    /// dropped.
    pub fn remove_location(&mut self, id: LocationId) -> Result<(), GraphError> {
        if id == self.root() {
            return Err(GraphError::RootRemoval);
        }
        if self.location(id).is_none() {
            return Err(GraphError::LocationNotFound(id));
        }
        for child in self.children(id).to_vec() {
            self.remove_location(child)?;
        }
        drop(self.take_object(id)?);

        let mut connections: Vec<ConnectionId> = self
            .location(id)
            .map(|l| l.outgoing.iter().chain(&l.incoming).copied().collect())
            .unwrap_or_default();
        connections.sort_unstable();
        connections.dedup();
        for connection in connections {
            let _ = self.disconnect(connection);
        }

        let Some(location) = self.location_mut(id) else {
            return Err(GraphError::LocationNotFound(id));
        };
        let parent = location.parent;
        let update_observers = std::mem::take(&mut location.update_observers);
        let observing_updates = std::mem::take(&mut location.observing_updates);
        let error_observers = std::mem::take(&mut location.error_observers);
        let observing_errors = std::mem::take(&mut location.observing_errors);
        for observer in update_observers {
            if let Some(other) = self.location_mut(observer) {
                other.observing_updates.remove(&id);
            }
        }
        for observed in observing_updates {
            if let Some(other) = self.location_mut(observed) {
                other.update_observers.remove(&id);
            }
        }
        for observer in error_observers {
            if let Some(other) = self.location_mut(observer) {
                other.observing_errors.remove(&id);
            }
        }
        for observed in observing_errors {
            if let Some(other) = self.location_mut(observed) {
                other.error_observers.remove(&id);
            }
        }

        if let Some(parent) = parent {
            if let Some(parent_location) = self.location_mut(parent) {
                parent_location.children.retain(|&child| child != id);
            }
            if let Some(machine) = self.machine_mut(parent) {
                machine.forget_front(id);
            }
            self.clear_child_error(parent, id);
        }

        self.locations[id.0 as usize] = None;
        tracing::debug!("remove_location: {id}");
        Ok(())
    }

    /// Renames `id`.
    pub fn rename(&mut self, id: LocationId, name: &str) -> Result<(), GraphError> {
        let location = self
            .location_mut(id)
            .ok_or(GraphError::LocationNotFound(id))?;
        location.name = name.to_string();
        Ok(())
    }

    /// Moves `id` within its parent Machine.
    pub fn set_position(&mut self, id: LocationId, position: Vec2) {
        if let Some(location) = self.location_mut(id) {
            location.position = position;
        }
    }

    // --- Connections ---

    /// Connects `from` to `to` under `label`, following pointers.
    ///
    /// The object at `from` is notified through
    /// [`Object::connection_added`].
    pub fn connect(
        &mut self,
        from: LocationId,
        to: LocationId,
        label: &str,
    ) -> Result<ConnectionId, GraphError> {
        self.connect_with(from, to, label, PointerBehavior::FollowPointers)
    }

    /// Connects `from` to `to` under `label` with an explicit pointer
    /// behaviour.
    pub fn connect_with(
        &mut self,
        from: LocationId,
        to: LocationId,
        label: &str,
        pointer_behavior: PointerBehavior,
    ) -> Result<ConnectionId, GraphError> {
        if self.location(from).is_none() {
            return Err(GraphError::LocationNotFound(from));
        }
        if self.location(to).is_none() {
            return Err(GraphError::LocationNotFound(to));
        }

        let id = ConnectionId(self.connections.len() as u32);
        self.connections.push(Some(Connection {
            from,
            to,
            label: label.to_string(),
            pointer_behavior,
        }));
        if let Some(location) = self.location_mut(from) {
            location.outgoing.push(id);
        }
        if let Some(location) = self.location_mut(to) {
            location.incoming.push(id);
        }

        tracing::debug!("connect: {from} → {to} ({label})");
        self.with_object(from, |object, rt| {
            object.connection_added(rt, from, label, id);
        });
        Ok(id)
    }

    /// Removes a connection from both of its endpoints.
    pub fn disconnect(&mut self, id: ConnectionId) -> Result<(), GraphError> {
        let connection = self
            .connections
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .ok_or(GraphError::ConnectionNotFound(id))?;
        if let Some(location) = self.location_mut(connection.from) {
            location.outgoing.retain(|&c| c != id);
        }
        if let Some(location) = self.location_mut(connection.to) {
            location.incoming.retain(|&c| c != id);
        }

        tracing::debug!("disconnect: {} → {} ({})", connection.from, connection.to, connection.label);
        let Connection {
            from, to, label, ..
        } = connection;
        self.with_object(from, |object, rt| {
            object.connection_removed(rt, from, &label, to);
        });
        Ok(())
    }

    // --- Observers ---

    /// Makes `observer` receive an update task whenever `observed` changes.
    pub fn observe_updates(&mut self, observer: LocationId, observed: LocationId) {
        if self.location(observer).is_none() || self.location(observed).is_none() {
            return;
        }
        if let Some(location) = self.location_mut(observed) {
            location.update_observers.insert(observer);
        }
        if let Some(location) = self.location_mut(observer) {
            location.observing_updates.insert(observed);
        }
    }

    /// Reverses [`observe_updates`](Self::observe_updates).
    pub fn stop_observing_updates(&mut self, observer: LocationId, observed: LocationId) {
        if let Some(location) = self.location_mut(observed) {
            location.update_observers.remove(&observer);
        }
        if let Some(location) = self.location_mut(observer) {
            location.observing_updates.remove(&observed);
        }
    }

    /// Makes `observer` receive an errored task whenever `observed` fails.
    pub fn observe_errors(&mut self, observer: LocationId, observed: LocationId) {
        if self.location(observer).is_none() || self.location(observed).is_none() {
            return;
        }
        if let Some(location) = self.location_mut(observed) {
            location.error_observers.insert(observer);
        }
        if let Some(location) = self.location_mut(observer) {
            location.observing_errors.insert(observed);
        }
    }

    /// Reverses [`observe_errors`](Self::observe_errors).
    pub fn stop_observing_errors(&mut self, observer: LocationId, observed: LocationId) {
        if let Some(location) = self.location_mut(observed) {
            location.error_observers.remove(&observer);
        }
        if let Some(location) = self.location_mut(observer) {
            location.observing_errors.remove(&observed);
        }
    }
}
