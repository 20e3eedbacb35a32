//! Named references from an object to its neighbourhood.
//!
//! An [`Argument`] is a query an object runs against its own Location. It
//! resolves in two steps:
//!
//! 1. the first outgoing connection labelled with the argument's name;
//! 2. otherwise a Location with that name found by [`Automat::nearby`].
//!
//! How strictly a missing or wrong target is treated depends on the
//! [`Precondition`]. Unmet preconditions are reported as errors on the
//! querying Location and signalled by `ok == false` in the result; nothing is
//! thrown.
//!
//! Arguments are usually `static` items shared by every instance of an
//! object kind. The live half of the protocol ([`Argument::attach`],
//! [`Argument::detach`], [`Argument::on_connection_added`]) keeps update
//! subscriptions in sync with the graph for objects that react to their
//! inputs.

use std::borrow::Cow;
use std::marker::PhantomData;

use crate::graph::{Automat, ConnectionId, LocationId, PointerBehavior};
use crate::object::Object;

/// How strictly an argument must be satisfied. Levels are ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precondition {
    /// Missing targets are fine.
    Optional,
    /// A target Location must exist.
    RequiresLocation,
    /// The target Location must hold an object.
    RequiresObject,
    /// The object must satisfy the argument's requirements.
    RequiresConcreteType,
}

/// Number of connections an argument accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// One target.
    Single,
    /// Any number of targets, visited with the loop helpers.
    Multiple,
}

/// A type check applied to resolved objects.
#[derive(Clone, Copy)]
pub struct Requirement {
    /// Name used in the mismatch message.
    pub type_name: &'static str,
    /// Returns true when the object is acceptable.
    pub check: fn(&dyn Object) -> bool,
}

impl Requirement {
    /// Requirement satisfied by objects of concrete type `T`.
    pub const fn instance_of<T: Object>(type_name: &'static str) -> Self {
        Self {
            type_name,
            check: is_instance::<T>,
        }
    }
}

fn is_instance<T: Object>(object: &dyn Object) -> bool {
    object.as_any().is::<T>()
}

impl std::fmt::Debug for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Requirement")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`Argument::get_location`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocationResult {
    /// False when a precondition failed (an error has been reported).
    pub ok: bool,
    /// Whether reads through this argument should chase Pointers.
    pub follow_pointers: bool,
    /// Resolved Location.
    pub location: Option<LocationId>,
}

/// Outcome of [`Argument::get_object`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectResult {
    /// False when a precondition failed (an error has been reported).
    pub ok: bool,
    /// Location the argument resolved to.
    pub location: Option<LocationId>,
    /// Location holding the resolved object (the end of the Pointer chain).
    pub object: Option<LocationId>,
}

/// Outcome of [`Argument::get_typed`].
#[derive(Debug)]
pub struct TypedResult<T> {
    /// False when a precondition failed (an error has been reported).
    pub ok: bool,
    /// Location the argument resolved to.
    pub location: Option<LocationId>,
    /// Location holding an object of type `T`.
    pub object: Option<LocationId>,
    marker: PhantomData<fn() -> T>,
}

impl<T: Object> TypedResult<T> {
    /// Borrows the resolved object.
    pub fn get<'a>(&self, rt: &'a Automat) -> Option<&'a T> {
        rt.object_as::<T>(self.object?)
    }

    /// Mutably borrows the resolved object.
    pub fn get_mut<'a>(&self, rt: &'a mut Automat) -> Option<&'a mut T> {
        rt.object_as_mut::<T>(self.object?)
    }
}

/// Always-available argument linking a Location to the ones that run after
/// it.
pub static THEN: Argument = Argument::multiple("then", Precondition::Optional);

/// A named reference query.
#[derive(Clone, Debug)]
pub struct Argument {
    name: Cow<'static, str>,
    precondition: Precondition,
    quantity: Quantity,
    requirements: &'static [Requirement],
}

impl Argument {
    /// Single-target argument.
    pub const fn new(name: &'static str, precondition: Precondition) -> Self {
        Self {
            name: Cow::Borrowed(name),
            precondition,
            quantity: Quantity::Single,
            requirements: &[],
        }
    }

    /// Multi-target argument.
    pub const fn multiple(name: &'static str, precondition: Precondition) -> Self {
        Self {
            name: Cow::Borrowed(name),
            precondition,
            quantity: Quantity::Multiple,
            requirements: &[],
        }
    }

    /// Single-target argument with type requirements.
    pub const fn requiring(
        name: &'static str,
        precondition: Precondition,
        requirements: &'static [Requirement],
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            precondition,
            quantity: Quantity::Single,
            requirements,
        }
    }

    /// Argument whose name is only known at runtime.
    pub fn named(name: impl Into<String>, precondition: Precondition) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            precondition,
            quantity: Quantity::Single,
            requirements: &[],
        }
    }

    /// Connection label this argument answers to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Strictness level.
    pub fn precondition(&self) -> Precondition {
        self.precondition
    }

    /// Single or multiple.
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Type requirements.
    pub fn requirements(&self) -> &'static [Requirement] {
        self.requirements
    }

    /// Whether `object` satisfies every requirement.
    pub fn accepts(&self, object: &dyn Object) -> bool {
        self.requirements.iter().all(|requirement| (requirement.check)(object))
    }

    // --- Resolution ---

    /// Resolves the target Location without reporting anything.
    pub fn find_location(&self, rt: &Automat, here: LocationId) -> LocationResult {
        if let Some((_, connection)) = rt.outgoing_labelled(here, &self.name).next() {
            return LocationResult {
                ok: true,
                follow_pointers: connection.pointer_behavior() == PointerBehavior::FollowPointers,
                location: Some(connection.to()),
            };
        }
        LocationResult {
            ok: true,
            follow_pointers: true,
            location: rt.nearby(here, |location| location.name() == self.name),
        }
    }

    /// Resolves the Location holding the target object without reporting
    /// anything.
    pub fn find_object(&self, rt: &Automat, here: LocationId) -> Option<LocationId> {
        object_at(rt, &self.find_location(rt, here))
    }

    /// Resolves the target Location.
    ///
    /// With a precondition of at least [`Precondition::RequiresLocation`] a
    /// missing target is reported on `here`.
    #[track_caller]
    pub fn get_location(&self, rt: &mut Automat, here: LocationId) -> LocationResult {
        let found = self.find_location(rt, here);
        if found.location.is_none() && self.precondition >= Precondition::RequiresLocation {
            let message = format!(
                "The {} argument of {} is not connected.",
                self.name,
                rt.describe(here)
            );
            rt.report_error(here, message);
            return LocationResult { ok: false, ..found };
        }
        found
    }

    /// Resolves the target object, following Pointers unless the connection
    /// says otherwise.
    #[track_caller]
    pub fn get_object(&self, rt: &mut Automat, here: LocationId) -> ObjectResult {
        let location = self.get_location(rt, here);
        if !location.ok {
            return ObjectResult {
                ok: false,
                location: None,
                object: None,
            };
        }
        let object = object_at(rt, &location);
        let Some(held) = object else {
            if location.location.is_some() && self.precondition >= Precondition::RequiresObject {
                let message = format!("The {} argument of {} is empty.", self.name, rt.describe(here));
                rt.report_error(here, message);
                return ObjectResult {
                    ok: false,
                    location: location.location,
                    object: None,
                };
            }
            return ObjectResult {
                ok: true,
                location: location.location,
                object: None,
            };
        };
        if self.precondition >= Precondition::RequiresConcreteType
            && let Some(failed) = rt
                .object(held)
                .and_then(|object| self.requirements.iter().find(|r| !(r.check)(object)))
        {
            let message = format!(
                "The {} argument is not an instance of {}.",
                self.name, failed.type_name
            );
            rt.report_error(here, message);
            return ObjectResult {
                ok: false,
                location: location.location,
                object: None,
            };
        }
        ObjectResult {
            ok: true,
            location: location.location,
            object,
        }
    }

    /// Resolves the target object and narrows it to `T`.
    #[track_caller]
    pub fn get_typed<T: Object>(&self, rt: &mut Automat, here: LocationId) -> TypedResult<T> {
        let found = self.get_object(rt, here);
        let typed = found.object.filter(|&held| rt.object_as::<T>(held).is_some());
        let mut ok = found.ok;
        if ok
            && found.object.is_some_and(|held| !rt.is_busy(held))
            && typed.is_none()
            && self.precondition >= Precondition::RequiresConcreteType
        {
            let message = format!(
                "The {} argument is not an instance of {}.",
                self.name,
                short_type_name::<T>()
            );
            rt.report_error(here, message);
            ok = false;
        }
        TypedResult {
            ok,
            location: found.location,
            object: typed,
            marker: PhantomData,
        }
    }

    /// Visits every Location connected under this argument's label, in
    /// insertion order, until `visit` returns `Some`.
    pub fn loop_locations<R>(
        &self,
        rt: &mut Automat,
        here: LocationId,
        mut visit: impl FnMut(&mut Automat, LocationId) -> Option<R>,
    ) -> Option<R> {
        let targets: Vec<LocationId> = rt
            .outgoing_labelled(here, &self.name)
            .map(|(_, connection)| connection.to())
            .collect();
        targets.into_iter().find_map(|target| visit(rt, target))
    }

    /// Like [`loop_locations`](Self::loop_locations) but visits the
    /// Locations holding the resolved objects, skipping empty targets.
    pub fn loop_objects<R>(
        &self,
        rt: &mut Automat,
        here: LocationId,
        mut visit: impl FnMut(&mut Automat, LocationId) -> Option<R>,
    ) -> Option<R> {
        let targets: Vec<LocationResult> = rt
            .outgoing_labelled(here, &self.name)
            .map(|(_, connection)| LocationResult {
                ok: true,
                follow_pointers: connection.pointer_behavior() == PointerBehavior::FollowPointers,
                location: Some(connection.to()),
            })
            .collect();
        targets
            .iter()
            .filter_map(|target| object_at(rt, target))
            .collect::<Vec<_>>()
            .into_iter()
            .find_map(|object| visit(rt, object))
    }

    /// Location holding the object at the end of the argument, for callers
    /// that only need the final Location.
    pub fn get_final_location(&self, rt: &mut Automat, here: LocationId) -> Option<LocationId> {
        self.get_object(rt, here).object
    }

    // --- Live arguments ---

    fn live_targets(&self, rt: &Automat, here: LocationId) -> Vec<LocationId> {
        let targets: Vec<LocationId> = rt
            .outgoing_labelled(here, &self.name)
            .map(|(_, connection)| connection.to())
            .collect();
        if targets.is_empty() {
            rt.nearby(here, |location| location.name() == self.name)
                .into_iter()
                .collect()
        } else {
            targets
        }
    }

    /// Starts observing every current target of the argument.
    pub fn attach(&self, rt: &mut Automat, here: LocationId) {
        for target in self.live_targets(rt, here) {
            rt.observe_updates(here, target);
        }
    }

    /// Stops observing every current target of the argument.
    pub fn detach(&self, rt: &mut Automat, here: LocationId) {
        for target in self.live_targets(rt, here) {
            rt.stop_observing_updates(here, target);
        }
    }

    /// Moves subscriptions from `old` to `new`.
    pub fn relocate(&self, rt: &mut Automat, old: Option<LocationId>, new: Option<LocationId>) {
        if let Some(old) = old {
            self.detach(rt, old);
        }
        if let Some(new) = new {
            self.attach(rt, new);
        }
    }

    /// Observes the target of a freshly added connection and schedules an
    /// update, since the target may already hold a value.
    pub fn on_connection_added(&self, rt: &mut Automat, here: LocationId, connection: ConnectionId) {
        let Some(to) = rt.connection(connection).map(|c| c.to()) else {
            return;
        };
        rt.observe_updates(here, to);
        rt.schedule_local_update(here, to);
    }

    /// Stops observing `to` unless another connection with this label still
    /// points at it.
    pub fn on_connection_removed(&self, rt: &mut Automat, here: LocationId, to: LocationId) {
        let still_connected = rt
            .outgoing_labelled(here, &self.name)
            .any(|(_, connection)| connection.to() == to);
        if !still_connected {
            rt.stop_observing_updates(here, to);
        }
    }

    /// Renames a live argument, moving its subscriptions to the targets of
    /// the new name and scheduling an update of `here`.
    pub fn rename(&mut self, rt: &mut Automat, here: LocationId, name: impl Into<String>) {
        self.detach(rt, here);
        self.name = Cow::Owned(name.into());
        self.attach(rt, here);
        rt.schedule_update(here);
    }
}

fn object_at(rt: &Automat, found: &LocationResult) -> Option<LocationId> {
    let location = found.location?;
    if found.follow_pointers {
        rt.follow(location)
    } else {
        rt.object(location).map(|_| location)
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
