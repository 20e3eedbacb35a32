//! Object capabilities.
//!
//! Everything stored in a Location implements [`Object`]. Specialised
//! behaviour is exposed through optional accessors instead of a class
//! hierarchy:
//!
//! - [`Object::as_pointer`]: the object is one hop of indirection
//!   ([`Pointer`]).
//! - [`Object::as_machine`]: the object is a container of child Locations
//!   ([`Machine`]).
//! - [`Object::args`]: the object declares live [`Argument`]s that must
//!   follow it when it moves (a "live object").
//!
//! Concrete types are recovered with [`AsAny`] through
//! [`Automat::object_as`].

use std::any::Any;
use std::cmp::Ordering;

use crate::argument::Argument;
use crate::graph::{Automat, ConnectionId, LocationId};
use crate::machine::Machine;

/// Upcast to [`Any`] for concrete-type narrowing.
///
/// Implemented for every `'static` type.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A value with behaviour, stored in a Location.
///
/// Every callback receives the [`Automat`] and the id of the Location the
/// object lives at (`here`). During a `&mut self` callback the object is
/// temporarily moved out of `here`, so it must use `self` rather than look
/// itself up in the arena.
pub trait Object: AsAny {
    /// Kind name used in messages, e.g. `"Integer"`.
    fn name(&self) -> &str;

    /// Deep copy used to instantiate prototypes.
    fn clone_object(&self, rt: &Automat) -> Box<dyn Object>;

    /// Textual value.
    fn text(&self, _rt: &Automat, _here: LocationId) -> String {
        String::new()
    }

    /// Replaces the value from text. Parse failures are reported on `here`.
    fn set_text(&mut self, _rt: &mut Automat, _here: LocationId, _text: &str) {}

    /// Performs the object's action.
    fn run(&mut self, _rt: &mut Automat, _here: LocationId) {}

    /// Called when an observed Location changed. Runs the object by default.
    fn updated(&mut self, rt: &mut Automat, here: LocationId, _updated: LocationId) {
        self.run(rt, here);
    }

    /// Called when an observed Location (or a child) reported an error.
    fn errored(&mut self, _rt: &mut Automat, _here: LocationId, _errored: LocationId) {}

    /// Enumerates the live arguments of the object.
    fn args(&self, _visit: &mut dyn FnMut(&Argument)) {}

    /// Called when the object moves. `old` is `None` on insertion and `new`
    /// is `None` when the object is taken out.
    ///
    /// The default re-homes every live argument.
    fn relocate(&mut self, rt: &mut Automat, old: Option<LocationId>, new: Option<LocationId>) {
        self.args(&mut |arg| arg.relocate(rt, old, new));
    }

    /// Called after a connection labelled `label` was added to `here`.
    fn connection_added(
        &mut self,
        rt: &mut Automat,
        here: LocationId,
        label: &str,
        connection: ConnectionId,
    ) {
        self.args(&mut |arg| {
            if arg.name() == label {
                arg.on_connection_added(rt, here, connection);
            }
        });
    }

    /// Called after a connection labelled `label` from `here` to `to` was
    /// removed.
    fn connection_removed(&mut self, rt: &mut Automat, here: LocationId, label: &str, to: LocationId) {
        self.args(&mut |arg| {
            if arg.name() == label {
                arg.on_connection_removed(rt, here, to);
            }
        });
    }

    /// Orders this object against `other`. Compares text by default.
    fn compare(
        &self,
        rt: &Automat,
        here: LocationId,
        other: &dyn Object,
        other_here: LocationId,
    ) -> Option<Ordering> {
        Some(self.text(rt, here).cmp(&other.text(rt, other_here)))
    }

    /// Pointer capability.
    fn as_pointer(&self) -> Option<&dyn Pointer> {
        None
    }

    /// Mutable Pointer capability.
    fn as_pointer_mut(&mut self) -> Option<&mut dyn Pointer> {
        None
    }

    /// Machine capability.
    fn as_machine(&self) -> Option<&Machine> {
        None
    }

    /// Mutable Machine capability.
    fn as_machine_mut(&mut self) -> Option<&mut Machine> {
        None
    }
}

/// One hop of indirection.
///
/// Reads through a Location holding a Pointer continue at [`next`]; writes
/// (`put`/`take`) are delegated to the last Pointer of a chain.
///
/// [`next`]: Pointer::next
pub trait Pointer {
    /// Location this Pointer currently refers to.
    fn next(&self, rt: &Automat, here: LocationId) -> Option<LocationId>;

    /// Stores `object` in the referred Location, returning what it replaced.
    ///
    /// When the Pointer refers to nothing, the object is rescued into an
    /// error on `here`.
    fn put_next(
        &mut self,
        rt: &mut Automat,
        here: LocationId,
        object: Box<dyn Object>,
    ) -> Option<Box<dyn Object>> {
        match self.next(rt, here) {
            Some(next) => rt.insert(next, object).ok().flatten(),
            None => {
                if let Some(error) = rt.report_error(here, "Pointer doesn't refer to anything.") {
                    error.save_object(object);
                }
                None
            }
        }
    }

    /// Takes the object out of the referred Location.
    fn take_next(&mut self, rt: &mut Automat, here: LocationId) -> Option<Box<dyn Object>> {
        let next = self.next(rt, here)?;
        rt.take_object(next).ok().flatten()
    }
}
