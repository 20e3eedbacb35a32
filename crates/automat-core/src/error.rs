//! Errors attached to Locations.
//!
//! A failing [`Object`] never unwinds through the scheduler. It reports an
//! [`Error`] on a Location instead; the error is forwarded to the Location's
//! error observers and to its parent [`Machine`](crate::Machine), which keeps
//! track of erroring children until they recover.

use std::fmt;

use crate::graph::{Automat, LocationId};
use crate::machine::Machine;
use crate::object::Object;

/// A failure recorded on a Location.
///
/// At most one error is held by a Location at any time. The first report
/// wins; later reports are ignored until the error is cleared.
pub struct Error {
    text: String,
    source: LocationId,
    saved_object: Option<Box<dyn Object>>,
    reported_at: &'static std::panic::Location<'static>,
}

impl Error {
    pub(crate) fn new(
        text: String,
        source: LocationId,
        reported_at: &'static std::panic::Location<'static>,
    ) -> Self {
        Self {
            text,
            source,
            saved_object: None,
            reported_at,
        }
    }

    /// Human readable message.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Location that reported the error.
    pub fn source(&self) -> LocationId {
        self.source
    }

    /// Source code position of the report.
    pub fn reported_at(&self) -> &'static std::panic::Location<'static> {
        self.reported_at
    }

    /// Object rescued from a Location that was about to lose it.
    pub fn saved_object(&self) -> Option<&dyn Object> {
        self.saved_object.as_deref()
    }

    /// Stores an object that would otherwise be dropped by the failing
    /// operation.
    pub fn save_object(&mut self, object: Box<dyn Object>) {
        self.saved_object = Some(object);
    }

    /// Takes the rescued object back out of the error.
    pub fn take_saved_object(&mut self) -> Option<Box<dyn Object>> {
        self.saved_object.take()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("text", &self.text)
            .field("source", &self.source)
            .field(
                "saved_object",
                &self.saved_object.as_ref().map(|object| object.name().to_string()),
            )
            .field("reported_at", &self.reported_at)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// --- Error reporting ---

impl Automat {
    /// Records an error on `id` unless one is already pending.
    ///
    /// A new error schedules an `Errored` task for every error observer of
    /// `id` and for its parent. Returns the error currently held by the
    /// Location, which is the older one when a report was ignored.
    #[track_caller]
    pub fn report_error(&mut self, id: LocationId, message: impl Into<String>) -> Option<&mut Error> {
        let reported_at = std::panic::Location::caller();
        let location = self.location_mut(id)?;
        if location.error.is_none() {
            let text = message.into();
            tracing::debug!(location = %id, error = %text, "report_error");
            location.error = Some(Error::new(text, id, reported_at));
            let observers: Vec<LocationId> = location.error_observers.iter().copied().collect();
            let parent = location.parent;
            for observer in observers {
                self.schedule_errored(observer, id);
            }
            if let Some(parent) = parent {
                self.schedule_errored(parent, id);
            }
        }
        self.location_mut(id)?.error.as_mut()
    }

    /// Reports that nothing named `name` could be found from `id`.
    #[track_caller]
    pub fn report_missing(&mut self, id: LocationId, name: &str) -> Option<&mut Error> {
        self.report_error(
            id,
            format!(
                "Couldn't find \"{name}\". You can create a connection or rename one of the nearby objects to fix this."
            ),
        )
    }

    /// Removes the error held by `id` and unwinds the parent's bookkeeping.
    pub fn clear_error(&mut self, id: LocationId) {
        let Some(location) = self.location_mut(id) else {
            return;
        };
        if location.error.take().is_some() {
            tracing::debug!(location = %id, "clear_error");
        }
        if let Some(parent) = location.parent {
            self.clear_child_error(parent, id);
        }
    }

    pub(crate) fn clear_child_error(&mut self, machine: LocationId, child: LocationId) {
        let Some(state) = self.machine_mut(machine) else {
            return;
        };
        if !state.forget_child_error(child) {
            return;
        }
        if !self.has_error(machine)
            && let Some(parent) = self.parent(machine)
        {
            self.clear_child_error(parent, machine);
        }
    }

    /// Returns true when `id` holds an error or is a Machine with erroring
    /// children.
    pub fn has_error(&self, id: LocationId) -> bool {
        let Some(location) = self.location(id) else {
            return false;
        };
        location.error.is_some() || self.machine(id).is_some_and(Machine::has_child_errors)
    }

    /// Error held by `id`, or for a Machine the first error among its
    /// children.
    pub fn error(&self, id: LocationId) -> Option<&Error> {
        let location = self.location(id)?;
        if let Some(error) = &location.error {
            return Some(error);
        }
        self.machine(id)?
            .children_with_errors()
            .iter()
            .find_map(|&child| self.error(child))
    }

    /// Collects every error held by Locations below `machine`, recursing into
    /// nested Machines.
    pub fn diagnostics(&self, machine: LocationId) -> Vec<(LocationId, &Error)> {
        let mut found = Vec::new();
        self.collect_diagnostics(machine, &mut found);
        found
    }

    fn collect_diagnostics<'a>(&'a self, machine: LocationId, found: &mut Vec<(LocationId, &'a Error)>) {
        let Some(location) = self.location(machine) else {
            return;
        };
        for &child in &location.children {
            if let Some(error) = self.location(child).and_then(|c| c.error.as_ref()) {
                found.push((child, error));
            }
            if self.machine(child).is_some() {
                self.collect_diagnostics(child, found);
            }
        }
    }
}
