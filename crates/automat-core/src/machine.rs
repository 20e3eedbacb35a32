//! Containers of child Locations.
//!
//! The child list itself lives in the arena (see [`Location::children`]); the
//! [`Machine`] object is what makes a Location a container. It keeps the
//! front panel, tracks which children currently have errors and carries
//! cloned children until it is placed somewhere.
//!
//! [`Location::children`]: crate::Location::children

use crate::graph::{Automat, GraphError, LocationId, Vec2};
use crate::object::Object;

pub(crate) struct PendingChild {
    pub name: String,
    pub position: Vec2,
    pub object: Option<Box<dyn Object>>,
}

impl PendingChild {
    fn clone_with(&self, rt: &Automat) -> Self {
        Self {
            name: self.name.clone(),
            position: self.position,
            object: self.object.as_ref().map(|object| object.clone_object(rt)),
        }
    }
}

/// A container of child Locations.
#[derive(Default)]
pub struct Machine {
    name: String,
    here: Option<LocationId>,
    front: Vec<LocationId>,
    children_with_errors: Vec<LocationId>,
    pending: Vec<PendingChild>,
}

impl Machine {
    /// Creates an empty Machine.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Location the Machine is placed at.
    pub fn location(&self) -> Option<LocationId> {
        self.here
    }

    /// Children exposed on the front panel.
    pub fn front_panel(&self) -> &[LocationId] {
        &self.front
    }

    /// Children currently holding (or containing) an error.
    pub fn children_with_errors(&self) -> &[LocationId] {
        &self.children_with_errors
    }

    /// Whether any child currently has an error.
    pub fn has_child_errors(&self) -> bool {
        !self.children_with_errors.is_empty()
    }

    /// Names of the children carried by an unplaced clone.
    pub fn pending_children(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(|child| child.name.as_str())
    }

    pub(crate) fn forget_child_error(&mut self, child: LocationId) -> bool {
        let before = self.children_with_errors.len();
        self.children_with_errors.retain(|&c| c != child);
        before != self.children_with_errors.len()
    }

    pub(crate) fn forget_front(&mut self, child: LocationId) {
        self.front.retain(|&c| c != child);
    }
}

impl Object for Machine {
    fn name(&self) -> &str {
        if self.name.is_empty() {
            "Machine"
        } else {
            &self.name
        }
    }

    fn clone_object(&self, rt: &Automat) -> Box<dyn Object> {
        let pending = match self.here {
            Some(here) => rt
                .children(here)
                .iter()
                .filter_map(|&child| rt.location(child))
                .map(|location| PendingChild {
                    name: location.name().to_string(),
                    position: location.position(),
                    object: location.object().map(|object| object.clone_object(rt)),
                })
                .collect(),
            None => self.pending.iter().map(|child| child.clone_with(rt)).collect(),
        };
        Box::new(Machine {
            name: self.name.clone(),
            pending,
            ..Machine::default()
        })
    }

    fn text(&self, _rt: &Automat, _here: LocationId) -> String {
        self.name.clone()
    }

    fn relocate(&mut self, rt: &mut Automat, old: Option<LocationId>, new: Option<LocationId>) {
        if let Some(old) = old {
            let detached = rt.detach_children(old);
            self.pending.extend(detached);
            self.front.clear();
            self.children_with_errors.clear();
        }
        self.here = new;
        if let Some(new) = new {
            for child in std::mem::take(&mut self.pending) {
                rt.materialize_child(new, child);
            }
        }
    }

    fn errored(&mut self, rt: &mut Automat, here: LocationId, errored: LocationId) {
        // Observers may already have cleared it.
        if !rt.has_error(errored) {
            return;
        }
        if !self.children_with_errors.contains(&errored) {
            self.children_with_errors.push(errored);
        }
        let observers: Vec<LocationId> = rt
            .location(here)
            .map(|location| location.error_observers().collect())
            .unwrap_or_default();
        for observer in observers {
            rt.schedule_errored(observer, errored);
        }

        if let Some(parent) = rt.parent(here) {
            rt.schedule_errored(parent, here);
        } else if let Some(error) = rt.error(errored) {
            tracing::error!(
                machine = %self.name,
                location = %rt.describe(errored),
                reported_at = %error.reported_at(),
                "{}",
                error.text()
            );
        }
    }

    fn as_machine(&self) -> Option<&Machine> {
        Some(self)
    }

    fn as_machine_mut(&mut self) -> Option<&mut Machine> {
        Some(self)
    }
}

// --- Front panel ---

impl Automat {
    /// Exposes `child` on the front panel of `machine`.
    ///
    /// Adding a child twice is logged and ignored.
    pub fn add_to_front_panel(&mut self, machine: LocationId, child: LocationId) -> Result<(), GraphError> {
        let state = self
            .machine_mut(machine)
            .ok_or(GraphError::NotAMachine(machine))?;
        if state.front.contains(&child) {
            tracing::error!("attempted to add already present {child} to the front panel of {machine}");
        } else {
            state.front.push(child);
        }
        Ok(())
    }

    /// Front panel entry of `machine` called `name`.
    pub fn front(&self, machine: LocationId, name: &str) -> Option<LocationId> {
        let found = self
            .machine(machine)?
            .front
            .iter()
            .copied()
            .find(|&child| self.name(child) == name);
        if found.is_none() {
            tracing::error!("component \"{name}\" of {} is missing", self.describe(machine));
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Cell;

    fn machine() -> (Automat, LocationId) {
        let mut rt = Automat::new();
        let root = rt.root();
        rt.insert(root, Box::new(Machine::new("outer"))).unwrap();
        (rt, root)
    }

    #[test]
    fn clone_is_deep() {
        let (mut rt, root) = machine();
        let original = rt.create(root, &Machine::new("inner"), "original").unwrap();
        let a = rt.create(original, &Cell::new("1"), "a").unwrap();
        rt.create(original, &Cell::new("2"), "b").unwrap();

        let prototype = rt.object(original).unwrap().clone_object(&rt);
        let pending: Vec<&str> = prototype.as_machine().unwrap().pending_children().collect();
        assert_eq!(pending, ["a", "b"]);

        let copy = rt.add_location(root, "copy").unwrap();
        rt.insert(copy, prototype).unwrap();
        let names: Vec<&str> = rt.children(copy).iter().map(|&c| rt.name(c)).collect();
        assert_eq!(names, ["a", "b"]);

        let copy_a = rt.child(copy, "a").unwrap();
        assert_ne!(copy_a, a);
        rt.set_text(copy_a, "changed");
        assert_eq!(rt.text(copy_a), "changed");
        assert_eq!(rt.text(a), "1");
        assert_eq!(rt.parent(copy_a), Some(copy));
    }

    #[test]
    fn nested_machines_clone_recursively() {
        let (mut rt, root) = machine();
        let outer = rt.create(root, &Machine::new("outer"), "outer").unwrap();
        let inner = rt.create(outer, &Machine::new("inner"), "inner").unwrap();
        rt.create(inner, &Cell::new("deep"), "leaf").unwrap();

        let prototype = rt.object(outer).unwrap().clone_object(&rt);
        let copy = rt.create(root, prototype.as_ref(), "copy").unwrap();
        let copy_inner = rt.child(copy, "inner").unwrap();
        let copy_leaf = rt.child(copy_inner, "leaf").unwrap();
        assert_eq!(rt.text(copy_leaf), "deep");
    }

    #[test]
    fn front_panel_lookup() {
        let (mut rt, root) = machine();
        let a = rt.create(root, &Cell::new("1"), "a").unwrap();
        rt.add_to_front_panel(root, a).unwrap();
        rt.add_to_front_panel(root, a).unwrap();

        assert_eq!(rt.machine(root).unwrap().front_panel(), &[a]);
        assert_eq!(rt.front(root, "a"), Some(a));
        assert_eq!(rt.front(root, "b"), None);
    }

    #[test]
    fn child_errors_propagate_and_clear() {
        let (mut rt, root) = machine();
        let inner = rt.create(root, &Machine::new("inner"), "inner").unwrap();
        let leaf = rt.create(inner, &Cell::new("x"), "leaf").unwrap();

        rt.report_error(leaf, "broken");
        rt.run_loop(None);

        assert!(rt.has_error(inner));
        assert!(rt.has_error(root));
        assert_eq!(rt.error(root).unwrap().text(), "broken");
        let diagnostics: Vec<_> = rt
            .diagnostics(root)
            .into_iter()
            .map(|(location, error)| (location, error.text().to_string()))
            .collect();
        assert_eq!(diagnostics, vec![(leaf, "broken".to_string())]);

        rt.clear_error(leaf);
        assert!(!rt.has_error(inner));
        assert!(!rt.has_error(root));
    }

    #[test]
    fn taking_a_machine_keeps_its_children() {
        let (mut rt, root) = machine();
        let inner = rt.create(root, &Machine::new("inner"), "inner").unwrap();
        rt.create(inner, &Cell::new("kept"), "leaf").unwrap();

        let taken = rt.take_object(inner).unwrap().unwrap();
        assert!(rt.children(inner).is_empty());

        let elsewhere = rt.add_location(root, "elsewhere").unwrap();
        rt.insert(elsewhere, taken).unwrap();
        let leaf = rt.child(elsewhere, "leaf").unwrap();
        assert_eq!(rt.text(leaf), "kept");
    }
}
