//! Reading and writing values through Locations.
//!
//! Values are exchanged as text. A Location holding a [`Pointer`] forwards
//! reads and writes to the end of its pointer chain; `put`/`take` act on the
//! last Pointer of the chain, since that is the hop that owns the slot.
//!
//! [`Pointer`]: crate::Pointer

use std::cmp::Ordering;

use crate::object::Object;

use super::{Automat, GraphError, Location, LocationId};

/// Result of walking a Pointer chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FollowedPointers {
    /// Last Location on the chain holding a Pointer.
    pub last_pointer: Option<LocationId>,
    /// Location holding the final, non-Pointer object.
    pub target: Option<LocationId>,
}

impl Automat {
    // --- Pointers ---

    /// Walks the Pointer chain starting at `start`.
    ///
    /// A busy Location (see [`Automat::is_busy`]) ends the chain as its
    /// target. Fails with [`GraphError::PointerCycle`] when a Pointer is
    /// reached twice.
    pub fn follow_pointers(&self, start: LocationId) -> Result<FollowedPointers, GraphError> {
        let mut chain = FollowedPointers::default();
        let mut visited = Vec::new();
        let mut current = start;
        loop {
            let Some(object) = self.object(current) else {
                if self.is_busy(current) {
                    chain.target = Some(current);
                }
                return Ok(chain);
            };
            let Some(pointer) = object.as_pointer() else {
                chain.target = Some(current);
                return Ok(chain);
            };
            if visited.contains(&current) {
                return Err(GraphError::PointerCycle(start));
            }
            visited.push(current);
            chain.last_pointer = Some(current);
            match pointer.next(self, current) {
                Some(next) => current = next,
                None => return Ok(chain),
            }
        }
    }

    fn follow_pointers_reporting(&mut self, start: LocationId) -> Result<FollowedPointers, GraphError> {
        self.follow_pointers(start).inspect_err(|_| {
            self.report_error(start, "Pointer cycle detected.");
        })
    }

    /// Location holding the object `id` resolves to.
    ///
    /// Plain objects resolve to `id` itself. Empty Locations, dangling
    /// Pointers and Pointer cycles resolve to `None`.
    pub fn follow(&self, id: LocationId) -> Option<LocationId> {
        match self.follow_pointers(id) {
            Ok(chain) => chain.target,
            Err(error) => {
                tracing::warn!("{error}");
                None
            }
        }
    }

    /// Stores `object` at `id`, or through the last Pointer when `id` holds
    /// one.
    pub fn put(
        &mut self,
        id: LocationId,
        object: Box<dyn Object>,
    ) -> Result<Option<Box<dyn Object>>, GraphError> {
        match self.follow_pointers_reporting(id)?.last_pointer {
            Some(pointer) => Ok(self
                .with_object(pointer, |held, rt| {
                    held.as_pointer_mut()
                        .and_then(|p| p.put_next(rt, pointer, object))
                })
                .flatten()),
            None => self.insert(id, object),
        }
    }

    /// Takes the object out of `id`, or through the last Pointer when `id`
    /// holds one.
    pub fn take(&mut self, id: LocationId) -> Result<Option<Box<dyn Object>>, GraphError> {
        match self.follow_pointers_reporting(id)?.last_pointer {
            Some(pointer) => Ok(self
                .with_object(pointer, |held, rt| {
                    held.as_pointer_mut().and_then(|p| p.take_next(rt, pointer))
                })
                .flatten()),
            None => self.take_object(id),
        }
    }

    // --- Text & numbers ---

    /// Text of the object `id` resolves to, empty when there is none.
    pub fn text(&self, id: LocationId) -> String {
        self.follow(id)
            .and_then(|target| Some(self.object(target)?.text(self, target)))
            .unwrap_or_default()
    }

    /// Writes `text` into the object `id` resolves to and schedules an
    /// update of `id`.
    ///
    /// Nothing happens when the current text already equals `text`, or when
    /// the write lands on a busy object: the running callback owns that value.
    pub fn set_text(&mut self, id: LocationId, text: &str) {
        if self.text(id) == text {
            return;
        }
        let Ok(chain) = self.follow_pointers_reporting(id) else {
            return;
        };
        match chain.target {
            Some(target) if self.is_busy(target) => {
                tracing::trace!(location = %target, "write into a busy object skipped");
                return;
            }
            Some(target) => {
                self.with_object(target, |object, rt| object.set_text(rt, target, text));
            }
            None if chain.last_pointer.is_some() => {
                self.report_error(id, "Can't set text on null pointer");
                return;
            }
            None => {
                self.report_error(id, "Can't set text on an empty location");
                return;
            }
        }
        self.schedule_update(id);
    }

    /// Text of `id` parsed as a number, NaN when it is not one.
    pub fn number(&self, id: LocationId) -> f64 {
        self.text(id).trim().parse().unwrap_or(f64::NAN)
    }

    /// Writes `number` as text. Whole numbers have no fractional part.
    pub fn set_number(&mut self, id: LocationId, number: f64) {
        self.set_text(id, &number.to_string());
    }

    /// Orders the objects `a` and `b` resolve to.
    pub fn compare(&self, a: LocationId, b: LocationId) -> Option<Ordering> {
        let a = self.follow(a)?;
        let b = self.follow(b)?;
        self.object(a)?.compare(self, a, self.object(b)?, b)
    }

    // --- Proximity search ---

    /// First Location near `here` matching `predicate`.
    ///
    /// Searches the siblings of `here` in creation order, then the siblings
    /// of its parent, and so on up to the root. `here` itself is skipped.
    pub fn nearby(
        &self,
        here: LocationId,
        mut predicate: impl FnMut(&Location) -> bool,
    ) -> Option<LocationId> {
        let mut current = here;
        while let Some(parent) = self.parent(current) {
            for &sibling in self.children(parent) {
                if sibling == current {
                    continue;
                }
                if let Some(location) = self.location(sibling)
                    && predicate(location)
                {
                    return Some(sibling);
                }
            }
            current = parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Machine;
    use crate::testing::{Cell, Hop};

    fn machine() -> (Automat, LocationId) {
        let mut rt = Automat::new();
        let root = rt.root();
        rt.insert(root, Box::new(Machine::new("test"))).unwrap();
        (rt, root)
    }

    #[test]
    fn text_follows_pointer_chain() {
        let (mut rt, root) = machine();
        let value = rt.create(root, &Cell::new("42"), "value").unwrap();
        let second = rt.create(root, &Hop::to(value), "second").unwrap();
        let first = rt.create(root, &Hop::to(second), "first").unwrap();

        assert_eq!(rt.text(first), "42");
        let chain = rt.follow_pointers(first).unwrap();
        assert_eq!(chain.last_pointer, Some(second));
        assert_eq!(chain.target, Some(value));
    }

    #[test]
    fn pointer_cycle_is_detected() {
        let (mut rt, root) = machine();
        let a = rt.add_location(root, "a").unwrap();
        let b = rt.create(root, &Hop::to(a), "b").unwrap();
        rt.insert(a, Box::new(Hop::to(b))).unwrap();

        assert_eq!(rt.follow_pointers(a), Err(GraphError::PointerCycle(a)));
        assert_eq!(rt.follow(a), None);
        assert_eq!(rt.text(a), "");

        rt.set_text(a, "x");
        assert_eq!(rt.error(a).unwrap().text(), "Pointer cycle detected.");
    }

    #[test]
    fn set_text_writes_through_pointer_and_schedules_update() {
        let (mut rt, root) = machine();
        let value = rt.create(root, &Cell::new("1"), "value").unwrap();
        let pointer = rt.create(root, &Hop::to(value), "pointer").unwrap();
        let watcher = rt.add_location(root, "watcher").unwrap();
        rt.observe_updates(watcher, pointer);

        rt.set_text(pointer, "2");

        assert_eq!(rt.text(value), "2");
        assert_eq!(rt.pending_tasks(), 1);
    }

    #[test]
    fn set_text_with_equal_text_is_a_no_op() {
        let (mut rt, root) = machine();
        let value = rt.create(root, &Cell::new("same"), "value").unwrap();
        let watcher = rt.add_location(root, "watcher").unwrap();
        rt.observe_updates(watcher, value);

        rt.set_text(value, "same");
        assert_eq!(rt.pending_tasks(), 0);
    }

    #[test]
    fn write_into_busy_object_is_skipped() {
        let (mut rt, root) = machine();
        let value = rt.create(root, &Cell::new("1"), "value").unwrap();
        let pointer = rt.create(root, &Hop::to(value), "pointer").unwrap();

        rt.with_object(value, |_, rt| {
            assert!(rt.is_busy(value));
            assert_eq!(rt.follow(pointer), Some(value));
            rt.set_text(pointer, "2");
        });

        assert!(!rt.is_busy(value));
        assert!(rt.error(pointer).is_none());
        assert_eq!(rt.text(value), "1");
        assert_eq!(rt.pending_tasks(), 0);
    }

    #[test]
    fn put_and_take_go_through_last_pointer() {
        let (mut rt, root) = machine();
        let slot = rt.add_location(root, "slot").unwrap();
        let pointer = rt.create(root, &Hop::to(slot), "pointer").unwrap();

        rt.put(pointer, Box::new(Cell::new("moved"))).unwrap();
        assert_eq!(rt.text(slot), "moved");
        assert!(rt.object_as::<Hop>(pointer).is_some());

        let taken = rt.take(pointer).unwrap().unwrap();
        assert_eq!(taken.name(), "Cell");
        assert!(rt.object(slot).is_none());
    }

    #[test]
    fn numbers_round_trip_through_text() {
        let (mut rt, root) = machine();
        let value = rt.create(root, &Cell::new("0"), "value").unwrap();
        rt.set_number(value, 41.0);
        assert_eq!(rt.text(value), "41");
        rt.set_number(value, 2.5);
        assert_eq!(rt.number(value), 2.5);
        rt.set_text(value, "abc");
        assert!(rt.number(value).is_nan());
    }

    #[test]
    fn nearby_prefers_siblings_then_ancestors() {
        let (mut rt, root) = machine();
        let outer_target = rt.add_location(root, "target").unwrap();
        let inner = rt.create(root, &Machine::new("inner"), "inner").unwrap();
        let here = rt.add_location(inner, "here").unwrap();

        assert_eq!(rt.nearby(here, |l| l.name() == "target"), Some(outer_target));

        let inner_target = rt.add_location(inner, "target").unwrap();
        assert_eq!(rt.nearby(here, |l| l.name() == "target"), Some(inner_target));
        assert_eq!(rt.nearby(here, |l| l.name() == "here"), None);
        // Ancestors are never matched by their own name.
        assert_eq!(rt.nearby(here, |l| l.name() == "inner"), None);
    }
}
