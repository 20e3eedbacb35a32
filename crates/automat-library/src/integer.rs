//! Whole numbers and the action that counts them up.

use std::cmp::Ordering;

use automat_core::{Argument, Automat, LocationId, Object, Precondition, Requirement};

/// A whole number.
///
/// Text that parses as a fractional number is rounded; anything else is
/// reported as an error and leaves the value unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Integer {
    value: i32,
}

impl Integer {
    /// Creates an Integer holding `value`.
    pub fn new(value: i32) -> Self {
        Self { value }
    }

    /// Current value.
    pub fn value(&self) -> i32 {
        self.value
    }

    /// Replaces the value without scheduling anything.
    pub fn set(&mut self, value: i32) {
        self.value = value;
    }
}

fn parse_integer(text: &str) -> Option<i32> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<i32>() {
        return Some(value);
    }
    let number = trimmed.parse::<f64>().ok()?;
    let rounded = number.round();
    (rounded.is_finite() && rounded >= f64::from(i32::MIN) && rounded <= f64::from(i32::MAX))
        .then_some(rounded as i32)
}

impl Object for Integer {
    fn name(&self) -> &str {
        "Integer"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(*self)
    }

    fn text(&self, _rt: &Automat, _here: LocationId) -> String {
        self.value.to_string()
    }

    fn set_text(&mut self, rt: &mut Automat, here: LocationId, text: &str) {
        match parse_integer(text) {
            Some(value) => {
                self.value = value;
                rt.clear_error(here);
            }
            None => {
                rt.report_error(here, format!("\"{text}\" is not a whole number."));
            }
        }
    }

    fn compare(
        &self,
        rt: &Automat,
        _here: LocationId,
        other: &dyn Object,
        other_here: LocationId,
    ) -> Option<Ordering> {
        if let Some(other) = other.as_any().downcast_ref::<Integer>() {
            return Some(self.value.cmp(&other.value));
        }
        let number: f64 = other.text(rt, other_here).trim().parse().ok()?;
        f64::from(self.value).partial_cmp(&number)
    }
}

static TARGET: Argument = Argument::requiring(
    "target",
    Precondition::RequiresConcreteType,
    &[Requirement::instance_of::<Integer>("Integer")],
);

/// Adds one to the [`Integer`] connected as `target` when run.
#[derive(Clone, Copy, Debug, Default)]
pub struct Increment;

impl Object for Increment {
    fn name(&self) -> &str {
        "Increment"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(Increment)
    }

    fn run(&mut self, rt: &mut Automat, here: LocationId) {
        let target = TARGET.get_typed::<Integer>(rt, here);
        let (Some(location), Some(object)) = (target.location, target.object) else {
            return;
        };
        let Some(integer) = target.get_mut(rt) else {
            return;
        };
        integer.value = integer.value.wrapping_add(1);
        rt.schedule_update(object);
        if location != object {
            rt.schedule_update(location);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine;
    use automat_core::Machine;

    #[test]
    fn text_round_trip() {
        let (mut rt, root) = machine();
        let number = rt.create(root, &Integer::new(7), "n").unwrap();
        assert_eq!(rt.text(number), "7");

        rt.set_text(number, " -12 ");
        assert_eq!(rt.object_as::<Integer>(number).unwrap().value(), -12);
        rt.set_number(number, 41.0);
        assert_eq!(rt.text(number), "41");
        rt.set_text(number, "2.6");
        assert_eq!(rt.text(number), "3");
    }

    #[test]
    fn garbage_is_reported_and_cleared() {
        let (mut rt, root) = machine();
        let number = rt.create(root, &Integer::new(1), "n").unwrap();

        rt.set_text(number, "abc");
        assert_eq!(rt.text(number), "1");
        assert_eq!(rt.error(number).unwrap().text(), "\"abc\" is not a whole number.");

        rt.set_text(number, "5");
        assert!(!rt.has_error(number));
    }

    #[test]
    fn increment_updates_observers() {
        let (mut rt, root) = machine();
        let number = rt.create(root, &Integer::default(), "n").unwrap();
        let increment = rt.create(root, &Increment, "inc").unwrap();
        let watcher = rt.add_location(root, "watcher").unwrap();
        rt.connect(increment, number, "target").unwrap();
        rt.observe_updates(watcher, number);

        rt.schedule_run(increment);
        rt.schedule_run(increment);
        rt.run_loop(None);

        assert_eq!(rt.text(number), "2");
        // Two runs, each followed by one update of the watcher.
        assert_eq!(rt.executed_tasks(), 4);
    }

    #[test]
    fn increment_rejects_other_objects() {
        let (mut rt, root) = machine();
        let other = rt.create(root, &Machine::new("inner"), "inner").unwrap();
        let increment = rt.create(root, &Increment, "inc").unwrap();
        rt.connect(increment, other, "target").unwrap();

        rt.schedule_run(increment);
        rt.run_loop(None);
        assert_eq!(
            rt.error(increment).unwrap().text(),
            "The target argument is not an instance of Integer."
        );
    }

    #[test]
    fn compares_numerically() {
        let (rt, _) = machine();
        let here = rt.root();
        let a = Integer::new(9);
        let b = Integer::new(10);
        assert_eq!(a.compare(&rt, here, &b, here), Some(Ordering::Less));
    }
}
