//! Equations kept solved.
//!
//! A [`Blackboard`] holds a formula such as `F = C * 9 / 5 + 32`. A
//! [`BlackboardUpdater`] placed in the same Machine turns every Blackboard
//! next to it into one formula per variable and watches the Locations named
//! after the variables:
//!
//! ```text
//! Blackboard  "F = C * 9 / 5 + 32"
//!     F <- C * 9 / 5 + 32
//!     C <- (F - 32) * 5 / 9
//! ```
//!
//! When the Location `C` changes, `F` is recomputed and written, and the
//! other way round. Writes happen with the updater's own scheduling
//! suppressed, so the value it just wrote does not bounce back into it.
//! A target with an incoming `const` connection is never written.

use std::collections::BTreeMap;

use automat_core::{Argument, Automat, LocationId, Object, Precondition};

use crate::algebra::{self, Expr, Statement};

/// Formula text.
#[derive(Clone, Debug, Default)]
pub struct Blackboard {
    source: String,
    statement: Option<Statement>,
}

impl Blackboard {
    /// Creates a Blackboard holding `formula`.
    ///
    /// A formula that does not parse is kept as text and solves nothing.
    pub fn new(formula: &str) -> Self {
        Self {
            source: formula.to_string(),
            statement: algebra::parse(formula).ok(),
        }
    }

    /// Parsed formula.
    pub fn statement(&self) -> Option<&Statement> {
        self.statement.as_ref()
    }
}

impl Object for Blackboard {
    fn name(&self) -> &str {
        "Blackboard"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn text(&self, _rt: &Automat, _here: LocationId) -> String {
        self.source.clone()
    }

    fn set_text(&mut self, rt: &mut Automat, here: LocationId, text: &str) {
        self.source = text.to_string();
        match algebra::parse(text) {
            Ok(statement) => {
                self.statement = Some(statement);
                rt.clear_error(here);
            }
            Err(error) => {
                self.statement = None;
                rt.report_error(here, format!("Can't parse \"{text}\": {error}."));
            }
        }
    }
}

/// Keeps the variables of nearby [`Blackboard`]s consistent.
#[derive(Clone, Debug, Default)]
pub struct BlackboardUpdater {
    formulas: BTreeMap<String, Expr>,
    inputs: BTreeMap<String, Argument>,
    blackboards: Vec<LocationId>,
}

impl BlackboardUpdater {
    /// Expression currently used to compute `variable`.
    pub fn formula(&self, variable: &str) -> Option<&Expr> {
        self.formulas.get(variable)
    }

    /// Variables read by at least one formula.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    fn detach(&mut self, rt: &mut Automat, here: LocationId) {
        for input in self.inputs.values() {
            input.detach(rt, here);
        }
        for blackboard in self.blackboards.drain(..) {
            rt.stop_observing_updates(here, blackboard);
        }
    }

    fn rebuild(&mut self, rt: &mut Automat, here: LocationId) {
        self.detach(rt, here);
        self.formulas.clear();
        self.inputs.clear();
        let Some(machine) = rt.parent(here) else {
            return;
        };
        self.blackboards = rt
            .children(machine)
            .iter()
            .copied()
            .filter(|&child| rt.object_as::<Blackboard>(child).is_some())
            .collect();
        for &blackboard in &self.blackboards {
            rt.observe_updates(here, blackboard);
        }
        for &blackboard in &self.blackboards {
            let Some(statement) = rt.object_as::<Blackboard>(blackboard).and_then(Blackboard::statement)
            else {
                continue;
            };
            for variable in statement.variables() {
                let Some(formula) = statement.solve_for(variable) else {
                    continue;
                };
                for input in formula.variables() {
                    self.inputs
                        .entry(input.to_string())
                        .or_insert_with(|| Argument::named(input, Precondition::RequiresObject));
                }
                self.formulas.insert(variable.to_string(), formula);
            }
        }
        for input in self.inputs.values() {
            input.attach(rt, here);
        }
        tracing::debug!(
            updater = %rt.describe(here),
            formulas = self.formulas.len(),
            inputs = self.inputs.len(),
            "blackboard formulas derived"
        );
    }
}

fn read_variable(rt: &mut Automat, here: LocationId, variable: &str) -> f64 {
    let argument = Argument::named(variable, Precondition::RequiresObject);
    match argument.find_object(rt, here) {
        Some(object) => rt.number(object),
        None => {
            rt.report_missing(here, variable);
            f64::NAN
        }
    }
}

impl Object for BlackboardUpdater {
    fn name(&self) -> &str {
        "Blackboard Updater"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(BlackboardUpdater::default())
    }

    fn updated(&mut self, rt: &mut Automat, here: LocationId, updated: LocationId) {
        if self.blackboards.contains(&updated) {
            self.rebuild(rt, here);
            return;
        }
        rt.clear_error(here);
        let changed = rt.name(updated).to_string();
        let formulas = &self.formulas;
        rt.without_scheduling(here, |rt| {
            for (variable, formula) in formulas {
                if formula.occurrences(&changed) == 0 {
                    continue;
                }
                let target = Argument::named(variable.as_str(), Precondition::RequiresObject);
                let Some(location) = target.find_location(rt, here).location else {
                    rt.report_missing(here, variable);
                    continue;
                };
                if rt.has_incoming(location, "const") {
                    continue;
                }
                let value = formula.eval(&mut |name| read_variable(rt, here, name));
                if value.is_nan() {
                    continue;
                }
                rt.set_number(location, value);
            }
        });
    }

    fn args(&self, visit: &mut dyn FnMut(&Argument)) {
        for input in self.inputs.values() {
            visit(input);
        }
    }

    fn relocate(&mut self, rt: &mut Automat, old: Option<LocationId>, new: Option<LocationId>) {
        if let Some(old) = old {
            self.detach(rt, old);
        }
        if let Some(new) = new {
            self.rebuild(rt, new);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Integer, machine};

    #[test]
    fn bad_formula_is_reported() {
        let (mut rt, root) = machine();
        let board = rt.create(root, &Blackboard::default(), "board").unwrap();
        rt.set_text(board, "x = (1");
        assert_eq!(rt.text(board), "x = (1");
        assert_eq!(
            rt.error(board).unwrap().text(),
            "Can't parse \"x = (1\": unexpected end of formula."
        );
        assert!(rt.object_as::<Blackboard>(board).unwrap().statement().is_none());
    }

    #[test]
    fn updater_derives_a_formula_per_variable() {
        let (mut rt, root) = machine();
        let a = rt.create(root, &Integer::new(1), "a").unwrap();
        let b = rt.create(root, &Integer::new(2), "b").unwrap();
        let _board = rt.create(root, &Blackboard::new("b = a * 2 + 1"), "board").unwrap();
        let updater = rt.create(root, &BlackboardUpdater::default(), "updater").unwrap();

        let state = rt.object_as::<BlackboardUpdater>(updater).unwrap();
        assert_eq!(state.formula("b").unwrap().to_string(), "((a * 2) + 1)");
        assert_eq!(state.formula("a").unwrap().to_string(), "((b - 1) / 2)");
        assert_eq!(state.inputs().collect::<Vec<_>>(), ["a", "b"]);
        let observed: Vec<_> = rt.location(updater).unwrap().observing_updates().collect();
        assert!(observed.contains(&a) && observed.contains(&b));

        rt.set_text(a, "4");
        rt.run_loop(None);
        assert_eq!(rt.text(b), "9");

        rt.set_text(b, "21");
        rt.run_loop(None);
        assert_eq!(rt.text(a), "10");
        assert!(!rt.has_error(updater));
    }

    #[test]
    fn const_targets_are_left_alone() {
        let (mut rt, root) = machine();
        let a = rt.create(root, &Integer::new(1), "a").unwrap();
        let b = rt.create(root, &Integer::new(2), "b").unwrap();
        let pin = rt.add_location(root, "pin").unwrap();
        rt.connect(pin, b, "const").unwrap();
        let _board = rt.create(root, &Blackboard::new("b = a + 1"), "board").unwrap();
        let _updater = rt.create(root, &BlackboardUpdater::default(), "updater").unwrap();

        rt.set_text(a, "5");
        rt.run_loop(None);
        assert_eq!(rt.text(b), "2");
    }

    #[test]
    fn missing_variables_are_reported() {
        let (mut rt, root) = machine();
        let x = rt.create(root, &Integer::new(1), "x").unwrap();
        let _board = rt.create(root, &Blackboard::new("y = x + 1"), "board").unwrap();
        let updater = rt.create(root, &BlackboardUpdater::default(), "updater").unwrap();

        rt.set_text(x, "2");
        rt.run_loop(None);
        assert_eq!(
            rt.error(updater).unwrap().text(),
            "Couldn't find \"y\". You can create a connection or rename one of the nearby objects to fix this."
        );
    }

    #[test]
    fn editing_the_blackboard_rederives() {
        let (mut rt, root) = machine();
        let a = rt.create(root, &Integer::new(1), "a").unwrap();
        let b = rt.create(root, &Integer::new(0), "b").unwrap();
        let board = rt.create(root, &Blackboard::new("b = a + 1"), "board").unwrap();
        let updater = rt.create(root, &BlackboardUpdater::default(), "updater").unwrap();

        rt.set_text(board, "b = a * 10");
        rt.run_loop(None);
        assert_eq!(
            rt.object_as::<BlackboardUpdater>(updater).unwrap().formula("b").unwrap().to_string(),
            "(a * 10)"
        );

        rt.set_text(a, "3");
        rt.run_loop(None);
        assert_eq!(rt.text(b), "30");
    }
}
