//! Boolean tests.
//!
//! Every test shows its state as `"true"` or `"false"`. [`EqualityTest`],
//! [`LessThanTest`] and [`AllTest`] recompute when one of their live inputs
//! changes and notify their own observers only when the state flips.
//! [`HealthTest`] reads the error state of its target whenever asked.

use std::cmp::Ordering;

use automat_core::{Argument, Automat, ConnectionId, LocationId, Object, Precondition};

use crate::bool_text;

fn set_state(state: &mut bool, new_state: bool, rt: &mut Automat, here: LocationId) {
    if *state != new_state {
        *state = new_state;
        rt.schedule_update(here);
    }
}

static EQUALITY_TARGET: Argument = Argument::multiple("target", Precondition::RequiresObject);

/// True when every `target` equals the one that changed last.
#[derive(Clone, Copy, Debug)]
pub struct EqualityTest {
    state: bool,
}

impl Default for EqualityTest {
    fn default() -> Self {
        Self { state: true }
    }
}

impl EqualityTest {
    /// Current state.
    pub fn state(&self) -> bool {
        self.state
    }
}

impl Object for EqualityTest {
    fn name(&self) -> &str {
        "Equality Test"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(*self)
    }

    fn text(&self, _rt: &Automat, _here: LocationId) -> String {
        bool_text(self.state)
    }

    fn updated(&mut self, rt: &mut Automat, here: LocationId, updated: LocationId) {
        let different = EQUALITY_TARGET.loop_objects(rt, here, |rt, target| {
            (rt.compare(target, updated) != Some(Ordering::Equal)).then_some(())
        });
        set_state(&mut self.state, different.is_none(), rt, here);
    }

    fn args(&self, visit: &mut dyn FnMut(&Argument)) {
        visit(&EQUALITY_TARGET);
    }
}

static LESS: Argument = Argument::new("less", Precondition::RequiresObject);
static THAN: Argument = Argument::new("than", Precondition::RequiresObject);

/// True when `less` orders strictly before `than`.
#[derive(Clone, Copy, Debug)]
pub struct LessThanTest {
    state: bool,
}

impl Default for LessThanTest {
    fn default() -> Self {
        Self { state: true }
    }
}

impl LessThanTest {
    /// Current state.
    pub fn state(&self) -> bool {
        self.state
    }
}

impl Object for LessThanTest {
    fn name(&self) -> &str {
        "Less Than Test"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(*self)
    }

    fn text(&self, _rt: &Automat, _here: LocationId) -> String {
        bool_text(self.state)
    }

    fn updated(&mut self, rt: &mut Automat, here: LocationId, _updated: LocationId) {
        rt.clear_error(here);
        let less = LESS.get_object(rt, here);
        let than = THAN.get_object(rt, here);
        let (Some(less), Some(than)) = (less.object, than.object) else {
            return;
        };
        let new_state = rt.compare(less, than) == Some(Ordering::Less);
        set_state(&mut self.state, new_state, rt, here);
    }

    fn args(&self, visit: &mut dyn FnMut(&Argument)) {
        visit(&LESS);
        visit(&THAN);
    }
}

static TEST: Argument = Argument::multiple("test", Precondition::RequiresObject);

/// True when every `test` reads `true`.
#[derive(Clone, Copy, Debug)]
pub struct AllTest {
    state: bool,
}

impl Default for AllTest {
    fn default() -> Self {
        Self { state: true }
    }
}

impl AllTest {
    /// Current state.
    pub fn state(&self) -> bool {
        self.state
    }
}

impl Object for AllTest {
    fn name(&self) -> &str {
        "All Test"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(*self)
    }

    fn text(&self, _rt: &Automat, _here: LocationId) -> String {
        bool_text(self.state)
    }

    fn updated(&mut self, rt: &mut Automat, here: LocationId, _updated: LocationId) {
        let failing = TEST.loop_objects(rt, here, |rt, test| (rt.text(test) != "true").then_some(()));
        set_state(&mut self.state, failing.is_none(), rt, here);
    }

    fn args(&self, visit: &mut dyn FnMut(&Argument)) {
        visit(&TEST);
    }
}

static HEALTH_TARGET: Argument = Argument::new("target", Precondition::Optional);

/// True while the object its `target` resolves to has no error.
///
/// A Machine is unhealthy while any of its children is. The test observes
/// the errors of its target and notifies its own observers when one is
/// reported.
#[derive(Clone, Copy, Debug, Default)]
pub struct HealthTest {
    watched: Option<LocationId>,
}

impl HealthTest {
    fn watch(&mut self, rt: &mut Automat, here: LocationId) {
        let target = HEALTH_TARGET.find_object(rt, here);
        if target == self.watched {
            return;
        }
        if let Some(old) = self.watched {
            rt.stop_observing_errors(here, old);
        }
        if let Some(new) = target {
            rt.observe_errors(here, new);
        }
        self.watched = target;
    }
}

impl Object for HealthTest {
    fn name(&self) -> &str {
        "Health Test"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(HealthTest::default())
    }

    fn text(&self, rt: &Automat, here: LocationId) -> String {
        let healthy = HEALTH_TARGET
            .find_object(rt, here)
            .is_none_or(|target| !rt.has_error(target));
        bool_text(healthy)
    }

    fn errored(&mut self, rt: &mut Automat, here: LocationId, _errored: LocationId) {
        rt.schedule_update(here);
    }

    fn relocate(&mut self, rt: &mut Automat, old: Option<LocationId>, new: Option<LocationId>) {
        if let (Some(old), Some(watched)) = (old, self.watched.take()) {
            rt.stop_observing_errors(old, watched);
        }
        if let Some(new) = new {
            self.watch(rt, new);
        }
    }

    fn connection_added(
        &mut self,
        rt: &mut Automat,
        here: LocationId,
        label: &str,
        _connection: ConnectionId,
    ) {
        if label == HEALTH_TARGET.name() {
            self.watch(rt, here);
        }
    }

    fn connection_removed(&mut self, rt: &mut Automat, here: LocationId, label: &str, _to: LocationId) {
        if label == HEALTH_TARGET.name() {
            self.watch(rt, here);
        }
    }
}
