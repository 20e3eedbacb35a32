//! Objects that route values and errors around a Machine.

use automat_core::{Argument, Automat, LocationId, Object, Pointer, Precondition};

static SWITCH_TARGET: Argument = Argument::new("target", Precondition::RequiresObject);

/// Picks one of its connections by the text of its `target`.
///
/// The case argument is renamed to the current text of `target`, so a
/// Switch whose target reads `"return flight"` shows the text of whatever it
/// reaches through a connection labelled `return flight`.
#[derive(Clone, Debug)]
pub struct Switch {
    case: Argument,
}

impl Default for Switch {
    fn default() -> Self {
        Self {
            case: Argument::named("case", Precondition::RequiresObject),
        }
    }
}

impl Switch {
    /// Label of the connection currently selected.
    pub fn case(&self) -> &str {
        self.case.name()
    }
}

impl Object for Switch {
    fn name(&self) -> &str {
        "Switch"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(Switch::default())
    }

    fn text(&self, rt: &Automat, here: LocationId) -> String {
        self.case
            .find_object(rt, here)
            .map(|case| rt.text(case))
            .unwrap_or_default()
    }

    fn updated(&mut self, rt: &mut Automat, here: LocationId, updated: LocationId) {
        let target = SWITCH_TARGET.get_object(rt, here);
        let (Some(location), Some(object)) = (target.location, target.object) else {
            return;
        };
        if updated == location || updated == object {
            let case = rt.text(object);
            if case != self.case.name() {
                self.case.rename(rt, here, case);
            }
            return;
        }
        if self.case.find_location(rt, here).location == Some(updated) {
            rt.schedule_update(here);
        }
    }

    fn args(&self, visit: &mut dyn FnMut(&Argument)) {
        visit(&SWITCH_TARGET);
        visit(&self.case);
    }
}

static TEST: Argument = Argument::new("test", Precondition::RequiresObject);
static MESSAGE: Argument = Argument::new("message", Precondition::Optional);

/// Reports an error on its own Location while its `test` reads `true`.
///
/// The error text is the text of `message`, or a generic one when there is
/// no message.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorReporter;

impl Object for ErrorReporter {
    fn name(&self) -> &str {
        "Error Reporter"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(ErrorReporter)
    }

    fn updated(&mut self, rt: &mut Automat, here: LocationId, _updated: LocationId) {
        rt.clear_error(here);
        let test = TEST.get_object(rt, here);
        let Some(test) = test.object else {
            return;
        };
        if rt.text(test) != "true" {
            return;
        }
        let message = MESSAGE.get_object(rt, here);
        if !message.ok {
            return;
        }
        let text = match message.object {
            Some(object) => rt.text(object),
            None => "Error reported by ErrorReporter".to_string(),
        };
        rt.report_error(here, text);
    }

    fn args(&self, visit: &mut dyn FnMut(&Argument)) {
        visit(&TEST);
        visit(&MESSAGE);
    }
}

/// Pointer to the Machine holding it.
///
/// Reads go through to the Machine. Writes through a Parent are rejected
/// and reported on its own Location.
#[derive(Clone, Copy, Debug, Default)]
pub struct Parent;

impl Object for Parent {
    fn name(&self) -> &str {
        "Parent"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(Parent)
    }

    fn as_pointer(&self) -> Option<&dyn Pointer> {
        Some(self)
    }

    fn as_pointer_mut(&mut self) -> Option<&mut dyn Pointer> {
        Some(self)
    }
}

impl Pointer for Parent {
    fn next(&self, rt: &Automat, here: LocationId) -> Option<LocationId> {
        rt.parent(here)
    }

    fn put_next(
        &mut self,
        rt: &mut Automat,
        here: LocationId,
        object: Box<dyn Object>,
    ) -> Option<Box<dyn Object>> {
        if let Some(error) = rt.report_error(here, "No parent to put to") {
            error.save_object(object);
        }
        None
    }

    fn take_next(&mut self, rt: &mut Automat, here: LocationId) -> Option<Box<dyn Object>> {
        rt.report_error(here, "No parent to take from");
        None
    }
}
