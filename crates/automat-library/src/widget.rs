//! Widget stand-ins: buttons, combo boxes and alerts.
//!
//! Nothing here draws. The objects keep the state a real widget would show
//! and expose it as text, so that graphs built around them can be driven
//! and checked headless.

use automat_core::{Argument, Automat, ConnectionId, LocationId, Object, Precondition};

static ENABLED: Argument = Argument::new("enabled", Precondition::Optional);

/// Push button.
///
/// Running the button is pressing it: unless its `enabled` argument reads
/// `false`, the Locations connected through `then` run afterwards.
#[derive(Clone, Debug, Default)]
pub struct Button {
    label: String,
}

impl Button {
    /// Creates a button with `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl Object for Button {
    fn name(&self) -> &str {
        "Button"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn text(&self, _rt: &Automat, _here: LocationId) -> String {
        self.label.clone()
    }

    fn set_text(&mut self, _rt: &mut Automat, _here: LocationId, text: &str) {
        self.label = text.to_string();
    }

    fn run(&mut self, rt: &mut Automat, here: LocationId) {
        let Some(enabled) = ENABLED.find_object(rt, here) else {
            return;
        };
        if rt.text(enabled) == "false" {
            rt.report_error(here, "Button is disabled.");
        }
    }
}

static OPTION: Argument = Argument::multiple("option", Precondition::Optional);

/// Selection among the Locations connected as `option`.
///
/// The text is the text of the selected option. Setting the text selects
/// the first option with that text.
#[derive(Clone, Debug, Default)]
pub struct ComboBox {
    selected: Option<LocationId>,
}

impl ComboBox {
    /// Currently selected option.
    pub fn selected(&self) -> Option<LocationId> {
        self.selected
    }
}

impl Object for ComboBox {
    fn name(&self) -> &str {
        "Combo Box"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(ComboBox::default())
    }

    fn text(&self, rt: &Automat, _here: LocationId) -> String {
        self.selected.map(|option| rt.text(option)).unwrap_or_default()
    }

    fn set_text(&mut self, rt: &mut Automat, here: LocationId, text: &str) {
        self.selected = OPTION.loop_locations(rt, here, |rt, option| {
            (rt.text(option) == text).then_some(option)
        });
        if self.selected.is_none() {
            rt.report_error(here, format!("No option named {text}"));
        }
    }

    fn updated(&mut self, rt: &mut Automat, here: LocationId, updated: LocationId) {
        if self.selected == Some(updated) {
            rt.schedule_update(here);
        }
    }

    fn args(&self, visit: &mut dyn FnMut(&Argument)) {
        visit(&OPTION);
    }

    fn connection_added(
        &mut self,
        rt: &mut Automat,
        here: LocationId,
        label: &str,
        connection: ConnectionId,
    ) {
        if label != OPTION.name() {
            return;
        }
        OPTION.on_connection_added(rt, here, connection);
        if self.selected.is_none() {
            self.selected = rt.connection(connection).map(|c| c.to());
        }
    }

    fn connection_removed(&mut self, rt: &mut Automat, here: LocationId, label: &str, to: LocationId) {
        if label != OPTION.name() {
            return;
        }
        OPTION.on_connection_removed(rt, here, to);
        if self.selected == Some(to) {
            self.selected = OPTION.loop_locations(rt, here, |_, option| Some(option));
            rt.schedule_update(here);
        }
    }
}

static MESSAGE: Argument = Argument::new("message", Precondition::RequiresObject);

/// Shows the text of its `message` argument when run.
///
/// Shown messages are logged and kept, oldest first.
#[derive(Clone, Debug, Default)]
pub struct Alert {
    shown: Vec<String>,
}

impl Alert {
    /// Messages shown so far.
    pub fn shown(&self) -> &[String] {
        &self.shown
    }
}

impl Object for Alert {
    fn name(&self) -> &str {
        "Alert"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(Alert::default())
    }

    fn run(&mut self, rt: &mut Automat, here: LocationId) {
        let message = MESSAGE.get_object(rt, here);
        let Some(object) = message.object else {
            return;
        };
        let text = rt.text(object);
        tracing::info!(alert = %rt.describe(here), "{text}");
        self.shown.push(text);
    }
}
