//! Automat Library - Concrete objects built on automat-core
//!
//! Every object here only consumes the public runtime API: it resolves
//! [`Argument`](automat_core::Argument)s, schedules updates and reports
//! errors. None of them carries scheduling logic of its own.
//!
//! - [`Integer`] / [`Increment`] - a whole number and the action counting it up
//! - [`Text`] - editable text with `{name}` placeholders
//! - [`Button`], [`ComboBox`], [`Alert`] - widget stand-ins
//! - [`Date`] - calendar date in `YYYY-MM-DD` form
//! - [`EqualityTest`], [`LessThanTest`], [`AllTest`], [`HealthTest`] - boolean tests
//! - [`Switch`], [`ErrorReporter`], [`Parent`] - flow helpers
//! - [`Blackboard`] / [`BlackboardUpdater`] - equations kept solved
//!
//! ## Example
//!
//! ```rust,ignore
//! use automat_core::{Automat, Machine};
//! use automat_library::{Integer, Text};
//!
//! let mut rt = Automat::new();
//! let root = rt.root();
//! rt.insert(root, Box::new(Machine::new("Counter")))?;
//! let count = rt.create(root, &Integer::default(), "count")?;
//! let label = rt.create(root, &Text::default(), "label")?;
//! rt.connect(label, count, "target")?;
//! rt.run_loop(None);
//! assert_eq!(rt.text(label), "0");
//! ```

pub mod algebra;
pub mod blackboard;
pub mod date;
pub mod flow;
pub mod integer;
pub mod predicate;
pub mod text;
pub mod widget;

// Re-export main types at crate root
pub use algebra::{Expr, Op, ParseError, Statement};
pub use blackboard::{Blackboard, BlackboardUpdater};
pub use date::Date;
pub use flow::{ErrorReporter, Parent, Switch};
pub use integer::{Increment, Integer};
pub use predicate::{AllTest, EqualityTest, HealthTest, LessThanTest};
pub use text::Text;
pub use widget::{Alert, Button, ComboBox};

/// Text used by the boolean objects.
pub(crate) fn bool_text(state: bool) -> String {
    if state { "true" } else { "false" }.to_string()
}

#[cfg(test)]
pub(crate) fn machine() -> (automat_core::Automat, automat_core::LocationId) {
    let mut rt = automat_core::Automat::new();
    let root = rt.root();
    rt.insert(root, Box::new(automat_core::Machine::new("test")))
        .unwrap();
    (rt, root)
}
