//! Prototype registry and factory for automat objects.
//!
//! This crate keeps an explicit, ordered catalogue of every object a user can
//! place in a Machine. Each entry pairs a [`PrototypeDescriptor`] with a
//! factory that builds a fresh prototype; new Locations are filled by cloning
//! it.
//!
//! # Features
//!
//! - **Discovery**: list all prototypes with metadata
//! - **Factory Pattern**: create objects by id at runtime
//! - **Category System**: prototypes grouped by what they do
//!
//! # Example
//!
//! ```rust
//! use automat_core::{Automat, Machine};
//! use automat_registry::{PrototypeCategory, PrototypeRegistry};
//!
//! let registry = PrototypeRegistry::new();
//!
//! for prototype in registry.all() {
//!     println!("{}: {}", prototype.name, prototype.description);
//! }
//!
//! let mut rt = Automat::new();
//! let root = rt.root();
//! rt.insert(root, Box::new(Machine::new("demo"))).unwrap();
//! let count = registry.instantiate(&mut rt, root, "integer", "count").unwrap();
//! assert_eq!(rt.text(count), "0");
//!
//! for prototype in registry.in_category(PrototypeCategory::Test) {
//!     println!("Test: {}", prototype.name);
//! }
//! ```

use automat_core::{Automat, GraphError, LocationId, Machine, Object};
use automat_library::{
    Alert, AllTest, Blackboard, BlackboardUpdater, Button, ComboBox, Date, EqualityTest,
    ErrorReporter, HealthTest, Increment, Integer, LessThanTest, Parent, Switch, Text,
};
use thiserror::Error;

/// Category of prototype for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrototypeCategory {
    /// Containers and pointers into them (machine, parent)
    Structure,
    /// Values that hold text (integer, date, text)
    Value,
    /// Stand-ins for on-screen controls (button, combo box, alert)
    Widget,
    /// Actions run as part of a chain (increment)
    Action,
    /// Boolean tests (equality, less than, all, health)
    Test,
    /// Routing of values and errors (switch, error reporter)
    Flow,
    /// Equations kept solved (blackboard, updater)
    Formula,
}

impl PrototypeCategory {
    /// All categories in display order.
    pub const ALL: [PrototypeCategory; 7] = [
        PrototypeCategory::Structure,
        PrototypeCategory::Value,
        PrototypeCategory::Widget,
        PrototypeCategory::Action,
        PrototypeCategory::Test,
        PrototypeCategory::Flow,
        PrototypeCategory::Formula,
    ];

    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            PrototypeCategory::Structure => "Structure",
            PrototypeCategory::Value => "Value",
            PrototypeCategory::Widget => "Widget",
            PrototypeCategory::Action => "Action",
            PrototypeCategory::Test => "Test",
            PrototypeCategory::Flow => "Flow",
            PrototypeCategory::Formula => "Formula",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            PrototypeCategory::Structure => "Machines and pointers to the machine holding an object",
            PrototypeCategory::Value => "Numbers, dates and text that other objects read and write",
            PrototypeCategory::Widget => "Buttons, combo boxes and alerts",
            PrototypeCategory::Action => "Objects that do something when run",
            PrototypeCategory::Test => "Objects whose text is true or false",
            PrototypeCategory::Flow => "Objects that route values and errors",
            PrototypeCategory::Formula => "Equations and the updater that keeps them solved",
        }
    }

    /// Looks a category up by its name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(name))
    }
}

/// Describes a prototype in the registry.
#[derive(Debug, Clone)]
pub struct PrototypeDescriptor {
    /// Unique identifier (lowercase, words joined by `-`).
    pub id: &'static str,
    /// Name the object reports about itself.
    pub name: &'static str,
    /// Brief description.
    pub description: &'static str,
    /// Category for organization.
    pub category: PrototypeCategory,
}

/// Errors from [`PrototypeRegistry::instantiate`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No prototype is registered under the id.
    #[error("unknown prototype: {0}")]
    UnknownPrototype(String),
    /// The graph rejected the new Location.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Factory function type for creating prototypes.
type PrototypeFactory = fn() -> Box<dyn Object>;

struct RegistryEntry {
    descriptor: PrototypeDescriptor,
    factory: PrototypeFactory,
}

/// Registry of all available prototypes.
///
/// Entries are kept in dependency order: a prototype comes after every
/// prototype its arguments require.
pub struct PrototypeRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for PrototypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PrototypeRegistry {
    /// Create a new registry with all library objects registered.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(17),
        };
        registry.register_builtin_prototypes();
        registry
    }

    fn register_builtin_prototypes(&mut self) {
        // Structure
        self.register(
            PrototypeDescriptor {
                id: "machine",
                name: "Machine",
                description: "Container whose children form a graph of their own",
                category: PrototypeCategory::Structure,
            },
            || Box::new(Machine::default()),
        );
        self.register(
            PrototypeDescriptor {
                id: "parent",
                name: "Parent",
                description: "Pointer to the machine holding it",
                category: PrototypeCategory::Structure,
            },
            || Box::new(Parent),
        );

        // Values
        self.register(
            PrototypeDescriptor {
                id: "integer",
                name: "Integer",
                description: "Whole number",
                category: PrototypeCategory::Value,
            },
            || Box::new(Integer::default()),
        );
        self.register(
            PrototypeDescriptor {
                id: "date",
                name: "Date",
                description: "Calendar date written as YYYY-MM-DD",
                category: PrototypeCategory::Value,
            },
            || Box::new(Date::default()),
        );
        self.register(
            PrototypeDescriptor {
                id: "text",
                name: "Text",
                description: "Editable text with {name} placeholders, optionally mirroring a target",
                category: PrototypeCategory::Value,
            },
            || Box::new(Text::default()),
        );

        // Actions and widgets
        self.register(
            PrototypeDescriptor {
                id: "increment",
                name: "Increment",
                description: "Adds one to the Integer it targets",
                category: PrototypeCategory::Action,
            },
            || Box::new(Increment),
        );
        self.register(
            PrototypeDescriptor {
                id: "button",
                name: "Button",
                description: "Runs its chain unless its enabled input reads false",
                category: PrototypeCategory::Widget,
            },
            || Box::new(Button::default()),
        );
        self.register(
            PrototypeDescriptor {
                id: "combo-box",
                name: "Combo Box",
                description: "Selects one of its options by text",
                category: PrototypeCategory::Widget,
            },
            || Box::new(ComboBox::default()),
        );
        self.register(
            PrototypeDescriptor {
                id: "alert",
                name: "Alert",
                description: "Shows the text of its message when run",
                category: PrototypeCategory::Widget,
            },
            || Box::new(Alert::default()),
        );

        // Tests
        self.register(
            PrototypeDescriptor {
                id: "equality-test",
                name: "Equality Test",
                description: "True when all of its targets are equal",
                category: PrototypeCategory::Test,
            },
            || Box::new(EqualityTest::default()),
        );
        self.register(
            PrototypeDescriptor {
                id: "less-than-test",
                name: "Less Than Test",
                description: "True when less orders before than",
                category: PrototypeCategory::Test,
            },
            || Box::new(LessThanTest::default()),
        );
        self.register(
            PrototypeDescriptor {
                id: "all-test",
                name: "All Test",
                description: "True when every connected test is true",
                category: PrototypeCategory::Test,
            },
            || Box::new(AllTest::default()),
        );
        self.register(
            PrototypeDescriptor {
                id: "health-test",
                name: "Health Test",
                description: "True while its target has no errors",
                category: PrototypeCategory::Test,
            },
            || Box::new(HealthTest::default()),
        );

        // Flow
        self.register(
            PrototypeDescriptor {
                id: "switch",
                name: "Switch",
                description: "Shows the connection named by the text of its target",
                category: PrototypeCategory::Flow,
            },
            || Box::new(Switch::default()),
        );
        self.register(
            PrototypeDescriptor {
                id: "error-reporter",
                name: "Error Reporter",
                description: "Reports its message as an error while its test is true",
                category: PrototypeCategory::Flow,
            },
            || Box::new(ErrorReporter),
        );

        // Formulas
        self.register(
            PrototypeDescriptor {
                id: "blackboard",
                name: "Blackboard",
                description: "Equation such as F = C * 9 / 5 + 32",
                category: PrototypeCategory::Formula,
            },
            || Box::new(Blackboard::default()),
        );
        self.register(
            PrototypeDescriptor {
                id: "blackboard-updater",
                name: "Blackboard Updater",
                description: "Keeps the variables of nearby blackboards consistent",
                category: PrototypeCategory::Formula,
            },
            || Box::new(BlackboardUpdater::default()),
        );
    }

    fn register(&mut self, descriptor: PrototypeDescriptor, factory: PrototypeFactory) {
        self.entries.push(RegistryEntry {
            descriptor,
            factory,
        });
    }

    /// Returns descriptors for all registered prototypes, in registration order.
    pub fn all(&self) -> Vec<&PrototypeDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for prototypes in a specific category.
    pub fn in_category(&self, category: PrototypeCategory) -> Vec<&PrototypeDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Get a descriptor by prototype id.
    pub fn get(&self, id: &str) -> Option<&PrototypeDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| &e.descriptor)
    }

    /// Create a fresh prototype by id.
    ///
    /// Returns `None` if the id is not registered.
    pub fn create(&self, id: &str) -> Option<Box<dyn Object>> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| (e.factory)())
    }

    /// Creates a child of `machine` named `name` holding a clone of the
    /// prototype registered under `id`.
    pub fn instantiate(
        &self,
        rt: &mut Automat,
        machine: LocationId,
        id: &str,
        name: &str,
    ) -> Result<LocationId, RegistryError> {
        let prototype = self
            .create(id)
            .ok_or_else(|| RegistryError::UnknownPrototype(id.to_string()))?;
        Ok(rt.create(machine, prototype.as_ref(), name)?)
    }

    /// Returns the number of registered prototypes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no prototypes are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_machine() -> (Automat, LocationId) {
        let mut rt = Automat::new();
        let root = rt.root();
        rt.insert(root, Box::new(Machine::new("demo"))).unwrap();
        (rt, root)
    }

    #[test]
    fn test_registry_creation() {
        let registry = PrototypeRegistry::new();
        assert_eq!(registry.len(), 17);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = PrototypeRegistry::new();
        let mut ids: Vec<_> = registry.all().iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), registry.len());
    }

    #[test]
    fn test_get_prototype() {
        let registry = PrototypeRegistry::new();

        let switch = registry.get("switch");
        assert!(switch.is_some());
        assert_eq!(switch.unwrap().category, PrototypeCategory::Flow);

        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_descriptor_names_match_objects() {
        let registry = PrototypeRegistry::new();
        for descriptor in registry.all() {
            let object = registry.create(descriptor.id).unwrap();
            assert_eq!(object.name(), descriptor.name, "{}", descriptor.id);
        }
    }

    #[test]
    fn test_in_category() {
        let registry = PrototypeRegistry::new();

        let tests: Vec<_> = registry
            .in_category(PrototypeCategory::Test)
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(
            tests,
            ["equality-test", "less-than-test", "all-test", "health-test"]
        );

        let total: usize = PrototypeCategory::ALL
            .iter()
            .map(|&c| registry.in_category(c).len())
            .sum();
        assert_eq!(total, registry.len());
    }

    #[test]
    fn test_dependency_order() {
        let registry = PrototypeRegistry::new();
        let position = |id: &str| registry.all().iter().position(|d| d.id == id).unwrap();
        assert!(position("integer") < position("increment"));
        assert!(position("blackboard") < position("blackboard-updater"));
        assert!(position("machine") < position("parent"));
    }

    #[test]
    fn test_category_names() {
        for category in PrototypeCategory::ALL {
            assert!(!category.description().is_empty());
            assert_eq!(PrototypeCategory::from_name(category.name()), Some(category));
        }
        assert_eq!(
            PrototypeCategory::from_name("formula"),
            Some(PrototypeCategory::Formula)
        );
        assert_eq!(PrototypeCategory::from_name("audio"), None);
    }

    #[test]
    fn test_instantiate() {
        let registry = PrototypeRegistry::new();
        let (mut rt, root) = demo_machine();

        let count = registry.instantiate(&mut rt, root, "integer", "count").unwrap();
        assert_eq!(rt.name(count), "count");
        assert_eq!(rt.text(count), "0");
        assert!(rt.object_as::<Integer>(count).is_some());

        let err = registry
            .instantiate(&mut rt, root, "oscillator", "x")
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownPrototype(ref id) if id == "oscillator"));
    }

    #[test]
    fn test_instantiate_needs_a_machine() {
        let registry = PrototypeRegistry::new();
        let (mut rt, root) = demo_machine();
        let count = registry.instantiate(&mut rt, root, "integer", "count").unwrap();

        let err = registry.instantiate(&mut rt, count, "text", "x").unwrap_err();
        assert!(matches!(err, RegistryError::Graph(GraphError::NotAMachine(id)) if id == count));
    }

    #[test]
    fn test_counter_from_registry() {
        let registry = PrototypeRegistry::new();
        let (mut rt, root) = demo_machine();
        let count = registry.instantiate(&mut rt, root, "integer", "value").unwrap();
        let increment = registry.instantiate(&mut rt, root, "increment", "inc").unwrap();
        rt.connect(increment, count, "target").unwrap();

        rt.schedule_run(increment);
        rt.schedule_run(increment);
        rt.run_loop(None);
        assert_eq!(rt.text(count), "2");
    }
}
