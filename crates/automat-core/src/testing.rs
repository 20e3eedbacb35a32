//! Small objects shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::graph::{Automat, LocationId};
use crate::object::{Object, Pointer};

/// Records every relocation it goes through.
#[derive(Default)]
pub struct Probe {
    pub relocations: Vec<(Option<LocationId>, Option<LocationId>)>,
}

impl Object for Probe {
    fn name(&self) -> &str {
        "Probe"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(Probe::default())
    }

    fn relocate(&mut self, _rt: &mut Automat, old: Option<LocationId>, new: Option<LocationId>) {
        self.relocations.push((old, new));
    }
}

/// Plain text holder.
pub struct Cell {
    pub value: String,
}

impl Cell {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

impl Object for Cell {
    fn name(&self) -> &str {
        "Cell"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(Cell::new(&self.value))
    }

    fn text(&self, _rt: &Automat, _here: LocationId) -> String {
        self.value.clone()
    }

    fn set_text(&mut self, _rt: &mut Automat, _here: LocationId, text: &str) {
        self.value = text.to_string();
    }
}

/// Pointer with a fixed destination.
pub struct Hop {
    pub next: Option<LocationId>,
}

impl Hop {
    pub fn to(next: LocationId) -> Self {
        Self { next: Some(next) }
    }

    pub fn dangling() -> Self {
        Self { next: None }
    }
}

impl Object for Hop {
    fn name(&self) -> &str {
        "Hop"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(Hop { next: self.next })
    }

    fn as_pointer(&self) -> Option<&dyn Pointer> {
        Some(self)
    }

    fn as_pointer_mut(&mut self) -> Option<&mut dyn Pointer> {
        Some(self)
    }
}

impl Pointer for Hop {
    fn next(&self, _rt: &Automat, _here: LocationId) -> Option<LocationId> {
        self.next
    }
}

/// Appends `"<event> <name>"` lines to a log shared between clones.
#[derive(Clone, Default)]
pub struct Journal {
    pub log: Rc<RefCell<Vec<String>>>,
}

impl Journal {
    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl Object for Journal {
    fn name(&self) -> &str {
        "Journal"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn run(&mut self, rt: &mut Automat, here: LocationId) {
        self.log.borrow_mut().push(format!("run {}", rt.name(here)));
    }

    fn updated(&mut self, rt: &mut Automat, here: LocationId, updated: LocationId) {
        self.log
            .borrow_mut()
            .push(format!("update {} from {}", rt.name(here), rt.name(updated)));
    }

    fn errored(&mut self, rt: &mut Automat, here: LocationId, errored: LocationId) {
        self.log
            .borrow_mut()
            .push(format!("errored {} from {}", rt.name(here), rt.name(errored)));
    }
}
