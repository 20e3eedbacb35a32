//! Property-based tests for the Location arena.
//!
//! Random sequences of connect / disconnect / remove operations must leave
//! every connection registered in exactly the outgoing list of its source and
//! the incoming list of its destination, and pointer chains of any shape must
//! terminate.

use automat_core::{Automat, ConnectionId, LocationId, Machine, Object, Pointer};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Connect(usize, usize, u8),
    Disconnect(usize),
    Remove(usize),
    Add,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..16, 0usize..16, 0u8..3).prop_map(|(a, b, l)| Op::Connect(a, b, l)),
        2 => (0usize..32).prop_map(Op::Disconnect),
        1 => (0usize..16).prop_map(Op::Remove),
        1 => Just(Op::Add),
    ]
}

fn assert_consistent(rt: &Automat) -> Result<(), TestCaseError> {
    for (id, connection) in rt.connections() {
        let from = rt.location(connection.from());
        let to = rt.location(connection.to());
        prop_assert!(from.is_some(), "{id} starts at a removed location");
        prop_assert!(to.is_some(), "{id} ends at a removed location");
        let outgoing = from.map_or(0, |l| l.outgoing().iter().filter(|&&c| c == id).count());
        let incoming = to.map_or(0, |l| l.incoming().iter().filter(|&&c| c == id).count());
        prop_assert_eq!(outgoing, 1);
        prop_assert_eq!(incoming, 1);
    }
    for location in rt.locations() {
        for &id in location.outgoing().iter().chain(location.incoming()) {
            prop_assert!(rt.connection(id).is_some(), "{} lists dead {id}", location.id());
        }
    }
    Ok(())
}

/// Pointer to another Location chosen by index.
struct Link(Option<LocationId>);

impl Object for Link {
    fn name(&self) -> &str {
        "Link"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(Link(self.0))
    }

    fn as_pointer(&self) -> Option<&dyn Pointer> {
        Some(self)
    }

    fn as_pointer_mut(&mut self) -> Option<&mut dyn Pointer> {
        Some(self)
    }
}

impl Pointer for Link {
    fn next(&self, _rt: &Automat, _here: LocationId) -> Option<LocationId> {
        self.0
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Connections stay registered on both endpoints whatever the sequence of
    /// structural edits.
    #[test]
    fn connections_stay_consistent(ops in prop::collection::vec(op(), 1..60)) {
        let mut rt = Automat::new();
        let root = rt.root();
        rt.insert(root, Box::new(Machine::new("arena"))).unwrap();
        let mut locations: Vec<LocationId> = (0..8)
            .map(|i| rt.add_location(root, &format!("l{i}")).unwrap())
            .collect();
        let mut connections: Vec<ConnectionId> = Vec::new();
        let labels = ["target", "then", "value"];

        for op in ops {
            match op {
                Op::Connect(a, b, label) => {
                    let from = locations[a % locations.len()];
                    let to = locations[b % locations.len()];
                    if let Ok(id) = rt.connect(from, to, labels[label as usize]) {
                        connections.push(id);
                    }
                }
                Op::Disconnect(index) if !connections.is_empty() => {
                    let id = connections.remove(index % connections.len());
                    let _ = rt.disconnect(id);
                }
                Op::Remove(index) if locations.len() > 1 => {
                    let id = locations.remove(index % locations.len());
                    rt.remove_location(id).unwrap();
                }
                Op::Add => {
                    let name = format!("l{}", locations.len());
                    locations.push(rt.add_location(root, &name).unwrap());
                }
                _ => {}
            }
            assert_consistent(&rt)?;
        }
    }

    /// Following any arrangement of pointers terminates, and a reported
    /// target never holds a pointer.
    #[test]
    fn pointer_chains_terminate(targets in prop::collection::vec(prop::option::of(0usize..6), 6)) {
        let mut rt = Automat::new();
        let root = rt.root();
        rt.insert(root, Box::new(Machine::new("pointers"))).unwrap();
        let locations: Vec<LocationId> = (0..6)
            .map(|i| rt.add_location(root, &format!("p{i}")).unwrap())
            .collect();
        for (index, target) in targets.iter().enumerate() {
            let next = target.map(|t| locations[t]);
            rt.insert(locations[index], Box::new(Link(next))).unwrap();
        }

        for &start in &locations {
            if let Some(target) = rt.follow(start) {
                prop_assert!(rt.object(target).and_then(|o| o.as_pointer()).is_none());
            }
            prop_assert_eq!(rt.text(start), "");
        }
    }
}
