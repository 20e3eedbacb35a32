//! Dataflow graph runtime for automat.
//!
//! Users place [`Object`]s into [`Location`]s, wire Locations together with
//! labelled [`Connection`]s and let the runtime keep derived values consistent
//! as their inputs change. All graph state lives in one [`Automat`] context that
//! is owned by a single scheduler thread; other threads submit work through an
//! [`AutomatHandle`].
//!
//! # Architecture
//!
//! - **Arena graph**: [`Automat`] owns every Location and Connection and hands
//!   out [`LocationId`] / [`ConnectionId`] handles. Connecting or removing is one
//!   authoritative operation that updates both endpoints.
//! - **Capabilities**: [`Object`] is a trait with optional narrowing accessors
//!   ([`Object::as_pointer`], [`Object::as_machine`]) instead of a class tree.
//! - **Arguments**: [`Argument`] is a named query an object runs against its
//!   own Location: explicit connections first, then a name search among
//!   nearby Locations.
//! - **Scheduler**: [`Task`]s are queued FIFO and executed by
//!   [`Automat::run_loop`]. Continuations ([`Automat::with_then`]) run after the
//!   whole call tree they were installed for.
//! - **Errors**: failures are [`Error`] values attached to Locations and
//!   propagated upwards through [`Machine`]s, never unwinding the scheduler.
//!
//! # Example
//!
//! ```rust,ignore
//! use automat_core::{Automat, Machine};
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

pub mod argument;
pub mod channel;
pub mod error;
pub mod graph;
pub mod machine;
pub mod object;
pub mod scheduler;
pub mod task;
pub mod thread;

#[cfg(test)]
pub(crate) mod testing;

pub use argument::{
    Argument, LocationResult, ObjectResult, Precondition, Quantity, Requirement, THEN,
    TypedResult,
};
pub use channel::Channel;
pub use error::Error;
pub use graph::{
    Automat, Connection, ConnectionId, FollowedPointers, GraphError, Location, LocationId,
    PointerBehavior, Vec2,
};
pub use machine::Machine;
pub use object::{AsAny, Object, Pointer};
pub use task::{Task, TaskKind};
pub use thread::{AutomatHandle, AutomatThread, ThreadError, ThreadOptions};
