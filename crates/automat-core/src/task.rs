//! Units of work executed by the scheduler.

use std::fmt;

use crate::graph::{Automat, LocationId};
use crate::scheduler::ContinuationId;

/// Closure executed by a [`TaskKind::Function`] task.
pub type TaskFn = Box<dyn FnOnce(&mut Automat, LocationId)>;

/// What a task does when executed.
pub enum TaskKind {
    /// Run the object at the target (see [`Automat::run`]).
    Run,
    /// Tell the target that `updated` changed.
    Update {
        /// Location that changed.
        updated: LocationId,
    },
    /// Tell the target that `errored` reported an error.
    Errored {
        /// Location holding the error.
        errored: LocationId,
    },
    /// Call an arbitrary closure with the target.
    Function(TaskFn),
}

/// A unit of work bound to a target Location.
pub struct Task {
    pub(crate) target: LocationId,
    pub(crate) kind: TaskKind,
    /// Continuation released once this task (and everything it schedules)
    /// has executed.
    pub(crate) waiting: Option<ContinuationId>,
}

impl Task {
    /// Runs the object at `target`.
    pub fn run(target: LocationId) -> Self {
        Self::new(target, TaskKind::Run)
    }

    /// Notifies `target` that `updated` changed.
    pub fn update(target: LocationId, updated: LocationId) -> Self {
        Self::new(target, TaskKind::Update { updated })
    }

    /// Notifies `target` that `errored` failed.
    pub fn errored(target: LocationId, errored: LocationId) -> Self {
        Self::new(target, TaskKind::Errored { errored })
    }

    /// Calls `function` with `target` on the scheduler thread.
    pub fn function(target: LocationId, function: impl FnOnce(&mut Automat, LocationId) + 'static) -> Self {
        Self::new(target, TaskKind::Function(Box::new(function)))
    }

    fn new(target: LocationId, kind: TaskKind) -> Self {
        Self {
            target,
            kind,
            waiting: None,
        }
    }

    /// Location the task acts on.
    pub fn target(&self) -> LocationId {
        self.target
    }

    /// What the task does.
    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    /// Like [`Display`](fmt::Display) but with Location names.
    pub fn describe(&self, rt: &Automat) -> String {
        let target = rt.describe(self.target);
        match &self.kind {
            TaskKind::Run => format!("RunTask({target})"),
            TaskKind::Update { updated } => format!("UpdateTask({target}, {})", rt.describe(*updated)),
            TaskKind::Errored { errored } => format!("ErroredTask({target}, {})", rt.describe(*errored)),
            TaskKind::Function(_) => format!("FunctionTask({target})"),
        }
    }

    pub(crate) fn execute(self, rt: &mut Automat) {
        let target = self.target;
        match self.kind {
            TaskKind::Run => rt.run(target),
            TaskKind::Update { updated } => {
                rt.with_object(target, |object, rt| object.updated(rt, target, updated));
            }
            TaskKind::Errored { errored } => {
                rt.with_object(target, |object, rt| object.errored(rt, target, errored));
            }
            TaskKind::Function(function) => function(rt, target),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TaskKind::Run => write!(f, "RunTask({})", self.target),
            TaskKind::Update { updated } => write!(f, "UpdateTask({}, {updated})", self.target),
            TaskKind::Errored { errored } => write!(f, "ErroredTask({}, {errored})", self.target),
            TaskKind::Function(_) => write!(f, "FunctionTask({})", self.target),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("task", &format_args!("{self}"))
            .field("waiting", &self.waiting)
            .finish()
    }
}

impl fmt::Debug for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => f.write_str("Run"),
            Self::Update { updated } => f.debug_struct("Update").field("updated", updated).finish(),
            Self::Errored { errored } => f.debug_struct("Errored").field("errored", errored).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Machine;

    #[test]
    fn describes_with_names() {
        let mut rt = Automat::new();
        let root = rt.root();
        rt.insert(root, Box::new(Machine::new("m"))).unwrap();
        let a = rt.add_location(root, "a").unwrap();
        let b = rt.add_location(root, "b").unwrap();

        assert_eq!(Task::run(a).describe(&rt), "RunTask(a)");
        assert_eq!(Task::update(a, b).describe(&rt), "UpdateTask(a, b)");
        assert_eq!(Task::errored(b, a).describe(&rt), "ErroredTask(b, a)");
        assert_eq!(Task::function(a, |_, _| {}).describe(&rt), "FunctionTask(a)");
        assert_eq!(Task::run(a).to_string(), format!("RunTask({a})"));
    }

    #[test]
    fn function_task_receives_target() {
        let mut rt = Automat::new();
        let root = rt.root();
        rt.insert(root, Box::new(Machine::new("m"))).unwrap();
        let a = rt.add_location(root, "a").unwrap();

        Task::function(a, |rt, target| {
            rt.rename(target, "renamed").unwrap();
        })
        .execute(&mut rt);
        assert_eq!(rt.name(a), "renamed");
    }
}
