//! The task queue and its continuation table.
//!
//! All scheduling state lives in [`Scheduler`], which is owned by the
//! [`Automat`]. Tasks are executed in FIFO order by [`Automat::run_loop`],
//! with one exception: a continuation installed through
//! [`Automat::with_then`] is spliced in at the front of the queue as soon as
//! the last task of its call tree has executed.
//!
//! # Continuations
//!
//! A continuation is a task plus a count of outstanding work. Every task
//! scheduled while a continuation is current is attributed to it, and while
//! that task executes the continuation stays current, so the whole
//! transitive call tree is counted. When the count drops to zero the
//! continuation task is queued.
//!
//! ```rust,ignore
//! rt.with_then(Task::run(report), |rt| {
//!     rt.schedule_run(first);
//!     rt.schedule_run(second);
//! });
//! rt.run_loop(None); // first, second, everything they trigger, then report
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::argument::THEN;
use crate::graph::{Automat, LocationId};
use crate::task::Task;

/// Handle of an installed continuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContinuationId(u64);

impl fmt::Display for ContinuationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Continuation({})", self.0)
    }
}

struct Continuation {
    task: Task,
    pending: usize,
}

/// Scheduling state of one [`Automat`].
#[derive(Default)]
pub struct Scheduler {
    queue: VecDeque<Task>,
    no_scheduling: HashSet<LocationId>,
    continuations: HashMap<ContinuationId, Continuation>,
    next_continuation: u64,
    current: Option<ContinuationId>,
    log_executed_tasks: bool,
    executed: u64,
}

impl Scheduler {
    fn suppressed(&self, target: LocationId) -> bool {
        self.no_scheduling.contains(&target)
    }

    fn hold(&mut self, id: Option<ContinuationId>) {
        if let Some(continuation) = id.and_then(|id| self.continuations.get_mut(&id)) {
            continuation.pending += 1;
        }
    }

    /// Drops one hold on `id`. Returns the continuation task once nothing
    /// holds it anymore.
    fn release(&mut self, id: Option<ContinuationId>) -> Option<Task> {
        let id = id?;
        let continuation = self.continuations.get_mut(&id)?;
        continuation.pending = continuation.pending.saturating_sub(1);
        if continuation.pending > 0 {
            return None;
        }
        self.continuations.remove(&id).map(|c| c.task)
    }
}

impl Automat {
    // --- Scheduling ---

    /// Queues `task`.
    ///
    /// The task is dropped when scheduling is suppressed for its target (see
    /// [`without_scheduling`](Self::without_scheduling)). Otherwise it is
    /// attributed to the current continuation, if any.
    pub fn schedule(&mut self, mut task: Task) {
        let scheduler = &mut self.scheduler;
        if scheduler.suppressed(task.target) {
            tracing::trace!(task = %task, "scheduling suppressed, dropping task");
            return;
        }
        task.waiting = scheduler.current;
        scheduler.hold(task.waiting);
        scheduler.queue.push_back(task);
    }

    /// Queues a [`Run`](crate::TaskKind::Run) of `id`.
    pub fn schedule_run(&mut self, id: LocationId) {
        self.schedule(Task::run(id));
    }

    /// Queues one update task for every update observer of `id`.
    ///
    /// Observers are never called synchronously.
    pub fn schedule_update(&mut self, id: LocationId) {
        let observers: Vec<LocationId> = self
            .location(id)
            .map(|location| location.update_observers().collect())
            .unwrap_or_default();
        for observer in observers {
            self.schedule(Task::update(observer, id));
        }
    }

    /// Queues a single update of `observer` caused by `updated`.
    pub fn schedule_local_update(&mut self, observer: LocationId, updated: LocationId) {
        self.schedule(Task::update(observer, updated));
    }

    /// Queues an errored notification of `observer` caused by `errored`.
    pub fn schedule_errored(&mut self, observer: LocationId, errored: LocationId) {
        self.schedule(Task::errored(observer, errored));
    }

    /// Queues a closure to be called with `target`.
    pub fn schedule_function(
        &mut self,
        target: LocationId,
        function: impl FnOnce(&mut Automat, LocationId) + 'static,
    ) {
        self.schedule(Task::function(target, function));
    }

    /// Runs `f`, then schedules `then` once `f` and every task it
    /// transitively scheduled have executed.
    ///
    /// When `f` schedules nothing, `then` is queued right away, ahead of any
    /// older tasks.
    pub fn with_then<R>(&mut self, mut then: Task, f: impl FnOnce(&mut Automat) -> R) -> R {
        let scheduler = &mut self.scheduler;
        let id = ContinuationId(scheduler.next_continuation);
        scheduler.next_continuation += 1;
        then.waiting = scheduler.current;
        scheduler.hold(then.waiting);
        scheduler.continuations.insert(id, Continuation { task: then, pending: 1 });
        let previous = scheduler.current.replace(id);

        let result = f(self);

        self.scheduler.current = previous;
        self.release_continuation(Some(id));
        result
    }

    /// Runs `f` while every task targeting `id` is dropped instead of queued.
    ///
    /// Nested calls for the same Location keep the suppression until the
    /// outermost one returns.
    pub fn without_scheduling<R>(&mut self, id: LocationId, f: impl FnOnce(&mut Automat) -> R) -> R {
        let inserted = self.scheduler.no_scheduling.insert(id);
        let result = f(self);
        if inserted {
            self.scheduler.no_scheduling.remove(&id);
        }
        result
    }

    fn release_continuation(&mut self, id: Option<ContinuationId>) {
        let mut next = id;
        // A dropped continuation releases its own parent in turn.
        while let Some(task) = self.scheduler.release(next) {
            if self.scheduler.suppressed(task.target) {
                tracing::trace!(task = %task, "scheduling suppressed, dropping continuation");
                next = task.waiting;
                continue;
            }
            self.scheduler.queue.push_front(task);
            break;
        }
    }

    // --- Execution ---

    /// Runs the object at `id`.
    ///
    /// A previous error on `id` is cleared first. When the object finishes
    /// without an error, every Location connected through `then` is
    /// scheduled to run.
    pub fn run(&mut self, id: LocationId) {
        if self.location(id).is_none() {
            return;
        }
        self.clear_error(id);
        self.with_object(id, |object, rt| object.run(rt, id));
        if self.has_error(id) {
            return;
        }
        THEN.loop_locations(self, id, |rt, next| {
            rt.schedule_run(next);
            None::<()>
        });
    }

    fn execute(&mut self, task: Task) {
        let waiting = task.waiting;
        if self.location(task.target).is_none() {
            tracing::trace!(task = %task, "target was removed, skipping task");
        } else {
            if self.scheduler.log_executed_tasks {
                tracing::debug!("{}", task.describe(self));
            }
            let previous = std::mem::replace(&mut self.scheduler.current, waiting);
            task.execute(self);
            self.scheduler.current = previous;
            self.scheduler.executed += 1;
        }
        self.release_continuation(waiting);
    }

    /// Executes queued tasks until the queue is empty or `max` tasks ran.
    ///
    /// Returns the number of tasks taken off the queue.
    pub fn run_loop(&mut self, max: Option<usize>) -> usize {
        let mut count = 0;
        while max.is_none_or(|max| count < max) {
            let Some(task) = self.scheduler.queue.pop_front() else {
                break;
            };
            self.execute(task);
            count += 1;
        }
        count
    }

    // --- Introspection ---

    /// Number of queued tasks.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.queue.len()
    }

    /// Queued tasks in execution order.
    pub fn queued_tasks(&self) -> impl Iterator<Item = &Task> {
        self.scheduler.queue.iter()
    }

    /// Total number of tasks executed so far.
    pub fn executed_tasks(&self) -> u64 {
        self.scheduler.executed
    }

    /// Whether tasks targeting `id` are currently dropped.
    pub fn is_scheduling_suppressed(&self, id: LocationId) -> bool {
        self.scheduler.suppressed(id)
    }

    /// Enables a debug log line for every executed task.
    pub fn set_log_executed_tasks(&mut self, enabled: bool) {
        self.scheduler.log_executed_tasks = enabled;
    }

    /// Drops every queued task and pending continuation. Returns how many
    /// tasks were dropped.
    pub(crate) fn abandon_tasks(&mut self) -> usize {
        let scheduler = &mut self.scheduler;
        let dropped = scheduler.queue.len() + scheduler.continuations.len();
        scheduler.queue.clear();
        scheduler.continuations.clear();
        scheduler.current = None;
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Machine;
    use crate::testing::Journal;

    fn journal() -> (Automat, LocationId, Journal) {
        let mut rt = Automat::new();
        let root = rt.root();
        rt.insert(root, Box::new(Machine::new("test"))).unwrap();
        (rt, root, Journal::default())
    }

    #[test]
    fn tasks_run_in_fifo_order() {
        let (mut rt, root, journal) = journal();
        let a = rt.create(root, &journal, "a").unwrap();
        let b = rt.create(root, &journal, "b").unwrap();

        rt.schedule_run(b);
        rt.schedule_run(a);
        assert_eq!(rt.run_loop(None), 2);
        assert_eq!(journal.entries(), ["run b", "run a"]);
    }

    #[test]
    fn run_loop_respects_limit() {
        let (mut rt, root, journal) = journal();
        let a = rt.create(root, &journal, "a").unwrap();
        for _ in 0..3 {
            rt.schedule_run(a);
        }
        assert_eq!(rt.run_loop(Some(2)), 2);
        assert_eq!(rt.pending_tasks(), 1);
        assert_eq!(rt.run_loop(None), 1);
        assert_eq!(rt.run_loop(None), 0);
    }

    #[test]
    fn run_schedules_then_targets() {
        let (mut rt, root, journal) = journal();
        let a = rt.create(root, &journal, "a").unwrap();
        let b = rt.create(root, &journal, "b").unwrap();
        let c = rt.create(root, &journal, "c").unwrap();
        rt.connect(a, b, "then").unwrap();
        rt.connect(a, c, "then").unwrap();

        rt.schedule_run(a);
        rt.run_loop(None);
        assert_eq!(journal.entries(), ["run a", "run b", "run c"]);
    }

    #[test]
    fn errored_run_does_not_continue() {
        let (mut rt, root, journal) = journal();
        let a = rt.create(root, &journal, "a").unwrap();
        let b = rt.create(root, &journal, "b").unwrap();
        rt.connect(a, b, "then").unwrap();

        rt.schedule_function(a, |rt, a| {
            rt.with_object(a, |object, rt| object.run(rt, a));
            rt.report_error(a, "failed");
        });
        rt.run_loop(None);
        assert!(rt.has_error(a));

        // A later run clears the error and continues.
        rt.schedule_run(a);
        rt.run_loop(None);
        assert!(!rt.has_error(a));
        assert_eq!(journal.entries(), ["run a", "run a", "run b"]);
    }

    #[test]
    fn schedule_update_queues_one_task_per_observer() {
        let (mut rt, root, journal) = journal();
        let source = rt.add_location(root, "source").unwrap();
        let observers: Vec<LocationId> = ["x", "y", "z"]
            .iter()
            .map(|name| rt.create(root, &journal, name).unwrap())
            .collect();
        for &observer in &observers {
            rt.observe_updates(observer, source);
        }

        rt.schedule_update(source);
        assert_eq!(rt.pending_tasks(), 3);
        assert!(journal.entries().is_empty());

        rt.run_loop(None);
        assert_eq!(
            journal.entries(),
            ["update x from source", "update y from source", "update z from source"]
        );
    }

    #[test]
    fn continuation_runs_after_call_tree_and_before_older_tasks() {
        let (mut rt, root, journal) = journal();
        let older = rt.create(root, &journal, "older").unwrap();
        let first = rt.create(root, &journal, "first").unwrap();
        let second = rt.create(root, &journal, "second").unwrap();
        let chained = rt.create(root, &journal, "chained").unwrap();
        let report = rt.create(root, &journal, "report").unwrap();
        rt.connect(first, chained, "then").unwrap();

        rt.schedule_run(older);
        rt.with_then(Task::run(report), |rt| {
            rt.schedule_run(first);
            rt.schedule_run(second);
        });
        rt.run_loop(None);

        assert_eq!(
            journal.entries(),
            ["run older", "run first", "run second", "run chained", "run report"]
        );
    }

    #[test]
    fn continuation_is_spliced_ahead_of_queued_tasks() {
        let (mut rt, root, journal) = journal();
        let work = rt.create(root, &journal, "work").unwrap();
        let later = rt.create(root, &journal, "later").unwrap();
        let report = rt.create(root, &journal, "report").unwrap();

        rt.schedule_function(work, move |rt, work| {
            rt.with_then(Task::run(report), |rt| rt.schedule_run(work));
            rt.schedule_run(later);
        });
        rt.run_loop(None);

        assert_eq!(journal.entries(), ["run work", "run report", "run later"]);
    }

    #[test]
    fn empty_continuation_fires_immediately() {
        let (mut rt, root, journal) = journal();
        let queued = rt.create(root, &journal, "queued").unwrap();
        let report = rt.create(root, &journal, "report").unwrap();

        rt.schedule_run(queued);
        rt.with_then(Task::run(report), |_| ());
        rt.run_loop(None);

        assert_eq!(journal.entries(), ["run report", "run queued"]);
    }

    #[test]
    fn suppressed_targets_drop_tasks() {
        let (mut rt, root, journal) = journal();
        let a = rt.create(root, &journal, "a").unwrap();

        rt.without_scheduling(a, |rt| {
            rt.schedule_run(a);
            rt.without_scheduling(a, |rt| rt.schedule_run(a));
            assert!(rt.is_scheduling_suppressed(a));
        });
        assert!(!rt.is_scheduling_suppressed(a));
        assert_eq!(rt.pending_tasks(), 0);

        rt.schedule_run(a);
        assert_eq!(rt.pending_tasks(), 1);
    }

    #[test]
    fn tasks_for_removed_locations_are_skipped() {
        let (mut rt, root, journal) = journal();
        let a = rt.create(root, &journal, "a").unwrap();
        rt.schedule_run(a);
        rt.remove_location(a).unwrap();

        assert_eq!(rt.run_loop(None), 1);
        assert!(journal.entries().is_empty());
        assert_eq!(rt.executed_tasks(), 0);
    }

    #[test]
    fn abandon_clears_everything() {
        let (mut rt, root, journal) = journal();
        let a = rt.create(root, &journal, "a").unwrap();
        rt.schedule_run(a);
        rt.with_then(Task::run(a), |rt| rt.schedule_run(a));

        assert_eq!(rt.abandon_tasks(), 3);
        assert_eq!(rt.run_loop(None), 0);
    }
}
