//! The scheduler thread and its cross-thread entry points.
//!
//! An [`AutomatThread`] owns an [`Automat`] on a dedicated thread and keeps
//! draining its task queue. Other threads never touch the graph; they hand
//! closures to the thread through an [`AutomatHandle`]:
//!
//! - [`AutomatHandle::run_on_automat_thread`] queues a closure and returns.
//! - [`AutomatHandle::run_on_automat_thread_synchronous`] waits for the
//!   closure's result.
//!
//! Closures travel through a one-slot [`Channel`], so a producer blocks while
//! the previous closure has not been picked up yet.
//!
//! ```rust,ignore
//! let thread = AutomatThread::spawn(ThreadOptions::default(), |rt| build(rt))?;
//! let text = thread.handle().run_on_automat_thread_synchronous(move |rt| rt.text(label))?;
//! thread.stop()?;
//! ```

use std::cell::RefCell;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, mpsc};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use thiserror::Error;

use crate::channel::Channel;
use crate::graph::Automat;

/// Closure executed on the scheduler thread.
pub type Job = Box<dyn FnOnce(&mut Automat) + Send>;

/// Errors returned by the cross-thread entry points.
#[derive(Debug, Error)]
pub enum ThreadError {
    /// The operating system refused to start the thread.
    #[error("failed to spawn the automat thread")]
    Spawn(#[source] io::Error),
    /// The scheduler thread is stopping or has stopped.
    #[error("the automat thread has stopped")]
    Stopped,
    /// A synchronous call was made from the scheduler thread itself.
    #[error("synchronous call issued from the automat thread")]
    Reentrant,
    /// The scheduler thread panicked.
    #[error("the automat thread panicked")]
    Panicked,
}

/// Settings of the scheduler thread.
#[derive(Clone, Debug)]
pub struct ThreadOptions {
    /// Thread name, visible in debuggers and logs.
    pub name: String,
    /// How long the idle thread waits for a closure before checking the stop
    /// flag again.
    pub poll_interval: Duration,
    /// Log every executed task at debug level.
    pub log_executed_tasks: bool,
}

impl Default for ThreadOptions {
    fn default() -> Self {
        Self {
            name: "automat".to_string(),
            poll_interval: Duration::from_millis(50),
            log_executed_tasks: false,
        }
    }
}

struct Shared {
    events: Channel<Job>,
    stop: AtomicBool,
    finished: AtomicBool,
    thread_id: OnceLock<ThreadId>,
    poll_interval: Duration,
}

thread_local! {
    /// Closures submitted from the scheduler thread itself, queued behind the
    /// current drain.
    static DEFERRED: RefCell<Vec<Job>> = const { RefCell::new(Vec::new()) };
}

/// A running scheduler thread.
///
/// Dropping it stops the thread and waits for it.
pub struct AutomatThread {
    handle: AutomatHandle,
    join: Option<JoinHandle<()>>,
}

impl AutomatThread {
    /// Starts the scheduler thread.
    ///
    /// `init` runs first on the new thread and builds the initial graph.
    pub fn spawn(
        options: ThreadOptions,
        init: impl FnOnce(&mut Automat) + Send + 'static,
    ) -> Result<Self, ThreadError> {
        let shared = Arc::new(Shared {
            events: Channel::new(),
            stop: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            thread_id: OnceLock::new(),
            poll_interval: options.poll_interval,
        });
        let thread_shared = Arc::clone(&shared);
        let log_executed_tasks = options.log_executed_tasks;
        let join = thread::Builder::new()
            .name(options.name.clone())
            .spawn(move || {
                let _ = thread_shared.thread_id.set(thread::current().id());
                let mut rt = Automat::new();
                rt.set_log_executed_tasks(log_executed_tasks);
                init(&mut rt);
                drive(&mut rt, &thread_shared);
            })
            .map_err(ThreadError::Spawn)?;
        tracing::debug!(name = %options.name, "automat thread started");
        Ok(Self {
            handle: AutomatHandle { shared },
            join: Some(join),
        })
    }

    /// Handle for submitting closures.
    pub fn handle(&self) -> AutomatHandle {
        self.handle.clone()
    }

    /// Stops the thread and waits for it. Queued tasks are abandoned.
    pub fn stop(mut self) -> Result<(), ThreadError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), ThreadError> {
        let Some(join) = self.join.take() else {
            return Ok(());
        };
        let shared = &self.handle.shared;
        shared.stop.store(true, Ordering::Release);
        // Wake the thread if it is waiting for a closure.
        let _ = shared.events.try_send(Box::new(|_| {}));
        join.join().map_err(|_| ThreadError::Panicked)
    }
}

impl Drop for AutomatThread {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            tracing::error!("{error}");
        }
    }
}

fn drive(rt: &mut Automat, shared: &Shared) {
    let root = rt.root();
    while !shared.stop.load(Ordering::Acquire) {
        rt.run_loop(None);
        let deferred = DEFERRED.with_borrow_mut(std::mem::take);
        if !deferred.is_empty() {
            for job in deferred {
                rt.schedule_function(root, move |rt, _| job(rt));
            }
            continue;
        }
        if let Some(job) = shared.events.recv_timeout(shared.poll_interval) {
            rt.schedule_function(root, move |rt, _| job(rt));
        }
    }
    shared.finished.store(true, Ordering::Release);
    DEFERRED.with_borrow_mut(Vec::clear);
    let abandoned = rt.abandon_tasks();
    tracing::debug!(abandoned, "automat thread stopped");
}

/// Cloneable access to a running scheduler thread.
#[derive(Clone)]
pub struct AutomatHandle {
    shared: Arc<Shared>,
}

impl AutomatHandle {
    /// Whether the calling thread is the scheduler thread.
    pub fn is_automat_thread(&self) -> bool {
        self.shared.thread_id.get() == Some(&thread::current().id())
    }

    /// Whether the scheduler thread is stopping or gone.
    pub fn is_stopped(&self) -> bool {
        self.shared.stop.load(Ordering::Acquire) || self.shared.finished.load(Ordering::Acquire)
    }

    /// Runs `f` on the scheduler thread without waiting for it.
    ///
    /// Called from the scheduler thread, `f` runs once the current drain of
    /// the queue is over, never inside the running task.
    pub fn run_on_automat_thread(
        &self,
        f: impl FnOnce(&mut Automat) + Send + 'static,
    ) -> Result<(), ThreadError> {
        if self.is_automat_thread() {
            DEFERRED.with_borrow_mut(|deferred| deferred.push(Box::new(f)));
            return Ok(());
        }
        self.submit(Box::new(f))
    }

    /// Runs `f` on the scheduler thread and returns its result.
    ///
    /// Fails with [`ThreadError::Reentrant`] on the scheduler thread, where
    /// the running task already has the [`Automat`] and should use it
    /// directly.
    pub fn run_on_automat_thread_synchronous<R: Send + 'static>(
        &self,
        f: impl FnOnce(&mut Automat) -> R + Send + 'static,
    ) -> Result<R, ThreadError> {
        if self.is_automat_thread() {
            return Err(ThreadError::Reentrant);
        }
        let (reply, result) = mpsc::sync_channel(1);
        self.submit(Box::new(move |rt| {
            let _ = reply.send(f(rt));
        }))?;
        loop {
            match result.recv_timeout(self.shared.poll_interval) {
                Ok(value) => return Ok(value),
                Err(mpsc::RecvTimeoutError::Disconnected) => return Err(ThreadError::Stopped),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if self.shared.finished.load(Ordering::Acquire) {
                        return result.try_recv().map_err(|_| ThreadError::Stopped);
                    }
                }
            }
        }
    }

    fn submit(&self, mut job: Job) -> Result<(), ThreadError> {
        loop {
            if self.is_stopped() {
                return Err(ThreadError::Stopped);
            }
            match self.shared.events.send_timeout(job, self.shared.poll_interval) {
                Ok(()) => return Ok(()),
                Err(returned) => job = returned,
            }
        }
    }
}

impl std::fmt::Debug for AutomatHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomatHandle")
            .field("thread_id", &self.shared.thread_id.get())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
