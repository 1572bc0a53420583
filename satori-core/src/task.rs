//! Task boundary around remote work.
//!
//! Every network call runs inside [`TaskHandler::execute`] on a handler
//! obtained from [`TaskManager::acquire`]. The returned [`TaskGuard`] closes
//! the handler when dropped, so the handler is released on success, error
//! and cancellation alike.

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// The task was cancelled before its work started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task cancelled")]
pub struct TaskCancelled;

pub trait TaskHandler {
    /// Progress message for the user.
    fn log(&self, message: &str);

    /// Run `work` as one unit. An implementation that supports cancellation
    /// returns `TaskCancelled` instead of running the work; it never stops
    /// work that has already started.
    fn execute<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<TaskCancelled>;

    /// Release the handler. Called exactly once by [`TaskGuard`].
    fn close(&self) {}
}

pub trait TaskManager {
    type Handler: TaskHandler;

    /// Open a raw handler. Prefer [`TaskManager::acquire`].
    fn open(&self) -> Self::Handler;

    fn acquire(&self) -> TaskGuard<Self::Handler> {
        TaskGuard::new(self.open())
    }
}

/// Scoped ownership of a handler; closes it on drop.
#[derive(Debug)]
pub struct TaskGuard<H: TaskHandler> {
    handler: H,
}

impl<H: TaskHandler> TaskGuard<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }
}

impl<H: TaskHandler> Deref for TaskGuard<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handler
    }
}

impl<H: TaskHandler> Drop for TaskGuard<H> {
    fn drop(&mut self) {
        self.handler.close();
    }
}

// ---------------------------------------------------------------------------
// Tracing-backed implementation
// ---------------------------------------------------------------------------

/// Default task manager: logs through `tracing` and honours a shared
/// cancellation flag checked before each unit of work.
#[derive(Debug, Clone, Default)]
pub struct TracingTaskManager {
    next_id: Arc<AtomicU64>,
    cancelled: Arc<AtomicBool>,
}

impl TracingTaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every task that has not started its work yet.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

impl TaskManager for TracingTaskManager {
    type Handler = TracingTask;

    fn open(&self) -> TracingTask {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(task = id, "task opened");
        TracingTask {
            id,
            cancelled: Arc::clone(&self.cancelled),
        }
    }
}

#[derive(Debug)]
pub struct TracingTask {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl TracingTask {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl TaskHandler for TracingTask {
    fn log(&self, message: &str) {
        tracing::info!(task = self.id, "{message}");
    }

    fn execute<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<TaskCancelled>,
    {
        if self.cancelled.load(Ordering::SeqCst) {
            tracing::info!(task = self.id, "task cancelled before start");
            return Err(TaskCancelled.into());
        }
        work()
    }

    fn close(&self) {
        tracing::debug!(task = self.id, "task closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingHandler {
        closed: Rc<Cell<u32>>,
    }

    impl TaskHandler for CountingHandler {
        fn log(&self, _message: &str) {}

        fn execute<T, E, F>(&self, work: F) -> Result<T, E>
        where
            F: FnOnce() -> Result<T, E>,
            E: From<TaskCancelled>,
        {
            work()
        }

        fn close(&self) {
            self.closed.set(self.closed.get() + 1);
        }
    }

    #[test]
    fn guard_closes_on_success_and_error() {
        let closed = Rc::new(Cell::new(0));

        {
            let guard = TaskGuard::new(CountingHandler {
                closed: Rc::clone(&closed),
            });
            let ok: Result<u32, TaskCancelled> = guard.execute(|| Ok(7));
            assert_eq!(ok, Ok(7));
        }
        assert_eq!(closed.get(), 1);

        let run = || -> Result<(), TaskCancelled> {
            let guard = TaskGuard::new(CountingHandler {
                closed: Rc::clone(&closed),
            });
            guard.execute(|| Err::<(), _>(TaskCancelled))?;
            unreachable!("error propagates before this point");
        };
        assert!(run().is_err());
        assert_eq!(closed.get(), 2);
    }

    #[test]
    fn cancelled_manager_skips_work() {
        let manager = TracingTaskManager::new();
        manager.cancel();
        let task = manager.acquire();
        let ran = Cell::new(false);
        let result: Result<(), TaskCancelled> = task.execute(|| {
            ran.set(true);
            Ok(())
        });
        assert_eq!(result, Err(TaskCancelled));
        assert!(!ran.get());

        manager.resume();
        let result: Result<u8, TaskCancelled> = manager.acquire().execute(|| Ok(1));
        assert_eq!(result, Ok(1));
    }

    #[test]
    fn task_ids_increase() {
        let manager = TracingTaskManager::new();
        let a = manager.acquire();
        let b = manager.acquire();
        assert!(b.id() > a.id());
    }
}
