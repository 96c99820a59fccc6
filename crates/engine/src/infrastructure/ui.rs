//! UI-thread marshaling adapters.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

use troupe_domain::CallbackError;

use crate::infrastructure::ports::{UiTask, UiThreadPort};

fn describe_panic(payload: Box<dyn Any + Send>) -> CallbackError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "task panicked".to_owned());
    CallbackError::new(message)
}

fn run_trapping_panics(task: UiTask) -> Result<(), CallbackError> {
    match catch_unwind(AssertUnwindSafe(task)) {
        Ok(result) => result,
        Err(payload) => Err(describe_panic(payload)),
    }
}

/// Runs tasks inline on the calling thread. Suitable for headless hosts
/// and tests where no designated UI thread exists.
#[derive(Default)]
pub struct CallerThreadUi;

impl CallerThreadUi {
    pub fn new() -> Self {
        Self
    }
}

impl UiThreadPort for CallerThreadUi {
    fn run_sync(&self, task: UiTask) -> Result<(), CallbackError> {
        run_trapping_panics(task)
    }
}

struct UiJob {
    task: UiTask,
    done: mpsc::Sender<Result<(), CallbackError>>,
}

/// Dedicated UI worker thread.
///
/// Tasks run there in submission order; the submitting thread blocks
/// until its task completes. A panic on the worker is trapped, surfaced
/// to the submitter as an error, and leaves the worker alive for later
/// tasks. Dropping the executor closes the queue and joins the thread.
pub struct UiExecutor {
    sender: Option<mpsc::Sender<UiJob>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl UiExecutor {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel::<UiJob>();
        let worker = thread::Builder::new()
            .name("ui-executor".to_owned())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    let result = run_trapping_panics(job.task);
                    let _ = job.done.send(result);
                }
            })
            .expect("failed to spawn the UI executor thread");
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }
}

impl Default for UiExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl UiThreadPort for UiExecutor {
    fn run_sync(&self, task: UiTask) -> Result<(), CallbackError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| CallbackError::new("UI executor is shut down"))?;
        let (done, wait) = mpsc::channel();
        sender
            .send(UiJob { task, done })
            .map_err(|_| CallbackError::new("UI executor thread is no longer running"))?;
        wait.recv()
            .map_err(|_| CallbackError::new("UI executor dropped the task"))?
    }
}

impl Drop for UiExecutor {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread::ThreadId;

    #[test]
    fn test_caller_thread_ui_runs_inline() {
        let ui = CallerThreadUi::new();
        let here = thread::current().id();
        let seen: Arc<Mutex<Option<ThreadId>>> = Arc::new(Mutex::new(None));
        let witness = Arc::clone(&seen);

        ui.run_sync(Box::new(move || {
            *witness.lock().unwrap() = Some(thread::current().id());
            Ok(())
        }))
        .unwrap();

        assert_eq!(*seen.lock().unwrap(), Some(here));
    }

    #[test]
    fn test_executor_pins_tasks_to_one_thread() {
        let ui = UiExecutor::new();
        let here = thread::current().id();
        let seen: Arc<Mutex<Vec<ThreadId>>> = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..2 {
            let witness = Arc::clone(&seen);
            ui.run_sync(Box::new(move || {
                witness.lock().unwrap().push(thread::current().id());
                Ok(())
            }))
            .unwrap();
        }

        let threads = seen.lock().unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0], threads[1]);
        assert_ne!(threads[0], here);
    }

    #[test]
    fn test_executor_surfaces_panics_and_survives() {
        let ui = UiExecutor::new();
        let err = ui
            .run_sync(Box::new(|| panic!("view blew up")))
            .unwrap_err();
        assert!(err.message().contains("view blew up"));

        // The worker is still alive for the next task.
        ui.run_sync(Box::new(|| Ok(()))).unwrap();
    }

    #[test]
    fn test_task_errors_pass_through() {
        let ui = UiExecutor::new();
        let err = ui
            .run_sync(Box::new(|| Err(CallbackError::new("no window system"))))
            .unwrap_err();
        assert_eq!(err.message(), "no window system");
    }
}
