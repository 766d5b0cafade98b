use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use futures::channel::oneshot;

use crate::config::SchedulerConfig;
use crate::error::{panic_message, SchedulerError};

use super::handle::{TaskHandle, TaskResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Serializes GPU work onto one dedicated thread.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct GpuTaskScheduler {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
    thread_name: String,
}

impl std::fmt::Debug for GpuTaskScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuTaskScheduler")
            .field("thread_name", &self.thread_name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl GpuTaskScheduler {
    /// Spawns the worker thread.
    pub fn new(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        let (tx, rx) = mpsc::channel::<Job>();

        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }
        let handle = builder.spawn(move || run(rx)).map_err(SchedulerError::Spawn)?;

        log::debug!("gpu worker '{}' started", config.thread_name);

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            thread_id: handle.thread().id(),
            worker: Mutex::new(Some(handle)),
            thread_name: config.thread_name.clone(),
        })
    }

    #[inline]
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// True when called from the worker thread.
    #[inline]
    pub fn is_gpu_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.sender).is_none()
    }

    /// Queues `task` behind everything already submitted.
    ///
    /// After `complete()` the returned handle resolves to
    /// `SchedulerError::Closed` and the task is dropped unrun.
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<TaskResult<T>>();
        let job: Job = Box::new(move || {
            // The receiver may be gone; the task still had to run.
            let _ = tx.send(run_caught(task));
        });

        let sender = lock(&self.sender);
        let Some(sender) = sender.as_ref() else {
            log::debug!("task submitted after completion; rejected");
            return TaskHandle::ready(Err(SchedulerError::Closed));
        };
        if sender.send(job).is_err() {
            return TaskHandle::ready(Err(SchedulerError::Closed));
        }
        TaskHandle::pending(rx, self.thread_id)
    }

    /// Runs `task` immediately when already on the worker thread, otherwise
    /// queues it like `submit`.
    pub fn execute<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.is_gpu_thread() {
            TaskHandle::ready(run_caught(task))
        } else {
            self.submit(task)
        }
    }

    /// Stops accepting tasks. Queued tasks still run. Idempotent.
    pub fn complete(&self) {
        if lock(&self.sender).take().is_some() {
            log::debug!("gpu worker '{}' completing", self.thread_name);
        }
    }

    /// Waits for the worker to drain and exit.
    ///
    /// Does not close the queue by itself; call `complete()` first. A no-op
    /// on the worker thread and after the first successful join.
    pub fn join(&self) {
        if self.is_gpu_thread() {
            log::warn!("join() called on the gpu worker itself; ignored");
            return;
        }
        let Some(handle) = lock(&self.worker).take() else { return };
        if handle.join().is_err() {
            log::error!("gpu worker '{}' terminated abnormally", self.thread_name);
        }
    }

    /// `complete()` followed by `join()`.
    pub fn shutdown(&self) {
        self.complete();
        self.join();
    }
}

impl Drop for GpuTaskScheduler {
    fn drop(&mut self) {
        self.complete();
        // Dropped from inside a task: the worker exits on its own once the
        // channel is empty.
        if !self.is_gpu_thread() {
            self.join();
        }
    }
}

fn run(rx: mpsc::Receiver<Job>) {
    for job in rx {
        job();
    }
    log::debug!("gpu worker exiting");
}

fn run_caught<T, F: FnOnce() -> T>(task: F) -> TaskResult<T> {
    panic::catch_unwind(AssertUnwindSafe(task)).map_err(|payload| {
        let msg = panic_message(payload.as_ref());
        log::error!("gpu task panicked: {msg}");
        SchedulerError::TaskPanicked(msg)
    })
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
