use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread::{self, ThreadId};

use futures::channel::oneshot;

use crate::error::SchedulerError;

pub(super) type TaskResult<T> = Result<T, SchedulerError>;

enum State<T> {
    /// Result known at creation (inline execution or closed scheduler).
    Ready(Option<TaskResult<T>>),
    /// Waiting on the worker.
    Pending(oneshot::Receiver<TaskResult<T>>),
}

/// Completion handle for a submitted GPU task.
///
/// Resolves once the task has run (or failed). Dropping the handle does not
/// cancel the task.
#[must_use = "dropping a TaskHandle discards the task result"]
pub struct TaskHandle<T> {
    state: State<T>,
    gpu_thread: Option<ThreadId>,
}

// No field is ever pinned; `T` is only moved out by value.
impl<T> Unpin for TaskHandle<T> {}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            State::Ready(Some(_)) => "ready",
            State::Ready(None) => "taken",
            State::Pending(_) => "pending",
        };
        f.debug_struct("TaskHandle").field("state", &state).finish()
    }
}

impl<T> TaskHandle<T> {
    /// A handle that is already resolved to `value`.
    pub fn resolved(value: T) -> Self {
        Self::ready(Ok(value))
    }

    pub(super) fn ready(result: TaskResult<T>) -> Self {
        Self { state: State::Ready(Some(result)), gpu_thread: None }
    }

    pub(super) fn pending(rx: oneshot::Receiver<TaskResult<T>>, gpu_thread: ThreadId) -> Self {
        Self { state: State::Pending(rx), gpu_thread: Some(gpu_thread) }
    }

    /// Returns the result if the task already finished, without blocking.
    pub fn try_take(&mut self) -> Option<TaskResult<T>> {
        match &mut self.state {
            State::Ready(slot) => slot.take(),
            State::Pending(rx) => match rx.try_recv() {
                Ok(Some(result)) => {
                    self.state = State::Ready(None);
                    Some(result)
                }
                Ok(None) => None,
                Err(oneshot::Canceled) => {
                    self.state = State::Ready(None);
                    Some(Err(SchedulerError::Dropped))
                }
            },
        }
    }

    /// Blocks the current thread until the task finishes.
    ///
    /// On the GPU thread itself a still-queued task can never run while we
    /// block, so that case returns `SchedulerError::WouldDeadlock`.
    pub fn wait(mut self) -> TaskResult<T> {
        if self.gpu_thread == Some(thread::current().id()) {
            return match self.try_take() {
                Some(result) => result,
                None => Err(SchedulerError::WouldDeadlock),
            };
        }
        pollster::block_on(self)
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            State::Ready(slot) => Poll::Ready(slot.take().unwrap_or(Err(SchedulerError::Dropped))),
            State::Pending(rx) => match Pin::new(rx).poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(received) => {
                    this.state = State::Ready(None);
                    Poll::Ready(received.unwrap_or(Err(SchedulerError::Dropped)))
                }
            },
        }
    }
}
