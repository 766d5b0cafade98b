//! Typed errors surfaced by the GPU task scheduler.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler stopped accepting tasks.
    #[error("gpu task scheduler is closed")]
    Closed,

    /// The task panicked; the worker kept running.
    #[error("gpu task panicked: {0}")]
    TaskPanicked(String),

    /// The task was dropped without reporting a result.
    #[error("gpu task was dropped before completion")]
    Dropped,

    /// Blocking on a queued task from the worker thread itself.
    #[error("waiting on a queued gpu task from the gpu thread would deadlock")]
    WouldDeadlock,

    #[error("failed to spawn gpu worker thread")]
    Spawn(#[source] io::Error),
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_handles_both_string_kinds() {
        let a: Box<dyn std::any::Any + Send> = Box::new("boom");
        let b: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        let c: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(a.as_ref()), "boom");
        assert_eq!(panic_message(b.as_ref()), "bang");
        assert_eq!(panic_message(c.as_ref()), "non-string panic payload");
    }

    #[test]
    fn display_messages() {
        assert_eq!(SchedulerError::Closed.to_string(), "gpu task scheduler is closed");
        assert!(SchedulerError::TaskPanicked("x".into()).to_string().ends_with(": x"));
    }
}
