//! Single-thread GPU task scheduler.
//!
//! Every graphics-context operation runs on one dedicated OS thread, one task
//! at a time, in submission order. Callers get a `TaskHandle` that can be
//! awaited or blocked on.
//!
//! Shutdown is cooperative: `complete()` closes the queue, already-queued
//! tasks still run, then the worker exits.

mod handle;
mod worker;

pub use handle::TaskHandle;
pub use worker::GpuTaskScheduler;
