//! Cooperative task scheduling for the uplink client.
//!
//! A [`Scheduler`] owns one dispatch context and one queue. Recurring tasks
//! run on fixed periods; one-shot events arrive through a bounded channel
//! and run at the next dispatch opportunity. Exactly one task executes at a
//! time, so everything the tasks share lives in a single context value that
//! each task receives by `&mut`. The single-writer guarantee is structural,
//! not a lock.
//!
//! ## Ordering
//!
//! - Recurring tasks fire in non-decreasing due-time order; due-time ties
//!   are broken by registration order.
//! - Queued one-shots run before any due recurring task at each dispatch
//!   point, in queue order.
//! - A task that overruns its period delays the next firing; firings never
//!   overlap.
//!
//! ## Fault isolation
//!
//! A panicking task aborts only that invocation. The dispatch loop logs the
//! panic and keeps running; no component failure stops the scheduler.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use uplink_sched::{Scheduler, TaskFuture};
//!
//! struct Ctx {
//!     ticks: u64,
//! }
//!
//! #[derive(Debug, Clone, Copy)]
//! enum Event {
//!     Poke,
//! }
//!
//! fn tick(ctx: &mut Ctx) -> TaskFuture<'_> {
//!     Box::pin(async move { ctx.ticks += 1 })
//! }
//!
//! fn dispatch(ctx: &mut Ctx, _event: Event) -> TaskFuture<'_> {
//!     Box::pin(async move { ctx.ticks += 1 })
//! }
//!
//! # async fn example() {
//! let mut sched = Scheduler::new(16, dispatch);
//! sched.schedule_recurring("tick", Duration::from_secs(1), tick);
//! let handle = sched.handle();
//! handle.call(Event::Poke).ok();
//! sched.run(Ctx { ticks: 0 }).await; // never returns
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod scheduler;
pub mod trigger;

pub use scheduler::{ScheduleError, Scheduler, SchedulerHandle, TaskFuture};
pub use trigger::TriggerBridge;
