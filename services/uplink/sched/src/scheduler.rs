//! Single-context dispatch loop with recurring tasks and a one-shot queue.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{self, Instant};
use tracing::{error, info, trace};

/// Future returned by a scheduled task, borrowing the shared context for
/// the duration of the invocation.
pub type TaskFuture<'a> = BoxFuture<'a, ()>;

/// Errors reported when queueing a one-shot event.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    /// The bounded one-shot queue is full; the event was dropped.
    #[error("one-shot queue full; event dropped")]
    QueueFull,
    /// The dispatch loop is gone; the event was dropped.
    #[error("scheduler stopped; event dropped")]
    Closed,
}

struct Recurring<C> {
    name: &'static str,
    period: Duration,
    due: Instant,
    task: Box<dyn for<'a> FnMut(&'a mut C) -> TaskFuture<'a> + Send>,
}

/// Cooperative task scheduler owning one dispatch context.
///
/// `C` is the shared context every task receives by `&mut`; `E` is the
/// one-shot event type delivered through [`SchedulerHandle::call`].
pub struct Scheduler<C, E> {
    recurring: Vec<Recurring<C>>,
    dispatch: Box<dyn for<'a> FnMut(&'a mut C, E) -> TaskFuture<'a> + Send>,
    queue_tx: mpsc::Sender<E>,
    queue_rx: mpsc::Receiver<E>,
}

/// Cloneable enqueue handle for one-shot events.
pub struct SchedulerHandle<E> {
    tx: mpsc::Sender<E>,
}

impl<E> Clone for SchedulerHandle<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> SchedulerHandle<E> {
    /// Queue `event` for the next dispatch opportunity.
    ///
    /// Non-blocking and constant-time, so it is safe to call from a context
    /// that preempts the dispatch loop. A full queue drops the event and
    /// reports [`ScheduleError::QueueFull`]; the caller decides whether the
    /// loss matters.
    pub fn call(&self, event: E) -> Result<(), ScheduleError> {
        self.tx.try_send(event).map_err(|err| match err {
            TrySendError::Full(_) => ScheduleError::QueueFull,
            TrySendError::Closed(_) => ScheduleError::Closed,
        })
    }
}

enum Wake<E> {
    Event(Option<E>),
    Due(usize),
}

impl<C, E: std::fmt::Debug> Scheduler<C, E> {
    /// Create a scheduler with a one-shot queue of `queue_capacity` events,
    /// dispatched through `dispatch`.
    pub fn new<F>(queue_capacity: usize, dispatch: F) -> Self
    where
        F: for<'a> FnMut(&'a mut C, E) -> TaskFuture<'a> + Send + 'static,
    {
        let (queue_tx, queue_rx) = mpsc::channel(queue_capacity);
        Self {
            recurring: Vec::new(),
            dispatch: Box::new(dispatch),
            queue_tx,
            queue_rx,
        }
    }

    /// Register a fixed-period recurring task.
    ///
    /// The first invocation happens one full period after registration.
    /// Tasks registered earlier win due-time ties.
    pub fn schedule_recurring<F>(&mut self, name: &'static str, period: Duration, task: F)
    where
        F: for<'a> FnMut(&'a mut C) -> TaskFuture<'a> + Send + 'static,
    {
        self.recurring.push(Recurring {
            name,
            period,
            due: Instant::now() + period,
            task: Box::new(task),
        });
    }

    /// Enqueue handle for one-shot events, cloneable across contexts.
    pub fn handle(&self) -> SchedulerHandle<E> {
        SchedulerHandle {
            tx: self.queue_tx.clone(),
        }
    }

    /// Run the dispatch loop forever.
    ///
    /// Takes ownership of the shared context; tasks receive it by `&mut`
    /// one at a time, never concurrently. Never returns under normal
    /// operation.
    pub async fn run(mut self, mut ctx: C) {
        info!(
            recurring = self.recurring.len(),
            "scheduler dispatch loop started"
        );

        loop {
            // Earliest-due recurring task; registration order breaks ties.
            let next = self
                .recurring
                .iter()
                .enumerate()
                .min_by_key(|(idx, task)| (task.due, *idx))
                .map(|(idx, task)| (idx, task.due));

            match next {
                Some((idx, due)) => {
                    // The scheduler holds its own sender, so the queue never
                    // closes while the loop is alive.
                    let wake = tokio::select! {
                        biased;
                        event = self.queue_rx.recv() => Wake::Event(event),
                        _ = time::sleep_until(due) => Wake::Due(idx),
                    };
                    match wake {
                        Wake::Event(Some(event)) => self.run_event(&mut ctx, event).await,
                        Wake::Event(None) => {}
                        Wake::Due(idx) => self.run_recurring(idx, &mut ctx).await,
                    }
                }
                None => {
                    if let Some(event) = self.queue_rx.recv().await {
                        self.run_event(&mut ctx, event).await;
                    }
                }
            }
        }
    }

    async fn run_recurring(&mut self, idx: usize, ctx: &mut C) {
        let name = self.recurring[idx].name;
        trace!(task = name, "recurring task firing");
        let fut = (self.recurring[idx].task)(ctx);
        if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
            error!(task = name, "recurring task panicked; invocation aborted");
        }
        // Re-arm from completion time: an overrun delays the next firing
        // instead of overlapping it.
        let task = &mut self.recurring[idx];
        task.due = Instant::now() + task.period;
    }

    async fn run_event(&mut self, ctx: &mut C, event: E) {
        trace!(?event, "one-shot event dispatching");
        let fut = (self.dispatch)(&mut *ctx, event);
        if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
            error!("one-shot task panicked; invocation aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::{mpsc::UnboundedSender, Notify};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestEvent {
        Poke,
    }

    struct TestCtx {
        log: UnboundedSender<&'static str>,
        starts: UnboundedSender<Instant>,
        gate: Arc<Notify>,
    }

    fn test_ctx(
        gate: Arc<Notify>,
    ) -> (
        TestCtx,
        tokio::sync::mpsc::UnboundedReceiver<&'static str>,
        tokio::sync::mpsc::UnboundedReceiver<Instant>,
    ) {
        let (log_tx, log_rx) = tokio::sync::mpsc::unbounded_channel();
        let (starts_tx, starts_rx) = tokio::sync::mpsc::unbounded_channel();
        (
            TestCtx {
                log: log_tx,
                starts: starts_tx,
                gate,
            },
            log_rx,
            starts_rx,
        )
    }

    fn dispatch(ctx: &mut TestCtx, _event: TestEvent) -> TaskFuture<'_> {
        Box::pin(async move {
            ctx.log.send("event").unwrap();
        })
    }

    fn task_a(ctx: &mut TestCtx) -> TaskFuture<'_> {
        Box::pin(async move {
            ctx.log.send("a").unwrap();
        })
    }

    fn task_b(ctx: &mut TestCtx) -> TaskFuture<'_> {
        Box::pin(async move {
            ctx.log.send("b").unwrap();
        })
    }

    fn slow_task(ctx: &mut TestCtx) -> TaskFuture<'_> {
        Box::pin(async move {
            ctx.log.send("slow:start").unwrap();
            ctx.gate.notified().await;
            ctx.log.send("slow:end").unwrap();
        })
    }

    fn overrun_task(ctx: &mut TestCtx) -> TaskFuture<'_> {
        Box::pin(async move {
            ctx.starts.send(Instant::now()).unwrap();
            time::sleep(Duration::from_millis(250)).await;
        })
    }

    fn panicking_task(_ctx: &mut TestCtx) -> TaskFuture<'_> {
        Box::pin(async move {
            panic!("boom");
        })
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<&'static str>) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Ok(entry) = rx.try_recv() {
            out.push(entry);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fire_after_one_period() {
        let (ctx, mut log_rx, _starts) = test_ctx(Arc::new(Notify::new()));
        let mut sched = Scheduler::new(4, dispatch);
        sched.schedule_recurring("a", Duration::from_millis(100), task_a);
        tokio::spawn(sched.run(ctx));
        settle().await;

        time::advance(Duration::from_millis(99)).await;
        settle().await;
        assert!(drain(&mut log_rx).is_empty(), "fired before one period");

        time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(drain(&mut log_rx), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_time_ties_follow_registration_order() {
        let (ctx, mut log_rx, _starts) = test_ctx(Arc::new(Notify::new()));
        let mut sched = Scheduler::new(4, dispatch);
        sched.schedule_recurring("a", Duration::from_millis(100), task_a);
        sched.schedule_recurring("b", Duration::from_millis(100), task_b);
        tokio::spawn(sched.run(ctx));
        settle().await;

        for _ in 0..4 {
            time::advance(Duration::from_millis(50)).await;
            settle().await;
        }
        assert_eq!(drain(&mut log_rx), vec!["a", "b", "a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_runs_after_current_task_completes() {
        let gate = Arc::new(Notify::new());
        let (ctx, mut log_rx, _starts) = test_ctx(gate.clone());
        let mut sched = Scheduler::new(4, dispatch);
        sched.schedule_recurring("slow", Duration::from_millis(100), slow_task);
        let handle = sched.handle();
        tokio::spawn(sched.run(ctx));
        settle().await;

        time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(drain(&mut log_rx), vec!["slow:start"]);

        // Trigger fires while the recurring task is mid-execution: the
        // one-shot must wait for it, never interleave with it.
        handle.call(TestEvent::Poke).unwrap();
        settle().await;
        assert!(drain(&mut log_rx).is_empty());

        gate.notify_one();
        settle().await;
        assert_eq!(drain(&mut log_rx), vec!["slow:end", "event"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shots_run_before_due_recurring() {
        let (ctx, mut log_rx, _starts) = test_ctx(Arc::new(Notify::new()));
        let mut sched = Scheduler::new(4, dispatch);
        sched.schedule_recurring("a", Duration::from_millis(100), task_a);
        let handle = sched.handle();
        handle.call(TestEvent::Poke).unwrap();
        handle.call(TestEvent::Poke).unwrap();
        tokio::spawn(sched.run(ctx));
        settle().await;

        // Both queued events drain before the timer has a chance.
        assert_eq!(drain(&mut log_rx), vec!["event", "event"]);

        time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(drain(&mut log_rx), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_task_does_not_stop_the_loop() {
        let (ctx, mut log_rx, _starts) = test_ctx(Arc::new(Notify::new()));
        let mut sched = Scheduler::new(4, dispatch);
        sched.schedule_recurring("boom", Duration::from_millis(100), panicking_task);
        sched.schedule_recurring("a", Duration::from_millis(100), task_a);
        tokio::spawn(sched.run(ctx));
        settle().await;

        for _ in 0..4 {
            time::advance(Duration::from_millis(100)).await;
            settle().await;
        }
        let fired = drain(&mut log_rx);
        assert!(
            fired.iter().filter(|name| **name == "a").count() >= 2,
            "survivor task starved after panics: {:?}",
            fired
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_delays_next_firing() {
        let (ctx, _log_rx, mut starts_rx) = test_ctx(Arc::new(Notify::new()));
        let mut sched = Scheduler::new(4, dispatch);
        // Period 100ms, each invocation takes 250ms
        sched.schedule_recurring("overrun", Duration::from_millis(100), overrun_task);
        tokio::spawn(sched.run(ctx));
        settle().await;

        for _ in 0..20 {
            time::advance(Duration::from_millis(50)).await;
            settle().await;
        }

        let mut starts = Vec::new();
        while let Ok(at) = starts_rx.try_recv() {
            starts.push(at);
        }
        assert!(starts.len() >= 2);
        // Next firing is one period after completion, never overlapped
        assert_eq!(starts[1] - starts[0], Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_full_queue_reports_and_drops() {
        let (ctx, _log_rx, _starts) = test_ctx(Arc::new(Notify::new()));
        let sched: Scheduler<TestCtx, TestEvent> = Scheduler::new(1, dispatch);
        let handle = sched.handle();
        drop(ctx);

        assert_eq!(handle.call(TestEvent::Poke), Ok(()));
        assert_eq!(handle.call(TestEvent::Poke), Err(ScheduleError::QueueFull));
    }
}
