//! Drift-resistant countdowns.
//!
//! `Countdown` is the pure clock: it is fed real elapsed durations, consumes
//! whole seconds and carries the remainder forward, so late or bunched ticks
//! never make the clock run slow or fast. `CountdownTimer` drives a shared
//! `Countdown` from a tokio interval and fires the tick/complete callbacks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, already finished, or less than a second accumulated.
    Idle,
    Ticked(u32),
    Completed,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    initial: u32,
    remaining: u32,
    running: bool,
    completed: bool,
    carry: Duration,
}

impl Countdown {
    pub fn new(initial_secs: u32, auto_start: bool) -> Self {
        Self {
            initial: initial_secs,
            remaining: initial_secs,
            running: auto_start && initial_secs > 0,
            completed: false,
            carry: Duration::ZERO,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn initial(&self) -> u32 {
        self.initial
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn start(&mut self) {
        if self.remaining > 0 {
            self.running = true;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.remaining = self.initial;
        self.running = false;
        self.completed = false;
        self.carry = Duration::ZERO;
    }

    /// Adds time. A countdown that already reached zero is re-armed and keeps
    /// running; a paused one stays paused.
    pub fn extend(&mut self, secs: u32) {
        if secs == 0 {
            return;
        }
        self.remaining = self.remaining.saturating_add(secs);
        if self.completed {
            self.completed = false;
            self.running = true;
        }
    }

    pub fn advance(&mut self, elapsed: Duration) -> TickOutcome {
        if !self.running || self.remaining == 0 {
            return TickOutcome::Idle;
        }

        self.carry += elapsed;
        let whole = self.carry.as_secs();
        if whole == 0 {
            return TickOutcome::Idle;
        }
        self.carry -= Duration::from_secs(whole);

        let consumed = u32::try_from(whole).unwrap_or(u32::MAX);
        self.remaining = self.remaining.saturating_sub(consumed);
        if self.remaining == 0 {
            self.running = false;
            self.completed = true;
            self.carry = Duration::ZERO;
            return TickOutcome::Completed;
        }
        TickOutcome::Ticked(self.remaining)
    }
}

/// Handle to a countdown ticking on the tokio runtime.
///
/// Callbacks run on the timer task while an internal gate is held, so once
/// `stop` (or drop) returns no further callback fires. A callback must not stop
/// its own timer.
pub struct CountdownTimer {
    countdown: Arc<Mutex<Countdown>>,
    live: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl CountdownTimer {
    /// Must be called from within a tokio runtime.
    pub fn spawn<T, C>(
        countdown: Countdown,
        period: Duration,
        mut on_tick: T,
        mut on_complete: C,
    ) -> Self
    where
        T: FnMut(u32) + Send + 'static,
        C: FnMut() + Send + 'static,
    {
        let countdown = Arc::new(Mutex::new(countdown));
        let live = Arc::new(Mutex::new(true));

        let task_countdown = countdown.clone();
        let task_live = live.clone();
        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            let mut last = Instant::now();

            loop {
                interval.tick().await;
                let now = Instant::now();
                let elapsed = now.duration_since(last);
                last = now;

                let gate = task_live.lock().expect("timer gate mutex poisoned");
                if !*gate {
                    break;
                }
                let outcome = task_countdown
                    .lock()
                    .expect("countdown mutex poisoned")
                    .advance(elapsed);
                match outcome {
                    TickOutcome::Idle => {}
                    TickOutcome::Ticked(remaining) => on_tick(remaining),
                    TickOutcome::Completed => {
                        on_tick(0);
                        on_complete();
                    }
                }
                drop(gate);
            }
        });

        Self {
            countdown,
            live,
            task,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.lock().remaining()
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_running()
    }

    pub fn start(&self) {
        self.lock().start();
    }

    pub fn pause(&self) {
        self.lock().pause();
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn extend(&self, secs: u32) {
        self.lock().extend(secs);
    }

    /// Stops ticking for good. Idempotent.
    pub fn stop(&self) {
        let mut gate = self.live.lock().expect("timer gate mutex poisoned");
        *gate = false;
        self.task.abort();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Countdown> {
        self.countdown.lock().expect("countdown mutex poisoned")
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
