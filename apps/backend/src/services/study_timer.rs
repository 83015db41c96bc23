//! Per-user study session tickers.
//!
//! Each running session is a tokio task that flushes elapsed time to a
//! [`StudyTimeSink`] every tick. Stopping a session signals the task over a
//! oneshot channel; the task flushes the partial remainder before it exits.
//!
//! Clients keep a session alive with heartbeats. A session that goes
//! `idle_ticks` ticks without one ends itself, so a closed tab stops counting.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use uuid::Uuid;
use vocab_core::timer::{duration_ms, StudyClock};

use crate::db::Database;
use crate::error::Result;

/// Ticks without a heartbeat before a session ends on its own.
pub const DEFAULT_IDLE_TICKS: u32 = 30;

/// Attempts at the last flush of a session before its time is given up.
const FINAL_FLUSH_ATTEMPTS: u32 = 3;

/// Where flushed study time goes.
pub trait StudyTimeSink: Send + Sync + 'static {
    fn add_study_time(
        &self,
        user_id: Uuid,
        elapsed_ms: u64,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl StudyTimeSink for Database {
    fn add_study_time(
        &self,
        user_id: Uuid,
        elapsed_ms: u64,
    ) -> impl Future<Output = Result<()>> + Send {
        Database::add_study_time(self, user_id, elapsed_ms)
    }
}


struct RunningSession {
    id: u64,
    stop: oneshot::Sender<()>,
    last_seen: Arc<Mutex<Instant>>,
    handle: JoinHandle<u64>,
}

type Sessions = Arc<Mutex<HashMap<Uuid, RunningSession>>>;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct StudyTimers<S> {
    sink: Arc<S>,
    tick: Duration,
    idle_ticks: u32,
    next_id: AtomicU64,
    running: Sessions,
}

impl<S: StudyTimeSink> StudyTimers<S> {
    pub fn new(sink: Arc<S>, tick: Duration) -> Self {
        Self {
            sink,
            tick,
            idle_ticks: DEFAULT_IDLE_TICKS,
            next_id: AtomicU64::new(0),
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// End sessions after this many ticks without a heartbeat.
    pub fn with_idle_ticks(mut self, idle_ticks: u32) -> Self {
        self.idle_ticks = idle_ticks.max(1);
        self
    }

    /// Start a session for the user. Returns false if one is already running;
    /// that session counts the call as a heartbeat.
    pub fn start(&self, user_id: Uuid) -> bool {
        let mut running = lock(&self.running);
        if let Some(session) = running.get(&user_id) {
            *lock(&session.last_seen) = Instant::now();
            return false;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let last_seen = Arc::new(Mutex::new(Instant::now()));
        let (stop, stop_rx) = oneshot::channel();
        let task = SessionTask {
            sink: self.sink.clone(),
            user_id,
            id,
            tick: self.tick,
            idle_timeout: self.tick * self.idle_ticks,
            last_seen: last_seen.clone(),
            running: self.running.clone(),
        };
        let handle = tokio::spawn(task.run(stop_rx));
        running.insert(
            user_id,
            RunningSession {
                id,
                stop,
                last_seen,
                handle,
            },
        );

        tracing::info!(%user_id, "study session started");
        true
    }

    /// Keep the user's session alive. Returns false if none is running.
    pub fn heartbeat(&self, user_id: Uuid) -> bool {
        match lock(&self.running).get(&user_id) {
            Some(session) => {
                *lock(&session.last_seen) = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Stop the user's session and wait for its final flush.
    ///
    /// Returns the milliseconds the session recorded, or `None` if no
    /// session was running.
    pub async fn stop(&self, user_id: Uuid) -> Option<u64> {
        let session = lock(&self.running).remove(&user_id)?;

        // The task may already be gone; the join below still reports it.
        let _ = session.stop.send(());

        match session.handle.await {
            Ok(total_ms) => {
                tracing::info!(%user_id, total_ms, "study session stopped");
                Some(total_ms)
            }
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "study session task failed");
                None
            }
        }
    }

    pub fn is_running(&self, user_id: Uuid) -> bool {
        lock(&self.running).contains_key(&user_id)
    }

    /// Stop every session, flushing each one.
    pub async fn shutdown(&self) {
        let users: Vec<Uuid> = lock(&self.running).keys().copied().collect();
        for user_id in users {
            self.stop(user_id).await;
        }
    }
}

struct SessionTask<S> {
    sink: Arc<S>,
    user_id: Uuid,
    id: u64,
    tick: Duration,
    idle_timeout: Duration,
    last_seen: Arc<Mutex<Instant>>,
    running: Sessions,
}

impl<S: StudyTimeSink> SessionTask<S> {
    async fn run(self, mut stop: oneshot::Receiver<()>) -> u64 {
        let start = Instant::now();
        let mut clock = StudyClock::start(start.into_std());
        let mut ticker = time::interval_at(start + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Milliseconds measured but not yet written.
        let mut pending_ms = 0;
        let mut total_ms = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    pending_ms += duration_ms(clock.tick(now.into_std()));
                    total_ms += self.flush(&mut pending_ms).await;
                    if self.is_idle(now) {
                        self.expire();
                        break;
                    }
                }
                _ = &mut stop => break,
            }
        }

        pending_ms += duration_ms(clock.stop(Instant::now().into_std()));
        let mut attempts = 1;
        total_ms += self.flush(&mut pending_ms).await;
        while pending_ms > 0 && attempts < FINAL_FLUSH_ATTEMPTS {
            time::sleep(self.tick).await;
            total_ms += self.flush(&mut pending_ms).await;
            attempts += 1;
        }
        if pending_ms > 0 {
            tracing::error!(
                user_id = %self.user_id,
                lost_ms = pending_ms,
                "study time could not be recorded"
            );
        }
        total_ms
    }

    fn is_idle(&self, now: Instant) -> bool {
        now.duration_since(*lock(&self.last_seen)) >= self.idle_timeout
    }

    /// Drop this session from the running map, unless it was replaced.
    fn expire(&self) {
        let mut running = lock(&self.running);
        if running.get(&self.user_id).is_some_and(|s| s.id == self.id) {
            running.remove(&self.user_id);
            tracing::info!(user_id = %self.user_id, "study session expired without a heartbeat");
        }
    }

    /// Write everything pending and return the milliseconds recorded.
    /// A failed write stays pending for the next attempt.
    async fn flush(&self, pending_ms: &mut u64) -> u64 {
        if *pending_ms == 0 {
            return 0;
        }
        match self.sink.add_study_time(self.user_id, *pending_ms).await {
            Ok(()) => std::mem::take(pending_ms),
            Err(e) => {
                tracing::warn!(
                    user_id = %self.user_id,
                    pending_ms = *pending_ms,
                    error = %e,
                    "failed to flush study time"
                );
                0
            }
        }
    }
}
