//! Background station polling.
//!
//! A single monitor thread owns every write to the [`StatusCache`]; any number
//! of readers take whole-record snapshots from it. The lock is only ever held
//! for a clone or a swap, never across a network call.

use integrations::remote_integration::StatusSource;
use remote_status::StatusRecord;
use station::PollerConfig;
use std::io;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

struct CacheState {
    record: StatusRecord,
    updates: u64,
}

/// Owned cell holding the latest station status. Reads copy the record out,
/// writes replace it wholesale.
pub struct StatusCache {
    state: Mutex<CacheState>,
    updated: Condvar,
    recorder_count: usize,
}

impl StatusCache {
    pub fn new(recorder_count: usize) -> StatusCache {
        StatusCache {
            state: Mutex::new(CacheState {
                record: StatusRecord::stale(recorder_count),
                updates: 0,
            }),
            updated: Condvar::new(),
            recorder_count: recorder_count,
        }
    }

    fn lock(&self) -> MutexGuard<CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> StatusRecord {
        self.lock().record.clone()
    }

    /// Number of records published since construction.
    pub fn updates(&self) -> u64 {
        self.lock().updates
    }

    /// Publishes `record`. A record sized for a different number of recorders
    /// is refused and the current one kept.
    pub fn replace(&self, record: StatusRecord) -> bool {
        if record.recorder_count() != self.recorder_count {
            warn!(
                "--Poller--: Refusing a status record with {} recorders, expected {}.",
                record.recorder_count(),
                self.recorder_count
            );
            return false;
        }

        let mut state = self.lock();
        state.record = record;
        state.updates += 1;
        drop(state);
        self.updated.notify_all();
        true
    }

    /// Blocks until at least one record has been published or `timeout`
    /// passes. Returns whether a record has been published.
    pub fn wait_for_first_update(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .updated
            .wait_timeout_while(state, timeout, |state| state.updates == 0)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.updates > 0
    }
}

struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn new() -> StopSignal {
        StopSignal {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<bool> {
        self.stopped.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stop(&self) {
        *self.lock() = true;
        self.wake.notify_all();
    }

    fn is_stopped(&self) -> bool {
        *self.lock()
    }

    /// Publishes `record` unless stopped. The stop flag stays locked across the
    /// swap, so nothing is published once `stop` has returned.
    fn publish(&self, cache: &StatusCache, record: StatusRecord) -> bool {
        let stopped = self.lock();
        if *stopped {
            debug!("--Poller--: Stopped while fetching, discarding the result.");
            return false;
        }
        cache.replace(record)
    }

    /// Sleeps for up to `timeout`, returning early (and `true`) once stopped.
    fn wait(&self, timeout: Duration) -> bool {
        let stopped = self.lock();
        let (stopped, _) = self
            .wake
            .wait_timeout_while(stopped, timeout, |stopped| !*stopped)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *stopped
    }
}

/// Runs one fetch cycle and publishes the result unless `signal` was stopped
/// meanwhile. A failed cycle leaves the cached record untouched and is simply
/// retried on the next interval; there is no backoff.
fn poll_once<S: StatusSource + ?Sized>(source: &S, cache: &StatusCache, signal: &StopSignal) -> bool {
    match source.fetch_status() {
        Ok(record) => {
            info!(
                "--Poller--: Status updated: {:?}, recorders {:?}, aux feed active: {}.",
                record.system_status, record.op_types, record.aux_feed_active
            );
            signal.publish(cache, record)
        }
        Err(e) => {
            warn!(
                "--Poller--: Failed to fetch station status, keeping the last known status. Details: {}",
                e
            );
            false
        }
    }
}

fn monitor<S: StatusSource>(
    source: &S,
    cache: &StatusCache,
    signal: &StopSignal,
    interval: Duration,
) {
    while !signal.is_stopped() {
        let started = Instant::now();
        poll_once(source, cache, signal);

        let remaining = interval
            .checked_sub(started.elapsed())
            .unwrap_or(Duration::from_secs(0));
        if signal.wait(remaining) {
            break;
        }
    }
    debug!("--Poller--: Monitor thread exiting.");
}

struct Worker {
    handle: JoinHandle<()>,
    signal: Arc<StopSignal>,
    // Disconnects when the monitor thread exits, however it exits.
    done: Receiver<()>,
}

pub struct Poller<S: StatusSource + Send + Sync + 'static> {
    source: Arc<S>,
    cache: Arc<StatusCache>,
    poll_interval: Duration,
    stop_timeout: Duration,
    worker: Option<Worker>,
}

impl<S: StatusSource + Send + Sync + 'static> Poller<S> {
    pub fn new(source: S, config: &PollerConfig) -> Poller<S> {
        Poller {
            source: Arc::new(source),
            cache: Arc::new(StatusCache::new(config.recorder_count())),
            poll_interval: config.poll_interval,
            stop_timeout: config.stop_timeout,
            worker: None,
        }
    }

    pub fn cache(&self) -> Arc<StatusCache> {
        self.cache.clone()
    }

    /// Snapshot of the latest status. Never waits on the network.
    pub fn status(&self) -> StatusRecord {
        self.cache.status()
    }

    /// Launches the monitor thread, stopping any previous one first. The first
    /// fetch starts immediately.
    pub fn start(&mut self) -> io::Result<()> {
        if self.worker.is_some() {
            self.stop();
        }

        // Each monitor thread gets its own signal so a detached one never restarts.
        let signal = Arc::new(StopSignal::new());
        let (done_tx, done_rx) = channel::<()>();
        let source = self.source.clone();
        let cache = self.cache.clone();
        let thread_signal = signal.clone();
        let interval = self.poll_interval;

        let handle = thread::Builder::new()
            .name("monitor".to_string())
            .spawn(move || {
                let _done = done_tx;
                monitor(&*source, &cache, &thread_signal, interval);
            })?;

        info!(
            "--Poller--: Started, polling every {} seconds.",
            interval.as_secs()
        );
        self.worker = Some(Worker {
            handle: handle,
            signal: signal,
            done: done_rx,
        });
        Ok(())
    }

    /// Signals the monitor thread and waits up to the stop timeout for it to
    /// exit. A thread stuck in a slow request is left to finish on its own;
    /// returns `false` in that case.
    pub fn stop(&mut self) -> bool {
        let worker = match self.worker.take() {
            Some(worker) => worker,
            None => return true,
        };
        worker.signal.stop();

        match worker.done.recv_timeout(self.stop_timeout) {
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "--Poller--: Monitor thread did not exit within {:?}, detaching it.",
                    self.stop_timeout
                );
                false
            }
            _ => {
                if worker.handle.join().is_err() {
                    warn!("--Poller--: Monitor thread panicked.");
                }
                info!("--Poller--: Stopped after {} updates.", self.cache.updates());
                true
            }
        }
    }
}

impl<S: StatusSource + Send + Sync + 'static> Drop for Poller<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
