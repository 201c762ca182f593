use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::provider::MetricsProvider;
use super::sampler::Sampler;
use super::snapshot::SystemSnapshot;

const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Runs a [`Sampler`] on its own thread, one poll per tick, and hands each
/// snapshot to the consumer over a channel.
///
/// The worker thread is the sampler's only caller, so polls never overlap.
pub struct Poller {
    receiver: Receiver<SystemSnapshot>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn spawn<P>(sampler: Sampler<P>, refresh: Duration) -> io::Result<Self>
    where
        P: MetricsProvider + Send + 'static,
        P::Handle: Send,
    {
        let (sender, receiver) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);

        let worker = thread::Builder::new()
            .name("sampler".to_string())
            .spawn(move || run_worker(sampler, refresh, sender, &worker_stop))?;

        Ok(Self {
            receiver,
            stop,
            worker: Some(worker),
        })
    }

    /// Newest snapshot produced since the last call, if any. Older ones are dropped.
    pub fn latest(&self) -> Option<SystemSnapshot> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(snapshot) => latest = Some(snapshot),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        latest
    }

    #[cfg(test)]
    fn recv_timeout(&self, timeout: Duration) -> Option<SystemSnapshot> {
        self.receiver.recv_timeout(timeout).ok()
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Polls once per `refresh` until stopped or until nobody is listening.
fn run_worker<P: MetricsProvider>(
    mut sampler: Sampler<P>,
    refresh: Duration,
    sender: Sender<SystemSnapshot>,
    stop: &AtomicBool,
) {
    let settings = sampler.settings();
    info!(
        refresh_ms = refresh.as_millis() as u64,
        top_n = settings.top_n,
        mount_filter = %settings.mount_filter,
        "sampler started"
    );

    while !stop.load(Ordering::Relaxed) {
        let started = Instant::now();
        let snapshot = sampler.poll();
        if sender.send(snapshot).is_err() {
            debug!("snapshot receiver dropped");
            break;
        }
        sleep_unless_stopped(refresh.saturating_sub(started.elapsed()), stop);
    }
    info!("sampler stopped");
}

fn sleep_unless_stopped(duration: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + duration;
    while !stop.load(Ordering::Relaxed) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(STOP_CHECK_INTERVAL));
    }
}
