use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam_channel::{bounded, Sender, TryRecvError};
use log::{debug, info};

use crate::RealtimeInitError;

#[derive(Debug, Clone)]
struct TickThreadStats {
    /// The last 100 tick time percentages (0 to 1)
    /// of how long a tick took, from the time between two ticks.
    tick_time: Arc<RwLock<VecDeque<f64>>>,

    /// The number of ticks that started after their deadline.
    late_ticks: Arc<AtomicU64>,
}

pub struct TickThreadStatsReader {
    stats: TickThreadStats,
}

impl TickThreadStatsReader {
    pub fn average_load(&self) -> f64 {
        let queue = self
            .stats
            .tick_time
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if queue.is_empty() {
            return 0.0;
        }
        queue.iter().sum::<f64>() / queue.len() as f64
    }

    pub fn last_load(&self) -> f64 {
        let queue = self
            .stats
            .tick_time
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        *queue.front().unwrap_or(&0.0)
    }

    pub fn late_ticks(&self) -> u64 {
        self.stats.late_ticks.load(Ordering::Relaxed)
    }
}

/// Calls a function at a fixed rate on a separate thread, until dropped.
///
/// Sleeps with `spin_sleep` until the deadline of each tick. When a tick runs
/// past the next deadline, the following one starts right away and the
/// schedule restarts from there instead of trying to catch up.
pub struct TickThread {
    stats: TickThreadStats,
    paused: Arc<AtomicBool>,

    // Dropping the sender stops the thread
    stop: Option<Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl TickThread {
    pub fn spawn<F: 'static + FnMut() + Send>(
        name: String,
        framerate: f64,
        mut tick: F,
    ) -> Result<Self, RealtimeInitError> {
        if !framerate.is_finite() || framerate <= 0.0 {
            return Err(RealtimeInitError::InvalidFramerate(framerate));
        }
        let delay = Duration::from_secs_f64(1.0 / framerate);

        let (stop, stopped) = bounded::<()>(1);
        let paused = Arc::new(AtomicBool::new(false));
        let stats = TickThreadStats {
            tick_time: Arc::new(RwLock::new(VecDeque::new())),
            late_ticks: Arc::new(AtomicU64::new(0)),
        };

        let join_handle = {
            let paused = paused.clone();
            let stats = stats.clone();
            let thread_name = name.clone();
            thread::Builder::new().name(name).spawn(move || {
                info!("Tick thread {thread_name} started at {framerate} fps");

                let mut deadline = Instant::now();
                loop {
                    match stopped.try_recv() {
                        Err(TryRecvError::Empty) => {}
                        _ => break,
                    }

                    if !paused.load(Ordering::Acquire) {
                        let start = Instant::now();
                        tick();

                        // Write the elapsed tick time percentage to the tick_time queue
                        let mut queue = stats
                            .tick_time
                            .write()
                            .unwrap_or_else(PoisonError::into_inner);
                        queue.push_front(start.elapsed().as_secs_f64() / delay.as_secs_f64());
                        if queue.len() > 100 {
                            queue.pop_back();
                        }
                    }

                    // Sleep until the next iteration
                    deadline += delay;
                    let now = Instant::now();
                    if deadline > now {
                        spin_sleep::sleep(deadline - now);
                    } else {
                        stats.late_ticks.fetch_add(1, Ordering::Relaxed);
                        deadline = now;
                    }
                }

                debug!("Tick thread {thread_name} stopped");
            })?
        };

        Ok(TickThread {
            stats,
            paused,
            stop: Some(stop),
            join_handle: Some(join_handle),
        })
    }

    /// Stops calling the tick function until `resume` is called.
    /// A tick that is already running still finishes.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn get_stats(&self) -> TickThreadStatsReader {
        TickThreadStatsReader {
            stats: self.stats.clone(),
        }
    }
}

impl Drop for TickThread {
    fn drop(&mut self) {
        self.stop.take();
        if let Some(join_handle) = self.join_handle.take() {
            // A panic in the tick function already got reported by the thread
            join_handle.join().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_thread(framerate: f64) -> (TickThread, Arc<AtomicU64>) {
        let count = Arc::new(AtomicU64::new(0));
        let thread = {
            let count = count.clone();
            TickThread::spawn("test_tick".to_string(), framerate, move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
        };
        (thread, count)
    }

    #[test]
    fn test_ticks_until_dropped() {
        let (thread, count) = counting_thread(500.0);
        thread::sleep(Duration::from_millis(100));
        assert!(count.load(Ordering::SeqCst) > 0);

        let stats = thread.get_stats();
        assert!(stats.average_load() >= 0.0);

        drop(thread);
        // The thread owned the other reference, so it must have exited
        assert_eq!(Arc::strong_count(&count), 1);
    }

    #[test]
    fn test_pause_and_resume() {
        let (thread, count) = counting_thread(500.0);
        thread::sleep(Duration::from_millis(50));

        thread.pause();
        assert!(thread.is_paused());
        thread::sleep(Duration::from_millis(20));
        let paused_count = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), paused_count);

        thread.resume();
        thread::sleep(Duration::from_millis(50));
        assert!(count.load(Ordering::SeqCst) > paused_count);
    }

    #[test]
    fn test_invalid_framerate() {
        for framerate in [0.0, -60.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                TickThread::spawn("test_tick".to_string(), framerate, || {}),
                Err(RealtimeInitError::InvalidFramerate(_))
            ));
        }
    }
}
