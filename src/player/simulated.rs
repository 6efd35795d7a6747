use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::player::{LoadedPlayer, PlayerCapability, PlayerEvent, PlayerProvider, VideoMetadata};

/// How long a simulated load takes before the Ready event fires. Long enough
/// that commands sent right after a video change exercise the readiness queue.
const LOAD_DELAY: Duration = Duration::from_millis(150);

/// Poll period of the internal end-of-video watcher.
const WATCH_INTERVAL: Duration = Duration::from_millis(50);

/// Wall-clock stand-in for the real embed widget. Position advances at the
/// current rate while playing and clamps at the duration; Ready fires after a
/// short load delay and Ended exactly once per run-off.
pub struct SimulatedPlayer {
    inner: Arc<Mutex<PlayerInner>>,
}

#[derive(Debug)]
struct PlayerInner {
    position: f64,
    anchored_at: Instant,
    playing: bool,
    rate: f64,
    duration: f64,
    ready: bool,
    ended_reported: bool,
}

impl PlayerInner {
    /// Position derived from the anchor instead of a per-frame tick, so
    /// readers never race the clock.
    fn current_time(&self) -> f64 {
        let mut t = self.position;
        if self.playing {
            t += self.anchored_at.elapsed().as_secs_f64() * self.rate;
        }
        t.min(self.duration)
    }

    /// Fold elapsed time into `position` before changing playback state.
    fn rebase(&mut self) {
        self.position = self.current_time();
        self.anchored_at = Instant::now();
    }
}

impl SimulatedPlayer {
    fn spawn(video_id: &str, duration: f64) -> LoadedPlayer {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Mutex::new(PlayerInner {
            position: 0.0,
            anchored_at: Instant::now(),
            playing: false,
            rate: 1.0,
            duration,
            ready: false,
            ended_reported: false,
        }));

        let metadata = VideoMetadata {
            title: Some(format!("Simulated {}", video_id)),
            duration,
        };
        let watcher_inner = Arc::clone(&inner);
        let video_id = video_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(LOAD_DELAY).await;
            {
                let mut state = watcher_inner.lock().unwrap();
                state.ready = true;
            }
            log::debug!("Simulated player ready for {}", video_id);
            if event_tx.send(PlayerEvent::Ready(metadata)).is_err() {
                return; // Host already moved on to another video
            }

            let mut ticker = tokio::time::interval(WATCH_INTERVAL);
            loop {
                ticker.tick().await;
                let ended = {
                    let mut state = watcher_inner.lock().unwrap();
                    if state.playing
                        && !state.ended_reported
                        && state.current_time() >= state.duration
                    {
                        state.rebase();
                        state.playing = false;
                        state.ended_reported = true;
                        true
                    } else {
                        false
                    }
                };
                if ended {
                    log::debug!("Simulated player for {} reached the end", video_id);
                    if event_tx.send(PlayerEvent::Ended).is_err() {
                        return;
                    }
                }
            }
        });

        (Box::new(SimulatedPlayer { inner }), event_rx)
    }
}

impl PlayerCapability for SimulatedPlayer {
    fn play(&mut self) {
        let mut state = self.inner.lock().unwrap();
        state.rebase();
        state.playing = true;
        if state.position < state.duration {
            state.ended_reported = false;
        }
    }

    fn pause(&mut self) {
        let mut state = self.inner.lock().unwrap();
        state.rebase();
        state.playing = false;
    }

    fn seek(&mut self, time: f64) {
        let mut state = self.inner.lock().unwrap();
        let duration = state.duration;
        state.rebase();
        state.position = time.clamp(0.0, duration);
        if state.position < duration {
            state.ended_reported = false;
        }
    }

    fn set_rate(&mut self, rate: f64) {
        let mut state = self.inner.lock().unwrap();
        state.rebase();
        state.rate = rate;
    }

    fn current_time(&self) -> f64 {
        self.inner.lock().unwrap().current_time()
    }

    fn duration(&self) -> f64 {
        self.inner.lock().unwrap().duration
    }
}

/// Provider handing out simulated players. Durations are derived from the
/// video id so different ids behave differently without any external data.
pub struct SimulatedProvider {
    default_duration: f64,
}

impl SimulatedProvider {
    pub fn new(default_duration: f64) -> Self {
        Self { default_duration }
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(180.0)
    }
}

impl PlayerProvider for SimulatedProvider {
    fn load(&self, video_id: &str) -> LoadedPlayer {
        // Deterministic per-id wobble, 60%..140% of the default.
        let hash: u32 = video_id.bytes().fold(0u32, |acc, b| {
            acc.wrapping_mul(31).wrapping_add(b as u32)
        });
        let factor = 0.6 + (hash % 81) as f64 / 100.0;
        SimulatedPlayer::spawn(video_id, self.default_duration * factor)
    }
}
