use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::channel::{Channel, ChannelMessage, PlayerCommand, Subscription};
use crate::core::LoopSettings;
use crate::player::{PlayerCapability, PlayerEvent, PlayerProvider, VideoMetadata};

/// Period of the time reporter, which doubles as the primary loop enforcer.
pub const REPORT_INTERVAL: Duration = Duration::from_millis(200);

/// Host for one player slot. Owns the only capability reference for that
/// slot, gates commands behind readiness, enforces the loop region and
/// reports playback time upstream. All coordination with the control deck
/// goes through the channel; nothing is shared.
pub struct PlayerHost {
    state: HostState,
    subscription: Subscription,
}

impl PlayerHost {
    pub fn new(
        index: usize,
        video_id: impl Into<String>,
        channel: Channel,
        provider: Arc<dyn PlayerProvider>,
    ) -> Self {
        let subscription = channel.subscribe_slot(index);
        Self {
            state: HostState::new(index, video_id, channel, provider),
            subscription,
        }
    }

    /// Spawn the host's event loop. The task runs until the channel closes
    /// or the session aborts it.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let mut events = self.state.load_current();
        let mut ticker = tokio::time::interval(REPORT_INTERVAL);

        loop {
            tokio::select! {
                msg = self.subscription.recv() => match msg {
                    None => {
                        log::info!("Channel closed, stopping host {}", self.state.index);
                        break;
                    }
                    Some(ChannelMessage::VideoChange { video_id, .. }) => {
                        events = self.state.change_video(&video_id);
                        // The sampler is tied to the capability: tear it down
                        // and restart it alongside the player.
                        ticker = tokio::time::interval(REPORT_INTERVAL);
                    }
                    Some(msg) => self.state.handle_message(&msg),
                },
                event = events.recv() => match event {
                    Some(PlayerEvent::Ready(metadata)) => self.state.on_ready(metadata),
                    Some(PlayerEvent::Ended) => self.state.on_ended(),
                    None => events = self.state.park_events(),
                },
                _ = ticker.tick() => self.state.on_tick(),
            }
        }
    }
}

/// The host's synchronous core. Every transition is a plain method call so
/// the whole state machine is testable without timers.
pub(crate) struct HostState {
    index: usize,
    video_id: String,
    channel: Channel,
    provider: Arc<dyn PlayerProvider>,
    player: Option<Box<dyn PlayerCapability>>,
    ready: bool,
    queue: VecDeque<PlayerCommand>,
    loop_settings: LoopSettings,
    /// Keeps a replacement event channel open after the capability's own
    /// stream ends, so the run loop never busy-polls a closed receiver.
    parked_events: Option<mpsc::UnboundedSender<PlayerEvent>>,
}

impl HostState {
    pub(crate) fn new(
        index: usize,
        video_id: impl Into<String>,
        channel: Channel,
        provider: Arc<dyn PlayerProvider>,
    ) -> Self {
        Self {
            index,
            video_id: video_id.into(),
            channel,
            provider,
            player: None,
            ready: false,
            queue: VecDeque::new(),
            loop_settings: LoopSettings::default(),
            parked_events: None,
        }
    }

    /// Load a capability for the current video id. Readiness drops back to
    /// not-ready and anything still queued for the previous id is gone.
    pub(crate) fn load_current(&mut self) -> mpsc::UnboundedReceiver<PlayerEvent> {
        self.ready = false;
        self.queue.clear();
        self.parked_events = None;
        log::info!("Host {} loading video {}", self.index, self.video_id);
        let (player, events) = self.provider.load(&self.video_id);
        self.player = Some(player);
        events
    }

    /// Switch to a new video id. Dropping the old event receiver cancels the
    /// in-flight readiness wait; the cleared queue cancels everything that
    /// was waiting behind it.
    pub(crate) fn change_video(&mut self, video_id: &str) -> mpsc::UnboundedReceiver<PlayerEvent> {
        log::info!(
            "Host {} switching video {} -> {}",
            self.index,
            self.video_id,
            video_id
        );
        self.video_id = video_id.to_string();
        self.player = None;
        self.loop_settings = LoopSettings::default();
        self.load_current()
    }

    /// Replacement event stream that stays open but never yields.
    pub(crate) fn park_events(&mut self) -> mpsc::UnboundedReceiver<PlayerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.parked_events = Some(tx);
        rx
    }

    /// Route one bus message. Commands execute immediately when the player is
    /// ready and queue up otherwise; status traffic for our own index (our
    /// own reports echoing back) is not a command and falls through.
    pub(crate) fn handle_message(&mut self, msg: &ChannelMessage) {
        let Some(command) = PlayerCommand::from_message(msg) else {
            return;
        };
        if self.ready {
            self.execute(command);
        } else {
            log::debug!("Host {} queueing {:?} until ready", self.index, command);
            self.queue.push_back(command);
        }
    }

    fn execute(&mut self, command: PlayerCommand) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        match command {
            PlayerCommand::Play => player.play(),
            PlayerCommand::Pause => player.pause(),
            PlayerCommand::Speed(rate) => player.set_rate(rate),
            PlayerCommand::Seek(time) => player.seek(time),
            // Wholesale replacement, last writer wins. No partial merge.
            PlayerCommand::LoopUpdate(settings) => self.loop_settings = settings,
        }
    }

    /// The capability finished initializing: capture metadata and drain the
    /// queue in arrival order, exactly as if each command had just come in.
    pub(crate) fn on_ready(&mut self, metadata: VideoMetadata) {
        self.ready = true;
        if self.loop_settings.end_time == 0.0 {
            self.loop_settings.end_time = metadata.duration;
        }
        log::info!(
            "Host {} ready ({}, {:.1}s), draining {} queued commands",
            self.index,
            metadata.title.as_deref().unwrap_or("untitled"),
            metadata.duration,
            self.queue.len()
        );
        while let Some(command) = self.queue.pop_front() {
            self.execute(command);
        }
    }

    /// Natural end of the video. With looping on we restart locally, no
    /// channel round-trip; otherwise the control deck gets one VIDEO_ENDED
    /// so it can drop its optimistic play flag.
    pub(crate) fn on_ended(&mut self) {
        if self.loop_settings.enabled {
            let start = self.loop_settings.start_time;
            if let Some(player) = self.player.as_mut() {
                player.seek(start);
                player.play();
            }
        } else {
            self.channel.publish(&ChannelMessage::Ended { index: self.index });
        }
    }

    /// One reporter tick: broadcast the position unconditionally, and when
    /// the playhead has crossed the loop end, snap it back to the start.
    /// This local seek is the primary loop enforcement; the ended handler
    /// only catches the true end of the video.
    pub(crate) fn on_tick(&mut self) {
        let Some(player) = self.player.as_ref() else {
            return;
        };
        let current_time = player.current_time();
        self.channel.publish(&ChannelMessage::TimeUpdate {
            index: self.index,
            current_time,
        });

        if self.loop_settings.enabled && current_time >= self.loop_settings.end_time {
            let start = self.loop_settings.start_time;
            if let Some(player) = self.player.as_mut() {
                player.seek(start);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_ready(&self) -> bool {
        self.ready
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub(crate) fn loop_settings(&self) -> LoopSettings {
        self.loop_settings
    }
}
