use std::sync::Arc;

use tokio::sync::mpsc;

use crate::channel::{Channel, ChannelMessage, Subscription};
use crate::control::{pick_fallback, SearchProvider};
use crate::core::{default_title, extract_video_id, LoopEdge, LoopSettings, Slot, PLAYBACK_RATES};
use crate::player::{PlayerCapability, PlayerEvent, PlayerProvider};

/// Starting a play this close to the end counts as a replay: seek to zero
/// first so the video restarts instead of instantly ending again.
const REPLAY_THRESHOLD: f64 = 0.5;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ControlError {
    #[error("no slot with index {0}")]
    BadSlot(usize),
    #[error("unsupported playback rate {0}")]
    UnsupportedRate(f64),
}

/// Display state for one tab of the control deck. Everything here is the
/// controller's own optimistic copy; the player host keeps its own and the
/// two only converge through the channel.
pub struct SlotControl {
    slot: Slot,
    is_playing: bool,
    playback_rate: f64,
    current_time: f64,
    duration: f64,
    loop_settings: LoopSettings,
    /// Bumped on every video change so Ready events from a replaced probe
    /// are recognized as stale and dropped.
    generation: u64,
    /// Muted metadata probe. Same capability interface as the visible
    /// player, different policy: paused on ready, never driven.
    probe: Option<Box<dyn PlayerCapability>>,
}

impl SlotControl {
    fn new(index: usize, video_id: &str) -> Self {
        Self {
            slot: Slot::new(index, video_id),
            is_playing: false,
            playback_rate: 1.0,
            current_time: 0.0,
            duration: 0.0,
            loop_settings: LoopSettings::default(),
            generation: 0,
            probe: None,
        }
    }

    pub fn index(&self) -> usize {
        self.slot.index
    }
    pub fn video_id(&self) -> &str {
        &self.slot.video_id
    }
    pub fn title(&self) -> &str {
        &self.slot.title
    }
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }
    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }
    pub fn current_time(&self) -> f64 {
        self.current_time
    }
    pub fn duration(&self) -> f64 {
        self.duration
    }
    pub fn loop_settings(&self) -> LoopSettings {
        self.loop_settings
    }
}

/// The detached control deck: one tab per slot, all commands broadcast over
/// the channel, all feedback received the same way.
pub struct Controller {
    channel: Channel,
    subscription: Subscription,
    provider: Arc<dyn PlayerProvider>,
    search: Arc<dyn SearchProvider>,
    slots: Vec<SlotControl>,
    meta_tx: mpsc::UnboundedSender<(usize, u64, PlayerEvent)>,
    meta_rx: mpsc::UnboundedReceiver<(usize, u64, PlayerEvent)>,
    /// Last user-visible degradation notice (search fallback and the like).
    notice: Option<String>,
}

impl Controller {
    pub fn new(
        channel: Channel,
        provider: Arc<dyn PlayerProvider>,
        search: Arc<dyn SearchProvider>,
        video_ids: &[String],
    ) -> Self {
        let subscription = channel.subscribe_all();
        let (meta_tx, meta_rx) = mpsc::unbounded_channel();
        let mut controller = Self {
            channel,
            subscription,
            provider,
            search,
            slots: video_ids
                .iter()
                .enumerate()
                .map(|(index, id)| SlotControl::new(index, id))
                .collect(),
            meta_tx,
            meta_rx,
            notice: None,
        };
        for index in 0..controller.slots.len() {
            controller.load_probe(index);
        }
        controller
    }

    pub fn slots(&self) -> &[SlotControl] {
        &self.slots
    }

    /// Take the pending degradation notice, if any, for display.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut SlotControl, ControlError> {
        self.slots.get_mut(index).ok_or(ControlError::BadSlot(index))
    }

    /// Optimistic play/pause toggle. No acknowledgment is awaited; the flag
    /// flips immediately and only a later VIDEO_ENDED corrects it.
    pub fn toggle_play(&mut self, index: usize) -> Result<(), ControlError> {
        let (was_playing, replay) = {
            let slot = self.slot_mut(index)?;
            let was_playing = slot.is_playing;
            let replay = !was_playing
                && slot.duration > 0.0
                && slot.current_time >= slot.duration - REPLAY_THRESHOLD;
            slot.is_playing = !was_playing;
            (was_playing, replay)
        };
        if was_playing {
            self.channel.publish(&ChannelMessage::Pause { index });
        } else {
            if replay {
                self.channel.publish(&ChannelMessage::Seek { index, time: 0.0 });
            }
            self.channel.publish(&ChannelMessage::Play { index });
        }
        Ok(())
    }

    pub fn set_playback_rate(&mut self, index: usize, rate: f64) -> Result<(), ControlError> {
        if !PLAYBACK_RATES.iter().any(|r| *r == rate) {
            return Err(ControlError::UnsupportedRate(rate));
        }
        self.slot_mut(index)?.playback_rate = rate;
        self.channel.publish(&ChannelMessage::Speed { index, speed: rate });
        Ok(())
    }

    pub fn seek(&mut self, index: usize, time: f64) -> Result<(), ControlError> {
        self.slot_mut(index)?;
        self.channel.publish(&ChannelMessage::Seek { index, time });
        Ok(())
    }

    /// Swap the slot's video for a raw id or anything `extract_video_id`
    /// recognizes. Resets the display copy, reloads the metadata probe and
    /// broadcasts VIDEO_CHANGE (the host clears its queue on receipt).
    pub fn change_video(&mut self, index: usize, input: &str) -> Result<(), ControlError> {
        let video_id = extract_video_id(input);
        {
            let slot = self.slot_mut(index)?;
            log::info!("Slot {} video change {} -> {}", index, slot.slot.video_id, video_id);
            slot.slot.video_id = video_id.clone();
            slot.slot.title = default_title(index);
            slot.is_playing = false;
            slot.current_time = 0.0;
            slot.duration = 0.0;
            slot.loop_settings = LoopSettings::default();
        }
        self.load_probe(index);
        self.channel.publish(&ChannelMessage::VideoChange { index, video_id });
        Ok(())
    }

    /// Keyword search via the external collaborator, uniform random pick on
    /// success, deterministic catalog fallback (with a user-visible notice)
    /// on failure or an empty result list.
    pub async fn random_by_keyword(
        &mut self,
        index: usize,
        keyword: &str,
    ) -> Result<(), ControlError> {
        self.slot_mut(index)?;
        let search = Arc::clone(&self.search);
        let result = search.search(keyword).await;
        let picked = match result {
            Ok(videos) if !videos.is_empty() => {
                self.notice = None;
                videos[fastrand::usize(..videos.len())].clone()
            }
            Ok(_) => {
                log::warn!("Search for '{}' returned nothing, using fallback catalog", keyword);
                self.notice =
                    Some("Search returned no results; picked from the built-in catalog.".to_string());
                pick_fallback(keyword).to_string()
            }
            Err(e) => {
                log::warn!("Search for '{}' failed ({}), using fallback catalog", keyword, e);
                self.notice =
                    Some("Search is unavailable; picked from the built-in catalog.".to_string());
                pick_fallback(keyword).to_string()
            }
        };
        self.change_video(index, &picked)
    }

    /// Flip looping without touching the boundaries.
    pub fn toggle_loop(&mut self, index: usize) -> Result<(), ControlError> {
        let slot = self.slot_mut(index)?;
        slot.loop_settings = slot.loop_settings.toggled();
        let loop_settings = slot.loop_settings;
        self.channel
            .publish(&ChannelMessage::LoopUpdate { index, loop_settings });
        Ok(())
    }

    /// Drag one loop boundary to an absolute position.
    pub fn update_loop(
        &mut self,
        index: usize,
        edge: LoopEdge,
        value: f64,
    ) -> Result<(), ControlError> {
        let slot = self.slot_mut(index)?;
        let edit = slot
            .loop_settings
            .apply_edit(edge, value, slot.duration, slot.current_time);
        self.commit_loop_edit(index, edit)
    }

    /// Nudge one loop boundary by a fixed step.
    pub fn nudge_loop(
        &mut self,
        index: usize,
        edge: LoopEdge,
        delta: f64,
    ) -> Result<(), ControlError> {
        let slot = self.slot_mut(index)?;
        let edit = slot
            .loop_settings
            .nudge(edge, delta, slot.duration, slot.current_time);
        self.commit_loop_edit(index, edit)
    }

    fn commit_loop_edit(
        &mut self,
        index: usize,
        edit: crate::core::LoopEdit,
    ) -> Result<(), ControlError> {
        self.slot_mut(index)?.loop_settings = edit.settings;
        self.channel.publish(&ChannelMessage::LoopUpdate {
            index,
            loop_settings: edit.settings,
        });
        if let Some(time) = edit.seek_to {
            self.channel.publish(&ChannelMessage::Seek { index, time });
        }
        Ok(())
    }

    /// Drain everything that arrived since the last pump: host status from
    /// the channel plus metadata events from the probes. Non-blocking, meant
    /// to be called from the embedder's own loop.
    pub fn pump(&mut self) {
        while let Some(msg) = self.subscription.try_recv() {
            self.handle_message(msg);
        }
        while let Ok((index, generation, event)) = self.meta_rx.try_recv() {
            self.handle_probe_event(index, generation, event);
        }
    }

    fn handle_message(&mut self, msg: ChannelMessage) {
        let Some(slot) = self.slots.get_mut(msg.index()) else {
            // Addressed to a slot this deck does not manage.
            return;
        };
        match msg {
            ChannelMessage::Ended { .. } => {
                log::debug!("Slot {} ended", slot.slot.index);
                slot.is_playing = false;
            }
            ChannelMessage::TimeUpdate { current_time, .. } => {
                slot.current_time = current_time;
            }
            // Everything else on the bus is our own command traffic echoing
            // back; the deck has nothing to do with it.
            _ => {}
        }
    }

    fn handle_probe_event(&mut self, index: usize, generation: u64, event: PlayerEvent) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if generation != slot.generation {
            log::debug!("Slot {} dropping stale probe event {:?}", index, event);
            return;
        }
        match event {
            PlayerEvent::Ready(metadata) => {
                // Probe policy: paused the moment it is usable, never driven.
                if let Some(probe) = slot.probe.as_mut() {
                    probe.pause();
                }
                slot.slot.title = metadata
                    .title
                    .unwrap_or_else(|| default_title(index));
                slot.duration = metadata.duration;
                if slot.loop_settings.end_time == 0.0 {
                    slot.loop_settings.end_time = metadata.duration;
                }
                log::info!(
                    "Slot {} metadata: '{}' ({:.1}s)",
                    index,
                    slot.slot.title,
                    slot.duration
                );
            }
            // The probe running off the end is meaningless, it never plays.
            PlayerEvent::Ended => {}
        }
    }

    /// (Re)load the muted metadata probe for a slot and forward its events,
    /// tagged with the slot's current generation.
    fn load_probe(&mut self, index: usize) {
        self.slots[index].generation += 1;
        let generation = self.slots[index].generation;
        let video_id = self.slots[index].slot.video_id.clone();
        let (probe, mut events) = self.provider.load(&video_id);
        self.slots[index].probe = Some(probe);

        let meta_tx = self.meta_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if meta_tx.send((index, generation, event)).is_err() {
                    break;
                }
            }
        });
    }
}
