use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::channel::Channel;
use crate::control::{Controller, SearchProvider};
use crate::core::{AppConfig, MAX_SLOTS};
use crate::player::{PlayerHost, PlayerProvider};

/// Buffer of the broadcast bus. Generously sized; an overrun only costs the
/// laggard some messages, which the protocol tolerates anyway.
const CHANNEL_CAPACITY: usize = 256;

/// One running wall: the channel, a host task per slot, and the control deck.
pub struct Session {
    pub controller: Controller,
    hosts: Vec<JoinHandle<()>>,
}

impl Session {
    /// Build the channel, spawn a player host per bootstrap video and wire
    /// up the controller. The bootstrap list is clamped to 1..=MAX_SLOTS.
    pub fn launch(
        config: &AppConfig,
        provider: Arc<dyn PlayerProvider>,
        search: Arc<dyn SearchProvider>,
    ) -> anyhow::Result<Self> {
        let mut video_ids = config.video_ids.clone();
        if video_ids.is_empty() {
            anyhow::bail!("Session needs at least one video id");
        }
        if video_ids.len() > MAX_SLOTS {
            log::warn!("Truncating session to {} slots", MAX_SLOTS);
            video_ids.truncate(MAX_SLOTS);
        }

        let channel = Channel::new(CHANNEL_CAPACITY);
        let hosts = video_ids
            .iter()
            .enumerate()
            .map(|(index, video_id)| {
                PlayerHost::new(index, video_id.clone(), channel.clone(), provider.clone()).spawn()
            })
            .collect();
        let controller = Controller::new(channel, provider, search, &video_ids);
        log::info!("Session launched with {} slots", video_ids.len());

        Ok(Self { controller, hosts })
    }

    pub fn slot_count(&self) -> usize {
        self.hosts.len()
    }

    /// Stop every host task. Queued commands and in-flight readiness waits
    /// die with them; nothing is persisted.
    pub fn shutdown(self) {
        for host in &self.hosts {
            host.abort();
        }
        log::info!("Session shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::control::NoSearch;
    use crate::player::SimulatedProvider;

    fn config(ids: &[&str]) -> AppConfig {
        AppConfig {
            video_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..AppConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_wires_metadata_through_probes() {
        let mut session = Session::launch(
            &config(&["dQw4w9WgXcQ", "jfKfPfyJRdk"]),
            Arc::new(SimulatedProvider::new(60.0)),
            Arc::new(NoSearch),
        )
        .unwrap();
        assert_eq!(session.slot_count(), 2);

        // Let the simulated load delay pass and the Ready events flow.
        tokio::time::sleep(Duration::from_millis(400)).await;
        session.controller.pump();

        for slot in session.controller.slots() {
            assert!(slot.title().starts_with("Simulated "), "{}", slot.title());
            assert!(slot.duration() > 0.0);
        }
        session.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_hosts_report_time_over_the_channel() {
        let mut session = Session::launch(
            &config(&["dQw4w9WgXcQ"]),
            Arc::new(SimulatedProvider::new(60.0)),
            Arc::new(NoSearch),
        )
        .unwrap();

        // Hosts broadcast VIDEO_TIME_UPDATE unconditionally every tick; the
        // controller's display time gets stamped even while paused at 0.
        tokio::time::sleep(Duration::from_millis(600)).await;
        session.controller.pump();
        assert_eq!(session.controller.slots()[0].current_time(), 0.0);
        assert!(session.controller.slots()[0].duration() > 0.0);
        session.shutdown();
    }

    #[tokio::test]
    async fn test_empty_bootstrap_rejected() {
        let result = Session::launch(
            &config(&[]),
            Arc::new(SimulatedProvider::default()),
            Arc::new(NoSearch),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_oversized_bootstrap_truncated() {
        let ids: Vec<String> = (0..12).map(|i| format!("video-id-{:02}", i)).collect();
        let config = AppConfig {
            video_ids: ids,
            ..AppConfig::default()
        };
        let session = Session::launch(
            &config,
            Arc::new(SimulatedProvider::default()),
            Arc::new(NoSearch),
        )
        .unwrap();
        assert_eq!(session.slot_count(), MAX_SLOTS);
        session.shutdown();
    }
}
