use tokio::sync::mpsc;

/// Metadata the embed widget reports once it finishes loading a video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub duration: f64,
}

/// Events emitted by a loaded (or loading) player capability.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The widget finished initializing for the current video id. Commands
    /// may be executed from this point on.
    Ready(VideoMetadata),
    /// Playback ran off the end of the video.
    Ended,
}

/// The embedded player widget, reduced to the operations the sync core
/// drives. One interface, two call sites with different policies: the player
/// host drives the visible player, the control deck keeps a muted instance
/// purely as a metadata probe and never calls play on it.
pub trait PlayerCapability: Send {
    fn play(&mut self);
    fn pause(&mut self);
    /// Seek to an absolute position in seconds.
    fn seek(&mut self, time: f64);
    fn set_rate(&mut self, rate: f64);
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
}

/// Loaded capability plus the event stream belonging to it. Dropping the
/// receiver abandons the in-flight readiness wait, which is exactly what a
/// video change needs.
pub type LoadedPlayer = (Box<dyn PlayerCapability>, mpsc::UnboundedReceiver<PlayerEvent>);

/// Factory for capabilities. Loading is asynchronous: the returned player is
/// not usable until its `Ready` event arrives.
pub trait PlayerProvider: Send + Sync {
    fn load(&self, video_id: &str) -> LoadedPlayer;
}
