use serde::{Deserialize, Serialize};

/// The fixed set of playback rates the control deck offers.
pub const PLAYBACK_RATES: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Length of a well-formed video identifier.
const VIDEO_ID_LEN: usize = 11;

/// One addressable video position. The index is the routing key on every
/// channel message and never changes for the lifetime of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub index: usize,
    pub video_id: String,
    pub title: String,
}

impl Slot {
    pub fn new(index: usize, video_id: impl Into<String>) -> Self {
        Self {
            index,
            video_id: video_id.into(),
            title: default_title(index),
        }
    }
}

/// Display name used until the player reports real metadata.
pub fn default_title(index: usize) -> String {
    format!("Video {}", index + 1)
}

/// Accept either a raw identifier or a recognized video-sharing URL and
/// return the identifier to load. URL forms handled: `youtu.be/<id>`,
/// `watch?v=<id>`, `/embed/<id>`, `/v/<id>` and `/e/<id>`. Anything else is
/// passed through verbatim; a bogus id is the player capability's problem,
/// it will simply fail to load.
pub fn extract_video_id(input: &str) -> String {
    let input = input.trim();

    if let Some(id) = id_after_marker(input, "youtu.be/") {
        return id;
    }
    if input.contains("youtube.com") {
        for marker in ["v=", "/embed/", "/v/", "/e/"] {
            if let Some(id) = id_after_marker(input, marker) {
                return id;
            }
        }
    }

    input.to_string()
}

/// Take the token following `marker`, cut at the first delimiter, and return
/// it only when it has the exact identifier length.
fn id_after_marker(input: &str, marker: &str) -> Option<String> {
    let rest = &input[input.find(marker)? + marker.len()..];
    let token: String = rest
        .chars()
        .take_while(|c| !matches!(c, '&' | '?' | '/' | '"' | '#') && !c.is_whitespace())
        .collect();
    (token.len() == VIDEO_ID_LEN).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_default_title() {
        let slot = Slot::new(2, "dQw4w9WgXcQ");
        assert_eq!(slot.title, "Video 3");
        assert_eq!(slot.index, 2);
    }

    #[test]
    fn test_extract_from_short_url() {
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=42"),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_extract_from_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123"),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_extract_from_embed_and_v_urls() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/jfKfPfyJRdk"),
            "jfKfPfyJRdk"
        );
        assert_eq!(
            extract_video_id("https://youtube.com/v/jfKfPfyJRdk?rel=0"),
            "jfKfPfyJRdk"
        );
    }

    #[test]
    fn test_raw_id_passes_through() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        // Unrecognized input is used verbatim, validation is deferred to the
        // player capability.
        assert_eq!(extract_video_id("not-a-video"), "not-a-video");
    }

    #[test]
    fn test_malformed_url_falls_back_to_verbatim() {
        let input = "https://youtube.com/watch?v=short";
        assert_eq!(extract_video_id(input), input);
    }

    #[test]
    fn test_playback_rates_ordered() {
        for pair in PLAYBACK_RATES.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
