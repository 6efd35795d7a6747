use serde::{Deserialize, Serialize};

/// Minimum span kept between the loop boundaries when an edit would
/// cross them. Matches the 5 second tie-break the control deck always used.
pub const MIN_LOOP_SPAN: f64 = 5.0;

/// Fine and coarse nudge steps for the boundary buttons.
pub const NUDGE_FINE: f64 = 0.1;
pub const NUDGE_COARSE: f64 = 1.0;

/// Per-slot loop region. Two copies of this exist at runtime (controller
/// mirror and player host authority) and are reconciled only through
/// VIDEO_LOOP_SETTINGS messages, so they may diverge transiently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSettings {
    pub enabled: bool,
    pub start_time: f64,
    pub end_time: f64,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            start_time: 0.0,
            end_time: 0.0,
        }
    }
}

/// Which boundary a user edit moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEdge {
    Start,
    End,
}

/// Result of committing a boundary edit: the corrected settings plus the
/// follow-up seek the edit demands, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopEdit {
    pub settings: LoopSettings,
    pub seek_to: Option<f64>,
}

impl LoopSettings {
    /// Flip looping on or off without touching the boundaries.
    pub fn toggled(&self) -> Self {
        Self {
            enabled: !self.enabled,
            ..*self
        }
    }

    /// Commit a single-boundary edit. Editing either boundary implicitly
    /// enables looping. The invariant `start_time < end_time` is restored by
    /// clamping, never reported as an error:
    /// - if the edit increased the start past the end, the end is pushed to
    ///   `start + MIN_LOOP_SPAN` (capped at the video duration);
    /// - otherwise the start is pulled back to `end - MIN_LOOP_SPAN`
    ///   (floored at zero).
    ///
    /// A moved start also asks for a seek to the new start; a moved end asks
    /// for a seek back to the start when the playhead would be left beyond
    /// the new end.
    pub fn apply_edit(
        &self,
        edge: LoopEdge,
        value: f64,
        duration: f64,
        current_time: f64,
    ) -> LoopEdit {
        // Boundaries can only live inside the video. With the duration still
        // unknown (0.0) there is nothing to cap against yet.
        let value = if duration > 0.0 {
            value.clamp(0.0, duration)
        } else {
            value.max(0.0)
        };

        let mut next = Self {
            enabled: true,
            ..*self
        };
        match edge {
            LoopEdge::Start => next.start_time = value,
            LoopEdge::End => next.end_time = value,
        }

        if next.start_time >= next.end_time {
            if next.start_time > self.start_time {
                next.end_time = (next.start_time + MIN_LOOP_SPAN).min(duration);
                // A start dragged to the very end leaves no room ahead, so
                // give ground behind it instead.
                if next.start_time >= next.end_time {
                    next.start_time = (next.end_time - MIN_LOOP_SPAN).max(0.0);
                }
            } else {
                next.start_time = (next.end_time - MIN_LOOP_SPAN).max(0.0);
                if next.start_time >= next.end_time {
                    next.end_time = (next.start_time + MIN_LOOP_SPAN).min(duration);
                }
            }
        }

        let seek_to = match edge {
            LoopEdge::Start => Some(next.start_time),
            LoopEdge::End if current_time > next.end_time => Some(next.start_time),
            LoopEdge::End => None,
        };

        LoopEdit {
            settings: next,
            seek_to,
        }
    }

    /// Nudge a boundary by a fixed step. Each step is bounded before the
    /// shared clamp runs: the start cannot be pushed past `end - step` nor
    /// below zero, the end cannot be pulled below `start + step` nor past
    /// the duration.
    pub fn nudge(
        &self,
        edge: LoopEdge,
        delta: f64,
        duration: f64,
        current_time: f64,
    ) -> LoopEdit {
        let step = delta.abs();
        let value = match edge {
            LoopEdge::Start if delta >= 0.0 => {
                (self.start_time + step).min(self.end_time - step)
            }
            LoopEdge::Start => (self.start_time - step).max(0.0),
            LoopEdge::End if delta >= 0.0 => (self.end_time + step).min(duration),
            LoopEdge::End => (self.end_time - step).max(self.start_time + step),
        };
        self.apply_edit(edge, value, duration, current_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(start: f64, end: f64) -> LoopSettings {
        LoopSettings {
            enabled: true,
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn test_toggle_keeps_boundaries() {
        let settings = region(10.0, 20.0);
        let toggled = settings.toggled();
        assert!(!toggled.enabled);
        assert_eq!(toggled.start_time, 10.0);
        assert_eq!(toggled.end_time, 20.0);
        assert_eq!(toggled.toggled(), settings);
    }

    #[test]
    fn test_plain_edit_accepted() {
        let edit = region(10.0, 20.0).apply_edit(LoopEdge::Start, 12.0, 60.0, 11.0);
        assert_eq!(edit.settings.start_time, 12.0);
        assert_eq!(edit.settings.end_time, 20.0);
        // Moving the start always seeks to the new start.
        assert_eq!(edit.seek_to, Some(12.0));
    }

    #[test]
    fn test_start_dragged_past_end_pushes_end() {
        let edit = region(10.0, 20.0).apply_edit(LoopEdge::Start, 25.0, 60.0, 15.0);
        assert_eq!(edit.settings.start_time, 25.0);
        assert_eq!(edit.settings.end_time, 30.0);
    }

    #[test]
    fn test_pushed_end_capped_at_duration() {
        let edit = region(10.0, 20.0).apply_edit(LoopEdge::Start, 25.0, 27.0, 15.0);
        assert_eq!(edit.settings.start_time, 25.0);
        assert_eq!(edit.settings.end_time, 27.0);
    }

    #[test]
    fn test_end_dragged_below_start_pulls_start() {
        let edit = region(10.0, 20.0).apply_edit(LoopEdge::End, 5.0, 60.0, 15.0);
        assert_eq!(edit.settings.start_time, 0.0);
        assert_eq!(edit.settings.end_time, 5.0);
        // Playhead at 15 sits past the new end, so we jump to the start.
        assert_eq!(edit.seek_to, Some(0.0));
    }

    #[test]
    fn test_end_edit_without_playhead_overrun_does_not_seek() {
        let edit = region(10.0, 20.0).apply_edit(LoopEdge::End, 18.0, 60.0, 15.0);
        assert_eq!(edit.settings.end_time, 18.0);
        assert_eq!(edit.seek_to, None);
    }

    #[test]
    fn test_edit_enables_looping() {
        let disabled = LoopSettings {
            enabled: false,
            start_time: 2.0,
            end_time: 30.0,
        };
        let edit = disabled.apply_edit(LoopEdge::End, 25.0, 60.0, 3.0);
        assert!(edit.settings.enabled);
    }

    #[test]
    fn test_start_dragged_to_duration_gives_ground_behind() {
        let edit = region(10.0, 20.0).apply_edit(LoopEdge::Start, 60.0, 60.0, 15.0);
        assert_eq!(edit.settings.start_time, 55.0);
        assert_eq!(edit.settings.end_time, 60.0);
    }

    #[test]
    fn test_end_dragged_to_zero_gives_ground_ahead() {
        let edit = region(10.0, 20.0).apply_edit(LoopEdge::End, 0.0, 60.0, 15.0);
        assert_eq!(edit.settings.start_time, 0.0);
        assert_eq!(edit.settings.end_time, 5.0);
    }

    #[test]
    fn test_edit_value_capped_to_video() {
        let edit = region(10.0, 20.0).apply_edit(LoopEdge::End, 75.0, 60.0, 15.0);
        assert_eq!(edit.settings.end_time, 60.0);
    }

    #[test]
    fn test_invariant_holds_for_boundary_sweeps() {
        let duration = 60.0;
        for value in [-3.0f64, 0.0, 4.9, 5.0, 19.9, 20.0, 30.0, 60.0, 75.0] {
            for edge in [LoopEdge::Start, LoopEdge::End] {
                let edit = region(5.0, 20.0).apply_edit(edge, value.max(0.0), duration, 10.0);
                let s = edit.settings;
                assert!(s.start_time < s.end_time, "{edge:?} -> {value} gave {s:?}");
                assert!(s.start_time >= 0.0, "{s:?}");
                assert!(s.end_time <= duration, "{s:?}");
            }
        }
    }

    #[test]
    fn test_nudge_start_up_bounded_by_end() {
        let edit = region(19.95, 20.0).nudge(LoopEdge::Start, NUDGE_FINE, 60.0, 10.0);
        assert!(edit.settings.start_time < edit.settings.end_time);
        assert!(edit.settings.start_time <= 20.0 - NUDGE_FINE + 1e-9);
    }

    #[test]
    fn test_nudge_end_down_bounded_by_start() {
        let edit = region(10.0, 10.5).nudge(LoopEdge::End, -NUDGE_COARSE, 60.0, 10.0);
        // Bounded below by start + step, then the shared clamp restores the order.
        assert!(edit.settings.start_time < edit.settings.end_time);
    }

    #[test]
    fn test_nudge_start_down_floors_at_zero() {
        let edit = region(0.05, 20.0).nudge(LoopEdge::Start, -NUDGE_FINE, 60.0, 10.0);
        assert_eq!(edit.settings.start_time, 0.0);
        assert_eq!(edit.seek_to, Some(0.0));
    }

    #[test]
    fn test_nudge_end_up_capped_at_duration() {
        let edit = region(10.0, 59.5).nudge(LoopEdge::End, NUDGE_COARSE, 60.0, 10.0);
        assert_eq!(edit.settings.end_time, 60.0);
    }

    #[test]
    fn test_wire_field_names() {
        let settings = region(1.5, 9.0);
        let value = serde_json::to_value(settings).unwrap();
        assert_eq!(value["enabled"], true);
        assert_eq!(value["startTime"], 1.5);
        assert_eq!(value["endTime"], 9.0);
    }
}
