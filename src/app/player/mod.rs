mod mpv;

pub(crate) use mpv::MpvPlayer;

use anyhow::Result;

/// A playback position sample. `duration` is NaN until the player knows it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MediaPosition {
    pub(crate) current_time: f64,
    pub(crate) duration: f64,
}

impl MediaPosition {
    pub(crate) fn unknown() -> Self {
        Self {
            current_time: 0.0,
            duration: f64::NAN,
        }
    }
}

/// The media element the controller drives.
pub(crate) trait MediaPlayer {
    /// Replaces the current source without starting playback.
    fn load(&mut self, url: &str) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    /// Stops playback and drops the source.
    fn clear(&mut self);
    fn position(&mut self) -> MediaPosition;
    /// Whether playback is still running (the player window is open).
    fn is_active(&mut self) -> bool;
}
