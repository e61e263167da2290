use crate::game::chart::{Chart, Difficulty};
use crate::game::timing;

/// A parsed step file. Immutable once built by the parser.
#[derive(Clone, Debug, PartialEq)]
pub struct Song {
    pub title: String,
    pub artist: String,
    pub bpm: f64,
    /// Signed offset applied to every note time.
    pub offset_ms: f64,
    /// Opaque music reference; resolving it is the caller's business.
    pub music: String,
    pub charts: Vec<Chart>,
}

impl Song {
    /// First chart declared with the given difficulty.
    pub fn chart(&self, difficulty: Difficulty) -> Option<&Chart> {
        self.charts.iter().find(|c| c.difficulty == difficulty)
    }

    #[inline(always)]
    pub fn ms_per_beat(&self) -> f64 {
        timing::ms_per_beat(self.bpm)
    }

    pub fn time_for_beat(&self, beat: f64) -> f64 {
        timing::time_from_beat(self.bpm, beat, self.offset_ms)
    }

    pub fn beat_for_time(&self, time_ms: f64) -> f64 {
        timing::beat_from_time(self.bpm, time_ms, self.offset_ms)
    }

    /// Time of the last note across every chart.
    pub fn last_note_time_ms(&self) -> Option<f64> {
        self.charts
            .iter()
            .filter_map(Chart::last_note_time_ms)
            .reduce(f64::max)
    }

    pub fn display_full_title(&self) -> String {
        if self.artist.trim().is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.artist, self.title)
        }
    }
}
