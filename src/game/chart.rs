use crate::game::note::{Direction, NUM_LANES, Note};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Difficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
    Challenge,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Beginner,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Challenge,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Challenge => "Challenge",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChartStats {
    pub total_arrows: u32,
    pub left: u32,
    pub down: u32,
    pub up: u32,
    pub right: u32,
    /// Rows (timestamps) carrying at least one arrow.
    pub total_steps: u32,
    /// Rows with exactly two arrows.
    pub jumps: u32,
    /// Rows with three or more arrows.
    pub hands: u32,
}

/// One playable difficulty of a song. Notes are sorted by time; notes sharing
/// a time form a jump and are kept in lane order.
#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    pub difficulty: Difficulty,
    pub level: u32,
    pub notes: Vec<Note>,
}

impl Chart {
    #[inline(always)]
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Same-timestamp groups in time order. Derived on each call, never stored.
    pub fn jumps(&self) -> impl Iterator<Item = &[Note]> + '_ {
        self.notes.chunk_by(|a, b| a.time_ms == b.time_ms)
    }

    /// Time of the last note, if any.
    pub fn last_note_time_ms(&self) -> Option<f64> {
        self.notes.last().map(|n| n.time_ms)
    }

    pub fn stats(&self) -> ChartStats {
        let mut stats = ChartStats::default();
        let mut lanes = [0u32; NUM_LANES];
        for note in &self.notes {
            lanes[note.direction.index()] += 1;
        }
        for group in self.jumps() {
            stats.total_steps += 1;
            match group.len() {
                0 | 1 => {}
                2 => stats.jumps += 1,
                _ => stats.hands += 1,
            }
        }
        stats.left = lanes[Direction::Left.index()];
        stats.down = lanes[Direction::Down.index()];
        stats.up = lanes[Direction::Up.index()];
        stats.right = lanes[Direction::Right.index()];
        stats.total_arrows = lanes.iter().sum();
        stats
    }
}
