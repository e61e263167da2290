//! Step-chart parsing, timing, judgment and scoring for 4-panel rhythm games.
//!
//! The core is clock-agnostic: callers feed timestamped lane presses and a
//! monotonic "now", and read back judgments, score and results.

pub mod config;
pub mod game;

pub use game::chart::{Chart, Difficulty};
pub use game::gameplay::Session;
pub use game::judgment::{InputEvent, JudgeGrade, Judgment, JudgmentEngine};
pub use game::note::{Direction, Note};
pub use game::parsing::{ParseError, ParseOptions, parse_simfile, parse_simfile_with};
pub use game::scores::{Grade, ScoreError, ScoreState};
pub use game::song::Song;
pub use game::stage_stats::StageSummary;
