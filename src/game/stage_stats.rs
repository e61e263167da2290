use serde::Serialize;

use crate::game::chart::{ChartStats, Difficulty};
use crate::game::life::Life;
use crate::game::scores::{self, JudgmentCounts};
use crate::game::timing_stats::{HistogramMs, TimingStats};

/// End-of-stage results for one play of one chart.
#[derive(Clone, Debug, Serialize)]
pub struct StageSummary {
    pub song_title: String,
    pub artist: String,
    pub difficulty: Difficulty,
    pub level: u32,
    pub chart_stats: ChartStats,
    pub score: u64,
    pub score_percent: f64,
    pub grade: scores::Grade,
    pub judgment_counts: JudgmentCounts,
    pub max_combo: u32,
    pub total_judged: u32,
    pub total_notes: u32,
    pub life: Life,
    pub failed: bool,
    pub timing: TimingStats,
    /// 1 ms offset histogram of every non-miss judgment.
    pub timing_histogram: HistogramMs,
}
