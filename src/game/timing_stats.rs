use crate::game::judgment::{JudgeGrade, Judgment};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimingStats {
    pub mean_abs_ms: f64,
    pub mean_ms: f64,
    pub stddev_ms: f64,
    pub max_abs_ms: f64,
    pub count: usize,
}

#[inline(always)]
fn is_timed(j: &Judgment) -> bool {
    j.grade != JudgeGrade::Miss
}

/// Offset statistics over every judgment that came from an actual input.
/// Misses carry no meaningful offset and are skipped.
pub fn compute_timing_stats(judgments: &[Judgment]) -> TimingStats {
    // First pass: sums and maxima
    let mut sum_abs = 0.0_f64;
    let mut sum_signed = 0.0_f64;
    let mut max_abs = 0.0_f64;
    let mut count: usize = 0;

    for j in judgments.iter().filter(|j| is_timed(j)) {
        let e = j.time_error_ms;
        let a = e.abs();
        sum_abs += a;
        sum_signed += e;
        if a > max_abs {
            max_abs = a;
        }
        count += 1;
    }

    if count == 0 {
        return TimingStats::default();
    }

    let mean_ms = sum_signed / (count as f64);
    let mean_abs_ms = sum_abs / (count as f64);

    // Second pass: sample standard deviation of signed offsets
    let stddev_ms = if count > 1 {
        let sum_diff_sq: f64 = judgments
            .iter()
            .filter(|j| is_timed(j))
            .map(|j| {
                let d = j.time_error_ms - mean_ms;
                d * d
            })
            .sum();
        (sum_diff_sq / ((count as f64) - 1.0)).sqrt()
    } else {
        0.0
    };

    TimingStats { mean_abs_ms, mean_ms, stddev_ms, max_abs_ms: max_abs, count }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HistogramMs {
    /// (bin_ms, count), sorted by bin.
    pub bins: Vec<(i32, u32)>,
    pub max_count: u32,
}

const HIST_BIN_MS: f64 = 1.0;

#[inline(always)]
fn bin_index_ms(v_ms: f64) -> i32 {
    // Floor, so -0.5ms lands in bin -1
    (v_ms / HIST_BIN_MS).floor() as i32
}

/// One-millisecond offset histogram of timed judgments.
pub fn build_histogram_ms(judgments: &[Judgment]) -> HistogramMs {
    let mut counts: BTreeMap<i32, u32> = BTreeMap::new();
    for j in judgments.iter().filter(|j| is_timed(j)) {
        let c = counts.entry(bin_index_ms(j.time_error_ms)).or_insert(0);
        *c = c.saturating_add(1);
    }
    let max_count = counts.values().copied().max().unwrap_or(0);
    HistogramMs { bins: counts.into_iter().collect(), max_count }
}
