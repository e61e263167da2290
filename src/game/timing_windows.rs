// Shared timing window definitions so the matcher and any result display agree.
use crate::game::judgment::JudgeGrade;

// All windows are half-widths in milliseconds, inclusive at the boundary.
pub const WINDOW_MARVELOUS_MS: f64 = 22.5;
pub const WINDOW_PERFECT_MS: f64 = 45.0;
pub const WINDOW_GREAT_MS: f64 = 90.0;
pub const WINDOW_GOOD_MS: f64 = 135.0;
pub const WINDOW_BOO_MS: f64 = 180.0;

/// Outermost window; inputs further than this from every pending note are dropped.
pub const OUTER_WINDOW_MS: f64 = WINDOW_BOO_MS;

const WINDOWS: [(f64, JudgeGrade); 5] = [
    (WINDOW_MARVELOUS_MS, JudgeGrade::Marvelous),
    (WINDOW_PERFECT_MS, JudgeGrade::Perfect),
    (WINDOW_GREAT_MS, JudgeGrade::Great),
    (WINDOW_GOOD_MS, JudgeGrade::Good),
    (WINDOW_BOO_MS, JudgeGrade::Boo),
];

/// Classify a signed offset (input time minus note time) into a grade, or
/// `None` when it falls outside the outer window.
#[inline(always)]
pub fn classify_offset_ms(offset_ms: f64) -> Option<JudgeGrade> {
    let abs = offset_ms.abs();
    WINDOWS
        .iter()
        .find(|(w, _)| abs <= *w)
        .map(|&(_, grade)| grade)
}

#[inline(always)]
pub fn within_outer_window(offset_ms: f64) -> bool {
    offset_ms.abs() <= OUTER_WINDOW_MS
}
