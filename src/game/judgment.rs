use crate::game::chart::Chart;
use crate::game::note::{Direction, Note};
use crate::game::timing_windows::{self, OUTER_WINDOW_MS};
use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Tap grades, best first. The order is the window strictness order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeGrade {
    Marvelous,
    Perfect,
    Great,
    Good,
    Boo,
    Miss,
}

impl JudgeGrade {
    pub const ALL: [JudgeGrade; 6] = [
        JudgeGrade::Marvelous,
        JudgeGrade::Perfect,
        JudgeGrade::Great,
        JudgeGrade::Good,
        JudgeGrade::Boo,
        JudgeGrade::Miss,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            JudgeGrade::Marvelous => 0,
            JudgeGrade::Perfect => 1,
            JudgeGrade::Great => 2,
            JudgeGrade::Good => 3,
            JudgeGrade::Boo => 4,
            JudgeGrade::Miss => 5,
        }
    }

    /// Marvelous, Perfect and Great extend the combo; everything else breaks it.
    #[inline(always)]
    pub const fn continues_combo(self) -> bool {
        matches!(self, JudgeGrade::Marvelous | JudgeGrade::Perfect | JudgeGrade::Great)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            JudgeGrade::Marvelous => "Marvelous",
            JudgeGrade::Perfect => "Perfect",
            JudgeGrade::Great => "Great",
            JudgeGrade::Good => "Good",
            JudgeGrade::Boo => "Boo",
            JudgeGrade::Miss => "Miss",
        }
    }
}

impl fmt::Display for JudgeGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An already-timestamped lane press, in the same clock as note times.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub direction: Direction,
    pub time_ms: f64,
}

/// Immutable record of one note's outcome.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Judgment {
    /// Index into the chart's note list.
    pub note_index: usize,
    pub direction: Direction,
    /// Input time minus note time; negative is early.
    pub time_error_ms: f64,
    pub grade: JudgeGrade,
    /// Clock time at which the judgment was made.
    pub judged_at_ms: f64,
}

/// Matches inputs against one chart's notes.
///
/// Notes are only ever judged once: either by the nearest matching input
/// inside the outer window, or by timing out to `Miss` once that window has
/// fully elapsed. `cursor` is the first note that may still be pending; every
/// note before it is judged.
#[derive(Clone, Debug)]
pub struct JudgmentEngine {
    chart: Arc<Chart>,
    results: Vec<Option<JudgeGrade>>,
    cursor: usize,
    pending: usize,
}

impl JudgmentEngine {
    pub fn new(chart: Arc<Chart>) -> Self {
        let len = chart.notes.len();
        Self { chart, results: vec![None; len], cursor: 0, pending: len }
    }

    #[inline(always)]
    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    #[inline(always)]
    pub fn notes(&self) -> &[Note] {
        &self.chart.notes
    }

    #[inline(always)]
    pub fn result(&self, note_index: usize) -> Option<JudgeGrade> {
        self.results.get(note_index).copied().flatten()
    }

    #[inline(always)]
    pub fn pending_count(&self) -> usize {
        self.pending
    }

    #[inline(always)]
    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }

    /// Time of the earliest note still waiting for a judgment.
    #[inline(always)]
    pub fn first_pending_time_ms(&self) -> Option<f64> {
        self.chart.notes.get(self.cursor).map(|n| n.time_ms)
    }

    /// Pending notes of the earliest timestamp that still has any, i.e. what is
    /// left of the next jump.
    pub fn next_pending_group(&self) -> SmallVec<[usize; 4]> {
        let notes = self.notes();
        let Some(first) = (self.cursor..notes.len()).find(|&i| self.results[i].is_none()) else {
            return SmallVec::new();
        };
        let time = notes[first].time_ms;
        (first..notes.len())
            .take_while(|&i| notes[i].time_ms == time)
            .filter(|&i| self.results[i].is_none())
            .collect()
    }

    /// Judges one input. Picks the pending note in the input's lane nearest to
    /// the input time within the outer window, preferring the earlier note on
    /// a tie. Inputs with no such note are dropped.
    pub fn evaluate(&mut self, now_ms: f64, input: &InputEvent) -> Option<Judgment> {
        let notes = &self.chart.notes;
        let mut best: Option<(usize, f64)> = None;
        for (idx, note) in notes.iter().enumerate().skip(self.cursor) {
            let diff = input.time_ms - note.time_ms;
            if diff < -OUTER_WINDOW_MS {
                // Sorted by time: every later note is further in the future.
                break;
            }
            if note.direction != input.direction || self.results[idx].is_some() {
                continue;
            }
            if !timing_windows::within_outer_window(diff) {
                continue;
            }
            let abs = diff.abs();
            match best {
                Some((_, best_abs)) if abs >= best_abs => {}
                _ => best = Some((idx, abs)),
            }
        }

        let (note_index, _) = best?;
        let note = notes[note_index];
        let time_error_ms = input.time_ms - note.time_ms;
        let grade = timing_windows::classify_offset_ms(time_error_ms)?;
        debug!(
            "HIT: grade={grade}, note={note_index}, lane={}, note_time_ms={:.3}, input_ms={:.3}, offset_ms={:.3}",
            note.direction, note.time_ms, input.time_ms, time_error_ms
        );
        self.mark_judged(note_index, grade);
        Some(Judgment {
            note_index,
            direction: note.direction,
            time_error_ms,
            grade,
            judged_at_ms: now_ms,
        })
    }

    /// Times out every pending note whose window closed before `now_ms`,
    /// returning the resulting misses in note order.
    pub fn expire(&mut self, now_ms: f64) -> Vec<Judgment> {
        let mut out = Vec::new();
        let mut idx = self.cursor;
        while idx < self.chart.notes.len() {
            let note = self.chart.notes[idx];
            let late_by = now_ms - note.time_ms;
            if late_by <= OUTER_WINDOW_MS {
                break;
            }
            if self.results[idx].is_none() {
                debug!(
                    "MISSED (time-based): note={idx}, lane={}, note_time_ms={:.3}, now_ms={:.3}",
                    note.direction, note.time_ms, now_ms
                );
                self.results[idx] = Some(JudgeGrade::Miss);
                self.pending -= 1;
                out.push(Judgment {
                    note_index: idx,
                    direction: note.direction,
                    time_error_ms: late_by,
                    grade: JudgeGrade::Miss,
                    judged_at_ms: now_ms,
                });
            }
            idx += 1;
        }
        self.cursor = idx;
        self.advance_cursor();
        out
    }

    fn mark_judged(&mut self, note_index: usize, grade: JudgeGrade) {
        debug_assert!(self.results[note_index].is_none());
        self.results[note_index] = Some(grade);
        self.pending -= 1;
        self.advance_cursor();
    }

    #[inline(always)]
    fn advance_cursor(&mut self) {
        while self.cursor < self.results.len() && self.results[self.cursor].is_some() {
            self.cursor += 1;
        }
    }
}
