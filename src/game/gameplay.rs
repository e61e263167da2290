use crate::game::chart::{Chart, Difficulty};
use crate::game::judgment::{InputEvent, Judgment, JudgmentEngine};
use crate::game::life::Life;
use crate::game::scores::{ScoreError, ScoreState};
use crate::game::song::Song;
use crate::game::stage_stats::StageSummary;
use crate::game::timing_stats;
use crate::game::timing_windows::OUTER_WINDOW_MS;
use log::{debug, info};
use smallvec::SmallVec;
use std::sync::Arc;

/// Judgments scored during one clock step, in note-time order.
pub type StepJudgments = SmallVec<[Judgment; 4]>;

// Margin past the last note's window used by `finish` so every note has timed out.
const FINISH_MARGIN_MS: f64 = 1.0;

/// One play of one chart. Drives the judgment engine from a caller-supplied
/// clock and folds each judgment into the score in note-time order.
#[derive(Clone, Debug)]
pub struct Session {
    chart: Arc<Chart>,
    engine: JudgmentEngine,
    score: ScoreState,
    judgments: Vec<Judgment>,
    /// Judged but not yet scored: waiting on an earlier pending note.
    held: Vec<Judgment>,
    last_now_ms: f64,
}

impl Session {
    pub fn new(chart: Arc<Chart>, initial_life: Life) -> Self {
        let total_notes = u32::try_from(chart.note_count()).unwrap_or(u32::MAX);
        info!(
            "Starting session: {} (level {}), {} notes",
            chart.difficulty, chart.level, total_notes
        );
        Self {
            engine: JudgmentEngine::new(Arc::clone(&chart)),
            score: ScoreState::with_life(total_notes, initial_life),
            judgments: Vec::with_capacity(chart.note_count()),
            held: Vec::new(),
            chart,
            last_now_ms: f64::NEG_INFINITY,
        }
    }

    /// Session for the first chart of `song` at `difficulty`, if the song has one.
    pub fn for_song(song: &Song, difficulty: Difficulty, initial_life: Life) -> Option<Self> {
        song.chart(difficulty)
            .map(|chart| Self::new(Arc::new(chart.clone()), initial_life))
    }

    #[inline(always)]
    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    #[inline(always)]
    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    #[inline(always)]
    pub fn judgments(&self) -> &[Judgment] {
        &self.judgments
    }

    #[inline(always)]
    pub fn engine(&self) -> &JudgmentEngine {
        &self.engine
    }

    /// True once every note has been judged and scored.
    #[inline(always)]
    pub fn is_finished(&self) -> bool {
        self.engine.is_complete() && self.held.is_empty()
    }

    /// Advances the clock, timing out every note whose window has closed.
    pub fn update(&mut self, now_ms: f64) -> Result<StepJudgments, ScoreError> {
        self.observe_clock(now_ms);
        self.expire_through(now_ms);
        self.release()
    }

    /// Processes one input at clock `now_ms`.
    ///
    /// Timeouts are first applied only up to the input's own timestamp, so a
    /// press that landed inside a note's window still counts even when it is
    /// processed late. The rest of the clock advance follows the match.
    pub fn handle_input(
        &mut self,
        now_ms: f64,
        input: &InputEvent,
    ) -> Result<StepJudgments, ScoreError> {
        self.observe_clock(now_ms);
        self.expire_through(now_ms.min(input.time_ms));
        match self.engine.evaluate(now_ms, input) {
            Some(j) => self.held.push(j),
            None => debug!(
                "Dropped input: lane={}, time_ms={:.3}, no pending note in window",
                input.direction, input.time_ms
            ),
        }
        self.expire_through(now_ms);
        self.release()
    }

    /// Replays a list of inputs, each processed at its own timestamp, then
    /// times out whatever is left.
    pub fn play_inputs(&mut self, inputs: &[InputEvent]) -> Result<(), ScoreError> {
        let mut ordered = inputs.to_vec();
        ordered.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        for input in &ordered {
            self.handle_input(input.time_ms, input)?;
        }
        self.finish()?;
        Ok(())
    }

    /// Moves the clock past the last note's window so every remaining note misses.
    pub fn finish(&mut self) -> Result<StepJudgments, ScoreError> {
        let end = self
            .chart
            .last_note_time_ms()
            .map_or(0.0, |t| t + OUTER_WINDOW_MS + FINISH_MARGIN_MS);
        self.update(end.max(self.last_now_ms))
    }

    pub fn summary(&self, song: &Song) -> StageSummary {
        StageSummary {
            song_title: song.title.clone(),
            artist: song.artist.clone(),
            difficulty: self.chart.difficulty,
            level: self.chart.level,
            chart_stats: self.chart.stats(),
            score: self.score.score(),
            score_percent: self.score.percentage(),
            grade: self.score.grade(),
            judgment_counts: *self.score.judgment_counts(),
            max_combo: self.score.max_combo(),
            total_judged: self.score.total_judged(),
            total_notes: self.score.total_notes(),
            life: *self.score.life(),
            failed: self.score.failed(),
            timing: timing_stats::compute_timing_stats(&self.judgments),
            timing_histogram: timing_stats::build_histogram_ms(&self.judgments),
        }
    }

    fn observe_clock(&mut self, now_ms: f64) {
        if now_ms < self.last_now_ms {
            debug!(
                "Clock moved backwards: {:.3} -> {:.3}; timeouts are not undone",
                self.last_now_ms, now_ms
            );
        } else {
            self.last_now_ms = now_ms;
        }
    }

    fn expire_through(&mut self, now_ms: f64) {
        let misses = self.engine.expire(now_ms);
        self.held.extend(misses);
    }

    /// Hands held judgments to scoring in note-time order. A hit on a later
    /// note waits until every earlier note has been judged, which takes at
    /// most the outer window.
    fn release(&mut self) -> Result<StepJudgments, ScoreError> {
        let mut out = StepJudgments::new();
        if self.held.is_empty() {
            return Ok(out);
        }
        self.held.sort_by_key(|j| j.note_index);
        let horizon = self.engine.first_pending_time_ms();
        let notes = &self.chart.notes;
        let ready = self
            .held
            .iter()
            .take_while(|j| horizon.is_none_or(|t| notes[j.note_index].time_ms <= t))
            .count();
        for j in self.held.drain(..ready) {
            self.score = self.score.apply(&j)?;
            self.judgments.push(j);
            out.push(j);
        }
        Ok(out)
    }
}
