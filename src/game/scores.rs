use crate::game::judgment::{JudgeGrade, Judgment};
use crate::game::life::Life;
use serde::Serialize;
use std::fmt;

pub const MAX_SCORE: u64 = 1_000_000;
pub const MAX_COMBO_MULTIPLIER: u32 = 4;
pub const COMBO_PER_MULTIPLIER_STEP: u32 = 10;

// --- Grade Definitions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    #[serde(rename = "AAAA")]
    Aaaa,
    #[serde(rename = "AAA")]
    Aaa,
    #[serde(rename = "AA")]
    Aa,
    A,
    B,
    C,
    D,
}

impl Grade {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Grade::Aaaa => "AAAA",
            Grade::Aaa => "AAA",
            Grade::Aa => "AA",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Percentage floors below the all-Marvelous / Marvelous+Perfect tiers, best first.
const GRADE_THRESHOLDS: [(u64, Grade); 4] =
    [(93, Grade::Aa), (80, Grade::A), (65, Grade::B), (45, Grade::C)];

/// Share of one note's maximum value awarded for a grade, in percent.
#[inline(always)]
pub const fn base_score_percent(grade: JudgeGrade) -> u32 {
    match grade {
        JudgeGrade::Marvelous => 100,
        JudgeGrade::Perfect => 98,
        JudgeGrade::Great => 65,
        JudgeGrade::Good => 25,
        JudgeGrade::Boo => 0,
        JudgeGrade::Miss => 0,
    }
}

/// `floor(combo / 10) + 1`, capped at 4.
#[inline(always)]
pub const fn combo_multiplier(combo: u32) -> u32 {
    let m = combo / COMBO_PER_MULTIPLIER_STEP + 1;
    if m > MAX_COMBO_MULTIPLIER { MAX_COMBO_MULTIPLIER } else { m }
}

/// Occurrences of every grade; all six are always present.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct JudgmentCounts([u32; 6]);

impl JudgmentCounts {
    #[inline(always)]
    pub fn get(&self, grade: JudgeGrade) -> u32 {
        self.0[grade.index()]
    }

    #[inline(always)]
    fn bump(&mut self, grade: JudgeGrade) {
        let slot = &mut self.0[grade.index()];
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (JudgeGrade, u32)> + '_ {
        JudgeGrade::ALL.into_iter().map(|g| (g, self.get(g)))
    }

    /// Sum of base-score percents over every counted judgment.
    pub fn percent_sum(&self) -> u64 {
        self.iter()
            .map(|(g, n)| u64::from(base_score_percent(g)) * u64::from(n))
            .sum()
    }
}

impl Serialize for JudgmentCounts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(JudgeGrade::ALL.len()))?;
        for (grade, count) in self.iter() {
            map.serialize_entry(&grade, &count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("judgment overflow: all {total_notes} expected judgments have already been applied")]
    Overflow { total_notes: u32 },
}

/// Mean base-score fraction over `counts`, as 0.0–100.0. Zero judgments yield 0.
pub fn calculate_percentage(counts: &JudgmentCounts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 0.0;
    }
    counts.percent_sum() as f64 / f64::from(total)
}

/// Mean base-score fraction scaled to [`MAX_SCORE`], truncated. Zero judgments yield 0.
pub fn calculate_score(counts: &JudgmentCounts) -> u64 {
    let total = u64::from(counts.total());
    if total == 0 {
        return 0;
    }
    counts.percent_sum() * MAX_SCORE / (total * 100)
}

/// Letter grade from the judgment histogram.
///
/// AAAA needs every judgment Marvelous; AAA allows Perfects but nothing
/// lower. Below that the percentage floors apply, compared exactly in
/// integers.
pub fn calculate_grade(counts: &JudgmentCounts) -> Grade {
    let total = counts.total();
    if total == 0 {
        return Grade::D;
    }
    let marvelous = counts.get(JudgeGrade::Marvelous);
    let perfect = counts.get(JudgeGrade::Perfect);
    if marvelous == total {
        return Grade::Aaaa;
    }
    if marvelous + perfect == total {
        return Grade::Aaa;
    }
    let sum = counts.percent_sum();
    let total = u64::from(total);
    GRADE_THRESHOLDS
        .iter()
        .find(|(floor, _)| sum >= floor * total)
        .map_or(Grade::D, |&(_, grade)| grade)
}

/// Per-session scoring aggregate. [`ScoreState::apply`] returns the next state
/// and leaves `self` untouched.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScoreState {
    raw_score: u64,
    combo: u32,
    max_combo: u32,
    counts: JudgmentCounts,
    total_judged: u32,
    total_notes: u32,
    life: Life,
}

impl ScoreState {
    /// `total_notes` is the number of judgments the chart will produce: the
    /// note count for tap charts, two per hold note when holds are present.
    pub fn new(total_notes: u32) -> Self {
        Self::with_life(total_notes, Life::default())
    }

    pub fn with_life(total_notes: u32, life: Life) -> Self {
        Self {
            raw_score: 0,
            combo: 0,
            max_combo: 0,
            counts: JudgmentCounts::default(),
            total_judged: 0,
            total_notes,
            life,
        }
    }

    /// Returns the state after `judgment`, or `Overflow` when every expected
    /// judgment has already been applied.
    pub fn apply(&self, judgment: &Judgment) -> Result<Self, ScoreError> {
        self.apply_grade(judgment.grade)
    }

    pub fn apply_grade(&self, grade: JudgeGrade) -> Result<Self, ScoreError> {
        if self.total_judged >= self.total_notes {
            return Err(ScoreError::Overflow { total_notes: self.total_notes });
        }
        let mut next = *self;
        if grade.continues_combo() {
            next.combo = next.combo.saturating_add(1);
            next.max_combo = next.max_combo.max(next.combo);
        } else {
            next.combo = 0;
        }
        next.counts.bump(grade);
        next.total_judged += 1;
        next.raw_score = next.raw_score.saturating_add(
            u64::from(base_score_percent(grade)) * u64::from(combo_multiplier(next.combo)),
        );
        next.life = next.life.apply(grade);
        Ok(next)
    }

    #[inline(always)]
    pub fn raw_score(&self) -> u64 {
        self.raw_score
    }

    #[inline(always)]
    pub fn combo(&self) -> u32 {
        self.combo
    }

    #[inline(always)]
    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    #[inline(always)]
    pub fn combo_multiplier(&self) -> u32 {
        combo_multiplier(self.combo)
    }

    #[inline(always)]
    pub fn judgment_counts(&self) -> &JudgmentCounts {
        &self.counts
    }

    #[inline(always)]
    pub fn total_judged(&self) -> u32 {
        self.total_judged
    }

    #[inline(always)]
    pub fn total_notes(&self) -> u32 {
        self.total_notes
    }

    #[inline(always)]
    pub fn is_complete(&self) -> bool {
        self.total_judged >= self.total_notes
    }

    #[inline(always)]
    pub fn life(&self) -> &Life {
        &self.life
    }

    #[inline(always)]
    pub fn health(&self) -> f64 {
        self.life.value
    }

    #[inline(always)]
    pub fn failed(&self) -> bool {
        self.life.failed
    }

    pub fn percentage(&self) -> f64 {
        calculate_percentage(&self.counts)
    }

    pub fn score(&self) -> u64 {
        calculate_score(&self.counts)
    }

    pub fn grade(&self) -> Grade {
        calculate_grade(&self.counts)
    }
}

/// Free-function form of [`ScoreState::apply`].
#[inline(always)]
pub fn apply(state: &ScoreState, judgment: &Judgment) -> Result<ScoreState, ScoreError> {
    state.apply(judgment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::note::Direction;
    use proptest::prelude::*;

    fn judgment(grade: JudgeGrade) -> Judgment {
        Judgment {
            note_index: 0,
            direction: Direction::Left,
            time_error_ms: 0.0,
            grade,
            judged_at_ms: 0.0,
        }
    }

    fn play(total: u32, grades: &[JudgeGrade]) -> ScoreState {
        grades
            .iter()
            .fold(ScoreState::new(total), |s, &g| s.apply(&judgment(g)).unwrap())
    }

    fn grade_strategy() -> impl Strategy<Value = JudgeGrade> {
        prop::sample::select(JudgeGrade::ALL.to_vec())
    }

    #[test]
    fn mixed_four_note_chart() {
        use JudgeGrade::*;
        let s = play(4, &[Marvelous, Perfect, Great, Miss]);
        assert_eq!(s.score(), 657_500);
        assert!((s.percentage() - 65.75).abs() < 1e-12);
        assert_eq!(s.total_judged(), 4);
        assert_eq!(s.combo(), 0);
        assert_eq!(s.max_combo(), 3);
        assert_eq!(s.grade(), Grade::B);
        assert!(s.is_complete());
    }

    #[test]
    fn empty_chart_scores_zero() {
        let s = ScoreState::new(0);
        assert_eq!(s.score(), 0);
        assert_eq!(s.percentage(), 0.0);
        assert_eq!(s.grade(), Grade::D);
        assert!(matches!(
            s.apply(&judgment(JudgeGrade::Marvelous)),
            Err(ScoreError::Overflow { total_notes: 0 })
        ));
    }

    #[test]
    fn refuses_judgments_past_total() {
        let s = play(2, &[JudgeGrade::Great, JudgeGrade::Great]);
        let err = s.apply(&judgment(JudgeGrade::Great)).unwrap_err();
        assert_eq!(err, ScoreError::Overflow { total_notes: 2 });
        // The retained state is untouched.
        assert_eq!(s.total_judged(), 2);
    }

    #[test]
    fn apply_leaves_previous_state_unchanged() {
        let before = ScoreState::new(3);
        let after = apply(&before, &judgment(JudgeGrade::Perfect)).unwrap();
        assert_eq!(before.total_judged(), 0);
        assert_eq!(after.total_judged(), 1);
        assert_eq!(after.judgment_counts().get(JudgeGrade::Perfect), 1);
    }

    #[test]
    fn grade_tiers() {
        use JudgeGrade::*;
        assert_eq!(play(3, &[Marvelous; 3]).grade(), Grade::Aaaa);
        assert_eq!(play(3, &[Marvelous, Perfect, Marvelous]).grade(), Grade::Aaa);
        assert_eq!(play(2, &[Perfect, Perfect]).grade(), Grade::Aaa);
        // 100 + 100 + 100 + 65 = 365 / 4 = 91.25
        assert_eq!(play(4, &[Marvelous, Marvelous, Marvelous, Great]).grade(), Grade::A);
        // (100 * 14 + 65) / 15 = 97.67
        let mut grades = vec![Marvelous; 14];
        grades.push(Great);
        assert_eq!(play(15, &grades).grade(), Grade::Aa);
        assert_eq!(play(2, &[Great, Great]).grade(), Grade::B);
        // (65 + 25) / 2 = 45
        assert_eq!(play(2, &[Great, Good]).grade(), Grade::C);
        assert_eq!(play(2, &[Good, Miss]).grade(), Grade::D);
        assert_eq!(play(1, &[Miss]).grade(), Grade::D);
    }

    #[test]
    fn threshold_floors_are_inclusive() {
        use JudgeGrade::*;
        // 400 / 5 = 80% exactly.
        assert_eq!(play(5, &[Marvelous, Marvelous, Marvelous, Marvelous, Boo]).grade(), Grade::A);
        // 65% exactly.
        assert_eq!(play(1, &[Great]).grade(), Grade::B);
    }

    #[test]
    fn multiplier_steps_every_ten_and_caps() {
        assert_eq!(combo_multiplier(0), 1);
        assert_eq!(combo_multiplier(9), 1);
        assert_eq!(combo_multiplier(10), 2);
        assert_eq!(combo_multiplier(29), 3);
        assert_eq!(combo_multiplier(30), 4);
        assert_eq!(combo_multiplier(1000), 4);
    }

    #[test]
    fn raw_score_uses_multiplier_after_the_judgment() {
        let s = play(12, &[JudgeGrade::Marvelous; 12]);
        // combos 1..=9 at x1, 10 and 11 and 12 at x2
        assert_eq!(s.raw_score(), 9 * 100 + 3 * 200);
        assert_eq!(s.combo_multiplier(), 2);
    }

    #[test]
    fn hold_heavy_charts_stay_bounded() {
        // Three hold notes: head and tail judged separately.
        let s = play(6, &[JudgeGrade::Marvelous; 6]);
        assert_eq!(s.percentage(), 100.0);
        assert_eq!(s.score(), MAX_SCORE);
        assert_eq!(s.grade(), Grade::Aaaa);
    }

    #[test]
    fn health_and_fail_flag_follow_judgments() {
        let s = play(6, &[JudgeGrade::Miss; 6]);
        assert!(s.failed());
        assert_eq!(s.health(), 0.0);
        // Scoring continues after failing.
        assert_eq!(s.total_judged(), 6);
        let s = ScoreState::with_life(1, Life::new(1.0)).apply_grade(JudgeGrade::Boo).unwrap();
        assert!(!s.failed());
        assert!((s.health() - 0.95).abs() < 1e-12);
    }

    #[test]
    fn counts_serialize_with_every_grade() {
        let s = play(2, &[JudgeGrade::Great, JudgeGrade::Miss]);
        let json = serde_json::to_value(s.judgment_counts()).unwrap();
        assert_eq!(json["great"], 1);
        assert_eq!(json["miss"], 1);
        assert_eq!(json["marvelous"], 0);
        assert_eq!(json.as_object().map(|m| m.len()), Some(6));
    }

    proptest! {
        #[test]
        fn score_and_percentage_are_bounded(
            grades in prop::collection::vec(grade_strategy(), 0..200),
            holds in 0usize..2,
        ) {
            // With holds every note contributes a head and a tail judgment.
            let per_note = holds + 1;
            let judgments: Vec<JudgeGrade> = grades
                .iter()
                .flat_map(|&g| std::iter::repeat_n(g, per_note))
                .collect();
            let s = play(judgments.len() as u32, &judgments);
            prop_assert!(s.score() <= MAX_SCORE);
            prop_assert!((0.0..=100.0).contains(&s.percentage()));
            prop_assert_eq!(s.judgment_counts().total(), s.total_judged());
            prop_assert!(s.total_judged() <= s.total_notes());
        }

        #[test]
        fn combo_rules_hold(grades in prop::collection::vec(grade_strategy(), 1..200)) {
            let mut s = ScoreState::new(grades.len() as u32);
            for g in grades {
                let next = s.apply_grade(g).unwrap();
                if g.continues_combo() {
                    prop_assert_eq!(next.combo(), s.combo() + 1);
                } else {
                    prop_assert_eq!(next.combo(), 0);
                }
                prop_assert!(next.max_combo() >= s.max_combo());
                prop_assert!(next.max_combo() >= next.combo());
                s = next;
            }
        }
    }
}
