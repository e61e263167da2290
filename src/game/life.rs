use crate::game::judgment::JudgeGrade;
use log::info;
use serde::Serialize;

pub const REGEN_COMBO_AFTER_MISS: u32 = 5;

pub const MAX_LIFE: f64 = 1.0;
pub const DEFAULT_INITIAL_LIFE: f64 = 0.5;

pub const LIFE_MARVELOUS: f64 = 0.008;
pub const LIFE_PERFECT: f64 = 0.008;
pub const LIFE_GREAT: f64 = 0.004;
pub const LIFE_GOOD: f64 = 0.0;
pub const LIFE_BOO: f64 = -0.050;
pub const LIFE_MISS: f64 = -0.100;

#[inline(always)]
pub const fn life_delta_for(grade: JudgeGrade) -> f64 {
    match grade {
        JudgeGrade::Marvelous => LIFE_MARVELOUS,
        JudgeGrade::Perfect => LIFE_PERFECT,
        JudgeGrade::Great => LIFE_GREAT,
        JudgeGrade::Good => LIFE_GOOD,
        JudgeGrade::Boo => LIFE_BOO,
        JudgeGrade::Miss => LIFE_MISS,
    }
}

/// Life bar. Once it reaches zero the player has failed for the rest of the
/// session, even if later judgments would have refilled it.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Life {
    pub value: f64,
    pub failed: bool,
    /// Positive changes still suppressed after the last negative one.
    pub regen_lockout: u32,
}

impl Default for Life {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_LIFE)
    }
}

impl Life {
    pub fn new(initial: f64) -> Self {
        let value = if initial.is_finite() { initial.clamp(0.0, MAX_LIFE) } else { DEFAULT_INITIAL_LIFE };
        Self { value, failed: value <= 0.0, regen_lockout: 0 }
    }

    #[must_use]
    pub fn apply(self, grade: JudgeGrade) -> Self {
        let mut next = self;
        if next.failed {
            next.value = 0.0;
            return next;
        }

        let mut delta = life_delta_for(grade);
        if delta > 0.0 {
            if next.regen_lockout > 0 {
                delta = 0.0;
                next.regen_lockout -= 1;
            }
        } else if delta < 0.0 {
            next.regen_lockout = REGEN_COMBO_AFTER_MISS;
        }

        next.value = (next.value + delta).clamp(0.0, MAX_LIFE);
        if next.value <= 0.0 {
            next.value = 0.0;
            next.failed = true;
            info!("Player has failed!");
        }
        next
    }
}
