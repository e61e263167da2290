// Beat <-> millisecond conversion for fixed-tempo charts.
//
// Every conversion is computed directly from integer indices; nothing here
// accumulates a per-row delta, so a note deep into a long chart lands on the
// same time as it would if it were the only note.

pub const BEATS_PER_MEASURE: u32 = 4;
pub const MS_PER_MINUTE: f64 = 60_000.0;

// ITG parity grid: 48 rows per beat, 192 per measure.
pub const ROWS_PER_BEAT: u32 = 48;
pub const ROWS_PER_MEASURE: u32 = ROWS_PER_BEAT * BEATS_PER_MEASURE;

#[inline(always)]
pub fn ms_per_beat(bpm: f64) -> f64 {
    MS_PER_MINUTE / bpm
}

/// `beat × (60000 / bpm) + offset_ms`, evaluated with a single division.
#[inline(always)]
pub fn time_from_beat(bpm: f64, beat: f64, offset_ms: f64) -> f64 {
    (beat * MS_PER_MINUTE) / bpm + offset_ms
}

/// Inverse of [`time_from_beat`].
#[inline(always)]
pub fn beat_from_time(bpm: f64, time_ms: f64, offset_ms: f64) -> f64 {
    ((time_ms - offset_ms) * bpm) / MS_PER_MINUTE
}

/// Numerator of the absolute beat of `row` in measure `measure`, over a
/// denominator of `rows_in_measure`. Kept integral so the beat is exact.
#[inline(always)]
fn beat_numerator(measure: u32, row: u32, rows_in_measure: u32) -> u64 {
    let per_measure = u64::from(BEATS_PER_MEASURE);
    u64::from(measure) * per_measure * u64::from(rows_in_measure) + u64::from(row) * per_measure
}

/// Absolute quarter-note beat: `measure × 4 + (row / rows) × 4`.
#[inline(always)]
pub fn measure_row_to_beat(measure: u32, row: u32, rows_in_measure: u32) -> f64 {
    debug_assert!(rows_in_measure > 0);
    beat_numerator(measure, row, rows_in_measure) as f64 / f64::from(rows_in_measure)
}

/// Absolute note time (ms) for a row, rounded to the nearest microsecond.
#[inline(always)]
pub fn measure_row_time_ms(
    bpm: f64,
    measure: u32,
    row: u32,
    rows_in_measure: u32,
    offset_ms: f64,
) -> f64 {
    debug_assert!(rows_in_measure > 0);
    let num = beat_numerator(measure, row, rows_in_measure) as f64;
    let time = (num * MS_PER_MINUTE) / (f64::from(rows_in_measure) * bpm) + offset_ms;
    round_to_micros(time)
}

#[inline(always)]
pub fn round_to_micros(ms: f64) -> f64 {
    let r = (ms * 1000.0).round() / 1000.0;
    // Normalize -0.0 so equal times compare and print identically.
    if r == 0.0 { 0.0 } else { r }
}

/// True when every row of a measure with `rows` lines falls on the 192nd grid
/// (4ths, 8ths, 12ths, 16ths, 24ths, 32nds, 48ths, 64ths, 96ths, 192nds, ...).
#[inline(always)]
pub fn is_standard_subdivision(rows: usize) -> bool {
    rows > 0 && (ROWS_PER_MEASURE as usize).is_multiple_of(rows)
}
