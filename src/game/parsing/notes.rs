use crate::game::note::{Direction, NUM_LANES, Note};
use crate::game::parsing::simfile::ParseError;
use crate::game::timing;
use log::warn;

pub const EMPTY_CELL: char = '.';
pub const ARROW_CELLS: [char; NUM_LANES] = ['L', 'D', 'U', 'R'];

/// A validated note row: which lanes carry an arrow.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeasureRow {
    pub line: usize,
    pub cells: [bool; NUM_LANES],
}

/// A note positioned in the measure grid but not yet timestamped. Times are
/// resolved once the song's BPM and offset are known.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlacedNote {
    pub line: usize,
    pub measure: u32,
    pub row: u32,
    pub rows_in_measure: u32,
    pub direction: Direction,
}

/// Checks the fixed-width row contract: exactly four cells, each `.` or an arrow.
/// The lane is given by the cell's position.
pub fn parse_row(line: usize, row: &str) -> Result<MeasureRow, ParseError> {
    let len = row.chars().count();
    if len != NUM_LANES {
        return Err(ParseError::InvalidRowLength { line, row: row.to_string(), len });
    }
    let mut cells = [false; NUM_LANES];
    for (column, ch) in row.chars().enumerate() {
        cells[column] = match ch {
            EMPTY_CELL => false,
            c if ARROW_CELLS.contains(&c) => true,
            ch => {
                return Err(ParseError::InvalidRowChar {
                    line,
                    row: row.to_string(),
                    ch,
                    column: column + 1,
                });
            }
        };
    }
    Ok(MeasureRow { line, cells })
}

/// Converts a finished measure buffer into placed notes. Rows-per-measure is
/// the buffer length; counts off the 192nd grid are accepted with a warning
/// unless `strict` is set.
pub fn place_measure(
    rows: &[MeasureRow],
    measure: u32,
    strict: bool,
    out: &mut Vec<PlacedNote>,
) -> Result<(), ParseError> {
    if rows.is_empty() {
        return Ok(());
    }
    let rows_in_measure = rows.len();
    if !timing::is_standard_subdivision(rows_in_measure) {
        if strict {
            return Err(ParseError::UnsupportedSubdivision {
                line: rows[0].line,
                rows: rows_in_measure,
            });
        }
        warn!(
            "Measure {} (line {}) has {} rows, which is not a standard subdivision; timing will still be computed.",
            measure, rows[0].line, rows_in_measure
        );
    }
    let rows_in_measure = rows_in_measure as u32;
    for (row_index, row) in rows.iter().enumerate() {
        for (column, &filled) in row.cells.iter().enumerate() {
            if !filled {
                continue;
            }
            let Some(direction) = Direction::from_column(column) else {
                continue;
            };
            out.push(PlacedNote {
                line: row.line,
                measure,
                row: row_index as u32,
                rows_in_measure,
                direction,
            });
        }
    }
    Ok(())
}

/// Resolves placed notes to absolute times. Input order is preserved, which is
/// already time order because measures and rows are placed in sequence.
pub fn timestamp_notes(
    placed: &[PlacedNote],
    bpm: f64,
    offset_ms: f64,
) -> Result<Vec<Note>, ParseError> {
    let mut notes = Vec::with_capacity(placed.len());
    for p in placed {
        let time_ms =
            timing::measure_row_time_ms(bpm, p.measure, p.row, p.rows_in_measure, offset_ms);
        if time_ms < 0.0 {
            return Err(ParseError::NegativeNoteTime { line: p.line, time_ms, offset_ms });
        }
        notes.push(Note {
            time_ms,
            direction: p.direction,
            beat: timing::measure_row_to_beat(p.measure, p.row, p.rows_in_measure),
        });
    }
    debug_assert!(notes.windows(2).all(|w| w[0].time_ms <= w[1].time_ms));
    Ok(notes)
}
