use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const NUM_LANES: usize = 4;

/// One of the four panel lanes, in chart column order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Down,
    Up,
    Right,
}

impl Direction {
    pub const ALL: [Direction; NUM_LANES] =
        [Direction::Left, Direction::Down, Direction::Up, Direction::Right];

    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Down => 1,
            Direction::Up => 2,
            Direction::Right => 3,
        }
    }

    #[inline(always)]
    pub const fn from_column(column: usize) -> Option<Self> {
        match column {
            0 => Some(Direction::Left),
            1 => Some(Direction::Down),
            2 => Some(Direction::Up),
            3 => Some(Direction::Right),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Down => "down",
            Direction::Up => "up",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Direction::Left),
            "down" | "d" => Ok(Direction::Down),
            "up" | "u" => Ok(Direction::Up),
            "right" | "r" => Ok(Direction::Right),
            _ => Err(()),
        }
    }
}

/// A single tap target. Notes sharing `time_ms` form a jump.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Note {
    /// Absolute time from song start, offset already applied.
    pub time_ms: f64,
    pub direction: Direction,
    /// Quarter-note beat the note was placed on, before offset.
    pub beat: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_map_to_lanes_in_order() {
        for (col, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(Direction::from_column(col), Some(*dir));
            assert_eq!(dir.index(), col);
        }
        assert_eq!(Direction::from_column(4), None);
    }

    #[test]
    fn parses_names_and_letters() {
        assert_eq!("Left".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!("r".parse::<Direction>(), Ok(Direction::Right));
        assert!("middle".parse::<Direction>().is_err());
    }
}
