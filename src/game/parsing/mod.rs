pub mod notes;
pub mod simfile;

pub use simfile::{ParseError, ParseOptions, parse_simfile, parse_simfile_with};
