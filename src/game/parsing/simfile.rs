use crate::game::chart::{Chart, Difficulty};
use crate::game::parsing::notes::{self, MeasureRow, PlacedNote};
use crate::game::song::Song;
use crate::game::timing;
use log::{debug, info};

const CHART_MARKER: &str = "CHART:";
const MEASURE_SEPARATOR: &str = ",";

/// Fatal step-file errors. No partial song is ever returned alongside one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("missing required header #{key}")]
    MissingHeader { key: &'static str },

    #[error("line {line}: #BPM must be a positive number, got '{value}'")]
    NonPositiveBpm { line: usize, value: String },

    #[error("line {line}: invalid value '{value}' for #{key}")]
    InvalidHeaderValue { line: usize, key: String, value: String },

    #[error("line {line}: malformed header '{text}', expected #KEY:VALUE")]
    MalformedHeader { line: usize, text: String },

    #[error("line {line}: invalid difficulty '{name}'")]
    InvalidDifficulty { line: usize, name: String },

    #[error("line {line}: invalid chart level '{value}'")]
    InvalidLevel { line: usize, value: String },

    #[error("line {line}: malformed chart declaration '{text}'")]
    MalformedChartDeclaration { line: usize, text: String },

    #[error("line {line}: row '{row}' has {len} characters, expected 4")]
    InvalidRowLength { line: usize, row: String, len: usize },

    #[error("line {line}: row '{row}' has invalid character '{ch}' at column {column}")]
    InvalidRowChar { line: usize, row: String, ch: char, column: usize },

    #[error("line {line}: measure data appears before any chart declaration")]
    MeasureOutsideChart { line: usize },

    #[error("line {line}: measure has {rows} rows, which is not a standard subdivision")]
    UnsupportedSubdivision { line: usize, rows: usize },

    #[error(
        "line {line}: #OFFSET of {offset_ms} ms puts this note at {time_ms} ms, before the start of the song"
    )]
    NegativeNoteTime { line: usize, time_ms: f64, offset_ms: f64 },

    #[error("no charts found")]
    NoCharts,
}

impl ParseError {
    /// 1-based source line, when the error is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MissingHeader { .. } | Self::NoCharts => None,
            Self::NonPositiveBpm { line, .. }
            | Self::InvalidHeaderValue { line, .. }
            | Self::MalformedHeader { line, .. }
            | Self::InvalidDifficulty { line, .. }
            | Self::InvalidLevel { line, .. }
            | Self::MalformedChartDeclaration { line, .. }
            | Self::InvalidRowLength { line, .. }
            | Self::InvalidRowChar { line, .. }
            | Self::MeasureOutsideChart { line }
            | Self::UnsupportedSubdivision { line, .. }
            | Self::NegativeNoteTime { line, .. } => Some(*line),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject measures whose row count is off the 192nd grid instead of warning.
    pub strict_subdivisions: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    Blank,
    ChartDeclaration(&'a str),
    Comment,
    Header(&'a str),
    MeasureSeparator,
    NoteRow(&'a str),
}

#[inline(always)]
fn classify_line(line: &str) -> LineKind<'_> {
    if line.is_empty() {
        return LineKind::Blank;
    }
    if let Some(comment) = line.strip_prefix("//") {
        if let Some(decl) = comment
            .strip_prefix("---")
            .map(str::trim_start)
            .and_then(|s| s.strip_prefix(CHART_MARKER))
        {
            return LineKind::ChartDeclaration(decl);
        }
        return LineKind::Comment;
    }
    if let Some(header) = line.strip_prefix('#') {
        return LineKind::Header(header);
    }
    if line == MEASURE_SEPARATOR {
        return LineKind::MeasureSeparator;
    }
    LineKind::NoteRow(line)
}

/// Parses the body of `//--- CHART: <Difficulty> (Level <N>) ---`.
fn parse_chart_declaration(line: usize, decl: &str) -> Result<(Difficulty, u32), ParseError> {
    let body = decl.trim();
    let body = body.strip_suffix("---").unwrap_or(body).trim();
    let (name, level_part) = match body.split_once('(') {
        Some((name, rest)) => (name.trim(), Some(rest)),
        None => (body, None),
    };
    let difficulty = name.parse::<Difficulty>().map_err(|()| ParseError::InvalidDifficulty {
        line,
        name: name.to_string(),
    })?;
    let malformed = || ParseError::MalformedChartDeclaration { line, text: decl.trim().to_string() };
    let level_part = level_part.ok_or_else(malformed)?;
    let level_part = level_part.trim().strip_suffix(')').ok_or_else(malformed)?.trim();
    let value = match level_part.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("level") => level_part[5..].trim(),
        _ => return Err(malformed()),
    };
    let level = value.parse::<u32>().map_err(|_| ParseError::InvalidLevel {
        line,
        value: value.to_string(),
    })?;
    Ok((difficulty, level))
}

#[derive(Debug)]
struct ChartBuilder {
    difficulty: Difficulty,
    level: u32,
    measure_index: u32,
    measure: Vec<MeasureRow>,
    placed: Vec<PlacedNote>,
}

impl ChartBuilder {
    fn new(difficulty: Difficulty, level: u32) -> Self {
        Self { difficulty, level, measure_index: 0, measure: Vec::new(), placed: Vec::new() }
    }

    fn end_measure(&mut self, strict: bool) -> Result<(), ParseError> {
        notes::place_measure(&self.measure, self.measure_index, strict, &mut self.placed)?;
        self.measure.clear();
        self.measure_index += 1;
        Ok(())
    }

    /// Flushes a trailing measure that never saw its separator.
    fn finish(mut self, strict: bool) -> Result<Self, ParseError> {
        if !self.measure.is_empty() {
            self.end_measure(strict)?;
        }
        Ok(self)
    }
}

#[derive(Debug, Default)]
struct Headers {
    title: Option<String>,
    artist: Option<String>,
    bpm: Option<f64>,
    offset_ms: Option<f64>,
    music: Option<String>,
}

impl Headers {
    fn apply(&mut self, line: usize, header: &str) -> Result<(), ParseError> {
        let Some((key, value)) = header.split_once(':') else {
            return Err(ParseError::MalformedHeader { line, text: format!("#{header}") });
        };
        let key = key.trim().to_ascii_uppercase();
        let value = value.trim();
        let value = value.strip_suffix(';').unwrap_or(value).trim();
        let invalid = |key: &str| ParseError::InvalidHeaderValue {
            line,
            key: key.to_string(),
            value: value.to_string(),
        };

        match key.as_str() {
            "TITLE" => self.title = non_empty(value),
            "ARTIST" => self.artist = Some(value.to_string()),
            "MUSIC" => self.music = non_empty(value),
            "BPM" => {
                let bpm = value.parse::<f64>().map_err(|_| invalid("BPM"))?;
                if !bpm.is_finite() {
                    return Err(invalid("BPM"));
                }
                if bpm <= 0.0 {
                    return Err(ParseError::NonPositiveBpm { line, value: value.to_string() });
                }
                self.bpm = Some(bpm);
            }
            "OFFSET" => {
                let seconds = value.parse::<f64>().map_err(|_| invalid("OFFSET"))?;
                if !seconds.is_finite() {
                    return Err(invalid("OFFSET"));
                }
                self.offset_ms = Some(timing::round_to_micros(seconds * 1000.0));
            }
            _ => debug!("Ignoring unknown header #{key} on line {line}"),
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Parses step-file text with default options.
pub fn parse_simfile(text: &str) -> Result<Song, ParseError> {
    parse_simfile_with(text, &ParseOptions::default())
}

/// Single pass over the lines. Headers may appear anywhere, so note times are
/// resolved after the pass once `#BPM` and `#OFFSET` are known.
pub fn parse_simfile_with(text: &str, options: &ParseOptions) -> Result<Song, ParseError> {
    let strict = options.strict_subdivisions;
    let mut headers = Headers::default();
    let mut finished: Vec<ChartBuilder> = Vec::new();
    let mut current: Option<ChartBuilder> = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        match classify_line(raw_line.trim()) {
            LineKind::Blank | LineKind::Comment => {}
            LineKind::ChartDeclaration(decl) => {
                let (difficulty, level) = parse_chart_declaration(line_no, decl)?;
                if let Some(done) = current.take() {
                    finished.push(done.finish(strict)?);
                }
                current = Some(ChartBuilder::new(difficulty, level));
            }
            LineKind::Header(header) => headers.apply(line_no, header)?,
            LineKind::MeasureSeparator => {
                let chart = current
                    .as_mut()
                    .ok_or(ParseError::MeasureOutsideChart { line: line_no })?;
                chart.end_measure(strict)?;
            }
            LineKind::NoteRow(row) => {
                let row = notes::parse_row(line_no, row)?;
                let chart = current
                    .as_mut()
                    .ok_or(ParseError::MeasureOutsideChart { line: line_no })?;
                chart.measure.push(row);
            }
        }
    }
    if let Some(done) = current.take() {
        finished.push(done.finish(strict)?);
    }

    let title = headers.title.ok_or(ParseError::MissingHeader { key: "TITLE" })?;
    let bpm = headers.bpm.ok_or(ParseError::MissingHeader { key: "BPM" })?;
    let music = headers.music.ok_or(ParseError::MissingHeader { key: "MUSIC" })?;
    let offset_ms = headers.offset_ms.unwrap_or(0.0);
    if finished.is_empty() {
        return Err(ParseError::NoCharts);
    }

    let mut charts = Vec::with_capacity(finished.len());
    for builder in finished {
        let notes = notes::timestamp_notes(&builder.placed, bpm, offset_ms)?;
        debug!(
            "Chart {} (level {}): {} measures, {} notes",
            builder.difficulty,
            builder.level,
            builder.measure_index,
            notes.len()
        );
        charts.push(Chart { difficulty: builder.difficulty, level: builder.level, notes });
    }

    info!(
        "Parsed '{}' at {} BPM (offset {} ms) with {} chart(s).",
        title,
        bpm,
        offset_ms,
        charts.len()
    );

    Ok(Song {
        title,
        artist: headers.artist.unwrap_or_default(),
        bpm,
        offset_ms,
        music,
        charts,
    })
}
