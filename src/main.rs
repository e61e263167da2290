use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use stepcore::config;
use stepcore::game::chart::ChartStats;
use stepcore::game::life::Life;
use stepcore::{Chart, Difficulty, InputEvent, Session, Song};

#[derive(Parser, Debug)]
#[command(name = "stepcore")]
#[command(version = "0.1.0")]
#[command(about = "Parse a step chart and score a recorded play", long_about = None)]
struct Args {
    /// Step chart file
    chart: PathBuf,

    /// Difficulty to play (defaults to the first chart in the file)
    #[arg(short, long)]
    difficulty: Option<String>,

    /// JSON list of timestamped lane presses to replay against the chart
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, default_value = config::CONFIG_PATH)]
    config: PathBuf,

    /// Output compact JSON (default is pretty-printed)
    #[arg(long)]
    compact: bool,
}

#[derive(Serialize)]
struct ChartInfo {
    difficulty: Difficulty,
    level: u32,
    stats: ChartStats,
    last_note_time_ms: Option<f64>,
}

#[derive(Serialize)]
struct SongInfo<'a> {
    title: &'a str,
    artist: &'a str,
    music: &'a str,
    bpm: f64,
    offset_ms: f64,
    charts: Vec<ChartInfo>,
}

impl<'a> SongInfo<'a> {
    fn new(song: &'a Song) -> Self {
        Self {
            title: &song.title,
            artist: &song.artist,
            music: &song.music,
            bpm: song.bpm,
            offset_ms: song.offset_ms,
            charts: song
                .charts
                .iter()
                .map(|c| ChartInfo {
                    difficulty: c.difficulty,
                    level: c.level,
                    stats: c.stats(),
                    last_note_time_ms: c.last_note_time_ms(),
                })
                .collect(),
        }
    }
}

fn select_chart<'a>(song: &'a Song, difficulty: Option<&str>) -> Result<&'a Chart, String> {
    match difficulty {
        Some(name) => {
            let difficulty: Difficulty = name
                .parse()
                .map_err(|()| format!("'{name}' is not a difficulty"))?;
            song.chart(difficulty)
                .ok_or_else(|| format!("'{}' has no {difficulty} chart", song.title))
        }
        None => song
            .charts
            .first()
            .ok_or_else(|| format!("'{}' has no charts", song.title)),
    }
}

fn to_json<T: Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact { serde_json::to_string(value) } else { serde_json::to_string_pretty(value) }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Startup default when config is missing or malformed.
    log::set_max_level(log::LevelFilter::Warn);

    config::load(&args.config);
    let cfg = config::get();
    log::set_max_level(cfg.log_level.as_level_filter());

    let text = std::fs::read_to_string(&args.chart)?;
    let song = stepcore::parse_simfile_with(&text, &cfg.parse_options())?;

    let Some(replay) = args.replay else {
        println!("{}", to_json(&SongInfo::new(&song), args.compact)?);
        return Ok(());
    };

    let chart = select_chart(&song, args.difficulty.as_deref())?;
    let inputs: Vec<InputEvent> = serde_json::from_str(&std::fs::read_to_string(replay)?)?;
    log::info!("Replaying {} inputs against {}", inputs.len(), song.display_full_title());

    let mut session = Session::new(std::sync::Arc::new(chart.clone()), Life::new(cfg.initial_life));
    session.play_inputs(&inputs)?;
    println!("{}", to_json(&session.summary(&song), args.compact)?);
    Ok(())
}
