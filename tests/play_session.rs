use std::process::Command;
use std::sync::Arc;

use stepcore::game::life::Life;
use stepcore::game::scores::Grade;
use stepcore::{Difficulty, Direction, InputEvent, JudgeGrade, Session, parse_simfile};

const SONG: &str = "\
#TITLE:Integration;
#ARTIST:Tester;
#BPM:120;
#MUSIC:song.ogg;

//--- CHART: Easy (Level 2) ---
L...
.D..
..U.
...R
,

//--- CHART: Hard (Level 8) ---
L..R
....
.DU.
....
,
";

fn press(direction: Direction, time_ms: f64) -> InputEvent {
    InputEvent { direction, time_ms }
}

#[test]
fn parse_judge_and_score_a_full_play() {
    let song = parse_simfile(SONG).unwrap();
    assert_eq!(song.charts.len(), 2);

    let mut session = Session::for_song(&song, Difficulty::Easy, Life::default()).unwrap();
    session
        .play_inputs(&[
            press(Direction::Left, 0.0),
            press(Direction::Down, 530.0),
            press(Direction::Up, 940.0),
        ])
        .unwrap();

    let grades: Vec<JudgeGrade> = session.judgments().iter().map(|j| j.grade).collect();
    assert_eq!(
        grades,
        vec![JudgeGrade::Marvelous, JudgeGrade::Perfect, JudgeGrade::Great, JudgeGrade::Miss]
    );

    let summary = session.summary(&song);
    assert_eq!(summary.score, 657_500);
    assert_eq!(summary.grade, Grade::B);
    assert_eq!(summary.max_combo, 3);
    assert_eq!(summary.total_judged, 4);
    assert_eq!(summary.timing.count, 3);
    assert!(!summary.failed);
}

#[test]
fn jumps_need_one_press_per_lane() {
    let song = parse_simfile(SONG).unwrap();
    let chart = Arc::new(song.chart(Difficulty::Hard).unwrap().clone());
    let mut session = Session::new(chart, Life::default());

    let out = session.handle_input(0.0, &press(Direction::Left, 0.0)).unwrap();
    assert_eq!(out.len(), 1);
    assert!(!session.is_finished());
    let out = session.handle_input(5.0, &press(Direction::Right, 5.0)).unwrap();
    assert_eq!(out[0].grade, JudgeGrade::Marvelous);

    session.handle_input(1000.0, &press(Direction::Down, 1000.0)).unwrap();
    session.handle_input(1000.0, &press(Direction::Up, 1000.0)).unwrap();
    assert!(session.is_finished());
    assert_eq!(session.score().grade(), Grade::Aaaa);
    assert_eq!(session.score().score(), 1_000_000);
}

#[test]
fn cli_prints_a_summary_for_a_replay() {
    let dir = tempfile::tempdir().unwrap();
    let chart_path = dir.path().join("song.chart");
    let replay_path = dir.path().join("replay.json");
    let config_path = dir.path().join("stepcore.ini");
    std::fs::write(&chart_path, SONG).unwrap();
    std::fs::write(
        &replay_path,
        r#"[{"direction":"left","time_ms":0.0},{"direction":"down","time_ms":530.0},{"direction":"up","time_ms":940.0}]"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_stepcore"))
        .arg(&chart_path)
        .args(["--difficulty", "easy", "--compact"])
        .arg("--replay")
        .arg(&replay_path)
        .arg("--config")
        .arg(&config_path)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["score"], 657_500);
    assert_eq!(summary["grade"], "B");
    assert_eq!(summary["difficulty"], "Easy");
    assert_eq!(summary["judgment_counts"]["miss"], 1);
    assert!(config_path.exists());
}

#[test]
fn cli_rejects_a_broken_chart() {
    let dir = tempfile::tempdir().unwrap();
    let chart_path = dir.path().join("broken.chart");
    std::fs::write(&chart_path, "#TITLE:x\n#BPM:0\n#MUSIC:a.ogg\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_stepcore"))
        .arg(&chart_path)
        .arg("--config")
        .arg(dir.path().join("stepcore.ini"))
        .output()
        .unwrap();
    assert!(!output.status.success());
}
