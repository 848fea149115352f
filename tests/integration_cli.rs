use assert_cmd::Command;
use chrono::{TimeZone, Utc};
use flick::results::{record_result, FileResultsStore, GameResult};
use tempfile::tempdir;

fn seeded_store(dir: &std::path::Path) -> FileResultsStore {
    let store = FileResultsStore::with_path(dir.join("braingames.json"));
    for (minute, score) in [(0, 1510), (5, 1620)] {
        let result = GameResult {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 8, minute, 0).unwrap(),
            average_time_ms: 380.5,
            incorrect_clicks: 1,
            missed_green_targets: 2,
            score,
            targets: Default::default(),
        };
        record_result(&store, &result).unwrap();
    }
    store
}

#[test]
fn scores_flag_prints_recent_results() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path());

    let output = Command::cargo_bin("flick")
        .unwrap()
        .args(["--scores", "--results-file"])
        .arg(store.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("2024-03-09 08:05:00"));
    assert!(lines[1].trim_end().ends_with("1620"));
}

#[test]
fn scores_flag_with_no_history_prints_header_only() {
    let dir = tempdir().unwrap();

    let output = Command::cargo_bin("flick")
        .unwrap()
        .args(["--scores", "--results-file"])
        .arg(dir.path().join("missing.json"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("Timestamp"));
}

#[test]
fn export_writes_csv() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path());
    let out = dir.path().join("history.csv");

    Command::cargo_bin("flick")
        .unwrap()
        .arg("--results-file")
        .arg(store.path())
        .arg("--export")
        .arg(&out)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        "2024-03-09T08:00:00.000Z,380.50,2,1,1510"
    );
}
