use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::results::{GameResult, History};

pub const RECENT_LIMIT: usize = 5;

/// One line of the recent scores table, already formatted for display
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub timestamp: String,
    pub average_time: String,
    pub missed_green_targets: u32,
    pub incorrect_clicks: u32,
    pub score: i64,
}

impl ScoreRow {
    fn new(timestamp: &DateTime<Utc>, result: &GameResult) -> Self {
        Self {
            timestamp: format_timestamp(timestamp),
            average_time: format!("{:.2}", result.average_time_ms),
            missed_green_targets: result.missed_green_targets,
            incorrect_clicks: result.incorrect_clicks,
            score: result.score,
        }
    }
}

/// Most recent results first. Entries whose key is not a timestamp are skipped.
pub fn recent_results(history: &History, limit: usize) -> Vec<(DateTime<Utc>, &GameResult)> {
    history
        .iter()
        .filter_map(|(key, result)| {
            DateTime::parse_from_rfc3339(key)
                .ok()
                .map(|ts| (ts.with_timezone(&Utc), result))
        })
        .sorted_by(|a, b| b.0.cmp(&a.0))
        .take(limit)
        .collect()
}

pub fn recent_rows(history: &History) -> Vec<ScoreRow> {
    recent_results(history, RECENT_LIMIT)
        .into_iter()
        .map(|(ts, result)| ScoreRow::new(&ts, result))
        .collect()
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Red for poor scores, green for 1000 and above
pub fn score_color(score: i64) -> (u8, u8, u8) {
    let percent = (score as f64 / 1000.0).clamp(0.0, 1.0);
    let r = (255.0 * (1.0 - percent)).round() as u8;
    let g = (180.0 * percent + 60.0 * (1.0 - percent)).round() as u8;
    (r, g, 80)
}

/// Plain-text table for printing outside the TUI
pub fn render_plain(rows: &[ScoreRow]) -> String {
    let mut out = format!(
        "{:<19}  {:>17}  {:>13}  {:>16}  {:>6}\n",
        "Timestamp", "Avg Reaction (ms)", "Missed Greens", "Incorrect Clicks", "Score"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<19}  {:>17}  {:>13}  {:>16}  {:>6}\n",
            row.timestamp, row.average_time, row.missed_green_targets, row.incorrect_clicks, row.score
        ));
    }
    out
}
