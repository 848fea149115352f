use flick::config::Config;
use flick::layout::{playable_extent, Position};
use ratatui::layout::Rect;

/// Cells a target occupies horizontally
pub const TARGET_WIDTH: u16 = 3;
pub const TARGET_GLYPH: &str = "███";

pub fn extent_of(config: &Config) -> (f64, f64) {
    playable_extent(config.board_width, config.board_height)
}

/// Map board coordinates onto the terminal cell of a target's left edge
pub fn project(position: Position, extent: (f64, f64), area: Rect) -> (u16, u16) {
    let (w, h) = extent;
    let span_x = area.width.saturating_sub(TARGET_WIDTH) as f64;
    let span_y = area.height.saturating_sub(1) as f64;
    let fx = if w > 0.0 { (position.x / w).clamp(0.0, 1.0) } else { 0.0 };
    let fy = if h > 0.0 { (position.y / h).clamp(0.0, 1.0) } else { 0.0 };

    (
        area.x + (fx * span_x).round() as u16,
        area.y + (fy * span_y).round() as u16,
    )
}

/// Whether a click lands on the target, allowing one cell of slack all round
pub fn hit(position: Position, extent: (f64, f64), area: Rect, column: u16, row: u16) -> bool {
    let (x, y) = project(position, extent, area);
    row.abs_diff(y) <= 1 && column + 1 >= x && column <= x + TARGET_WIDTH
}
