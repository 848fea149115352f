use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Horizontal room reserved for fixed UI chrome
pub const CHROME_MARGIN_X: f64 = 250.0;
/// Vertical room reserved for fixed UI chrome
pub const CHROME_MARGIN_Y: f64 = 400.0;
pub const GREEN_PROBABILITY: f64 = 0.7;
/// Draws per target before settling for the best candidate seen
pub const MAX_PLACEMENT_ATTEMPTS: usize = 1_000;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TargetColor {
    Green,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub position: Position,
    pub color: TargetColor,
    pub clicked: bool,
}

impl Target {
    pub fn new(position: Position, color: TargetColor) -> Self {
        Self {
            position,
            color,
            clicked: false,
        }
    }

    pub fn is_green(&self) -> bool {
        self.color == TargetColor::Green
    }

    pub fn is_red(&self) -> bool {
        self.color == TargetColor::Red
    }
}

/// Places targets on a board so no two sit closer than a minimum distance
#[derive(Debug)]
pub struct TargetLayout {
    rng: StdRng,
}

impl Default for TargetLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetLayout {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(
        &mut self,
        board_width: f64,
        board_height: f64,
        count: usize,
        min_distance: f64,
    ) -> Vec<Target> {
        let (max_x, max_y) = playable_extent(board_width, board_height);

        let mut placed: Vec<Position> = Vec::with_capacity(count);
        let mut targets = Vec::with_capacity(count);

        for index in 0..count {
            let position = self.place(&placed, max_x, max_y, min_distance, index);
            placed.push(position);

            let color = if self.rng.gen_bool(GREEN_PROBABILITY) {
                TargetColor::Green
            } else {
                TargetColor::Red
            };
            targets.push(Target::new(position, color));
        }

        targets
    }

    fn place(
        &mut self,
        placed: &[Position],
        max_x: f64,
        max_y: f64,
        min_distance: f64,
        index: usize,
    ) -> Position {
        let mut best: Option<(Position, f64)> = None;

        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let candidate = Position::new(self.draw(max_x), self.draw(max_y));
            let clearance = nearest_distance(placed, &candidate);
            if clearance >= min_distance {
                return candidate;
            }
            if best.map_or(true, |(_, d)| clearance > d) {
                best = Some((candidate, clearance));
            }
        }

        // MAX_PLACEMENT_ATTEMPTS > 0, so a candidate was always drawn
        let (position, clearance) = best.unwrap_or((Position::new(0.0, 0.0), 0.0));
        warn!(
            index,
            clearance, min_distance, "board too crowded, accepting best-effort placement"
        );
        position
    }

    fn draw(&mut self, max: f64) -> f64 {
        if max > 0.0 {
            self.rng.gen_range(0.0..max)
        } else {
            0.0
        }
    }
}

/// Width and height of the area targets are drawn from
pub fn playable_extent(board_width: f64, board_height: f64) -> (f64, f64) {
    (
        (board_width - CHROME_MARGIN_X).max(0.0),
        (board_height - CHROME_MARGIN_Y).max(0.0),
    )
}

fn nearest_distance(placed: &[Position], candidate: &Position) -> f64 {
    placed
        .iter()
        .map(|p| p.distance(candidate))
        .fold(f64::INFINITY, f64::min)
}

/// Smallest pairwise distance on a board, `None` for fewer than two targets
pub fn min_pairwise_distance(targets: &[Target]) -> Option<f64> {
    use itertools::Itertools;

    targets
        .iter()
        .tuple_combinations()
        .map(|(a, b)| a.position.distance(&b.position))
        .reduce(f64::min)
}
