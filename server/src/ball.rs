//! Ball entities and rack generation.
//!
//! Balls are never removed from the registry: a pocketed ball only flips
//! `active` off, so ids stay stable for the nine-ball re-spot.

use crate::table::Table;
use crate::vec2::{distance_sq, vec2, Vec2};
use billiards_shared::config::GameMode;
use rand::Rng;

pub const CUE_BALL_ID: u8 = 0;
pub const EIGHT_BALL_ID: u8 = 8;
pub const NINE_BALL_ID: u8 = 9;

/// Maximum random offset added to each racked ball, per axis
const RACK_JITTER: f64 = 0.1;

/// 8-ball rack, apex first; each inner slice is one column of the triangle.
const EIGHT_BALL_RACK: [&[u8]; 5] = [
    &[1],
    &[2, 9],
    &[3, 8, 10],
    &[4, 15, 12, 5],
    &[6, 7, 13, 14, 11],
];

/// 9-ball diamond: (ball id, column, row offset in diameters)
const NINE_BALL_RACK: [(u8, f64, f64); 9] = [
    (1, 0.0, 0.0),
    (2, 1.0, -0.5),
    (3, 1.0, 0.5),
    (9, 2.0, 0.0),
    (5, 2.0, -1.0),
    (6, 2.0, 1.0),
    (7, 3.0, -0.5),
    (8, 3.0, 0.5),
    (4, 4.0, 0.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallCategory {
    Cue,
    Solid,
    Stripe,
    Eight,
    Nine,
}

impl BallCategory {
    /// Category of a numbered ball in the given variant
    pub fn for_ball(mode: GameMode, id: u8) -> Self {
        match (mode, id) {
            (_, CUE_BALL_ID) => BallCategory::Cue,
            (GameMode::EightBall, EIGHT_BALL_ID) => BallCategory::Eight,
            (GameMode::EightBall, id) if id > EIGHT_BALL_ID => BallCategory::Stripe,
            (GameMode::NineBall, NINE_BALL_ID) => BallCategory::Nine,
            _ => BallCategory::Solid,
        }
    }

    pub fn is_object(&self) -> bool {
        *self != BallCategory::Cue
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub id: u8,
    pub pos: Vec2,
    pub vel: Vec2,
    pub active: bool,
    pub category: BallCategory,
}

impl Ball {
    pub fn new(id: u8, pos: Vec2, category: BallCategory) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            active: true,
            category,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.vel.x != 0.0 || self.vel.y != 0.0
    }
}

/// The balls of one round, indexed by position in `balls` (not by id).
#[derive(Debug, Clone)]
pub struct BallRegistry {
    pub balls: Vec<Ball>,
}

impl BallRegistry {
    pub fn new(balls: Vec<Ball>) -> Self {
        Self { balls }
    }

    /// Rack a fresh frame: cue ball on the cue spot, object balls in the
    /// variant's triangle with a small seeded jitter.
    pub fn rack(mode: GameMode, table: &Table, rng: &mut impl Rng) -> Self {
        let r = table.ball_radius;
        let apex = table.rack_apex();
        // Column spacing of a tight triangle, plus a hair of slack
        let column = ((2.0 * r).powi(2) - r * r).sqrt() + 0.5;
        let mut jitter = || vec2(rng.gen::<f64>() * RACK_JITTER, rng.gen::<f64>() * RACK_JITTER);

        let mut balls = vec![Ball::new(CUE_BALL_ID, table.cue_spot(), BallCategory::Cue)];
        match mode {
            GameMode::EightBall => {
                for (col, ids) in EIGHT_BALL_RACK.iter().enumerate() {
                    for (row, &id) in ids.iter().enumerate() {
                        let x = apex.x + col as f64 * column;
                        let y = apex.y + row as f64 * 2.0 * r - (ids.len() - 1) as f64 * r;
                        let j = jitter();
                        balls.push(Ball::new(
                            id,
                            vec2(x + j.x, y + j.y),
                            BallCategory::for_ball(mode, id),
                        ));
                    }
                }
            }
            GameMode::NineBall => {
                for &(id, col, row) in NINE_BALL_RACK.iter() {
                    let x = apex.x + col * column;
                    let y = apex.y + row * 2.0 * r;
                    let j = jitter();
                    balls.push(Ball::new(
                        id,
                        vec2(x + j.x, y + j.y),
                        BallCategory::for_ball(mode, id),
                    ));
                }
            }
        }
        Self { balls }
    }

    pub fn get(&self, id: u8) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: u8) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| b.id == id)
    }

    pub fn cue(&self) -> Option<&Ball> {
        self.get(CUE_BALL_ID)
    }

    pub fn cue_mut(&mut self) -> Option<&mut Ball> {
        self.get_mut(CUE_BALL_ID)
    }

    pub fn active(&self) -> impl Iterator<Item = &Ball> {
        self.balls.iter().filter(|b| b.active)
    }

    /// Active balls other than the cue ball
    pub fn active_object_balls(&self) -> impl Iterator<Item = &Ball> {
        self.active().filter(|b| b.category.is_object())
    }

    pub fn any_moving(&self) -> bool {
        self.active().any(Ball::is_moving)
    }

    /// Whether a ball centered at `pos` would overlap any active ball other
    /// than `ignore`.
    pub fn overlaps(&self, pos: Vec2, radius: f64, ignore: u8) -> bool {
        let min_dist = 2.0 * radius;
        self.active()
            .filter(|b| b.id != ignore)
            .any(|b| distance_sq(b.pos, pos) < min_dist * min_dist)
    }

    /// Nearest legal spot to `start` for ball `id`: in bounds, clear of
    /// every other active ball and outside the pocket capture zones.
    /// Slots are one diameter plus a gap apart. The search runs along the
    /// row toward the far cushion, then back toward the head, then on rows
    /// further and further above and below.
    pub fn free_spot(
        &self,
        table: &Table,
        start: Vec2,
        id: u8,
        capture_scale: f64,
    ) -> Option<Vec2> {
        let step = 2.0 * table.ball_radius + 1.0;
        let is_free = |pos: Vec2| {
            table.contains(pos)
                && !self.overlaps(pos, table.ball_radius, id)
                && table.pocket_at(pos, capture_scale).is_none()
        };
        let cols = (table.width / step).ceil() as i32;
        let rows = (table.height / step).ceil() as i32;

        for row in 0..=rows {
            let offsets = if row == 0 { vec![0] } else { vec![-row, row] };
            for dy in offsets {
                let y = start.y + dy as f64 * step;
                if y < table.min_y() || y > table.max_y() {
                    continue;
                }
                let forward = (0..=cols).map(|i| start.x + i as f64 * step);
                let back = (1..=cols).map(|i| start.x - i as f64 * step);
                let found = forward.chain(back).map(|x| vec2(x, y)).find(|&p| is_free(p));
                if found.is_some() {
                    return found;
                }
            }
        }
        None
    }

    /// Put the nine-ball back on the table at the free spot nearest the
    /// foot spot.
    pub fn respot_nine(&mut self, table: &Table, capture_scale: f64) -> Option<Vec2> {
        let foot = table.foot_spot();
        let pos = self
            .free_spot(table, foot, NINE_BALL_ID, capture_scale)
            .unwrap_or(foot);
        let nine = self.get_mut(NINE_BALL_ID)?;
        nine.active = true;
        nine.pos = pos;
        nine.vel = Vec2::ZERO;
        Some(pos)
    }

    /// Total kinetic energy of active balls (unit mass)
    pub fn kinetic_energy(&self) -> f64 {
        self.active()
            .map(|b| 0.5 * (b.vel.x * b.vel.x + b.vel.y * b.vel.y))
            .sum()
    }
}
