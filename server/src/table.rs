use crate::vec2::{distance_sq, vec2, Vec2};

pub const TABLE_WIDTH: f64 = 800.0;
pub const TABLE_HEIGHT: f64 = 400.0;
pub const BALL_RADIUS: f64 = 12.0;
pub const POCKET_RADIUS: f64 = 28.0;

/// Side pockets sit slightly outside the long cushions.
const SIDE_POCKET_OFFSET: f64 = 8.0;

/// A pocket: capture happens within `capture_radius * pocket_capture_scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pocket {
    pub center: Vec2,
    pub capture_radius: f64,
}

/// Immutable table geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub width: f64,
    pub height: f64,
    pub ball_radius: f64,
    /// Fraction of the normal velocity kept by a cushion
    pub cushion_restitution: f64,
    pub pockets: [Pocket; 6],
}

impl Table {
    pub fn new(width: f64, height: f64, ball_radius: f64, cushion_restitution: f64) -> Self {
        let pocket = |x: f64, y: f64| Pocket {
            center: vec2(x, y),
            capture_radius: POCKET_RADIUS,
        };
        Self {
            width,
            height,
            ball_radius,
            cushion_restitution,
            pockets: [
                pocket(0.0, 0.0),
                pocket(width / 2.0, -SIDE_POCKET_OFFSET),
                pocket(width, 0.0),
                pocket(0.0, height),
                pocket(width / 2.0, height + SIDE_POCKET_OFFSET),
                pocket(width, height),
            ],
        }
    }

    /// Where the cue ball starts and where it returns after a scratch.
    pub fn cue_spot(&self) -> Vec2 {
        vec2(self.width / 4.0, self.height / 2.0)
    }

    /// Apex of the rack triangle.
    pub fn rack_apex(&self) -> Vec2 {
        vec2(self.width * 0.75, self.height / 2.0)
    }

    /// Re-spot position for the nine-ball.
    pub fn foot_spot(&self) -> Vec2 {
        vec2(self.width * 0.75, self.height / 2.0)
    }

    pub fn min_x(&self) -> f64 {
        self.ball_radius
    }

    pub fn max_x(&self) -> f64 {
        self.width - self.ball_radius
    }

    pub fn min_y(&self) -> f64 {
        self.ball_radius
    }

    pub fn max_y(&self) -> f64 {
        self.height - self.ball_radius
    }

    /// Clamp a ball center into the playable area.
    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        vec2(
            pos.x.clamp(self.min_x(), self.max_x()),
            pos.y.clamp(self.min_y(), self.max_y()),
        )
    }

    /// Whether a ball center lies inside the playable area.
    pub fn contains(&self, pos: Vec2) -> bool {
        (self.min_x()..=self.max_x()).contains(&pos.x)
            && (self.min_y()..=self.max_y()).contains(&pos.y)
    }

    /// Index of the pocket capturing a ball centered at `pos`, if any.
    pub fn pocket_at(&self, pos: Vec2, capture_scale: f64) -> Option<usize> {
        self.pockets.iter().position(|p| {
            let r = p.capture_radius * capture_scale;
            distance_sq(pos, p.center) < r * r
        })
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new(TABLE_WIDTH, TABLE_HEIGHT, BALL_RADIUS, 0.75)
    }
}
