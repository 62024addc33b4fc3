//! Aim guide: where the cue ball goes first along a given line.

use crate::ball::{BallRegistry, CUE_BALL_ID};
use crate::table::Table;
use crate::vec2::{add, dot, length_sq, scale, sub, try_normalize, vec2, Vec2};

/// Slack for a cue ball already resting against what it aims at.
const CONTACT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AimTarget {
    Cushion,
    Ball(u8),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimGuide {
    /// Cue ball center at the moment of impact
    pub impact: Vec2,
    pub target: AimTarget,
    /// Unit direction after impact: the cue ball's rebound off a cushion,
    /// or the line the struck object ball leaves on
    pub deflection: Vec2,
}

/// Cast the cue ball along `direction` and report the first cushion or
/// ball it would reach. `None` without an active cue ball or a direction.
pub fn cast(registry: &BallRegistry, table: &Table, direction: Vec2) -> Option<AimGuide> {
    let cue = registry.cue().filter(|b| b.active)?;
    let dir = try_normalize(direction)?;
    let origin = cue.pos;

    let (wall_t, flip_x, flip_y) = cushion_hit(table, origin, dir);

    let reach = 2.0 * table.ball_radius;
    let ball_hit = registry
        .active()
        .filter(|b| b.id != CUE_BALL_ID)
        .filter_map(|b| {
            let to_ball = sub(b.pos, origin);
            let along = dot(to_ball, dir);
            if along < 0.0 {
                return None;
            }
            let miss_sq = length_sq(to_ball) - along * along;
            if miss_sq >= reach * reach {
                return None;
            }
            let t = along - (reach * reach - miss_sq).sqrt();
            (t > -CONTACT_EPSILON).then_some((b.id, b.pos, t.max(0.0)))
        })
        .min_by(|a, b| a.2.total_cmp(&b.2));

    match ball_hit {
        Some((id, pos, t)) if t <= wall_t => {
            let impact = add(origin, scale(dir, t));
            Some(AimGuide {
                impact,
                target: AimTarget::Ball(id),
                deflection: try_normalize(sub(pos, impact)).unwrap_or(dir),
            })
        }
        _ => {
            let deflection = vec2(
                if flip_x { -dir.x } else { dir.x },
                if flip_y { -dir.y } else { dir.y },
            );
            Some(AimGuide {
                impact: table.clamp(add(origin, scale(dir, wall_t))),
                target: AimTarget::Cushion,
                deflection,
            })
        }
    }
}

/// Distance to the first cushion along `dir`, and which velocity
/// components a bounce there would reverse (both at a corner).
fn cushion_hit(table: &Table, origin: Vec2, dir: Vec2) -> (f64, bool, bool) {
    let axis_t = |pos: f64, d: f64, min: f64, max: f64| {
        if d > 0.0 {
            ((max - pos) / d).max(0.0)
        } else if d < 0.0 {
            ((min - pos) / d).max(0.0)
        } else {
            f64::INFINITY
        }
    };
    let tx = axis_t(origin.x, dir.x, table.min_x(), table.max_x());
    let ty = axis_t(origin.y, dir.y, table.min_y(), table.max_y());
    let t = tx.min(ty);
    (t, tx <= t + CONTACT_EPSILON, ty <= t + CONTACT_EPSILON)
}
