//! Fixed-substep integrator: rolling friction, cushions, pockets and
//! ball-ball contacts.

use crate::audio::{AudioSink, TableEvent, MIN_CUSHION_SPEED, MIN_IMPACT_FORCE};
use crate::ball::{Ball, BallCategory, BallRegistry, CUE_BALL_ID};
use crate::rules::TurnContext;
use crate::table::Table;
use crate::vec2::{add, dot, from_basis, length, perp, scale, sub, vec2, Vec2};
use billiards_shared::config::PhysicsConfig;

/// Extra position-only passes after the contact pass, so a cluster pushed
/// apart pair by pair does not leave residual overlap behind.
const MAX_SEPARATION_PASSES: usize = 16;
const OVERLAP_TOLERANCE: f64 = 1e-9;

/// Advance the table by `ticks` whole ticks. Returns whether any ball is
/// still moving afterwards.
pub fn advance(
    registry: &mut BallRegistry,
    table: &Table,
    config: &PhysicsConfig,
    turn: &mut TurnContext,
    sink: &mut dyn AudioSink,
    ticks: u32,
) -> bool {
    for _ in 0..ticks {
        let potted = step_tick(registry, table, config, turn, sink);
        if !potted.is_empty() {
            turn.record_potted(&potted);
        }
        sink.end_tick();
    }
    registry.any_moving()
}

/// One tick split into `config.sub_steps` equal increments. Returns the ids
/// pocketed during the tick, in pocket order.
fn step_tick(
    registry: &mut BallRegistry,
    table: &Table,
    config: &PhysicsConfig,
    turn: &mut TurnContext,
    sink: &mut dyn AudioSink,
) -> Vec<u8> {
    let sub_steps = config.sub_steps.max(1) as f64;
    let friction = config.deceleration / sub_steps;
    let mut potted = Vec::new();

    for _ in 0..config.sub_steps.max(1) {
        for ball in registry.balls.iter_mut().filter(|b| b.active) {
            integrate(ball, friction, sub_steps, config.stop_threshold);
            bounce_off_cushions(ball, table, sink);

            if let Some(pocket) = table.pocket_at(ball.pos, config.pocket_capture_scale) {
                ball.active = false;
                ball.vel = Vec2::ZERO;
                if !potted.contains(&ball.id) {
                    potted.push(ball.id);
                }
                if ball.category == BallCategory::Nine {
                    turn.nine_ball_potted = true;
                }
                sink.notify(TableEvent::Pocketed {
                    ball: ball.id,
                    pocket: pocket as u8,
                });
            }
        }

        resolve_contacts(registry, table, config.ball_restitution, turn, sink);
    }

    potted
}

/// Move by one sub-increment, then take a constant bite out of the speed.
fn integrate(ball: &mut Ball, friction: f64, sub_steps: f64, stop_threshold: f64) {
    ball.pos = add(ball.pos, scale(ball.vel, 1.0 / sub_steps));

    let speed = length(ball.vel);
    if speed > 0.0 {
        let new_speed = (speed - friction).max(0.0);
        if new_speed < stop_threshold {
            ball.vel = Vec2::ZERO;
        } else {
            ball.vel = scale(ball.vel, new_speed / speed);
        }
    }
}

/// Clamp to the cushions and reflect the crossing component, losing energy.
fn bounce_off_cushions(ball: &mut Ball, table: &Table, sink: &mut dyn AudioSink) {
    let e = table.cushion_restitution;
    let mut hit = false;

    if ball.pos.x < table.min_x() {
        ball.pos.x = table.min_x();
        ball.vel.x = ball.vel.x.abs() * e;
        hit = true;
    }
    if ball.pos.x > table.max_x() {
        ball.pos.x = table.max_x();
        ball.vel.x = -ball.vel.x.abs() * e;
        hit = true;
    }
    if ball.pos.y < table.min_y() {
        ball.pos.y = table.min_y();
        ball.vel.y = ball.vel.y.abs() * e;
        hit = true;
    }
    if ball.pos.y > table.max_y() {
        ball.pos.y = table.max_y();
        ball.vel.y = -ball.vel.y.abs() * e;
        hit = true;
    }

    if hit {
        let speed = length(ball.vel);
        if speed > MIN_CUSHION_SPEED {
            sink.notify(TableEvent::CushionImpact {
                ball: ball.id,
                speed,
            });
        }
    }
}

/// Contact pass over every unordered pair, followed by position-only
/// passes until nothing overlaps.
fn resolve_contacts(
    registry: &mut BallRegistry,
    table: &Table,
    restitution: f64,
    turn: &mut TurnContext,
    sink: &mut dyn AudioSink,
) {
    let n = registry.balls.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (left, right) = registry.balls.split_at_mut(j);
            let (a, b) = (&mut left[i], &mut right[0]);
            if !a.active || !b.active {
                continue;
            }
            let Some(normal) = separate(a, b, table) else {
                continue;
            };

            if a.id == CUE_BALL_ID && turn.first_contact.is_none() {
                turn.first_contact = Some(b.id);
            } else if b.id == CUE_BALL_ID && turn.first_contact.is_none() {
                turn.first_contact = Some(a.id);
            }

            if let Some(force) = exchange_normal_velocity(a, b, normal, restitution) {
                if force > MIN_IMPACT_FORCE {
                    sink.notify(TableEvent::BallImpact {
                        a: a.id,
                        b: b.id,
                        force,
                    });
                }
            }
        }
    }

    for _ in 0..MAX_SEPARATION_PASSES {
        let mut any_overlap = false;
        for i in 0..n {
            for j in (i + 1)..n {
                let (left, right) = registry.balls.split_at_mut(j);
                let (a, b) = (&mut left[i], &mut right[0]);
                if a.active && b.active && penetration(a, b, table) > OVERLAP_TOLERANCE {
                    separate(a, b, table);
                    any_overlap = true;
                }
            }
        }
        if !any_overlap {
            break;
        }
    }
}

fn penetration(a: &Ball, b: &Ball, table: &Table) -> f64 {
    let d = sub(b.pos, a.pos);
    2.0 * table.ball_radius - dot(d, d).sqrt()
}

/// Push an overlapping pair apart along the contact normal, half each.
/// When a cushion stops one ball, the other takes the remainder. Returns
/// the normal (from `a` to `b`) if the pair was overlapping.
fn separate(a: &mut Ball, b: &mut Ball, table: &Table) -> Option<Vec2> {
    let min_dist = 2.0 * table.ball_radius;
    let delta = sub(b.pos, a.pos);
    let dist_sq = dot(delta, delta);
    if dist_sq >= min_dist * min_dist {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-9 {
        scale(delta, 1.0 / dist)
    } else {
        vec2(1.0, 0.0)
    };
    let overlap = min_dist - dist;
    if overlap <= OVERLAP_TOLERANCE {
        return Some(normal);
    }

    let half = scale(normal, overlap * 0.5);
    a.pos = table.clamp(sub(a.pos, half));
    b.pos = table.clamp(add(b.pos, half));

    let remaining = min_dist - length(sub(b.pos, a.pos));
    if remaining > OVERLAP_TOLERANCE {
        // One side is pinned against a cushion; move whichever can still move
        let pushed_b = table.clamp(add(b.pos, scale(normal, remaining)));
        if length(sub(pushed_b, b.pos)) > OVERLAP_TOLERANCE {
            b.pos = pushed_b;
        } else {
            a.pos = table.clamp(sub(a.pos, scale(normal, remaining)));
        }
    }
    Some(normal)
}

/// Restitution-weighted exchange of the normal components. Tangential
/// components are untouched. Only applied while the pair is approaching;
/// returns the impact force `|v1n - v2n|` when applied.
fn exchange_normal_velocity(a: &mut Ball, b: &mut Ball, normal: Vec2, e: f64) -> Option<f64> {
    let tangent = perp(normal);
    let v1n = dot(a.vel, normal);
    let v2n = dot(b.vel, normal);
    if v1n <= v2n {
        return None;
    }
    let v1t = dot(a.vel, tangent);
    let v2t = dot(b.vel, tangent);

    let v1n_new = (v1n * (1.0 - e) + v2n * (1.0 + e)) / 2.0;
    let v2n_new = (v1n * (1.0 + e) + v2n * (1.0 - e)) / 2.0;

    a.vel = from_basis(normal, v1n_new, v1t);
    b.vel = from_basis(normal, v2n_new, v2t);
    Some((v1n - v2n).abs())
}
