//! Conversions from engine state to the shared wire types.

pub use billiards_shared::protocol::*;

use crate::aim::{AimGuide, AimTarget};
use crate::audio::TableEvent;
use crate::ball::{Ball, BallCategory};
use crate::player::Seat;
use crate::round::Phase;
use crate::rules::Group;
use crate::table::Table;
use billiards_shared::config::{PhysicsConfig, FRAME_OPTIONS};

/// Round to 2 decimal places (sub-pixel precision is plenty for drawing)
#[inline]
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn welcome(table: &Table, physics: &PhysicsConfig) -> WelcomeMsg {
    WelcomeMsg {
        protocol_version: PROTOCOL_VERSION,
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        table: TableWire {
            width: table.width,
            height: table.height,
            ball_radius: table.ball_radius,
            pockets: table
                .pockets
                .iter()
                .map(|p| PocketWire {
                    pos: [p.center.x, p.center.y],
                    radius: p.capture_radius,
                })
                .collect(),
        },
        physics: *physics,
        frame_options: FRAME_OPTIONS.to_vec(),
    }
}

pub fn ball_wire(ball: &Ball) -> BallWire {
    BallWire {
        id: ball.id,
        pos: [round2(ball.pos.x), round2(ball.pos.y)],
        category: category_wire(ball.category),
        active: ball.active,
    }
}

pub fn category_wire(category: BallCategory) -> CategoryWire {
    match category {
        BallCategory::Cue => CategoryWire::Cue,
        BallCategory::Solid => CategoryWire::Solid,
        BallCategory::Stripe => CategoryWire::Stripe,
        BallCategory::Eight => CategoryWire::Eight,
        BallCategory::Nine => CategoryWire::Nine,
    }
}

pub fn phase_wire(phase: Phase) -> PhaseWire {
    match phase {
        Phase::AwaitingShot => PhaseWire::AwaitingShot,
        Phase::BallsMoving => PhaseWire::BallsMoving,
        Phase::Resolving => PhaseWire::Resolving,
        Phase::AwaitingPlacement => PhaseWire::AwaitingPlacement,
        Phase::RoundOver(_) => PhaseWire::RoundOver,
    }
}

pub fn group_wire(group: Group) -> GroupWire {
    match group {
        Group::Unassigned => GroupWire::Unassigned,
        Group::Solids => GroupWire::Solids,
        Group::Stripes => GroupWire::Stripes,
    }
}

pub fn seat_wire(seat: Seat) -> u8 {
    seat.number()
}

pub fn aim_wire(guide: &AimGuide) -> AimGuideWire {
    AimGuideWire {
        impact: [round2(guide.impact.x), round2(guide.impact.y)],
        target_ball: match guide.target {
            AimTarget::Ball(id) => Some(id),
            AimTarget::Cushion => None,
        },
        deflection: [round2(guide.deflection.x), round2(guide.deflection.y)],
    }
}

pub fn event_wire(event: TableEvent) -> TableEventWire {
    match event {
        TableEvent::ShotStruck { power } => TableEventWire::ShotStruck {
            power: round2(power),
        },
        TableEvent::CushionImpact { ball, speed } => TableEventWire::CushionImpact {
            ball,
            speed: round2(speed),
        },
        TableEvent::BallImpact { a, b, force } => TableEventWire::BallImpact {
            a,
            b,
            force: round2(force),
        },
        TableEvent::Pocketed { ball, pocket } => TableEventWire::Pocketed { ball, pocket },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec2::vec2;

    #[test]
    fn ball_position_is_rounded() {
        let mut ball = Ball::new(3, vec2(100.123456, 50.987654), BallCategory::Solid);
        ball.active = false;
        let wire = ball_wire(&ball);
        assert_eq!(wire.pos, [100.12, 50.99]);
        assert_eq!(wire.category, CategoryWire::Solid);
        assert!(!wire.active);
    }

    #[test]
    fn welcome_describes_default_table() {
        let msg = welcome(&Table::default(), &PhysicsConfig::default());
        assert_eq!(msg.protocol_version, PROTOCOL_VERSION);
        assert_eq!(msg.table.pockets.len(), 6);
        assert_eq!(msg.table.width, 800.0);
        assert_eq!(msg.frame_options, vec![1, 3, 5, 7]);
    }

    #[test]
    fn round_over_phase_drops_winner() {
        assert_eq!(phase_wire(Phase::RoundOver(Seat::P2)), PhaseWire::RoundOver);
    }

    #[test]
    fn aim_guide_names_struck_ball_only() {
        let guide = AimGuide {
            impact: vec2(276.004, 200.0),
            target: AimTarget::Ball(3),
            deflection: vec2(1.0, 0.0),
        };
        let wire = aim_wire(&guide);
        assert_eq!(wire.impact, [276.0, 200.0]);
        assert_eq!(wire.target_ball, Some(3));

        let cushion = AimGuide {
            target: AimTarget::Cushion,
            ..guide
        };
        assert_eq!(aim_wire(&cushion).target_ball, None);
    }

    #[test]
    fn event_conversion_keeps_ids() {
        let wire = event_wire(TableEvent::Pocketed { ball: 9, pocket: 4 });
        assert!(matches!(wire, TableEventWire::Pocketed { ball: 9, pocket: 4 }));
    }
}
