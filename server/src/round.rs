//! One frame of play: the racked balls, whose turn it is, and the
//! shot → motion → verdict cycle.

use crate::aim::{self, AimGuide};
use crate::audio::{AudioSink, TableEvent};
use crate::ball::{BallRegistry, CUE_BALL_ID};
use crate::physics;
use crate::player::Seat;
use crate::rules::{self, PlayerGroups, RuleSet, ShotVerdict, TurnContext};
use crate::table::Table;
use crate::vec2::{scale, try_normalize, Vec2};
use billiards_shared::config::PhysicsConfig;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingShot,
    BallsMoving,
    /// Only held while the verdict is being computed inside `tick`
    Resolving,
    AwaitingPlacement,
    RoundOver(Seat),
}

/// A cue release, already translated from pointer input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub direction: Vec2,
    pub power: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotOutcome {
    /// Cue ball launched with this (clamped) power
    Struck { power: f64 },
    /// Balls moving, placement pending or round over
    NotReady,
    /// Power at or below the minimum
    TooWeak,
    NoDirection,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementOutcome {
    Placed(Vec2),
    /// Overlaps a ball or sits in a pocket; nothing was committed
    Invalid,
    NotPlacing,
}

#[derive(Debug, Clone)]
pub struct Round {
    rules: RuleSet,
    table: Table,
    physics: PhysicsConfig,
    registry: BallRegistry,
    turn: TurnContext,
    groups: PlayerGroups,
    shooter: Seat,
    phase: Phase,
    placement_valid: bool,
}

impl Round {
    /// Rack a new frame. Player 1 breaks.
    pub fn new(rules: RuleSet, table: Table, physics: PhysicsConfig, rng: &mut impl Rng) -> Self {
        let registry = BallRegistry::rack(rules.mode, &table, rng);
        Self::with_registry(rules, table, physics, registry)
    }

    /// Start from an arbitrary layout.
    pub fn with_registry(
        rules: RuleSet,
        table: Table,
        physics: PhysicsConfig,
        registry: BallRegistry,
    ) -> Self {
        Self {
            rules,
            table,
            physics,
            registry,
            turn: TurnContext::default(),
            groups: PlayerGroups::default(),
            shooter: Seat::P1,
            phase: Phase::AwaitingShot,
            placement_valid: true,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn shooter(&self) -> Seat {
        self.shooter
    }

    pub fn groups(&self) -> PlayerGroups {
        self.groups
    }

    pub fn registry(&self) -> &BallRegistry {
        &self.registry
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn turn(&self) -> &TurnContext {
        &self.turn
    }

    /// Whether the cue ball's current ball-in-hand position may be committed
    pub fn placement_valid(&self) -> bool {
        self.placement_valid
    }

    pub fn winner(&self) -> Option<Seat> {
        match self.phase {
            Phase::RoundOver(seat) => Some(seat),
            _ => None,
        }
    }

    pub fn apply_shot(&mut self, shot: Shot, sink: &mut dyn AudioSink) -> ShotOutcome {
        if self.phase != Phase::AwaitingShot || self.registry.any_moving() {
            return ShotOutcome::NotReady;
        }
        if shot.power.is_nan() || shot.power <= self.physics.min_power {
            return ShotOutcome::TooWeak;
        }
        let Some(direction) = try_normalize(shot.direction) else {
            return ShotOutcome::NoDirection;
        };
        let power = shot.power.min(self.physics.max_power);
        let velocity = scale(direction, power * self.physics.shot_scale);

        match self.registry.cue_mut() {
            Some(cue) if cue.active => cue.vel = velocity,
            _ => return ShotOutcome::NotReady,
        }

        self.turn.reset();
        self.phase = Phase::BallsMoving;
        sink.notify(TableEvent::ShotStruck { power });
        ShotOutcome::Struck { power }
    }

    /// Where a shot along `direction` would first strike. Only while
    /// awaiting a shot.
    pub fn aim_guide(&self, direction: Vec2) -> Option<AimGuide> {
        if self.phase != Phase::AwaitingShot {
            return None;
        }
        aim::cast(&self.registry, &self.table, direction)
    }

    /// Drag the cue ball around during ball-in-hand. The ball follows the
    /// pointer (clamped to the cushions); returns whether the spot is legal.
    pub fn preview_cue_ball(&mut self, pos: Vec2) -> bool {
        if self.phase != Phase::AwaitingPlacement {
            return false;
        }
        let pos = self.table.clamp(pos);
        self.placement_valid = self.is_free_spot(pos);
        if let Some(cue) = self.registry.cue_mut() {
            cue.pos = pos;
        }
        self.placement_valid
    }

    pub fn place_cue_ball(&mut self, pos: Vec2) -> PlacementOutcome {
        if self.phase != Phase::AwaitingPlacement {
            return PlacementOutcome::NotPlacing;
        }
        let pos = self.table.clamp(pos);
        if !self.is_free_spot(pos) {
            return PlacementOutcome::Invalid;
        }
        if let Some(cue) = self.registry.cue_mut() {
            cue.pos = pos;
            cue.vel = Vec2::ZERO;
            cue.active = true;
        }
        self.placement_valid = true;
        self.phase = Phase::AwaitingShot;
        PlacementOutcome::Placed(pos)
    }

    /// Simulate `ticks` ticks. When the balls come to rest the shot is
    /// resolved, exactly once, and its verdict returned.
    pub fn tick(&mut self, ticks: u32, sink: &mut dyn AudioSink) -> Option<ShotVerdict> {
        if self.phase != Phase::BallsMoving || ticks == 0 {
            return None;
        }
        let moving = physics::advance(
            &mut self.registry,
            &self.table,
            &self.physics,
            &mut self.turn,
            sink,
            ticks,
        );
        if moving {
            return None;
        }

        self.phase = Phase::Resolving;
        let verdict = rules::resolve(
            self.rules,
            &mut self.registry,
            &self.table,
            self.physics.pocket_capture_scale,
            &self.turn,
            &mut self.groups,
            self.shooter,
        );
        self.shooter = verdict.next_shooter;
        self.phase = if let Some(winner) = verdict.round_winner {
            Phase::RoundOver(winner)
        } else if verdict.ball_in_hand {
            self.placement_valid = self
                .registry
                .cue()
                .is_some_and(|cue| self.is_free_spot(cue.pos));
            Phase::AwaitingPlacement
        } else {
            Phase::AwaitingShot
        };
        Some(verdict)
    }

    fn is_free_spot(&self, pos: Vec2) -> bool {
        self.table.contains(pos)
            && !self
                .registry
                .overlaps(pos, self.table.ball_radius, CUE_BALL_ID)
            && self
                .table
                .pocket_at(pos, self.physics.pocket_capture_scale)
                .is_none()
    }
}
