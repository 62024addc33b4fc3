//! Turn and foul resolution.
//!
//! Runs once per shot, after every ball has come to rest, and turns the
//! shot's facts (first contact, what was potted) into a verdict.

use crate::ball::{BallCategory, BallRegistry, CUE_BALL_ID, EIGHT_BALL_ID};
use crate::player::Seat;
use crate::table::Table;
use crate::vec2::Vec2;
use billiards_shared::config::GameMode;
use std::fmt;

/// Facts gathered while the balls of one shot are moving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnContext {
    pub potted_this_turn: bool,
    /// First ball the cue ball touched
    pub first_contact: Option<u8>,
    pub nine_ball_potted: bool,
    /// Ids pocketed during the shot, in pot order
    pub potted: Vec<u8>,
}

impl TurnContext {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Merge one tick's pocketed ids.
    pub fn record_potted(&mut self, ids: &[u8]) {
        if ids.is_empty() {
            return;
        }
        self.potted_this_turn = true;
        self.potted.extend_from_slice(ids);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Foul {
    /// Cue ball pocketed
    Scratch,
    /// Cue ball touched nothing
    NoContact,
    /// 9-ball: a lower-numbered ball was still on the table
    WrongBall { expected: u8 },
}

impl fmt::Display for Foul {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Foul::Scratch => write!(f, "Scratch"),
            Foul::NoContact => write!(f, "No contact"),
            Foul::WrongBall { expected } => write!(f, "Wrong ball (must hit {})", expected),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Group {
    #[default]
    Unassigned,
    Solids,
    Stripes,
}

impl Group {
    fn complement(self) -> Self {
        match self {
            Group::Solids => Group::Stripes,
            Group::Stripes => Group::Solids,
            Group::Unassigned => Group::Unassigned,
        }
    }

    fn of(category: BallCategory) -> Option<Self> {
        match category {
            BallCategory::Solid => Some(Group::Solids),
            BallCategory::Stripe => Some(Group::Stripes),
            _ => None,
        }
    }
}

/// 8-ball group per seat. Assigned at most once per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerGroups {
    pub player1: Group,
    pub player2: Group,
}

impl PlayerGroups {
    pub fn is_assigned(&self) -> bool {
        self.player1 != Group::Unassigned
    }

    pub fn get(&self, seat: Seat) -> Group {
        match seat {
            Seat::P1 => self.player1,
            Seat::P2 => self.player2,
        }
    }

    fn assign(&mut self, shooter: Seat, group: Group) {
        match shooter {
            Seat::P1 => {
                self.player1 = group;
                self.player2 = group.complement();
            }
            Seat::P2 => {
                self.player2 = group;
                self.player1 = group.complement();
            }
        }
    }
}

/// Variant and house-rule switches the resolver needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSet {
    pub mode: GameMode,
    /// Potting the eight only wins with the table cleared and a legal hit;
    /// otherwise it loses
    pub eight_ball_requires_clear: bool,
}

impl RuleSet {
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            eight_ball_requires_clear: false,
        }
    }
}

/// Outcome of one resolved shot.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotVerdict {
    pub foul: Option<Foul>,
    /// Groups were assigned by this shot
    pub groups_assigned: bool,
    pub round_winner: Option<Seat>,
    /// Where the nine went back on the table, if it was re-spotted
    pub respotted_nine: Option<Vec2>,
    pub next_shooter: Seat,
    pub ball_in_hand: bool,
}

impl ShotVerdict {
    /// Text shown to the players after a foul.
    pub fn foul_notice(&self) -> Option<String> {
        let foul = self.foul?;
        let mut text = foul.to_string();
        if self.respotted_nine.is_some() {
            text.push_str(" (nine re-spotted)");
        }
        Some(text)
    }
}

/// Judge a finished shot. Mutates the registry for the scratch
/// reactivation and the nine re-spot, and `groups` on first assignment.
pub fn resolve(
    rules: RuleSet,
    registry: &mut BallRegistry,
    table: &Table,
    capture_scale: f64,
    turn: &TurnContext,
    groups: &mut PlayerGroups,
    shooter: Seat,
) -> ShotVerdict {
    let cue_active = registry.cue().is_some_and(|b| b.active);

    let foul = if !cue_active {
        let spot = registry
            .free_spot(table, table.cue_spot(), CUE_BALL_ID, capture_scale)
            .unwrap_or_else(|| table.cue_spot());
        if let Some(cue) = registry.cue_mut() {
            cue.active = true;
            cue.pos = spot;
            cue.vel = Vec2::ZERO;
        }
        Some(Foul::Scratch)
    } else if let Some(first) = turn.first_contact {
        match rules.mode {
            GameMode::NineBall => lowest_object_ball(registry)
                .filter(|&lowest| lowest < first)
                .map(|expected| Foul::WrongBall { expected }),
            GameMode::EightBall => None,
        }
    } else {
        Some(Foul::NoContact)
    };

    let mut verdict = ShotVerdict {
        foul,
        groups_assigned: false,
        round_winner: None,
        respotted_nine: None,
        next_shooter: shooter,
        ball_in_hand: false,
    };

    match rules.mode {
        GameMode::EightBall => {
            if !groups.is_assigned() && foul.is_none() {
                let first_group = turn
                    .potted
                    .iter()
                    .filter(|&&id| id != EIGHT_BALL_ID && id != CUE_BALL_ID)
                    .find_map(|&id| registry.get(id).and_then(|b| Group::of(b.category)));
                if let Some(group) = first_group {
                    groups.assign(shooter, group);
                    verdict.groups_assigned = true;
                }
            }

            if turn.potted.contains(&EIGHT_BALL_ID) {
                let winner = if rules.eight_ball_requires_clear {
                    let cleared = registry
                        .active_object_balls()
                        .all(|b| b.id == EIGHT_BALL_ID);
                    if cleared && turn.first_contact.is_some() {
                        shooter
                    } else {
                        shooter.other()
                    }
                } else {
                    shooter
                };
                verdict.round_winner = Some(winner);
                return verdict;
            }
        }
        GameMode::NineBall => {
            if turn.nine_ball_potted {
                if foul.is_none() {
                    verdict.round_winner = Some(shooter);
                    return verdict;
                }
                verdict.respotted_nine = registry.respot_nine(table, capture_scale);
            }
        }
    }

    if foul.is_some() || !turn.potted_this_turn {
        verdict.next_shooter = shooter.other();
    }
    verdict.ball_in_hand = foul.is_some();
    verdict
}

/// Lowest id among active numbered balls.
fn lowest_object_ball(registry: &BallRegistry) -> Option<u8> {
    registry.active_object_balls().map(|b| b.id).min()
}
