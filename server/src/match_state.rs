//! Best-of-N match lifecycle on top of [`Round`].

use crate::audio::AudioSink;
use crate::player::{Identity, Seat};
use crate::round::{PlacementOutcome, Round, Shot, ShotOutcome};
use crate::rules::{RuleSet, ShotVerdict};
use crate::table::{Table, BALL_RADIUS, TABLE_HEIGHT, TABLE_WIDTH};
use crate::vec2::Vec2;
use billiards_shared::config::{GameMode, MatchConfig, PhysicsConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Result of a finished match from one player's point of view, handed to
/// the score store.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub points_delta: i64,
    pub is_win: bool,
    pub opponent_name: String,
    pub opponent_avatar: Option<String>,
    /// "<own>-<opponent>" frame count
    pub final_score: String,
    pub mode_tags: Vec<String>,
}

impl ResultRecord {
    /// The variant tag ("8BALL"/"9BALL"), the last of `mode_tags`
    pub fn mode_tag(&self) -> &str {
        self.mode_tags.last().map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub winner: Seat,
    pub frame_score: [u32; 2],
    /// Indexed by [`Seat::index`]
    pub records: [ResultRecord; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchProgress {
    /// Frame awarded and a fresh rack is on the table
    NextRound { winner: Seat, frame_score: [u32; 2] },
    MatchOver(MatchResult),
}

/// What one controller tick produced.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub verdict: Option<ShotVerdict>,
    pub progress: Option<MatchProgress>,
}

pub struct MatchController {
    config: MatchConfig,
    mode: GameMode,
    physics: PhysicsConfig,
    players: [Identity; 2],
    frame_score: [u32; 2],
    round: Round,
    rounds_played: u32,
    last_round_winner: Option<Seat>,
    result: Option<MatchResult>,
    rng: ChaCha8Rng,
}

impl MatchController {
    /// Validate the configuration and rack the first frame.
    pub fn new(
        mode: GameMode,
        config: MatchConfig,
        physics: PhysicsConfig,
        players: [Identity; 2],
        seed: u64,
    ) -> Result<Self, String> {
        config.validate()?;
        physics.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let round = Self::rack(mode, &config, &physics, &mut rng);
        Ok(Self {
            config,
            mode,
            physics,
            players,
            frame_score: [0, 0],
            round,
            rounds_played: 0,
            last_round_winner: None,
            result: None,
            rng,
        })
    }

    fn rack(
        mode: GameMode,
        config: &MatchConfig,
        physics: &PhysicsConfig,
        rng: &mut ChaCha8Rng,
    ) -> Round {
        let rules = RuleSet {
            mode,
            eight_ball_requires_clear: config.eight_ball_requires_clear,
        };
        let table = Table::new(TABLE_WIDTH, TABLE_HEIGHT, BALL_RADIUS, physics.wall_bounce);
        Round::new(rules, table, *physics, rng)
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    pub fn players(&self) -> &[Identity; 2] {
        &self.players
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn frame_score(&self) -> [u32; 2] {
        self.frame_score
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub fn last_round_winner(&self) -> Option<Seat> {
        self.last_round_winner
    }

    pub fn match_winner(&self) -> Option<Seat> {
        self.result.as_ref().map(|r| r.winner)
    }

    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// `["BO<n>", "<mode>"]`
    pub fn mode_tags(&self) -> Vec<String> {
        vec![
            format!("BO{}", self.config.frames_to_play),
            self.mode.tag().to_string(),
        ]
    }

    pub fn apply_shot(&mut self, shot: Shot, sink: &mut dyn AudioSink) -> ShotOutcome {
        if self.is_over() {
            return ShotOutcome::NotReady;
        }
        self.round.apply_shot(shot, sink)
    }

    pub fn preview_cue_ball(&mut self, pos: Vec2) -> bool {
        if self.is_over() {
            return false;
        }
        self.round.preview_cue_ball(pos)
    }

    pub fn place_cue_ball(&mut self, pos: Vec2) -> PlacementOutcome {
        if self.is_over() {
            return PlacementOutcome::NotPlacing;
        }
        self.round.place_cue_ball(pos)
    }

    /// Advance the current round; a frame-deciding verdict rolls straight
    /// into [`Self::on_round_end`].
    pub fn tick(&mut self, ticks: u32, sink: &mut dyn AudioSink) -> TickReport {
        if self.is_over() {
            return TickReport::default();
        }
        let verdict = self.round.tick(ticks, sink);
        let progress = verdict
            .as_ref()
            .and_then(|v| v.round_winner)
            .map(|winner| self.on_round_end(winner));
        TickReport { verdict, progress }
    }

    /// Award a frame. Either racks the next one (player 1 breaks) or closes
    /// the match and builds both result records. Once the match is over
    /// the stored result is returned unchanged.
    pub fn on_round_end(&mut self, winner: Seat) -> MatchProgress {
        if let Some(result) = &self.result {
            return MatchProgress::MatchOver(result.clone());
        }

        self.frame_score[winner.index()] += 1;
        self.rounds_played += 1;
        self.last_round_winner = Some(winner);

        if self.frame_score[winner.index()] >= self.config.frames_to_win() {
            let result = MatchResult {
                winner,
                frame_score: self.frame_score,
                records: [self.record_for(Seat::P1, winner), self.record_for(Seat::P2, winner)],
            };
            self.result = Some(result.clone());
            MatchProgress::MatchOver(result)
        } else {
            self.round = Self::rack(self.mode, &self.config, &self.physics, &mut self.rng);
            MatchProgress::NextRound {
                winner,
                frame_score: self.frame_score,
            }
        }
    }

    fn record_for(&self, seat: Seat, winner: Seat) -> ResultRecord {
        let points = i64::from(self.config.points_per_match);
        let opponent = &self.players[seat.other().index()];
        ResultRecord {
            points_delta: if seat == winner { points } else { -points },
            is_win: seat == winner,
            opponent_name: opponent.name.clone(),
            opponent_avatar: opponent.avatar.clone(),
            final_score: format!(
                "{}-{}",
                self.frame_score[seat.index()],
                self.frame_score[seat.other().index()]
            ),
            mode_tags: self.mode_tags(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullSink;
    use crate::round::Phase;
    use crate::vec2::vec2;

    fn players() -> [Identity; 2] {
        [Identity::new("alice", Some("a.png".into())), Identity::guest()]
    }

    fn controller(frames: u32) -> MatchController {
        MatchController::new(
            GameMode::EightBall,
            MatchConfig {
                frames_to_play: frames,
                points_per_match: 100,
                eight_ball_requires_clear: false,
            },
            PhysicsConfig::default(),
            players(),
            7,
        )
        .unwrap()
    }

    #[test]
    fn even_frame_count_is_rejected() {
        let result = MatchController::new(
            GameMode::NineBall,
            MatchConfig {
                frames_to_play: 4,
                ..Default::default()
            },
            PhysicsConfig::default(),
            players(),
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn invalid_physics_is_rejected() {
        let result = MatchController::new(
            GameMode::NineBall,
            MatchConfig::default(),
            PhysicsConfig {
                sub_steps: 0,
                ..Default::default()
            },
            players(),
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn best_of_three_two_nil() {
        let mut m = controller(3);
        assert!(matches!(
            m.on_round_end(Seat::P1),
            MatchProgress::NextRound { winner: Seat::P1, frame_score: [1, 0] }
        ));
        let MatchProgress::MatchOver(result) = m.on_round_end(Seat::P1) else {
            panic!("match should be over");
        };
        assert_eq!(result.winner, Seat::P1);
        let p1 = &result.records[0];
        assert_eq!(p1.points_delta, 100);
        assert!(p1.is_win);
        assert_eq!(p1.final_score, "2-0");
        assert_eq!(p1.opponent_name, "Player 2");
        assert_eq!(p1.mode_tags, vec!["BO3".to_string(), "8BALL".to_string()]);
        let p2 = &result.records[1];
        assert_eq!(p2.points_delta, -100);
        assert!(!p2.is_win);
        assert_eq!(p2.final_score, "0-2");
        assert_eq!(p2.opponent_name, "alice");
        assert_eq!(p2.opponent_avatar.as_deref(), Some("a.png"));
    }

    #[test]
    fn best_of_three_two_one() {
        let mut m = controller(3);
        m.on_round_end(Seat::P1);
        m.on_round_end(Seat::P2);
        let MatchProgress::MatchOver(result) = m.on_round_end(Seat::P1) else {
            panic!("match should be over");
        };
        assert_eq!(result.frame_score, [2, 1]);
        assert_eq!(result.records[0].final_score, "2-1");
        assert_eq!(m.match_winner(), Some(Seat::P1));
        assert_eq!(m.rounds_played(), 3);
    }

    #[test]
    fn single_frame_match_ends_on_first_round() {
        let mut m = controller(1);
        assert!(matches!(m.on_round_end(Seat::P2), MatchProgress::MatchOver(_)));
        assert_eq!(m.match_winner(), Some(Seat::P2));
    }

    #[test]
    fn new_round_is_freshly_racked_with_player_one_breaking() {
        let mut m = controller(5);
        m.apply_shot(
            Shot {
                direction: vec2(1.0, 0.0),
                power: 30.0,
            },
            &mut NullSink,
        );
        m.on_round_end(Seat::P2);
        assert_eq!(m.round().phase(), Phase::AwaitingShot);
        assert_eq!(m.round().shooter(), Seat::P1);
        assert!(m.round().registry().active().count() == 16);
        assert!(!m.round().registry().any_moving());
    }

    #[test]
    fn input_after_match_over_is_ignored() {
        let mut m = controller(1);
        m.on_round_end(Seat::P1);
        let outcome = m.apply_shot(
            Shot {
                direction: vec2(1.0, 0.0),
                power: 30.0,
            },
            &mut NullSink,
        );
        assert_eq!(outcome, ShotOutcome::NotReady);
        assert_eq!(m.place_cue_ball(vec2(100.0, 100.0)), PlacementOutcome::NotPlacing);
        // Further round ends do not move the score
        m.on_round_end(Seat::P2);
        assert_eq!(m.frame_score(), [1, 0]);
    }

    #[test]
    fn seeded_matches_rack_identically() {
        let a = controller(3);
        let b = controller(3);
        assert_eq!(a.round().registry().balls, b.round().registry().balls);
    }

    #[test]
    fn tick_drives_break_to_verdict() {
        let mut m = controller(3);
        m.apply_shot(
            Shot {
                direction: vec2(1.0, 0.0),
                power: 45.0,
            },
            &mut NullSink,
        );
        let mut verdict = None;
        for _ in 0..5000 {
            let report = m.tick(1, &mut NullSink);
            if report.verdict.is_some() {
                verdict = report.verdict;
                break;
            }
        }
        let verdict = verdict.expect("break shot never settled");
        assert_ne!(m.round().phase(), Phase::BallsMoving);
        match verdict.round_winner {
            // Eight on the break: the frame was awarded and re-racked
            Some(_) => assert_eq!(m.rounds_played(), 1),
            None => assert_eq!(m.round().turn().first_contact, Some(1)),
        }
    }
}
