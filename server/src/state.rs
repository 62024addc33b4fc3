use crate::audio::{EventBuffer, ThrottledSink};
use crate::config::ServerConfig;
use crate::match_state::{MatchController, MatchProgress, MatchResult};
use crate::player::{Identity, Seat};
use crate::protocol::{
    self, GroupWire, MatchOverMsg, PhaseWire, RoundOverMsg, StartMatchMsg, TableEventWire,
    TableStateMsg, WelcomeMsg,
};
use crate::round::{PlacementOutcome, Shot, ShotOutcome};
use crate::store::ScoreStore;
use crate::table::Table;
use crate::vec2::{vec2, Vec2};
use billiards_shared::config::{MatchConfig, PhysicsConfig};

/// What a batch of ticks produced, for broadcasting.
#[derive(Debug, Default)]
pub struct StepOutput {
    pub events: Vec<TableEventWire>,
    pub round_over: Option<RoundOverMsg>,
    pub match_over: Option<MatchOverMsg>,
}

/// Central game state owned by the game loop task.
pub struct GameState {
    config: ServerConfig,
    physics: PhysicsConfig,
    table: Table,
    current: Option<MatchController>,
    sink: ThrottledSink<EventBuffer>,
    /// Foul text and the simulated seconds it stays visible
    foul_notice: Option<(String, f64)>,
    /// Last aim direction sent by the renderer
    aim: Option<Vec2>,
    store: Box<dyn ScoreStore>,
    matches_started: u64,
}

impl GameState {
    pub fn new(config: ServerConfig, store: Box<dyn ScoreStore>) -> Self {
        let physics = PhysicsConfig::default();
        let table = Table::new(
            crate::table::TABLE_WIDTH,
            crate::table::TABLE_HEIGHT,
            crate::table::BALL_RADIUS,
            physics.wall_bounce,
        );
        Self {
            config,
            physics,
            table,
            current: None,
            sink: ThrottledSink::new(EventBuffer::default()),
            foul_notice: None,
            aim: None,
            store,
            matches_started: 0,
        }
    }

    pub fn welcome(&self) -> WelcomeMsg {
        protocol::welcome(&self.table, &self.physics)
    }

    pub fn current_match(&self) -> Option<&MatchController> {
        self.current.as_ref()
    }

    /// Begin a new match, replacing any match in progress.
    pub fn start_match(&mut self, msg: StartMatchMsg) -> Result<(), String> {
        let config = MatchConfig {
            frames_to_play: msg.frames_to_play,
            points_per_match: msg.points_per_match,
            eight_ball_requires_clear: msg.eight_ball_requires_clear,
        };
        let players = [
            Identity::from(msg.player1),
            msg.player2.map(Identity::from).unwrap_or_else(Identity::guest),
        ];
        // Each match gets its own stream so consecutive matches rack differently
        let seed = self.config.rng_seed.wrapping_add(self.matches_started);
        let controller = MatchController::new(msg.mode, config, self.physics, players, seed)?;

        tracing::info!(
            "Match started: {} vs {} ({} BO{})",
            controller.players()[0].name,
            controller.players()[1].name,
            msg.mode.tag(),
            config.frames_to_play
        );
        self.matches_started += 1;
        self.current = Some(controller);
        self.foul_notice = None;
        self.aim = None;
        self.sink.reset();
        self.sink.inner_mut().drain();
        Ok(())
    }

    pub fn shot(&mut self, dx: f64, dy: f64, power: f64) -> Result<(), String> {
        let controller = self.current.as_mut().ok_or("no match in progress")?;
        let shot = Shot {
            direction: vec2(dx, dy),
            power,
        };
        match controller.apply_shot(shot, &mut self.sink) {
            ShotOutcome::Struck { power } => {
                tracing::debug!(
                    "Seat {} shot with power {:.1}",
                    controller.round().shooter().number(),
                    power
                );
                self.aim = None;
                Ok(())
            }
            ShotOutcome::NotReady => Err("table is not ready for a shot".to_string()),
            ShotOutcome::TooWeak => Err("shot power too low".to_string()),
            ShotOutcome::NoDirection => Err("shot has no direction".to_string()),
        }
    }

    /// Aim preview; the guide rides along in the next snapshots.
    pub fn aim(&mut self, dx: f64, dy: f64) -> Result<(), String> {
        if self.current.is_none() {
            return Err("no match in progress".to_string());
        }
        self.aim = Some(vec2(dx, dy));
        Ok(())
    }

    /// Ball-in-hand drag. Never rejected; the snapshot carries the validity.
    pub fn move_cue_ball(&mut self, x: f64, y: f64) -> Result<(), String> {
        let controller = self.current.as_mut().ok_or("no match in progress")?;
        controller.preview_cue_ball(vec2(x, y));
        Ok(())
    }

    pub fn place_cue_ball(&mut self, x: f64, y: f64) -> Result<(), String> {
        let controller = self.current.as_mut().ok_or("no match in progress")?;
        match controller.place_cue_ball(vec2(x, y)) {
            PlacementOutcome::Placed(_) => Ok(()),
            PlacementOutcome::Invalid => Err("cue ball cannot be placed there".to_string()),
            PlacementOutcome::NotPlacing => Err("no ball in hand".to_string()),
        }
    }

    /// Advance the simulation by whole ticks.
    pub fn tick(&mut self, ticks: u32) -> StepOutput {
        let mut out = StepOutput::default();
        if ticks == 0 {
            return out;
        }

        if let Some((_, remaining)) = &mut self.foul_notice {
            *remaining -= ticks as f64 / self.config.tick_rate_hz as f64;
            if *remaining <= 0.0 {
                self.foul_notice = None;
            }
        }

        let Some(controller) = self.current.as_mut() else {
            return out;
        };
        let report = controller.tick(ticks, &mut self.sink);

        if let Some(verdict) = &report.verdict {
            tracing::debug!(
                foul = ?verdict.foul,
                next = verdict.next_shooter.number(),
                "Shot resolved"
            );
            if let Some(text) = verdict.foul_notice() {
                self.foul_notice = Some((text, self.config.foul_notice_secs));
            }
        }

        match report.progress {
            Some(MatchProgress::NextRound {
                winner,
                frame_score,
            }) => {
                tracing::info!(
                    "Frame won by seat {} ({}-{})",
                    winner.number(),
                    frame_score[0],
                    frame_score[1]
                );
                self.sink.reset();
                out.round_over = Some(RoundOverMsg {
                    winner: winner.number(),
                    frame_score,
                });
            }
            Some(MatchProgress::MatchOver(result)) => {
                out.round_over = Some(RoundOverMsg {
                    winner: result.winner.number(),
                    frame_score: result.frame_score,
                });
                out.match_over = Some(MatchOverMsg {
                    winner: result.winner.number(),
                    final_score: result.records[0].final_score.clone(),
                    points_delta: result.records[result.winner.index()].points_delta,
                    mode_tags: result.records[0].mode_tags.clone(),
                });
                self.persist(&result);
            }
            None => {}
        }

        out.events = self.drain_events();
        out
    }

    /// Table events queued since the last drain (shots included).
    pub fn drain_events(&mut self) -> Vec<TableEventWire> {
        self.sink
            .inner_mut()
            .drain()
            .into_iter()
            .map(protocol::event_wire)
            .collect()
    }

    fn persist(&mut self, result: &MatchResult) {
        let Some(controller) = self.current.as_ref() else {
            return;
        };
        tracing::info!(
            "Match won by {} ({})",
            controller.players()[result.winner.index()].name,
            result.records[0].final_score
        );
        for seat in [Seat::P1, Seat::P2] {
            let identity = &controller.players()[seat.index()];
            if identity.anonymous {
                continue;
            }
            if let Err(e) = self.store.record_result(identity, &result.records[seat.index()]) {
                tracing::warn!("Failed to record result for {}: {}", identity.name, e);
            }
        }
    }

    /// Snapshot for broadcasting; `None` before the first match.
    pub fn table_state(&self) -> Option<TableStateMsg> {
        let controller = self.current.as_ref()?;
        let round = controller.round();
        let groups = round.groups();
        let phase = if controller.is_over() {
            PhaseWire::MatchOver
        } else {
            protocol::phase_wire(round.phase())
        };
        let groups = match controller.mode() {
            billiards_shared::config::GameMode::EightBall => [
                protocol::group_wire(groups.player1),
                protocol::group_wire(groups.player2),
            ],
            billiards_shared::config::GameMode::NineBall => {
                [GroupWire::Unassigned, GroupWire::Unassigned]
            }
        };
        Some(TableStateMsg {
            mode: controller.mode(),
            balls: round.registry().balls.iter().map(protocol::ball_wire).collect(),
            phase,
            shooter: protocol::seat_wire(round.shooter()),
            groups,
            frame_score: controller.frame_score(),
            placement_valid: round.placement_valid(),
            foul: self.foul_notice.as_ref().map(|(text, _)| text.clone()),
            aim: self
                .aim
                .and_then(|dir| round.aim_guide(dir))
                .map(|guide| protocol::aim_wire(&guide)),
        })
    }
}
