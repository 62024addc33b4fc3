use crate::config::ServerConfig;
use crate::protocol::{
    ClientMsg, MatchOverMsg, RoundOverMsg, TableEventWire, TableStateMsg, WelcomeMsg,
};
use crate::state::{GameState, StepOutput};
use crate::store::ScoreStore;
use crate::timestep::FixedTimestep;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Commands from client connections to the game loop
pub enum GameCommand {
    ClientJoin {
        response: oneshot::Sender<(WelcomeMsg, Option<TableStateMsg>)>,
    },
    ClientLeave,
    Input {
        msg: ClientMsg,
        /// `Err` carries the rejection reason
        response: oneshot::Sender<Result<(), String>>,
    },
}

/// Broadcasts from game loop to all clients
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    TableState(TableStateMsg),
    TableEvent(TableEventWire),
    RoundOver(RoundOverMsg),
    MatchOver(MatchOverMsg),
}

/// Run the main game loop. Owns all game state.
pub async fn run_game_loop(
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    server_config: ServerConfig,
    store: Box<dyn ScoreStore>,
) {
    let tick_rate_hz = server_config.tick_rate_hz;
    let broadcast_every_n = (tick_rate_hz / server_config.broadcast_rate_hz).max(1) as u64;
    let mut state = GameState::new(server_config, store);

    let tick_duration = Duration::from_secs_f64(1.0 / tick_rate_hz as f64);
    let mut timestep = FixedTimestep::new(tick_duration.as_secs_f64());
    let mut last_frame = Instant::now();
    let mut frame_count: u64 = 0;
    let mut clients: usize = 0;

    let mut tick_interval = tokio::time::interval(tick_duration);
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let now = Instant::now();
                let ticks = timestep.accumulate((now - last_frame).as_secs_f64());
                last_frame = now;

                let out = state.tick(ticks);
                let decided = out.round_over.is_some();
                send_step(&broadcast_tx, out);

                // Snapshots at lower rate, and right away when a frame ends
                frame_count += 1;
                if decided || frame_count % broadcast_every_n == 0 {
                    if let Some(msg) = state.table_state() {
                        let _ = broadcast_tx.send(GameBroadcast::TableState(msg));
                    }
                }
            }

            Some(cmd) = cmd_rx.recv() => {
                match cmd {
                    GameCommand::ClientJoin { response } => {
                        clients += 1;
                        let _ = response.send((state.welcome(), state.table_state()));
                        tracing::info!("Client joined ({} connected)", clients);
                    }
                    GameCommand::ClientLeave => {
                        clients = clients.saturating_sub(1);
                        tracing::info!("Client left ({} connected)", clients);
                    }
                    GameCommand::Input { msg, response } => {
                        let result = match msg {
                            ClientMsg::StartMatch(start) => state.start_match(start),
                            ClientMsg::Aim { dx, dy } => state.aim(dx, dy),
                            ClientMsg::Shot { dx, dy, power } => state.shot(dx, dy, power),
                            ClientMsg::MoveCueBall { x, y } => state.move_cue_ball(x, y),
                            ClientMsg::PlaceCueBall { x, y } => state.place_cue_ball(x, y),
                        };
                        if let Err(reason) = &result {
                            tracing::debug!("Input rejected: {}", reason);
                        }
                        let _ = response.send(result);

                        for event in state.drain_events() {
                            let _ = broadcast_tx.send(GameBroadcast::TableEvent(event));
                        }
                        if let Some(msg) = state.table_state() {
                            let _ = broadcast_tx.send(GameBroadcast::TableState(msg));
                        }
                    }
                }
            }

            else => break,
        }
    }

    tracing::info!("Game loop ended");
}

fn send_step(broadcast_tx: &broadcast::Sender<GameBroadcast>, out: StepOutput) {
    for event in out.events {
        let _ = broadcast_tx.send(GameBroadcast::TableEvent(event));
    }
    if let Some(msg) = out.round_over {
        let _ = broadcast_tx.send(GameBroadcast::RoundOver(msg));
    }
    if let Some(msg) = out.match_over {
        let _ = broadcast_tx.send(GameBroadcast::MatchOver(msg));
    }
}
