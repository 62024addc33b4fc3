//! Self-play client for the billiards host.
//!
//! Connects to a running table, starts a match and plays both seats: aims
//! the cue ball at the lowest object ball with a little noise, and drops
//! the cue ball on a random spot whenever it has ball in hand.
//!
//! Usage: cargo run --bin selfplay -- [OPTIONS]
//!
//! Options:
//!   --url URL        Host URL (default: ws://127.0.0.1:9002/ws)
//!   --mode MODE      8BALL or 9BALL (default: 9BALL)
//!   --frames N       Frames to play: 1, 3, 5 or 7 (default: 3)
//!   --seed S         Seed for aiming noise (default: 1)
//!   --timeout S      Give up after this many seconds (default: 300)

use billiards_shared::config::GameMode;
use billiards_shared::protocol::{
    BallWire, CategoryWire, ClientMsg, IdentityWire, PhaseWire, ServerMsg, StartMatchMsg,
    TableStateMsg,
};
use futures_util::{SinkExt, StreamExt};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

struct Options {
    url: String,
    mode: GameMode,
    frames: u32,
    seed: u64,
    timeout_secs: u64,
}

impl Options {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut opts = Options {
            url: "ws://127.0.0.1:9002/ws".to_string(),
            mode: GameMode::NineBall,
            frames: 3,
            seed: 1,
            timeout_secs: 300,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--url" => {
                    i += 1;
                    opts.url = args.get(i).cloned().unwrap_or(opts.url);
                }
                "--mode" => {
                    i += 1;
                    opts.mode = match args.get(i).map(String::as_str) {
                        Some("8BALL") => GameMode::EightBall,
                        _ => GameMode::NineBall,
                    };
                }
                "--frames" => {
                    i += 1;
                    opts.frames = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(3);
                }
                "--seed" => {
                    i += 1;
                    opts.seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(1);
                }
                "--timeout" => {
                    i += 1;
                    opts.timeout_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(300);
                }
                _ => {}
            }
            i += 1;
        }
        opts
    }
}

#[derive(Default)]
struct Tally {
    shots: u32,
    placements: u32,
    rejections: u32,
    fouls: u32,
    pots: u32,
}

/// Pick the next input for the table, if it is our move.
fn next_move(state: &TableStateMsg, rng: &mut ChaCha8Rng) -> Option<ClientMsg> {
    match state.phase {
        PhaseWire::AwaitingShot => {
            let cue = state
                .balls
                .iter()
                .find(|b| b.category == CategoryWire::Cue && b.active)?;
            let target = lowest_object_ball(&state.balls)?;
            let noise = rng.gen_range(-0.05..0.05);
            let dx = target.pos[0] - cue.pos[0];
            let dy = target.pos[1] - cue.pos[1];
            let (sin, cos) = f64::sin_cos(noise);
            Some(ClientMsg::Shot {
                dx: dx * cos - dy * sin,
                dy: dx * sin + dy * cos,
                power: rng.gen_range(12.0..40.0),
            })
        }
        PhaseWire::AwaitingPlacement => Some(ClientMsg::PlaceCueBall {
            x: rng.gen_range(40.0..360.0),
            y: rng.gen_range(40.0..360.0),
        }),
        _ => None,
    }
}

fn lowest_object_ball(balls: &[BallWire]) -> Option<&BallWire> {
    balls
        .iter()
        .filter(|b| b.active && b.category != CategoryWire::Cue)
        .min_by_key(|b| b.id)
}

async fn send(
    ws: &mut (impl futures_util::Sink<Message> + Unpin),
    msg: &ClientMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    ws.send(Message::Text(json.into()))
        .await
        .map_err(|_| "send failed".to_string())
}

#[tokio::main]
async fn main() {
    let opts = Options::from_args();

    println!("=== Billiards Self-Play ===");
    println!("URL: {}", opts.url);
    println!("Mode: {}  Frames: {}", opts.mode.tag(), opts.frames);
    println!();

    let (mut ws, _) = match connect_async(&opts.url).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Failed to connect: {}", e);
            std::process::exit(1);
        }
    };

    let start = ClientMsg::StartMatch(StartMatchMsg {
        mode: opts.mode,
        frames_to_play: opts.frames,
        points_per_match: 0,
        player1: IdentityWire {
            name: "selfplay-1".to_string(),
            avatar: None,
        },
        player2: None,
        eight_ball_requires_clear: false,
    });
    if let Err(e) = send(&mut ws, &start).await {
        eprintln!("Failed to start match: {}", e);
        std::process::exit(1);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let mut tally = Tally::default();
    let deadline = Instant::now() + Duration::from_secs(opts.timeout_secs);
    // Last phase we acted on, so one snapshot stream yields one input
    let mut acted_on: Option<(PhaseWire, u8, usize)> = None;
    let mut last_phase: Option<PhaseWire> = None;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let msg = match tokio::time::timeout(remaining, ws.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => text,
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {
                eprintln!("Connection closed");
                break;
            }
            Ok(Some(Err(e))) => {
                eprintln!("Connection error: {}", e);
                break;
            }
            Ok(Some(Ok(_))) => continue,
            Err(_) => {
                eprintln!("Timed out after {}s", opts.timeout_secs);
                break;
            }
        };

        let Ok(server_msg) = serde_json::from_str::<ServerMsg>(&msg) else {
            continue;
        };
        match server_msg {
            ServerMsg::Welcome(w) => {
                println!("Connected (protocol v{}, host {})", w.protocol_version, w.server_version);
            }
            ServerMsg::TableState(state) => {
                if state.phase == PhaseWire::AwaitingPlacement
                    && last_phase != Some(PhaseWire::AwaitingPlacement)
                {
                    tally.fouls += 1;
                }
                last_phase = Some(state.phase);

                let active = state.balls.iter().filter(|b| b.active).count();
                let key = (state.phase, state.shooter, active);
                if acted_on == Some(key) {
                    continue;
                }
                if let Some(input) = next_move(&state, &mut rng) {
                    match input {
                        ClientMsg::Shot { .. } => tally.shots += 1,
                        ClientMsg::PlaceCueBall { .. } => tally.placements += 1,
                        _ => {}
                    }
                    if send(&mut ws, &input).await.is_err() {
                        break;
                    }
                    acted_on = Some(key);
                }
            }
            ServerMsg::TableEvent(e) => {
                if matches!(e.event, billiards_shared::protocol::TableEventWire::Pocketed { .. }) {
                    tally.pots += 1;
                }
            }
            ServerMsg::RoundOver(r) => {
                println!(
                    "Frame to seat {} ({}-{})",
                    r.winner, r.frame_score[0], r.frame_score[1]
                );
                acted_on = None;
            }
            ServerMsg::MatchOver(m) => {
                println!("Match to seat {} ({}) {:?}", m.winner, m.final_score, m.mode_tags);
                break;
            }
            ServerMsg::Rejected(r) => {
                tally.rejections += 1;
                // Retry on the next snapshot
                acted_on = None;
                if tally.rejections % 20 == 1 {
                    eprintln!("Rejected: {}", r.reason);
                }
            }
        }
    }

    let _ = ws.close(None).await;

    println!();
    println!("=== Results ===");
    println!("Shots: {}", tally.shots);
    println!("Placements: {}", tally.placements);
    println!("Balls pocketed: {}", tally.pots);
    println!("Fouls seen: {}", tally.fouls);
    println!("Rejected inputs: {}", tally.rejections);
}
