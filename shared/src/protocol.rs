use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::{GameMode, PhysicsConfig};

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// === Host -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMsg),
    #[serde(rename = "table_state")]
    TableState(TableStateMsg),
    #[serde(rename = "table_event")]
    TableEvent(TableEventMsg),
    #[serde(rename = "round_over")]
    RoundOver(RoundOverMsg),
    #[serde(rename = "match_over")]
    MatchOver(MatchOverMsg),
    #[serde(rename = "rejected")]
    Rejected(RejectedMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub protocol_version: u32,
    pub server_version: String,
    pub table: TableWire,
    pub physics: PhysicsConfig,
    pub frame_options: Vec<u32>,
}

/// Static table geometry, sent once so the renderer can draw it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct TableWire {
    pub width: f64,
    pub height: f64,
    pub ball_radius: f64,
    pub pockets: Vec<PocketWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
pub struct PocketWire {
    pub pos: [f64; 2],
    pub radius: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct TableStateMsg {
    pub mode: GameMode,
    pub balls: Vec<BallWire>,
    pub phase: PhaseWire,
    /// Seat to act next: 1 or 2
    pub shooter: u8,
    pub groups: [GroupWire; 2],
    pub frame_score: [u32; 2],
    /// Whether the cue ball's current ball-in-hand position may be committed
    pub placement_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foul: Option<String>,
    /// Guide for the last aim sent while awaiting a shot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aim: Option<AimGuideWire>,
}

/// First thing the cue ball would reach along the current aim.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct AimGuideWire {
    /// Cue ball center at impact
    pub impact: [f64; 2],
    /// Object ball struck; absent when a cushion comes first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ball: Option<u8>,
    /// Unit direction after impact
    pub deflection: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
pub struct BallWire {
    pub id: u8,
    pub pos: [f64; 2],
    pub category: CategoryWire,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "snake_case")]
pub enum CategoryWire {
    Cue,
    Solid,
    Stripe,
    Eight,
    Nine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "snake_case")]
pub enum PhaseWire {
    AwaitingShot,
    BallsMoving,
    Resolving,
    AwaitingPlacement,
    RoundOver,
    MatchOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "snake_case")]
pub enum GroupWire {
    Unassigned,
    Solids,
    Stripes,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
pub struct TableEventMsg {
    pub event: TableEventWire,
}

/// Physical events for the renderer's audio feedback.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableEventWire {
    ShotStruck { power: f64 },
    CushionImpact { ball: u8, speed: f64 },
    BallImpact { a: u8, b: u8, force: f64 },
    Pocketed { ball: u8, pocket: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct RoundOverMsg {
    pub winner: u8,
    pub frame_score: [u32; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MatchOverMsg {
    pub winner: u8,
    /// Player 1's perspective, e.g. "2-1"
    pub final_score: String,
    /// Points moved to the winner (and taken from the loser)
    pub points_delta: i64,
    pub mode_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
pub struct RejectedMsg {
    pub reason: String,
}

// === Client -> Host ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "start_match")]
    StartMatch(StartMatchMsg),
    #[serde(rename = "aim")]
    Aim { dx: f64, dy: f64 },
    #[serde(rename = "shot")]
    Shot { dx: f64, dy: f64, power: f64 },
    #[serde(rename = "move_cue_ball")]
    MoveCueBall { x: f64, y: f64 },
    #[serde(rename = "place_cue_ball")]
    PlaceCueBall { x: f64, y: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct StartMatchMsg {
    pub mode: GameMode,
    pub frames_to_play: u32,
    pub points_per_match: u32,
    pub player1: IdentityWire,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2: Option<IdentityWire>,
    /// Potting the eight only wins on a cleared table
    #[serde(default)]
    pub eight_ball_requires_clear: bool,
}

/// Authenticated player identity, as handed over by the login collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
pub struct IdentityWire {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_msg_welcome_roundtrip() {
        let msg = ServerMsg::Welcome(WelcomeMsg {
            protocol_version: PROTOCOL_VERSION,
            server_version: "0.1.0".to_string(),
            table: TableWire {
                width: 800.0,
                height: 400.0,
                ball_radius: 12.0,
                pockets: vec![PocketWire {
                    pos: [0.0, 0.0],
                    radius: 28.0,
                }],
            },
            physics: PhysicsConfig::default(),
            frame_options: vec![1, 3, 5, 7],
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"welcome\""));
        assert!(json.contains("\"protocolVersion\":1"));
        assert!(json.contains("\"ballRadius\":12.0"));
        let parsed: ServerMsg = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerMsg::Welcome(w) => {
                assert_eq!(w.protocol_version, PROTOCOL_VERSION);
                assert_eq!(w.table.pockets.len(), 1);
                assert_eq!(w.physics.sub_steps, 8);
            }
            _ => panic!("Expected Welcome"),
        }
    }

    #[test]
    fn table_state_omits_missing_foul() {
        let msg = ServerMsg::TableState(TableStateMsg {
            mode: GameMode::NineBall,
            balls: vec![BallWire {
                id: 0,
                pos: [200.0, 200.0],
                category: CategoryWire::Cue,
                active: true,
            }],
            phase: PhaseWire::AwaitingShot,
            shooter: 1,
            groups: [GroupWire::Unassigned, GroupWire::Unassigned],
            frame_score: [0, 0],
            placement_valid: true,
            foul: None,
            aim: None,
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"table_state\""));
        assert!(json.contains("\"phase\":\"awaiting_shot\""));
        assert!(json.contains("\"mode\":\"9BALL\""));
        assert!(!json.contains("foul"));
        assert!(!json.contains("aim"));
    }

    #[test]
    fn table_event_carries_kind() {
        let msg = ServerMsg::TableEvent(TableEventMsg {
            event: TableEventWire::BallImpact {
                a: 0,
                b: 3,
                force: 4.5,
            },
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"table_event\""));
        assert!(json.contains("\"kind\":\"ball_impact\""));
        let parsed: ServerMsg = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerMsg::TableEvent(TableEventMsg {
                event: TableEventWire::BallImpact { a, b, .. },
            }) => {
                assert_eq!((a, b), (0, 3));
            }
            _ => panic!("Expected BallImpact"),
        }
    }

    #[test]
    fn client_msg_shot_roundtrip() {
        let msg = ClientMsg::Shot {
            dx: 1.0,
            dy: -0.5,
            power: 30.0,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"shot\""));
        let parsed: ClientMsg = serde_json::from_str(&json).unwrap();
        match parsed {
            ClientMsg::Shot { dx, dy, power } => {
                assert!((dx - 1.0).abs() < 1e-9);
                assert!((dy + 0.5).abs() < 1e-9);
                assert!((power - 30.0).abs() < 1e-9);
            }
            _ => panic!("Expected Shot"),
        }
    }

    #[test]
    fn client_msg_start_match_without_player2() {
        let json = r#"{"type":"start_match","mode":"8BALL","framesToPlay":3,"pointsPerMatch":100,"player1":{"name":"alice"}}"#;
        let parsed: ClientMsg = serde_json::from_str(json).unwrap();
        match parsed {
            ClientMsg::StartMatch(start) => {
                assert_eq!(start.mode, GameMode::EightBall);
                assert_eq!(start.frames_to_play, 3);
                assert_eq!(start.player1.name, "alice");
                assert!(start.player1.avatar.is_none());
                assert!(start.player2.is_none());
                assert!(!start.eight_ball_requires_clear);
            }
            _ => panic!("Expected StartMatch"),
        }
    }

    #[test]
    fn client_msg_start_match_with_clear_rule() {
        let json = r#"{"type":"start_match","mode":"8BALL","framesToPlay":1,"pointsPerMatch":0,"player1":{"name":"alice"},"eightBallRequiresClear":true}"#;
        match serde_json::from_str::<ClientMsg>(json).unwrap() {
            ClientMsg::StartMatch(start) => assert!(start.eight_ball_requires_clear),
            _ => panic!("Expected StartMatch"),
        }
    }

    #[test]
    fn client_msg_aim_parses() {
        let json = r#"{"type":"aim","dx":0.0,"dy":-1.0}"#;
        match serde_json::from_str::<ClientMsg>(json).unwrap() {
            ClientMsg::Aim { dx, dy } => assert_eq!((dx, dy), (0.0, -1.0)),
            _ => panic!("Expected Aim"),
        }
    }

    #[test]
    fn client_msg_place_cue_ball_roundtrip() {
        let msg = ClientMsg::PlaceCueBall { x: 150.0, y: 90.5 };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"place_cue_ball\""));
        let parsed: ClientMsg = serde_json::from_str(&json).unwrap();
        match parsed {
            ClientMsg::PlaceCueBall { x, y } => {
                assert_eq!(x, 150.0);
                assert_eq!(y, 90.5);
            }
            _ => panic!("Expected PlaceCueBall"),
        }
    }

    #[test]
    fn match_over_roundtrip() {
        let msg = ServerMsg::MatchOver(MatchOverMsg {
            winner: 1,
            final_score: "2-1".to_string(),
            points_delta: 100,
            mode_tags: vec!["BO3".to_string(), "8BALL".to_string()],
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"finalScore\":\"2-1\""));
        let parsed: ServerMsg = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerMsg::MatchOver(m) => assert_eq!(m.mode_tags.len(), 2),
            _ => panic!("Expected MatchOver"),
        }
    }
}
