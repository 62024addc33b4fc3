//! Headless match play: rule scenarios end to end, without the host.

use billiards_server::audio::{EventBuffer, NullSink, TableEvent};
use billiards_server::ball::{Ball, BallCategory, BallRegistry, CUE_BALL_ID, NINE_BALL_ID};
use billiards_server::match_state::{MatchController, MatchProgress};
use billiards_server::physics;
use billiards_server::player::{Identity, Seat};
use billiards_server::round::{Phase, Round, Shot, ShotOutcome};
use billiards_server::rules::{Foul, Group, RuleSet, ShotVerdict, TurnContext};
use billiards_server::store::{JsonFileStore, ScoreStore};
use billiards_server::table::Table;
use billiards_server::vec2::{distance_sq, sub, vec2};
use billiards_shared::config::{GameMode, MatchConfig, PhysicsConfig};

fn round_with(mode: GameMode, balls: &[(u8, f64, f64)]) -> Round {
    let balls = balls
        .iter()
        .map(|&(id, x, y)| Ball::new(id, vec2(x, y), BallCategory::for_ball(mode, id)))
        .collect();
    Round::with_registry(
        RuleSet::new(mode),
        Table::default(),
        PhysicsConfig::default(),
        BallRegistry::new(balls),
    )
}

fn shoot_and_settle(round: &mut Round, dx: f64, dy: f64, power: f64) -> ShotVerdict {
    let outcome = round.apply_shot(
        Shot {
            direction: vec2(dx, dy),
            power,
        },
        &mut NullSink,
    );
    assert!(matches!(outcome, ShotOutcome::Struck { .. }), "{:?}", outcome);
    for _ in 0..10_000 {
        if let Some(verdict) = round.tick(1, &mut NullSink) {
            return verdict;
        }
    }
    panic!("balls never came to rest");
}

#[test]
fn eight_ball_first_pot_assigns_solids_and_keeps_turn() {
    // Ball 3 a diameter and a half from the top-right pocket, cue behind it
    let mut round = round_with(
        GameMode::EightBall,
        &[(0, 700.0, 100.0), (3, 740.0, 60.0), (8, 300.0, 300.0), (11, 200.0, 100.0)],
    );
    let verdict = shoot_and_settle(&mut round, 1.0, -1.0, 12.0);

    assert_eq!(verdict.foul, None);
    assert!(verdict.groups_assigned);
    assert_eq!(round.groups().player1, Group::Solids);
    assert_eq!(round.groups().player2, Group::Stripes);
    assert_eq!(round.shooter(), Seat::P1);
    assert_eq!(round.phase(), Phase::AwaitingShot);
}

#[test]
fn nine_ball_wrong_ball_with_nine_potted_respots() {
    // Cue lined up on the nine, which sits off the top-right pocket; ball 1
    // is still on the table
    let mut round = round_with(
        GameMode::NineBall,
        &[(0, 700.0, 100.0), (NINE_BALL_ID, 740.0, 60.0), (1, 200.0, 300.0), (2, 300.0, 300.0)],
    );
    let verdict = shoot_and_settle(&mut round, 1.0, -1.0, 12.0);

    assert_eq!(verdict.foul, Some(Foul::WrongBall { expected: 1 }));
    assert_eq!(verdict.round_winner, None);
    let table = Table::default();
    assert_eq!(verdict.respotted_nine, Some(table.foot_spot()));
    let nine = round.registry().get(NINE_BALL_ID).unwrap();
    assert!(nine.active);
    assert_eq!(round.shooter(), Seat::P2);
    assert_eq!(round.phase(), Phase::AwaitingPlacement);
}

#[test]
fn scratch_gives_opponent_ball_in_hand() {
    let mut round = round_with(
        GameMode::NineBall,
        &[(0, 100.0, 100.0), (1, 500.0, 200.0), (NINE_BALL_ID, 600.0, 200.0)],
    );
    let verdict = shoot_and_settle(&mut round, -1.0, -1.0, 20.0);

    assert_eq!(verdict.foul, Some(Foul::Scratch));
    assert!(verdict.ball_in_hand);
    assert_eq!(round.shooter(), Seat::P2);
    assert_eq!(round.phase(), Phase::AwaitingPlacement);
    assert!(round.registry().cue().unwrap().active);
}

#[test]
fn best_of_three_pays_out_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");
    let mut store = JsonFileStore::open(&path).unwrap();

    let players = [Identity::new("alice", None), Identity::new("bob", None)];
    let mut controller = MatchController::new(
        GameMode::EightBall,
        MatchConfig {
            frames_to_play: 3,
            points_per_match: 100,
            eight_ball_requires_clear: false,
        },
        PhysicsConfig::default(),
        players.clone(),
        99,
    )
    .unwrap();

    controller.on_round_end(Seat::P1);
    controller.on_round_end(Seat::P2);
    let MatchProgress::MatchOver(result) = controller.on_round_end(Seat::P1) else {
        panic!("match should be decided at 2 frames");
    };
    assert_eq!(result.records[0].final_score, "2-1");
    assert_eq!(result.records[1].final_score, "1-2");

    for seat in [Seat::P1, Seat::P2] {
        store
            .record_result(&players[seat.index()], &result.records[seat.index()])
            .unwrap();
    }

    let reopened = JsonFileStore::open(&path).unwrap();
    let alice = reopened.user("alice").unwrap();
    assert_eq!(alice.score, 100);
    assert_eq!(alice.stats["8BALL"].wins, 1);
    assert_eq!(alice.history[0].details.mode_tags, vec!["BO3", "8BALL"]);
    // Floored at zero
    assert_eq!(reopened.user("bob").unwrap().score, 0);
}

#[test]
fn head_on_collision_exchanges_speed() {
    let table = Table::default();
    let mut registry = BallRegistry::new(vec![
        Ball::new(1, vec2(300.0, 200.0), BallCategory::Solid),
        Ball::new(2, vec2(330.0, 200.0), BallCategory::Solid),
    ]);
    registry.balls[0].vel = vec2(10.0, 0.0);
    let mut sink = EventBuffer::default();
    let mut turn = TurnContext::default();

    // Advance one sub-step at a time until the first impact is reported
    let config = PhysicsConfig {
        deceleration: 1e-9,
        ..Default::default()
    };
    for _ in 0..10 {
        physics::advance(&mut registry, &table, &config, &mut turn, &mut sink, 1);
        if sink
            .events
            .iter()
            .any(|e| matches!(e, TableEvent::BallImpact { .. }))
        {
            break;
        }
    }

    let a = registry.balls[0].vel.x;
    let b = registry.balls[1].vel.x;
    assert!((a - 0.4).abs() < 1e-3, "a = {}", a);
    assert!((b - 9.6).abs() < 1e-3, "b = {}", b);
    // Momentum is conserved
    assert!((a + b - 10.0).abs() < 1e-3);
}

#[test]
fn scripted_nine_ball_play_keeps_table_invariants() {
    let mut controller = MatchController::new(
        GameMode::NineBall,
        MatchConfig {
            frames_to_play: 1,
            points_per_match: 10,
            eight_ball_requires_clear: false,
        },
        PhysicsConfig::default(),
        [Identity::new("alice", None), Identity::guest()],
        2024,
    )
    .unwrap();

    for shot_no in 0..40 {
        if controller.is_over() {
            break;
        }
        let round = controller.round();
        match round.phase() {
            Phase::AwaitingPlacement => {
                // Try spots down the head of the table until one is free
                let placed = (0..20).any(|i| {
                    let pos = vec2(60.0 + (i % 5) as f64 * 30.0, 80.0 + (i / 5) as f64 * 60.0);
                    matches!(
                        controller.place_cue_ball(pos),
                        billiards_server::round::PlacementOutcome::Placed(_)
                    )
                });
                assert!(placed, "no legal ball-in-hand spot found");
                continue;
            }
            Phase::AwaitingShot => {}
            other => panic!("unexpected phase {:?} before shot {}", other, shot_no),
        }

        let registry = controller.round().registry();
        let cue = registry.cue().unwrap().pos;
        let target = registry
            .active_object_balls()
            .min_by_key(|b| b.id)
            .unwrap()
            .pos;
        let outcome = controller.apply_shot(
            Shot {
                direction: sub(target, cue),
                power: 25.0,
            },
            &mut NullSink,
        );
        assert!(matches!(outcome, ShotOutcome::Struck { .. }));

        let mut settled = false;
        for _ in 0..10_000 {
            if controller.tick(1, &mut NullSink).verdict.is_some() {
                settled = true;
                break;
            }
        }
        assert!(settled, "shot {} never settled", shot_no);

        let table = controller.round().table().clone();
        let registry = controller.round().registry();
        let cues = registry
            .balls
            .iter()
            .filter(|b| b.id == CUE_BALL_ID && b.category == BallCategory::Cue)
            .count();
        assert_eq!(cues, 1);
        let active: Vec<_> = registry.active().collect();
        for (i, a) in active.iter().enumerate() {
            assert!(table.contains(a.pos), "ball {} out of bounds", a.id);
            for b in &active[i + 1..] {
                let d = distance_sq(a.pos, b.pos).sqrt();
                // The cue may sit in an overlapping spot only while in hand
                if a.id != CUE_BALL_ID || controller.round().phase() != Phase::AwaitingPlacement {
                    assert!(d >= 2.0 * table.ball_radius - 1e-6, "{} and {} overlap", a.id, b.id);
                }
            }
        }
    }
}
