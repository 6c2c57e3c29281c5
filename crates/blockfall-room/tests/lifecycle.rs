//! Integration tests for the room lifecycle controller.
//!
//! These drive the controller exactly the way the server layer does:
//! one event at a time, asserting on the delivery plan it returns.

use blockfall_protocol::{ClientId, ClientMessage, RoomCode, ServerMessage};
use blockfall_room::{Delivery, LifecycleController};
use rand::rngs::StdRng;
use rand::SeedableRng;

// =========================================================================
// Helpers
// =========================================================================

fn cid(id: u64) -> ClientId {
    ClientId(id)
}

fn controller() -> LifecycleController {
    LifecycleController::with_rng(StdRng::seed_from_u64(7))
}

/// Connects a client and has it create a room; returns the room code.
fn create_room(ctl: &mut LifecycleController, client: ClientId, name: &str) -> RoomCode {
    ctl.connect(client);
    let out = ctl.handle_message(
        client,
        ClientMessage::CreateRoom {
            name: Some(name.into()),
        },
    );
    match &out[..] {
        [Delivery {
            to,
            msg: ServerMessage::RoomCreated { code, .. },
        }] => {
            assert_eq!(*to, client);
            *code
        }
        other => panic!("expected room_created, got {other:?}"),
    }
}

fn join(ctl: &mut LifecycleController, client: ClientId, code: RoomCode, name: &str) -> Vec<Delivery> {
    ctl.connect(client);
    ctl.handle_message(
        client,
        ClientMessage::JoinRoom {
            code: code.to_string(),
            name: Some(name.into()),
        },
    )
}

/// A started three-player room: host 1 ("Ana"), 2 ("Bo"), 3 ("Cy").
fn started_trio(ctl: &mut LifecycleController) -> RoomCode {
    let code = create_room(ctl, cid(1), "Ana");
    join(ctl, cid(2), code, "Bo");
    join(ctl, cid(3), code, "Cy");
    ctl.handle_message(cid(1), ClientMessage::StartGame);
    code
}

fn error_message(out: &[Delivery]) -> &str {
    match out {
        [Delivery {
            msg: ServerMessage::Error { message },
            ..
        }] => message,
        other => panic!("expected a single error delivery, got {other:?}"),
    }
}

fn deliveries_to(out: &[Delivery], client: ClientId) -> Vec<&ServerMessage> {
    out.iter().filter(|d| d.to == client).map(|d| &d.msg).collect()
}

// =========================================================================
// Create / join
// =========================================================================

#[test]
fn test_create_room_makes_sender_host_of_a_lobby() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");

    let room = ctl.registry().get(code).expect("room should exist");
    assert!(room.is_host(cid(1)));
    assert!(!room.started);
    assert_eq!(room.players().len(), 1);
}

#[test]
fn test_join_confirms_to_joiner_and_notifies_others() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");

    let out = join(&mut ctl, cid(2), code, "Bo");

    match deliveries_to(&out, cid(2))[..] {
        [ServerMessage::RoomJoined { code: c, players }] => {
            assert_eq!(*c, code);
            assert_eq!(players.len(), 2);
            assert_eq!(players[1].name, "Bo");
        }
        ref other => panic!("unexpected joiner deliveries: {other:?}"),
    }
    match deliveries_to(&out, cid(1))[..] {
        [ServerMessage::PlayerJoined { name, players }] => {
            assert_eq!(name, "Bo");
            assert_eq!(players.len(), 2);
        }
        ref other => panic!("unexpected host deliveries: {other:?}"),
    }
}

#[test]
fn test_join_is_case_insensitive_on_the_code() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");

    ctl.connect(cid(2));
    let out = ctl.handle_message(
        cid(2),
        ClientMessage::JoinRoom {
            code: code.to_string().to_ascii_lowercase(),
            name: None,
        },
    );

    assert!(matches!(
        deliveries_to(&out, cid(2))[..],
        [ServerMessage::RoomJoined { .. }]
    ));
}

#[test]
fn test_join_unknown_code_is_room_not_found() {
    let mut ctl = controller();
    ctl.connect(cid(1));
    let out = ctl.handle_message(
        cid(1),
        ClientMessage::JoinRoom {
            code: "ZZZZ".into(),
            name: None,
        },
    );
    assert_eq!(error_message(&out), "room not found");
}

#[test]
fn test_join_malformed_code_is_room_not_found() {
    let mut ctl = controller();
    ctl.connect(cid(1));
    let out = ctl.handle_message(
        cid(1),
        ClientMessage::JoinRoom {
            code: "not-a-code".into(),
            name: None,
        },
    );
    assert_eq!(error_message(&out), "room not found");
}

#[test]
fn test_fifth_join_is_room_full_and_changes_nothing() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");
    for i in 2..=4 {
        join(&mut ctl, cid(i), code, &format!("P{i}"));
    }

    let out = join(&mut ctl, cid(5), code, "P5");

    assert_eq!(error_message(&out), "room full");
    assert_eq!(ctl.registry().get(code).unwrap().players().len(), 4);
}

#[test]
fn test_join_after_start_is_match_already_in_progress() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");
    join(&mut ctl, cid(2), code, "Bo");
    ctl.handle_message(cid(1), ClientMessage::StartGame);

    let out = join(&mut ctl, cid(3), code, "Cy");

    assert_eq!(error_message(&out), "match already in progress");
}

#[test]
fn test_create_while_in_a_room_is_ignored() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");

    let out = ctl.handle_message(cid(1), ClientMessage::CreateRoom { name: None });

    assert!(out.is_empty());
    assert_eq!(ctl.registry().len(), 1);
    assert!(ctl.registry().get(code).is_some());
}

#[test]
fn test_missing_name_falls_back_to_default() {
    let mut ctl = controller();
    ctl.connect(cid(1));
    let out = ctl.handle_message(cid(1), ClientMessage::CreateRoom { name: None });

    match &out[..] {
        [Delivery {
            msg: ServerMessage::RoomCreated { players, .. },
            ..
        }] => assert_eq!(players[0].name, "Player"),
        other => panic!("expected room_created, got {other:?}"),
    }
}

// =========================================================================
// Start
// =========================================================================

#[test]
fn test_start_broadcasts_one_seed_to_everyone_and_resets_players() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");
    join(&mut ctl, cid(2), code, "Bo");

    // Stale lobby state that the start transition must wipe.
    ctl.handle_message(cid(2), ClientMessage::PlayerLost);

    let out = ctl.handle_message(cid(1), ClientMessage::StartGame);

    let seeds: Vec<u32> = out
        .iter()
        .map(|d| match &d.msg {
            ServerMessage::GameStart { seed } => *seed,
            other => panic!("expected game_start, got {other:?}"),
        })
        .collect();
    assert_eq!(seeds.len(), 2, "every member receives the start");
    assert!(seeds.windows(2).all(|w| w[0] == w[1]), "seed is shared");

    let room = ctl.registry().get(code).unwrap();
    assert!(room.started);
    for p in room.players() {
        assert_eq!(p.score, 0);
        assert!(!p.lost);
    }
}

#[test]
fn test_start_from_host_mid_match_is_ignored() {
    // No mid-match restart: once in a match, a second start_game from
    // the host changes nothing and broadcasts nothing.
    let mut ctl = controller();
    let code = started_trio(&mut ctl);
    ctl.handle_message(
        cid(2),
        ClientMessage::Move {
            score: 80,
            grid: None,
            lines: None,
        },
    );

    let out = ctl.handle_message(cid(1), ClientMessage::StartGame);

    assert!(out.is_empty(), "no fresh seed is broadcast");
    let room = ctl.registry().get(code).unwrap();
    assert!(room.started);
    assert_eq!(
        room.players()[1].score,
        80,
        "scores are not reset by an ignored restart"
    );
}

#[test]
fn test_start_from_non_host_is_ignored() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");
    join(&mut ctl, cid(2), code, "Bo");

    let out = ctl.handle_message(cid(2), ClientMessage::StartGame);

    assert!(out.is_empty());
    assert!(!ctl.registry().get(code).unwrap().started);
}

// =========================================================================
// Move relay
// =========================================================================

#[test]
fn test_move_payload_round_trips_to_others_only() {
    let mut ctl = controller();
    started_trio(&mut ctl);

    let grid = serde_json::json!([[1, 0], [0, 1]]);
    let out = ctl.handle_message(
        cid(2),
        ClientMessage::Move {
            score: 120,
            grid: Some(grid.clone()),
            lines: Some(3),
        },
    );

    assert!(deliveries_to(&out, cid(2)).is_empty(), "sender gets nothing");
    for receiver in [cid(1), cid(3)] {
        match deliveries_to(&out, receiver)[..] {
            [ServerMessage::OpponentUpdate {
                name,
                grid: g,
                score,
                lines,
            }] => {
                assert_eq!(name, "Bo");
                assert_eq!(g.as_ref(), Some(&grid));
                assert_eq!(*score, 120);
                assert_eq!(*lines, Some(3));
            }
            ref other => panic!("unexpected deliveries: {other:?}"),
        }
    }
}

#[test]
fn test_move_in_lobby_is_dropped() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");
    join(&mut ctl, cid(2), code, "Bo");

    let out = ctl.handle_message(
        cid(1),
        ClientMessage::Move {
            score: 50,
            grid: None,
            lines: None,
        },
    );

    assert!(out.is_empty());
    assert_eq!(ctl.registry().get(code).unwrap().players()[0].score, 0);
}

// =========================================================================
// Elimination and arbitration
// =========================================================================

#[test]
fn test_two_losses_in_three_player_match_crown_the_survivor() {
    let mut ctl = controller();
    let code = started_trio(&mut ctl);

    let out = ctl.handle_message(cid(2), ClientMessage::PlayerLost);
    // Only the opponent-lost notice so far; two players still alive.
    assert!(out
        .iter()
        .all(|d| matches!(d.msg, ServerMessage::OpponentLost { .. })));

    let out = ctl.handle_message(cid(3), ClientMessage::PlayerLost);

    let game_overs: Vec<&Delivery> = out
        .iter()
        .filter(|d| matches!(d.msg, ServerMessage::GameOver { .. }))
        .collect();
    assert_eq!(game_overs.len(), 3, "game_over goes to every member");
    match &game_overs[0].msg {
        ServerMessage::GameOver { winner, scores } => {
            assert_eq!(winner, "Ana");
            assert_eq!(scores.len(), 3);
        }
        _ => unreachable!(),
    }
    assert!(!ctl.registry().get(code).unwrap().started, "room is a lobby again");
}

#[test]
fn test_all_lost_highest_score_wins_with_earliest_max_tie_break() {
    let mut ctl = controller();
    started_trio(&mut ctl);

    // scores = [{Ana,10},{Bo,25},{Cy,25}] → Bo wins (precedes Cy).
    for (client, score) in [(cid(1), 10), (cid(2), 25), (cid(3), 25)] {
        ctl.handle_message(
            client,
            ClientMessage::Move {
                score,
                grid: None,
                lines: None,
            },
        );
    }
    ctl.handle_message(cid(1), ClientMessage::PlayerLost);
    ctl.handle_message(cid(2), ClientMessage::PlayerLost);
    let out = ctl.handle_message(cid(3), ClientMessage::PlayerLost);

    let verdict = out
        .iter()
        .find_map(|d| match &d.msg {
            ServerMessage::GameOver { winner, scores } => Some((winner, scores)),
            _ => None,
        })
        .expect("match should be decided");
    assert_eq!(verdict.0, "Bo");
    assert_eq!(verdict.1[1].score, 25);
}

#[test]
fn test_room_returns_to_joinable_lobby_after_game_over() {
    let mut ctl = controller();
    let code = started_trio(&mut ctl);
    ctl.handle_message(cid(2), ClientMessage::PlayerLost);
    ctl.handle_message(cid(3), ClientMessage::PlayerLost);

    let out = join(&mut ctl, cid(4), code, "Di");
    assert!(matches!(
        deliveries_to(&out, cid(4))[..],
        [ServerMessage::RoomJoined { .. }]
    ));
}

// =========================================================================
// Leave / disconnect
// =========================================================================

#[test]
fn test_host_leave_migrates_host_to_earliest_joined_survivor() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");
    join(&mut ctl, cid(2), code, "Bo");
    join(&mut ctl, cid(3), code, "Cy");

    let out = ctl.handle_message(cid(1), ClientMessage::Leave);

    let room = ctl.registry().get(code).unwrap();
    assert!(room.is_host(cid(2)));
    // player_left goes to both survivors with the refreshed roster.
    for receiver in [cid(2), cid(3)] {
        match deliveries_to(&out, receiver)[..] {
            [ServerMessage::PlayerLeft { name, players }] => {
                assert_eq!(name, "Ana");
                assert_eq!(players.len(), 2);
                assert_eq!(players[0].name, "Bo");
            }
            ref other => panic!("unexpected deliveries: {other:?}"),
        }
    }
}

#[test]
fn test_sole_member_leave_deletes_the_room() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");

    let out = ctl.handle_message(cid(1), ClientMessage::Leave);

    assert!(out.is_empty(), "no one is left to notify");
    assert!(ctl.registry().get(code).is_none());

    // The emptied code is gone for good.
    let out = join(&mut ctl, cid(2), code, "Bo");
    assert_eq!(error_message(&out), "room not found");
}

#[test]
fn test_double_leave_is_a_no_op() {
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");
    join(&mut ctl, cid(2), code, "Bo");

    let first = ctl.handle_message(cid(2), ClientMessage::Leave);
    assert!(!first.is_empty());

    let second = ctl.handle_message(cid(2), ClientMessage::Leave);
    assert!(second.is_empty(), "no duplicate broadcasts");
    assert_eq!(ctl.registry().get(code).unwrap().players().len(), 1);
}

#[test]
fn test_mid_match_disconnect_can_decide_the_match() {
    let mut ctl = controller();
    let code = started_trio(&mut ctl);
    ctl.handle_message(cid(3), ClientMessage::PlayerLost);

    // Bo drops mid-match: Ana is the last one alive among the members
    // that remain, so the arbitrator fires on the disconnect.
    let out = ctl.handle_disconnect(cid(2));

    let game_over = out
        .iter()
        .find_map(|d| match &d.msg {
            ServerMessage::GameOver { winner, scores } => Some((winner, scores)),
            _ => None,
        })
        .expect("disconnect should decide the match");
    assert_eq!(game_over.0, "Ana");
    // The leaver is no longer a member, so the scoreboard has two rows.
    assert_eq!(game_over.1.len(), 2);
    assert!(!ctl.registry().get(code).unwrap().started);
}

#[test]
fn test_two_player_match_disconnect_leaves_no_verdict() {
    // With one member remaining the "more than one member" rule blocks a
    // win-by-elimination; the survivor's match simply idles.
    let mut ctl = controller();
    let code = create_room(&mut ctl, cid(1), "Ana");
    join(&mut ctl, cid(2), code, "Bo");
    ctl.handle_message(cid(1), ClientMessage::StartGame);

    let out = ctl.handle_disconnect(cid(2));

    assert!(out
        .iter()
        .all(|d| !matches!(d.msg, ServerMessage::GameOver { .. })));
    assert!(ctl.registry().get(code).unwrap().started);
}

#[test]
fn test_disconnect_before_joining_any_room_is_harmless() {
    let mut ctl = controller();
    ctl.connect(cid(1));
    assert!(ctl.handle_disconnect(cid(1)).is_empty());
    // And for a client the controller has never seen at all.
    assert!(ctl.handle_disconnect(cid(99)).is_empty());
}
