//! Game-over arbitration.
//!
//! Invoked after any event that can shrink the set of alive players: an
//! explicit loss report, or a mid-match disconnect. A player who
//! disconnects is removed from the membership rather than flagged
//! `lost`, so the alive count stays correct either way.

use blockfall_protocol::ScoreEntry;

use crate::{Player, Room};

/// The outcome of a decided match.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Display name of the winning member.
    pub winner: String,
    /// Every remaining member's final name/score, in membership order.
    pub scores: Vec<ScoreEntry>,
}

/// Decides whether the match in `room` is over, and who won.
///
/// - Exactly one alive member remaining, in a room with more than one
///   member: that member wins.
/// - Zero alive members: the highest score wins; ties break to the
///   earliest member in join order (left-to-right strict-maximum scan).
/// - Otherwise the match continues and `None` is returned.
///
/// The caller broadcasts `game_over` and returns the room to the lobby
/// when a verdict is produced.
pub fn adjudicate(room: &Room) -> Option<Verdict> {
    let alive: Vec<&Player> = room.players().iter().filter(|p| !p.lost).collect();

    if alive.len() == 1 && room.players().len() > 1 {
        return Some(Verdict {
            winner: alive[0].name.clone(),
            scores: room.scoreboard(),
        });
    }

    if alive.is_empty() {
        // Strict `>` keeps the first maximum encountered, so the
        // earliest-joined member wins ties.
        let mut best: Option<&Player> = None;
        for p in room.players() {
            match best {
                Some(b) if p.score <= b.score => {}
                _ => best = Some(p),
            }
        }
        return best.map(|winner| Verdict {
            winner: winner.name.clone(),
            scores: room.scoreboard(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockfall_protocol::{ClientId, RoomCode};
    use crate::Room;

    fn match_of(players: &[(&str, u64, bool)]) -> Room {
        let code = RoomCode::parse("AB23").unwrap();
        let mut room = Room::new(code, ClientId(1), players[0].0.to_string());
        for (i, (name, _, _)) in players.iter().enumerate().skip(1) {
            room.add_player(ClientId(i as u64 + 1), name.to_string());
        }
        room.begin_match();
        for (i, (_, score, lost)) in players.iter().enumerate() {
            let p = room.player_mut(ClientId(i as u64 + 1)).unwrap();
            p.score = *score;
            p.lost = *lost;
        }
        room
    }

    #[test]
    fn test_no_verdict_while_two_remain_alive() {
        let room = match_of(&[("A", 10, false), ("B", 20, false), ("C", 5, true)]);
        assert_eq!(adjudicate(&room), None);
    }

    #[test]
    fn test_last_alive_member_wins() {
        let room = match_of(&[("A", 10, true), ("B", 20, false), ("C", 5, true)]);
        let verdict = adjudicate(&room).expect("match should be decided");
        assert_eq!(verdict.winner, "B");
        assert_eq!(verdict.scores.len(), 3);
    }

    #[test]
    fn test_sole_member_room_never_wins_by_elimination() {
        // A one-player room with the player still alive has no verdict:
        // winning requires the room to have more than one member.
        let room = match_of(&[("A", 10, false)]);
        assert_eq!(adjudicate(&room), None);
    }

    #[test]
    fn test_all_lost_highest_score_wins() {
        let room = match_of(&[("A", 10, true), ("B", 40, true), ("C", 25, true)]);
        let verdict = adjudicate(&room).unwrap();
        assert_eq!(verdict.winner, "B");
    }

    #[test]
    fn test_all_lost_tie_breaks_to_earliest_joined() {
        let room = match_of(&[("A", 10, true), ("B", 25, true), ("C", 25, true)]);
        let verdict = adjudicate(&room).unwrap();
        assert_eq!(verdict.winner, "B", "B precedes C in join order");
    }

    #[test]
    fn test_all_lost_sole_member_wins_by_score() {
        let room = match_of(&[("A", 0, true)]);
        let verdict = adjudicate(&room).unwrap();
        assert_eq!(verdict.winner, "A");
    }
}
