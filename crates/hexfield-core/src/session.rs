//! Game session state machine.
//!
//! A session owns one board and the seats playing on it, and advances
//! through a fixed sequence of phases. All input enters through
//! [`GameSession::handle`], which matches on the (phase, message) pair:
//! a message the current phase has no rule for is dropped without reply,
//! while a rule-level rejection (not your turn, illegal placement) earns
//! the sender an `invalid` reply. The session never touches sockets; it
//! returns the messages to deliver and the caller owns the transport.

use crate::board::{BoardState, PlayerId};
use crate::player::{is_valid_username, PlayerColor, Seat};
use crate::protocol::{
    ClientMessage, ConnId, GameId, HostOptions, PlayerInfo, SelectionKind, ServerMessage,
};
use rand::Rng;

/// Phases of one game, in order of first entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Seats filling up and negotiating usernames/colors.
    PlayerSetup,
    /// Initial settlement and road placement, two rounds.
    SettlementSetup {
        placing: SetupPlacing,
        second_round: bool,
    },
    /// The current player is rolling the dice.
    RollDice,
    /// Main turn actions (building, trading). Extension point.
    PlayerTurn,
    /// Somebody won. Extension point.
    EndGame,
}

/// What the current player owes during settlement setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupPlacing {
    Settlement,
    Road,
}

/// A message addressed to one connection, produced by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: ConnId,
    pub message: ServerMessage,
}

/// One running (or finished) game.
#[derive(Debug)]
pub struct GameSession {
    id: GameId,
    max_players: u8,
    randomize: bool,
    board: BoardState,
    seats: Vec<Seat>,
    phase: GamePhase,
    /// Seat index whose input the current phase is waiting on.
    cur: usize,
}

impl GameSession {
    /// Create an empty session for the given host options.
    pub fn new(id: GameId, options: &HostOptions) -> Self {
        let mut rng = rand::thread_rng();
        Self::new_with_rng(id, options, &mut rng)
    }

    /// Create an empty session with a provided RNG for board generation.
    pub fn new_with_rng<R: Rng>(id: GameId, options: &HostOptions, rng: &mut R) -> Self {
        Self {
            id,
            max_players: options.num_players,
            randomize: options.randomize,
            board: BoardState::new_with_rng(options.randomize, rng),
            seats: Vec::with_capacity(options.num_players as usize),
            phase: GamePhase::PlayerSetup,
            cur: 0,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn max_players(&self) -> u8 {
        self.max_players
    }

    pub fn randomize(&self) -> bool {
        self.randomize
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= self.max_players as usize
    }

    /// Reserve the next seat for `conn`. Callers check [`Self::is_full`]
    /// first; a seat is never reclaimed, even if the connection dies.
    pub fn add_seat(&mut self, conn: ConnId) {
        debug_assert!(!self.is_full());
        self.seats.push(Seat::new(conn));
    }

    /// Handle one client message, returning the messages to deliver.
    ///
    /// An empty result means the message was dropped (unknown sender, or no
    /// rule for it in the current phase).
    pub fn handle<R: Rng>(
        &mut self,
        from: ConnId,
        msg: &ClientMessage,
        rng: &mut R,
    ) -> Vec<Outbound> {
        let Some(seat_idx) = self.seats.iter().position(|s| s.conn == from) else {
            return Vec::new();
        };

        match (self.phase, msg) {
            (
                GamePhase::PlayerSetup,
                ClientMessage::UserColorSelection {
                    username, color, ..
                },
            ) => self.handle_user_color(seat_idx, username, *color),
            (
                GamePhase::SettlementSetup {
                    placing: SetupPlacing::Settlement,
                    second_round,
                },
                ClientMessage::SelectSettlement { settlement, .. },
            ) => self.handle_select_settlement(seat_idx, *settlement, second_round),
            (
                GamePhase::SettlementSetup {
                    placing: SetupPlacing::Road,
                    second_round,
                },
                ClientMessage::SelectRoad { road, .. },
            ) => self.handle_select_road(seat_idx, *road, second_round),
            (GamePhase::RollDice, ClientMessage::StopDice { .. }) => {
                self.handle_stop_dice(seat_idx, rng)
            }
            // No rule for this message in this phase: drop it.
            _ => Vec::new(),
        }
    }

    // ==================== Player Setup ====================

    fn handle_user_color(
        &mut self,
        seat_idx: usize,
        username: &str,
        color: PlayerColor,
    ) -> Vec<Outbound> {
        let accept_username = is_valid_username(username)
            && !self
                .seats
                .iter()
                .enumerate()
                .any(|(i, s)| i != seat_idx && s.username.as_deref() == Some(username));
        let accept_color = !self
            .seats
            .iter()
            .enumerate()
            .any(|(i, s)| i != seat_idx && s.color == Some(color));

        let mut out = Vec::new();
        let conn = self.seats[seat_idx].conn;

        if accept_username && accept_color {
            self.seats[seat_idx].username = Some(username.to_string());
            self.seats[seat_idx].color = Some(color);

            out.push(Outbound {
                to: conn,
                message: ServerMessage::GameBoard {
                    layout: self.board.tile_types(),
                },
            });

            let others: Vec<(ConnId, PlayerInfo)> = self
                .seats
                .iter()
                .enumerate()
                .filter(|(i, s)| *i != seat_idx && s.is_identified())
                .filter_map(|(_, s)| {
                    Some((
                        s.conn,
                        PlayerInfo {
                            username: s.username.clone()?,
                            color: s.color?,
                        },
                    ))
                })
                .collect();

            out.push(Outbound {
                to: conn,
                message: ServerMessage::CurrentPlayers {
                    players: others.iter().map(|(_, info)| info.clone()).collect(),
                },
            });
            for (other_conn, _) in &others {
                out.push(Outbound {
                    to: *other_conn,
                    message: ServerMessage::NewPlayer {
                        username: username.to_string(),
                        color,
                    },
                });
            }
        }

        // The verdict always closes the exchange, accepted or not.
        out.push(Outbound {
            to: conn,
            message: ServerMessage::CheckUserColor {
                accept_username,
                accept_color,
            },
        });

        if self.is_full() && self.seats.iter().all(Seat::is_identified) {
            self.phase = GamePhase::SettlementSetup {
                placing: SetupPlacing::Settlement,
                second_round: false,
            };
            self.cur = 0;
            out.extend(self.prompt_placement(SetupPlacing::Settlement));
        }

        out
    }

    // ==================== Settlement Setup ====================

    fn handle_select_settlement(
        &mut self,
        seat_idx: usize,
        node: usize,
        second_round: bool,
    ) -> Vec<Outbound> {
        if seat_idx != self.cur || !self.board.is_settlement_placement_legal(node) {
            return vec![self.invalid_reply(seat_idx, SelectionKind::Settlement)];
        }

        let player = self.cur as PlayerId;
        self.board.place_settlement(node, player);
        if second_round {
            let gained = self.board.resources_adjacent_to(node);
            self.seats[self.cur].resources.add_hand(&gained);
        }

        let Some(color) = self.seats[self.cur].color else {
            return Vec::new();
        };
        let mut out = self.broadcast(ServerMessage::NewSettlement {
            settlement: node,
            color,
        });

        self.phase = GamePhase::SettlementSetup {
            placing: SetupPlacing::Road,
            second_round,
        };
        out.push(Outbound {
            to: self.seats[self.cur].conn,
            message: ServerMessage::SelectRoad,
        });
        out
    }

    fn handle_select_road(&mut self, seat_idx: usize, road: usize, second_round: bool) -> Vec<Outbound> {
        if seat_idx != self.cur || !self.board.is_road_placement_legal(road, self.cur as PlayerId) {
            return vec![self.invalid_reply(seat_idx, SelectionKind::Road)];
        }

        self.board.place_road(road, self.cur as PlayerId);
        let Some(color) = self.seats[self.cur].color else {
            return Vec::new();
        };
        let mut out = self.broadcast(ServerMessage::NewRoad { road, color });

        if self.cur + 1 < self.seats.len() {
            self.cur += 1;
            self.phase = GamePhase::SettlementSetup {
                placing: SetupPlacing::Settlement,
                second_round,
            };
            out.extend(self.prompt_placement(SetupPlacing::Settlement));
        } else if !second_round {
            self.cur = 0;
            self.phase = GamePhase::SettlementSetup {
                placing: SetupPlacing::Settlement,
                second_round: true,
            };
            out.extend(self.prompt_placement(SetupPlacing::Settlement));
        } else {
            self.cur = 0;
            self.phase = GamePhase::RollDice;
            out.extend(self.prompt_roll());
        }
        out
    }

    // ==================== Dice ====================

    fn handle_stop_dice<R: Rng>(&mut self, seat_idx: usize, rng: &mut R) -> Vec<Outbound> {
        // Only the roller may stop the dice; everyone else is ignored.
        if seat_idx != self.cur {
            return Vec::new();
        }
        let left = rng.gen_range(0..6) as u8;
        let right = rng.gen_range(0..6) as u8;
        self.broadcast(ServerMessage::DiceResult { left, right })
    }

    // ==================== Helpers ====================

    fn invalid_reply(&self, seat_idx: usize, kind: SelectionKind) -> Outbound {
        Outbound {
            to: self.seats[seat_idx].conn,
            message: ServerMessage::Invalid { message: kind },
        }
    }

    fn broadcast(&self, message: ServerMessage) -> Vec<Outbound> {
        self.seats
            .iter()
            .map(|s| Outbound {
                to: s.conn,
                message: message.clone(),
            })
            .collect()
    }

    fn current_username(&self) -> String {
        self.seats[self.cur]
            .username
            .clone()
            .unwrap_or_default()
    }

    /// Prompt the current player for a placement and tell the rest to wait.
    fn prompt_placement(&self, placing: SetupPlacing) -> Vec<Outbound> {
        let prompt = match placing {
            SetupPlacing::Settlement => ServerMessage::SelectSettlement,
            SetupPlacing::Road => ServerMessage::SelectRoad,
        };
        let cur_player = self.current_username();
        self.seats
            .iter()
            .enumerate()
            .map(|(i, s)| Outbound {
                to: s.conn,
                message: if i == self.cur {
                    prompt.clone()
                } else {
                    ServerMessage::Wait {
                        cur_player: cur_player.clone(),
                    }
                },
            })
            .collect()
    }

    /// Prompt the current player to roll and tell the rest to wait.
    fn prompt_roll(&self) -> Vec<Outbound> {
        let roller = self.current_username();
        self.seats
            .iter()
            .enumerate()
            .map(|(i, s)| Outbound {
                to: s.conn,
                message: if i == self.cur {
                    ServerMessage::RollDice
                } else {
                    ServerMessage::WaitDice {
                        roller: roller.clone(),
                    }
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn options(n: u8) -> HostOptions {
        HostOptions {
            num_players: n,
            randomize: false,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn select(session: &mut GameSession, conn: ConnId, msg: ClientMessage) -> Vec<Outbound> {
        let mut rng = rng();
        session.handle(conn, &msg, &mut rng)
    }

    fn identify(session: &mut GameSession, conn: ConnId, username: &str, color: PlayerColor) {
        let out = select(
            session,
            conn,
            ClientMessage::UserColorSelection {
                game_id: session.id(),
                username: username.to_string(),
                color,
            },
        );
        let verdict = out
            .iter()
            .find(|o| matches!(o.message, ServerMessage::CheckUserColor { .. }))
            .expect("no verdict sent");
        assert_eq!(
            verdict.message,
            ServerMessage::CheckUserColor {
                accept_username: true,
                accept_color: true,
            }
        );
    }

    /// Two seated, fully identified players; session is in settlement setup.
    fn two_player_session() -> GameSession {
        let mut session = GameSession::new(0, &options(2));
        session.add_seat(ConnId(1));
        session.add_seat(ConnId(2));
        identify(&mut session, ConnId(1), "alice", PlayerColor::White);
        identify(&mut session, ConnId(2), "bob", PlayerColor::Black);
        assert_eq!(
            session.phase(),
            GamePhase::SettlementSetup {
                placing: SetupPlacing::Settlement,
                second_round: false,
            }
        );
        session
    }

    #[test]
    fn unknown_connection_is_dropped() {
        let mut session = GameSession::new(0, &options(2));
        session.add_seat(ConnId(1));
        let out = select(
            &mut session,
            ConnId(99),
            ClientMessage::StopDice { game_id: 0 },
        );
        assert!(out.is_empty());
    }

    #[test]
    fn wrong_phase_message_is_dropped() {
        let mut session = GameSession::new(0, &options(2));
        session.add_seat(ConnId(1));
        // Dice message during player setup has no rule: silence.
        let out = select(&mut session, ConnId(1), ClientMessage::StopDice { game_id: 0 });
        assert!(out.is_empty());
        assert_eq!(session.phase(), GamePhase::PlayerSetup);
    }

    #[test]
    fn duplicate_username_and_color_are_rejected_independently() {
        let mut session = GameSession::new(0, &options(3));
        session.add_seat(ConnId(1));
        session.add_seat(ConnId(2));
        identify(&mut session, ConnId(1), "alice", PlayerColor::White);

        let out = select(
            &mut session,
            ConnId(2),
            ClientMessage::UserColorSelection {
                game_id: 0,
                username: "alice".to_string(),
                color: PlayerColor::White,
            },
        );
        // Rejection carries only the verdict, and both flags are down.
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].message,
            ServerMessage::CheckUserColor {
                accept_username: false,
                accept_color: false,
            }
        );

        let out = select(
            &mut session,
            ConnId(2),
            ClientMessage::UserColorSelection {
                game_id: 0,
                username: "alice".to_string(),
                color: PlayerColor::Black,
            },
        );
        assert_eq!(
            out[0].message,
            ServerMessage::CheckUserColor {
                accept_username: false,
                accept_color: true,
            }
        );
    }

    #[test]
    fn malformed_username_is_rejected() {
        let mut session = GameSession::new(0, &options(2));
        session.add_seat(ConnId(1));
        let out = select(
            &mut session,
            ConnId(1),
            ClientMessage::UserColorSelection {
                game_id: 0,
                username: "a".to_string(),
                color: PlayerColor::White,
            },
        );
        assert_eq!(
            out[0].message,
            ServerMessage::CheckUserColor {
                accept_username: false,
                accept_color: true,
            }
        );
        assert_eq!(session.phase(), GamePhase::PlayerSetup);
    }

    #[test]
    fn verdict_follows_the_acceptance_messages() {
        let mut session = GameSession::new(0, &options(3));
        session.add_seat(ConnId(1));
        let out = select(
            &mut session,
            ConnId(1),
            ClientMessage::UserColorSelection {
                game_id: 0,
                username: "alice".to_string(),
                color: PlayerColor::White,
            },
        );
        let kinds: Vec<&ServerMessage> = out.iter().map(|o| &o.message).collect();
        assert!(matches!(kinds[0], ServerMessage::GameBoard { .. }));
        assert!(matches!(kinds[1], ServerMessage::CurrentPlayers { .. }));
        assert!(matches!(kinds[2], ServerMessage::CheckUserColor { .. }));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn new_player_is_announced_to_identified_seats_only() {
        let mut session = GameSession::new(0, &options(3));
        session.add_seat(ConnId(1));
        session.add_seat(ConnId(2));
        session.add_seat(ConnId(3));
        identify(&mut session, ConnId(1), "alice", PlayerColor::White);

        let out = select(
            &mut session,
            ConnId(2),
            ClientMessage::UserColorSelection {
                game_id: 0,
                username: "bob".to_string(),
                color: PlayerColor::Black,
            },
        );

        let announced: Vec<ConnId> = out
            .iter()
            .filter(|o| matches!(o.message, ServerMessage::NewPlayer { .. }))
            .map(|o| o.to)
            .collect();
        assert_eq!(announced, vec![ConnId(1)]);

        let current = out
            .iter()
            .find_map(|o| match &o.message {
                ServerMessage::CurrentPlayers { players } => Some(players.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            current,
            vec![PlayerInfo {
                username: "alice".to_string(),
                color: PlayerColor::White,
            }]
        );
    }

    #[test]
    fn last_identification_starts_settlement_setup() {
        let mut session = GameSession::new(0, &options(2));
        session.add_seat(ConnId(1));
        session.add_seat(ConnId(2));
        identify(&mut session, ConnId(1), "alice", PlayerColor::White);
        assert_eq!(session.phase(), GamePhase::PlayerSetup);

        let out = select(
            &mut session,
            ConnId(2),
            ClientMessage::UserColorSelection {
                game_id: 0,
                username: "bob".to_string(),
                color: PlayerColor::Black,
            },
        );

        // Seat 0 is prompted, seat 1 told to wait for alice.
        let prompt = out
            .iter()
            .find(|o| o.message == ServerMessage::SelectSettlement)
            .unwrap();
        assert_eq!(prompt.to, ConnId(1));
        let wait = out
            .iter()
            .find(|o| matches!(o.message, ServerMessage::Wait { .. }))
            .unwrap();
        assert_eq!(wait.to, ConnId(2));
        assert_eq!(
            wait.message,
            ServerMessage::Wait {
                cur_player: "alice".to_string(),
            }
        );
    }

    #[test]
    fn out_of_turn_settlement_gets_invalid_reply() {
        let mut session = two_player_session();
        let out = select(
            &mut session,
            ConnId(2),
            ClientMessage::SelectSettlement {
                game_id: 0,
                settlement: 0,
            },
        );
        assert_eq!(
            out,
            vec![Outbound {
                to: ConnId(2),
                message: ServerMessage::Invalid {
                    message: SelectionKind::Settlement,
                },
            }]
        );
    }

    #[test]
    fn illegal_settlement_gets_invalid_reply_and_no_state_change() {
        let mut session = two_player_session();
        let out = select(
            &mut session,
            ConnId(1),
            ClientMessage::SelectSettlement {
                game_id: 0,
                settlement: 1000,
            },
        );
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].message,
            ServerMessage::Invalid {
                message: SelectionKind::Settlement,
            }
        );
        assert_eq!(
            session.phase(),
            GamePhase::SettlementSetup {
                placing: SetupPlacing::Settlement,
                second_round: false,
            }
        );
    }

    #[test]
    fn road_message_while_settlement_owed_is_dropped() {
        let mut session = two_player_session();
        let out = select(
            &mut session,
            ConnId(1),
            ClientMessage::SelectRoad {
                game_id: 0,
                road: 0,
            },
        );
        assert!(out.is_empty());
    }

    #[test]
    fn valid_settlement_is_broadcast_and_road_owed() {
        let mut session = two_player_session();
        let out = select(
            &mut session,
            ConnId(1),
            ClientMessage::SelectSettlement {
                game_id: 0,
                settlement: 0,
            },
        );

        let recipients: Vec<ConnId> = out
            .iter()
            .filter(|o| {
                o.message
                    == ServerMessage::NewSettlement {
                        settlement: 0,
                        color: PlayerColor::White,
                    }
            })
            .map(|o| o.to)
            .collect();
        assert_eq!(recipients, vec![ConnId(1), ConnId(2)]);

        let prompt = out.last().unwrap();
        assert_eq!(prompt.to, ConnId(1));
        assert_eq!(prompt.message, ServerMessage::SelectRoad);
        assert_eq!(session.board().node_owner(0), Some(0));
    }

    #[test]
    fn first_round_settlement_grants_nothing() {
        let mut session = two_player_session();
        select(
            &mut session,
            ConnId(1),
            ClientMessage::SelectSettlement {
                game_id: 0,
                settlement: 0,
            },
        );
        assert!(session.seats()[0].resources.is_empty());
    }

    #[test]
    fn non_roller_stop_dice_is_dropped() {
        let mut session = two_player_session();
        // Walk both placement rounds: seat 0 then seat 1, twice.
        for (conn, node, road) in [
            (ConnId(1), 0, 0),
            (ConnId(2), 2, 2),
            (ConnId(1), 9, 10),
            (ConnId(2), 11, 11),
        ] {
            select(
                &mut session,
                conn,
                ClientMessage::SelectSettlement {
                    game_id: 0,
                    settlement: node,
                },
            );
            select(
                &mut session,
                conn,
                ClientMessage::SelectRoad { game_id: 0, road },
            );
        }
        assert_eq!(session.phase(), GamePhase::RollDice);

        let out = select(&mut session, ConnId(2), ClientMessage::StopDice { game_id: 0 });
        assert!(out.is_empty());

        let out = select(&mut session, ConnId(1), ClientMessage::StopDice { game_id: 0 });
        assert_eq!(out.len(), 2);
        for o in &out {
            match o.message {
                ServerMessage::DiceResult { left, right } => {
                    assert!(left <= 5);
                    assert!(right <= 5);
                }
                ref other => panic!("unexpected message {:?}", other),
            }
        }
        // The roll does not advance the phase.
        assert_eq!(session.phase(), GamePhase::RollDice);
    }
}
