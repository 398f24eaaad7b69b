use serde::{Deserialize, Serialize};

use super::board::{Board, Outcome, Symbol};
use crate::ai::MinimaxPlayer;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    Human,
    Computer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum SessionError {
    GameFinished,
    NotHumanTurn,
    NotComputerTurn,
    IllegalMove { position: usize },
    NoMoveAvailable,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MoveResolution {
    pub position: usize,
    pub symbol: Symbol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    pub board: Board,
}

/// 一局人机对战：记录谁执哪一方、轮到谁走，以及对局是否结束。
pub struct GameSession {
    board: Board,
    player: MinimaxPlayer,
    human: Symbol,
    turn: Turn,
}

impl GameSession {
    /// 先手方执 `X`。电脑先手时直接在中心或角落落第一子。
    pub fn new(player: MinimaxPlayer, human_starts: bool) -> Self {
        let human = if human_starts { Symbol::X } else { Symbol::O };
        let mut session = Self {
            board: Board::new(),
            player,
            human,
            turn: Turn::Human,
        };

        if !human_starts {
            let opening = session.player.opening_move();
            session.board.insert(human.opponent(), opening);
        }

        session
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn human(&self) -> Symbol {
        self.human
    }

    pub fn computer(&self) -> Symbol {
        self.human.opponent()
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.board.is_terminal()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn player(&self) -> &MinimaxPlayer {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut MinimaxPlayer {
        &mut self.player
    }

    pub fn play_human(&mut self, position: usize) -> Result<MoveResolution, SessionError> {
        self.ensure_turn(Turn::Human)?;
        self.apply(self.human, position, Turn::Computer)
    }

    pub fn play_computer(&mut self) -> Result<MoveResolution, SessionError> {
        self.ensure_turn(Turn::Computer)?;
        let symbol = self.computer();
        let decision = self
            .player
            .choose_move(&self.board, symbol.is_maximizing())
            .ok_or(SessionError::NoMoveAvailable)?;
        self.apply(symbol, decision.index, Turn::Human)
    }

    fn ensure_turn(&self, expected: Turn) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::GameFinished);
        }
        if self.turn != expected {
            return Err(match expected {
                Turn::Human => SessionError::NotHumanTurn,
                Turn::Computer => SessionError::NotComputerTurn,
            });
        }
        Ok(())
    }

    fn apply(
        &mut self,
        symbol: Symbol,
        position: usize,
        next: Turn,
    ) -> Result<MoveResolution, SessionError> {
        if !self.board.insert(symbol, position) {
            return Err(SessionError::IllegalMove { position });
        }
        self.turn = next;

        Ok(MoveResolution {
            position,
            symbol,
            outcome: self.board.is_terminal(),
            board: self.board,
        })
    }
}
