//! 游戏核心逻辑模块（棋盘模型、人机对局流程）。

pub mod board;
pub mod session;

pub use board::{
    Board, BoardError, IntegrityError, Orientation, Outcome, Symbol, WinLine, CELL_COUNT,
};
pub use session::{GameSession, MoveResolution, SessionError, Turn};
