//! AI 模块：极小化极大搜索与搜索跟踪。

pub mod minimax;
pub mod trace;

pub use minimax::{Decision, MinimaxPlayer, SearchConfig, WIN_SCORE};
pub use trace::{ConsoleTrace, TraceEvent, TraceSink};
