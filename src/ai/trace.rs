//! 搜索跟踪：把极小化极大搜索的每一步以可读文本交给注入的输出端。

use std::fmt;

use crate::game::Board;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Turn {
        maximizing: bool,
        depth: u8,
        available: Vec<usize>,
    },
    /// 仅在顶层调用时输出当前局面。
    Position { board: Board },
    Explore {
        index: usize,
        depth: u8,
        board: Board,
    },
    Heuristic { index: usize, depth: u8, score: i32 },
    Candidates { score: i32, moves: Vec<usize> },
    Decision { index: usize },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Turn {
                maximizing,
                depth,
                available,
            } => {
                let side = if *maximizing {
                    "Maximizing"
                } else {
                    "Minimizing"
                };
                writeln!(f, "{side} player's turn Depth: {depth}")?;
                write!(f, "Available Moves: {}", join(available, " "))
            }
            TraceEvent::Position { board } => write!(f, "{board}"),
            TraceEvent::Explore { index, board, .. } => {
                write!(f, "Exploring move {index}\n{board}")
            }
            TraceEvent::Heuristic {
                index,
                depth: 0,
                score,
            } => write!(f, "Move {index} yielded a heuristic value of {score}"),
            TraceEvent::Heuristic { index, score, .. } => {
                write!(f, "Child move {index} yielded a heuristic value of {score}")
            }
            TraceEvent::Candidates { score, moves } => {
                write!(f, "Move(s) {} yielded {score}", join(moves, ","))
            }
            TraceEvent::Decision { index } => {
                write!(f, "Move {index} was decided as the best move")
            }
        }
    }
}

fn join(indices: &[usize], separator: &str) -> String {
    indices
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

pub trait TraceSink {
    fn record(&mut self, event: &TraceEvent);
}

impl<F> TraceSink for F
where
    F: FnMut(&TraceEvent),
{
    fn record(&mut self, event: &TraceEvent) {
        self(event)
    }
}

/// 默认输出端：浏览器控制台（原生目标下写到 stderr）。
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleTrace;

impl TraceSink for ConsoleTrace {
    fn record(&mut self, event: &TraceEvent) {
        let line = event.to_string();
        #[cfg(target_arch = "wasm32")]
        web_sys::console::log_1(&line.into());
        #[cfg(not(target_arch = "wasm32"))]
        eprintln!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_wording_depends_on_depth() {
        let root = TraceEvent::Heuristic {
            index: 4,
            depth: 0,
            score: 0,
        };
        let child = TraceEvent::Heuristic {
            index: 2,
            depth: 3,
            score: -97,
        };
        assert_eq!(root.to_string(), "Move 4 yielded a heuristic value of 0");
        assert_eq!(
            child.to_string(),
            "Child move 2 yielded a heuristic value of -97"
        );
    }

    #[test]
    fn turn_and_candidates_list_indices() {
        let turn = TraceEvent::Turn {
            maximizing: false,
            depth: 2,
            available: vec![1, 5, 8],
        };
        assert_eq!(
            turn.to_string(),
            "Minimizing player's turn Depth: 2\nAvailable Moves: 1 5 8"
        );

        let candidates = TraceEvent::Candidates {
            score: 0,
            moves: vec![0, 2, 6],
        };
        assert_eq!(candidates.to_string(), "Move(s) 0,2,6 yielded 0");
        assert_eq!(
            TraceEvent::Decision { index: 6 }.to_string(),
            "Move 6 was decided as the best move"
        );
    }

    #[test]
    fn closures_are_sinks() {
        let mut lines = Vec::new();
        {
            let mut sink = |event: &TraceEvent| lines.push(event.to_string());
            sink.record(&TraceEvent::Decision { index: 1 });
        }
        assert_eq!(lines, vec!["Move 1 was decided as the best move".to_string()]);
    }
}
