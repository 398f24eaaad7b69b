use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::trace::{ConsoleTrace, TraceEvent, TraceSink};
use crate::game::{Board, Outcome, Symbol};

/// 胜局基础分；实际得分按深度修正，落在 `[-100, 100]`。
pub const WIN_SCORE: i32 = 100;

/// 电脑先手时在中心与四角中随机落子。
const OPENING_MOVES: [usize; 5] = [0, 2, 4, 6, 8];

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    /// `None` 表示不限深度，一直搜索到终局。
    #[serde(default)]
    pub max_depth: Option<u8>,
    #[serde(default)]
    pub trace: bool,
}

impl SearchConfig {
    pub fn with_max_depth(mut self, depth: u8) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// 前端沿用 `-1` 表示不限深度，任何负数都按不限处理。
    pub fn from_js_depth(depth: Option<i32>) -> Self {
        Self {
            max_depth: depth.and_then(|value| u8::try_from(value).ok()),
            trace: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decision {
    pub index: usize,
    pub score: i32,
    pub candidates: Vec<usize>,
    pub nodes: u64,
}

pub struct MinimaxPlayer {
    config: SearchConfig,
    scores: BTreeMap<i32, Vec<usize>>,
    rng: SmallRng,
    sink: Box<dyn TraceSink>,
    nodes: u64,
}

impl MinimaxPlayer {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            scores: BTreeMap::new(),
            rng: SmallRng::from_entropy(),
            sink: Box::new(ConsoleTrace),
            nodes: 0,
        }
    }

    pub fn with_seed(config: SearchConfig, seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            ..Self::new(config)
        }
    }

    pub fn with_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.set_sink(sink);
        self
    }

    pub fn set_sink(&mut self, sink: impl TraceSink + 'static) {
        self.sink = Box::new(sink);
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.config.trace = trace;
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }

    /// 最近一次顶层搜索中，各得分对应的落子位置（按发现顺序）。
    pub fn scores(&self) -> &BTreeMap<i32, Vec<usize>> {
        &self.scores
    }

    pub fn opening_move(&mut self) -> usize {
        OPENING_MOVES.choose(&mut self.rng).copied().unwrap_or(4)
    }

    /// 终局或截断局面的启发值：`X` 胜 `100 - depth`，`O` 胜 `-100 + depth`，其余为 0。
    pub fn evaluate(board: &Board, depth: u8) -> i32 {
        match board.is_terminal() {
            Some(Outcome::Win(line)) if line.winner.is_maximizing() => {
                WIN_SCORE - i32::from(depth)
            }
            Some(Outcome::Win(_)) => -WIN_SCORE + i32::from(depth),
            Some(Outcome::Draw) | None => 0,
        }
    }

    pub fn choose_move(&mut self, board: &Board, maximizing: bool) -> Option<Decision> {
        self.choose_move_with(board, maximizing, |_| {})
    }

    /// 顶层搜索。局面已终结或深度上限为 0 时没有可选的落子，返回 `None` 且不调用回调。
    pub fn choose_move_with<F>(
        &mut self,
        board: &Board,
        maximizing: bool,
        on_decision: F,
    ) -> Option<Decision>
    where
        F: FnOnce(usize),
    {
        self.scores.clear();
        self.nodes = 1;

        if self.is_cutoff(board, 0) {
            return None;
        }

        let moves = board.available_moves();
        self.trace(|| TraceEvent::Turn {
            maximizing,
            depth: 0,
            available: moves.clone(),
        });
        self.trace(|| TraceEvent::Position { board: *board });

        let symbol = Symbol::for_turn(maximizing);
        let mut best = initial_bound(maximizing);
        for index in moves {
            let child = self.explore(board, symbol, index, 0);
            let score = self.minimax(&child, !maximizing, 1);
            best = pick(maximizing, best, score);
            self.trace(|| TraceEvent::Heuristic {
                index,
                depth: 0,
                score,
            });
            self.scores.entry(score).or_default().push(index);
        }

        let candidates = self.scores.get(&best)?.clone();
        let index = candidates.choose(&mut self.rng).copied()?;

        if self.config.trace {
            for (score, moves) in &self.scores {
                self.sink.record(&TraceEvent::Candidates {
                    score: *score,
                    moves: moves.clone(),
                });
            }
            self.sink.record(&TraceEvent::Decision { index });
        }

        on_decision(index);

        Some(Decision {
            index,
            score: best,
            candidates,
            nodes: self.nodes,
        })
    }

    fn minimax(&mut self, board: &Board, maximizing: bool, depth: u8) -> i32 {
        self.nodes += 1;

        if self.is_cutoff(board, depth) {
            return Self::evaluate(board, depth);
        }

        let moves = board.available_moves();
        self.trace(|| TraceEvent::Turn {
            maximizing,
            depth,
            available: moves.clone(),
        });

        let symbol = Symbol::for_turn(maximizing);
        let mut best = initial_bound(maximizing);
        for index in moves {
            let child = self.explore(board, symbol, index, depth);
            let score = self.minimax(&child, !maximizing, depth + 1);
            best = pick(maximizing, best, score);
            self.trace(|| TraceEvent::Heuristic {
                index,
                depth,
                score,
            });
        }
        best
    }

    fn explore(&mut self, board: &Board, symbol: Symbol, index: usize, depth: u8) -> Board {
        let mut child = *board;
        child.insert(symbol, index);
        self.trace(|| TraceEvent::Explore {
            index,
            depth,
            board: child,
        });
        child
    }

    fn is_cutoff(&self, board: &Board, depth: u8) -> bool {
        board.is_terminal().is_some() || self.config.max_depth == Some(depth)
    }

    fn trace<E>(&mut self, event: E)
    where
        E: FnOnce() -> TraceEvent,
    {
        if self.config.trace {
            self.sink.record(&event());
        }
    }
}

fn initial_bound(maximizing: bool) -> i32 {
    if maximizing {
        -WIN_SCORE
    } else {
        WIN_SCORE
    }
}

fn pick(maximizing: bool, best: i32, score: i32) -> i32 {
    if maximizing {
        best.max(score)
    } else {
        best.min(score)
    }
}
