pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::{Function, Promise};

pub use ai::{
    ConsoleTrace, Decision, MinimaxPlayer, SearchConfig, TraceEvent, TraceSink, WIN_SCORE,
};
pub use game::{
    Board, BoardError, GameSession, IntegrityError, MoveResolution, Orientation, Outcome,
    SessionError, Symbol, Turn, WinLine, CELL_COUNT,
};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error<E: Serialize + std::fmt::Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn outcome_to_js(outcome: Option<Outcome>) -> Result<JsValue, JsValue> {
    match outcome {
        Some(outcome) => to_value(&outcome).map_err(JsValue::from),
        None => Ok(JsValue::NULL),
    }
}

fn parse_symbol(symbol: &str) -> Result<Symbol, JsValue> {
    Symbol::from_str(symbol)
        .map_err(|_| JsValue::from_str(&format!("unknown symbol {symbol:?}, expected \"x\" or \"o\"")))
}

fn js_trace_sink(sink: Function) -> impl TraceSink {
    move |event: &TraceEvent| {
        let _ = sink.call1(&JsValue::NULL, &JsValue::from_str(&event.to_string()));
    }
}

fn config_from_js(config: JsValue) -> Result<SearchConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(SearchConfig::default());
    }
    from_value(config).map_err(JsValue::from)
}

/// 前端持有的棋盘与电脑玩家。
#[wasm_bindgen]
pub struct GameEngine {
    board: Board,
    player: MinimaxPlayer,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(
        initial_state_json: Option<String>,
        max_depth: Option<i32>,
        trace: Option<bool>,
    ) -> Result<GameEngine, JsValue> {
        let config = SearchConfig::from_js_depth(max_depth).with_trace(trace.unwrap_or(false));
        Self::build(initial_state_json, config)
    }

    /// 以 `{ max_depth, trace }` 形式的配置对象创建，缺省字段取默认值。
    pub fn with_config(
        initial_state_json: Option<String>,
        config: JsValue,
    ) -> Result<GameEngine, JsValue> {
        Self::build(initial_state_json, config_from_js(config)?)
    }

    fn build(
        initial_state_json: Option<String>,
        config: SearchConfig,
    ) -> Result<GameEngine, JsValue> {
        let board = if let Some(json) = initial_state_json {
            serde_json::from_str(&json).map_err(serde_to_js_error)?
        } else {
            Board::new()
        };
        Ok(GameEngine {
            board,
            player: MinimaxPlayer::new(config),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.board).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.board = serde_json::from_str(json).map_err(serde_to_js_error)?;
        Ok(())
    }

    pub fn insert(&mut self, symbol: &str, position: u32) -> Result<bool, JsValue> {
        let symbol = parse_symbol(symbol)?;
        Ok(self.board.insert(symbol, position as usize))
    }

    pub fn available_moves(&self) -> Vec<u32> {
        self.board
            .available_moves()
            .into_iter()
            .map(|index| index as u32)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.board.is_full()
    }

    pub fn is_terminal(&self) -> Result<JsValue, JsValue> {
        outcome_to_js(self.board.is_terminal())
    }

    /// 只计算最佳落子，不修改棋盘。回调在本方法返回前同步执行，
    /// 不能再调用本对象的方法（wasm-bindgen 会拒绝重入借用）。
    pub fn best_move(
        &mut self,
        maximizing: bool,
        callback: Option<Function>,
    ) -> Result<Option<u32>, JsValue> {
        let mut callback_result = Ok(JsValue::UNDEFINED);
        let decision = self
            .player
            .choose_move_with(&self.board, maximizing, |index| {
                if let Some(callback) = &callback {
                    callback_result =
                        callback.call1(&JsValue::NULL, &JsValue::from(index as u32));
                }
            });
        callback_result?;
        Ok(decision.map(|decision| decision.index as u32))
    }

    /// 计算并把电脑的落子写入棋盘，之后才调用回调（用于刷新界面）。
    /// 回调同样不能再调用本对象的方法。
    pub fn apply_best_move(
        &mut self,
        maximizing: bool,
        callback: Option<Function>,
    ) -> Result<Option<u32>, JsValue> {
        let Some(decision) = self.player.choose_move(&self.board, maximizing) else {
            return Ok(None);
        };
        self.board.insert(Symbol::for_turn(maximizing), decision.index);

        let index = decision.index as u32;
        if let Some(callback) = callback {
            callback.call1(&JsValue::NULL, &JsValue::from(index))?;
        }
        Ok(Some(index))
    }

    pub fn last_scores(&self) -> Result<JsValue, JsValue> {
        to_value(self.player.scores()).map_err(JsValue::from)
    }

    pub fn set_trace_sink(&mut self, sink: Function) {
        self.player.set_sink(js_trace_sink(sink));
        self.player.set_trace(true);
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.player.set_trace(enabled);
    }

    /// 先等待 `delay_ms` 毫秒再搜索，返回 `Decision` 的 JSON 字符串；局面已结束时为 `null`。
    pub fn think(&self, maximizing: bool, delay_ms: Option<u32>) -> Promise {
        let board = self.board;
        let config = self.player.config();
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut player = MinimaxPlayer::new(config);
            match player.choose_move(&board, maximizing) {
                Some(decision) => {
                    let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
                    Ok(JsValue::from_str(&json))
                }
                None => Ok(JsValue::NULL),
            }
        })
    }
}

/// 带回合管理的人机对局。
#[wasm_bindgen(js_name = "GameSession")]
pub struct SessionHandle {
    session: GameSession,
}

#[wasm_bindgen(js_class = "GameSession")]
impl SessionHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(human_starts: bool, max_depth: Option<i32>, trace: Option<bool>) -> SessionHandle {
        let config = SearchConfig::from_js_depth(max_depth).with_trace(trace.unwrap_or(false));
        SessionHandle {
            session: GameSession::new(MinimaxPlayer::new(config), human_starts),
        }
    }

    pub fn with_config(human_starts: bool, config: JsValue) -> Result<SessionHandle, JsValue> {
        Ok(SessionHandle {
            session: GameSession::new(MinimaxPlayer::new(config_from_js(config)?), human_starts),
        })
    }

    pub fn human_symbol(&self) -> String {
        self.session.human().to_string()
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_value(self.session.board()).map_err(JsValue::from)
    }

    pub fn outcome(&self) -> Result<JsValue, JsValue> {
        outcome_to_js(self.session.outcome())
    }

    pub fn play_human(&mut self, position: u32) -> Result<JsValue, JsValue> {
        let resolution = self
            .session
            .play_human(position as usize)
            .map_err(|error| to_value(&error).unwrap_or_else(JsValue::from))?;
        to_value(&resolution).map_err(JsValue::from)
    }

    pub fn play_computer(&mut self) -> Result<JsValue, JsValue> {
        let resolution = self
            .session
            .play_computer()
            .map_err(|error| to_value(&error).unwrap_or_else(JsValue::from))?;
        to_value(&resolution).map_err(JsValue::from)
    }

    pub fn set_trace_sink(&mut self, sink: Function) {
        let player = self.session.player_mut();
        player.set_sink(js_trace_sink(sink));
        player.set_trace(true);
    }
}

/// 返回一个空棋盘（九个空字符串）。
#[wasm_bindgen(js_name = "createBoard")]
pub fn create_board() -> Result<JsValue, JsValue> {
    to_value(&Board::new()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "checkTerminal")]
pub fn check_terminal(state: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(state).map_err(JsValue::from)?;
    outcome_to_js(board.is_terminal())
}

#[wasm_bindgen(js_name = "availableMoves")]
pub fn available_moves(state: JsValue) -> Result<Vec<u32>, JsValue> {
    let board: Board = from_value(state).map_err(JsValue::from)?;
    Ok(board
        .available_moves()
        .into_iter()
        .map(|index| index as u32)
        .collect())
}

#[wasm_bindgen(js_name = "computeBestMove")]
pub fn compute_best_move(
    state: JsValue,
    maximizing: bool,
    max_depth: Option<i32>,
) -> Result<JsValue, JsValue> {
    let board: Board = from_value(state).map_err(JsValue::from)?;
    let mut player = MinimaxPlayer::new(SearchConfig::from_js_depth(max_depth));
    match player.choose_move(&board, maximizing) {
        Some(decision) => to_value(&decision).map_err(JsValue::from),
        None => Ok(JsValue::NULL),
    }
}

#[wasm_bindgen(js_name = "validateBoard")]
pub fn validate_board(state: JsValue) -> Result<(), JsValue> {
    let board: Board = from_value(state).map_err(JsValue::from)?;
    board
        .integrity_check()
        .map_err(|error| to_value(&error).unwrap_or_else(JsValue::from))
}

#[wasm_bindgen(js_name = "openingMove")]
pub fn opening_move() -> u32 {
    MinimaxPlayer::new(SearchConfig::default()).opening_move() as u32
}

#[wasm_bindgen(js_name = "formatBoard")]
pub fn format_board(state: JsValue) -> Result<String, JsValue> {
    let board: Board = from_value(state).map_err(JsValue::from)?;
    Ok(board.to_string())
}

#[wasm_bindgen(js_name = "parseBoard")]
pub fn parse_board(pattern: &str) -> Result<JsValue, JsValue> {
    let board = Board::from_str(pattern).map_err(to_js_error)?;
    to_value(&board).map_err(JsValue::from)
}
