use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// 棋盘格子数量（3x3，按行排列）。
pub const CELL_COUNT: usize = 9;

/// 棋子符号。`X` 恒为极大方，`O` 恒为极小方。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    pub fn for_turn(maximizing: bool) -> Self {
        if maximizing {
            Symbol::X
        } else {
            Symbol::O
        }
    }

    pub fn is_maximizing(self) -> bool {
        self == Symbol::X
    }

    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::X => "x",
            Symbol::O => "o",
        }
    }
}

impl FromStr for Symbol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Symbol::X),
            "o" => Ok(Symbol::O),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Orientation {
    #[serde(rename = "H")]
    Horizontal,
    #[serde(rename = "V")]
    Vertical,
    #[serde(rename = "D")]
    Diagonal,
}

/// 获胜连线：胜者、方向，以及该方向内从 1 开始的序号。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinLine {
    pub winner: Symbol,
    pub orientation: Orientation,
    pub line: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win(WinLine),
    Draw,
}

impl Outcome {
    pub fn winner(&self) -> Option<Symbol> {
        match self {
            Outcome::Win(line) => Some(line.winner),
            Outcome::Draw => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, Outcome::Draw)
    }
}

#[derive(Serialize)]
struct OutcomeRepr {
    winner: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    direction: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    row: Option<u8>,
}

// 前端按 `${direction}${row}` 拼接连线动画的 class。
impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self {
            Outcome::Win(line) => OutcomeRepr {
                winner: line.winner.as_str(),
                direction: Some(line.orientation),
                row: Some(line.line),
            },
            Outcome::Draw => OutcomeRepr {
                winner: "draw",
                direction: None,
                row: None,
            },
        };
        repr.serialize(serializer)
    }
}

/// 检查顺序固定：三行、三列、两条对角线。
const WINNING_LINES: [(Orientation, u8, [usize; 3]); 8] = [
    (Orientation::Horizontal, 1, [0, 1, 2]),
    (Orientation::Horizontal, 2, [3, 4, 5]),
    (Orientation::Horizontal, 3, [6, 7, 8]),
    (Orientation::Vertical, 1, [0, 3, 6]),
    (Orientation::Vertical, 2, [1, 4, 7]),
    (Orientation::Vertical, 3, [2, 5, 8]),
    (Orientation::Diagonal, 1, [0, 4, 8]),
    (Orientation::Diagonal, 2, [2, 4, 6]),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BoardError {
    InvalidLength { len: usize },
    InvalidSymbol { index: usize, value: String },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::InvalidLength { len } => {
                write!(f, "board must have {CELL_COUNT} cells, got {len}")
            }
            BoardError::InvalidSymbol { index, value } => {
                write!(f, "cell {index} holds unknown symbol {value:?}")
            }
        }
    }
}

impl std::error::Error for BoardError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    MarkCountMismatch { x: usize, o: usize },
    MultipleWinners,
}

/// 3x3 棋盘。按值复制，搜索时每个分支持有自己的副本。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Board {
    cells: [Option<Symbol>; CELL_COUNT],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Option<Symbol>; CELL_COUNT]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<Symbol>; CELL_COUNT] {
        &self.cells
    }

    pub fn get(&self, position: usize) -> Option<Symbol> {
        self.cells.get(position).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// 越界或格子已被占用时返回 `false`，棋盘保持不变。
    pub fn insert(&mut self, symbol: Symbol, position: usize) -> bool {
        match self.cells.get_mut(position) {
            Some(cell) if cell.is_none() => {
                *cell = Some(symbol);
                true
            }
            _ => false,
        }
    }

    pub fn available_moves(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| cell.is_none().then_some(index))
            .collect()
    }

    pub fn count(&self, symbol: Symbol) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == Some(symbol))
            .count()
    }

    /// 轮到落子的一方：棋子较少者，数量相等时为 `X`。
    pub fn turn(&self) -> Symbol {
        if self.count(Symbol::X) > self.count(Symbol::O) {
            Symbol::O
        } else {
            Symbol::X
        }
    }

    /// 返回 `None` 表示对局尚未结束。
    pub fn is_terminal(&self) -> Option<Outcome> {
        if self.is_empty() {
            return None;
        }

        if let Some(line) = self.winning_lines().next() {
            return Some(Outcome::Win(line));
        }

        if self.is_full() {
            return Some(Outcome::Draw);
        }

        None
    }

    fn winning_lines(&self) -> impl Iterator<Item = WinLine> + '_ {
        WINNING_LINES
            .iter()
            .filter_map(move |&(orientation, line, [a, b, c])| {
                let winner = self.cells[a]?;
                (self.cells[b] == Some(winner) && self.cells[c] == Some(winner)).then_some(
                    WinLine {
                        winner,
                        orientation,
                        line,
                    },
                )
            })
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let x = self.count(Symbol::X);
        let o = self.count(Symbol::O);
        if x.abs_diff(o) > 1 {
            return Err(IntegrityError::MarkCountMismatch { x, o });
        }

        let mut winners = self.winning_lines().map(|line| line.winner);
        if let Some(first) = winners.next() {
            if winners.any(|winner| winner != first) {
                return Err(IntegrityError::MultipleWinners);
            }
        }

        Ok(())
    }
}

impl From<Board> for Vec<String> {
    fn from(board: Board) -> Self {
        board
            .cells
            .iter()
            .map(|cell| cell.map(Symbol::as_str).unwrap_or_default().to_string())
            .collect()
    }
}

impl TryFrom<Vec<String>> for Board {
    type Error = BoardError;

    fn try_from(values: Vec<String>) -> Result<Self, Self::Error> {
        if values.len() != CELL_COUNT {
            return Err(BoardError::InvalidLength { len: values.len() });
        }

        let mut cells = [None; CELL_COUNT];
        for (index, value) in values.into_iter().enumerate() {
            if value.trim().is_empty() {
                continue;
            }
            let symbol = Symbol::from_str(&value)
                .map_err(|_| BoardError::InvalidSymbol { index, value })?;
            cells[index] = Some(symbol);
        }
        Ok(Self { cells })
    }
}

/// 紧凑写法，例如 `"xo./.x./..o"`：`.` 表示空格，空白与 `/` 被忽略。
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<String> = s
            .chars()
            .filter(|ch| !ch.is_whitespace() && *ch != '/')
            .map(|ch| match ch {
                '.' | '-' | '_' => String::new(),
                other => other.to_string(),
            })
            .collect();
        Self::try_from(values)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.cells.chunks(3).enumerate() {
            if row > 0 {
                writeln!(f)?;
                writeln!(f, "――― ――― ―――")?;
            }
            let rendered: Vec<String> = cells
                .iter()
                .map(|cell| match cell {
                    Some(symbol) => format!(" {symbol} "),
                    None => "   ".to_string(),
                })
                .collect();
            f.write_str(&rendered.join("|"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(pattern: &str) -> Board {
        pattern.parse().expect("pattern should describe nine cells")
    }

    #[test]
    fn empty_board_is_not_terminal() {
        let board = Board::new();
        assert!(board.is_empty());
        assert!(!board.is_full());
        assert_eq!(board.is_terminal(), None);
    }

    #[test]
    fn every_line_reports_orientation_and_index() {
        for (orientation, line, cells) in WINNING_LINES {
            let mut board = Board::new();
            for index in cells {
                assert!(board.insert(Symbol::O, index));
            }
            assert_eq!(
                board.is_terminal(),
                Some(Outcome::Win(WinLine {
                    winner: Symbol::O,
                    orientation,
                    line,
                })),
                "line {cells:?}"
            );
        }
    }

    #[test]
    fn first_line_in_priority_order_wins() {
        // 第一行与第一列同时成线时，行优先。
        let board = board("xxx/xo./xoo");
        assert_eq!(
            board.is_terminal(),
            Some(Outcome::Win(WinLine {
                winner: Symbol::X,
                orientation: Orientation::Horizontal,
                line: 1,
            }))
        );

        let board = board_with_diagonals();
        assert_eq!(
            board.is_terminal().map(|outcome| match outcome {
                Outcome::Win(line) => (line.orientation, line.line),
                Outcome::Draw => panic!("expected a win"),
            }),
            Some((Orientation::Diagonal, 1))
        );
    }

    fn board_with_diagonals() -> Board {
        board("x.x/.x./x.x")
    }

    #[test]
    fn full_board_without_line_is_draw() {
        let board = board("xox/xoo/oxx");
        assert!(board.is_full());
        let outcome = board.is_terminal().expect("full board is terminal");
        assert!(outcome.is_draw());
        assert_eq!(outcome.winner(), None);
        assert_eq!(
            serde_json::to_value(outcome).expect("outcome serializes"),
            serde_json::json!({ "winner": "draw" })
        );
    }

    #[test]
    fn full_board_with_top_row_reports_row_one() {
        let board = board("xxx/oox/oxo");
        let outcome = board.is_terminal().expect("win is terminal");
        assert_eq!(
            serde_json::to_value(outcome).expect("outcome serializes"),
            serde_json::json!({ "winner": "x", "direction": "H", "row": 1 })
        );
    }

    #[test]
    fn partial_board_without_line_is_not_terminal() {
        assert_eq!(board("xo./.x./..o").is_terminal(), None);
    }

    #[test]
    fn insert_rejects_occupied_and_out_of_range() {
        let mut board = board("x../.o./...");
        let before = board;

        assert!(!board.insert(Symbol::O, 0));
        assert!(!board.insert(Symbol::X, 4));
        assert!(!board.insert(Symbol::X, 9));
        assert!(!board.insert(Symbol::X, usize::MAX));
        assert_eq!(board, before);

        assert!(board.insert(Symbol::X, 8));
        assert_eq!(board.get(8), Some(Symbol::X));
    }

    #[test]
    fn available_moves_are_ascending() {
        assert_eq!(board("x.o/.x./o..").available_moves(), vec![1, 3, 5, 7, 8]);
        assert_eq!(Board::new().available_moves(), (0..CELL_COUNT).collect::<Vec<_>>());
        assert!(board("xox/xoo/oxx").available_moves().is_empty());
    }

    #[test]
    fn copies_do_not_alias() {
        let original = board("x../.../...");
        let mut fork = original;
        assert!(fork.insert(Symbol::O, 4));

        assert_eq!(original.get(4), None);
        assert_eq!(original.available_moves().len(), 8);
        assert_eq!(fork.available_moves().len(), 7);
    }

    #[test]
    fn turn_follows_mark_counts() {
        assert_eq!(Board::new().turn(), Symbol::X);
        assert_eq!(board("x../.../...").turn(), Symbol::O);
        assert_eq!(board("x../.o./...").turn(), Symbol::X);
        assert_eq!(board("o../.../...").turn(), Symbol::X);
    }

    #[test]
    fn json_state_round_trip() {
        let board: Board =
            serde_json::from_str(r#"["x","X","","","o","","","",""]"#).expect("valid state");
        assert_eq!(board.get(0), Some(Symbol::X));
        assert_eq!(board.get(1), Some(Symbol::X));
        assert_eq!(board.get(4), Some(Symbol::O));

        let json = serde_json::to_string(&board).expect("board serializes");
        assert_eq!(json, r#"["x","x","","","o","","","",""]"#);
    }

    #[test]
    fn malformed_states_are_rejected() {
        assert_eq!(
            Board::try_from(vec![String::new(); 8]),
            Err(BoardError::InvalidLength { len: 8 })
        );

        let mut values = vec![String::new(); CELL_COUNT];
        values[3] = "z".to_string();
        assert_eq!(
            Board::try_from(values),
            Err(BoardError::InvalidSymbol {
                index: 3,
                value: "z".to_string(),
            })
        );

        assert!(serde_json::from_str::<Board>(r#"["x"]"#).is_err());
    }

    #[test]
    fn integrity_check_flags_impossible_positions() {
        assert_eq!(board("xo./.x./..o").integrity_check(), Ok(()));
        assert_eq!(
            board("xxx/.../...").integrity_check(),
            Err(IntegrityError::MarkCountMismatch { x: 3, o: 0 })
        );
        assert_eq!(
            board("xxx/ooo/x.o").integrity_check(),
            Err(IntegrityError::MultipleWinners)
        );
    }

    #[test]
    fn display_draws_grid() {
        let rendered = board("xo./.x./..o").to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                " x | o |   ",
                "――― ――― ―――",
                "   | x |   ",
                "――― ――― ―――",
                "   |   | o ",
            ]
        );
    }
}
