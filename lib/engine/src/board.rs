/*
 * 象棋棋盘模块（Board 与棋子表示）
 *
 * 设计要点
 * - 棋盘尺寸为 9 列 x 10 行，红方在下（第 9 行为底线），黑方在上（第 0 行为底线）
 * - 每个格子是 Option<Piece>，None 表示空格；一个格子只能放一个棋子
 * - Piece 由棋种 PieceKind 与所属方 Side 组成，两方规则对称（按行镜像）
 * - Position 的行列都从 0 开始，用 i32 存储，越界坐标可以表示但永远不合法
 *
 * 棋盘只负责存取，不做任何走法判断；走法规则见 rules 模块
 */

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constant::{
    BOARD_HEIGHT, BOARD_WIDTH, FEN_MAP, INITIAL_FEN, RIVER_BLACK_ROW, RIVER_RED_ROW,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Side {
    Red,   // 先手
    Black, // 后手
}

impl Side {
    pub fn next(&self) -> Side {
        if self == &Side::Red {
            Side::Black
        } else {
            Side::Red
        }
    }
    pub fn name(&self) -> &'static str {
        match self {
            Side::Red => "红方",
            Side::Black => "黑方",
        }
    }
    pub fn id(&self) -> &'static str {
        match self {
            Side::Red => "red",
            Side::Black => "black",
        }
    }
    // 兵卒前进方向
    pub fn forward(&self) -> i32 {
        match self {
            Side::Red => -1,
            Side::Black => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Side {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" | "r" | "w" | "first" => Ok(Side::Red),
            "black" | "b" | "second" => Ok(Side::Black),
            _ => Err(SquareError::UnknownSide(s.to_owned())),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PieceKind {
    General,  // 帅
    Advisor,  // 士
    Elephant, // 相
    Horse,    // 马
    Chariot,  // 车
    Cannon,   // 炮
    Soldier,  // 兵
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::General,
        PieceKind::Advisor,
        PieceKind::Elephant,
        PieceKind::Horse,
        PieceKind::Chariot,
        PieceKind::Cannon,
        PieceKind::Soldier,
    ];

    pub fn fen_char(&self) -> char {
        match self {
            PieceKind::General => 'k',
            PieceKind::Advisor => 'a',
            PieceKind::Elephant => 'b',
            PieceKind::Horse => 'n',
            PieceKind::Chariot => 'r',
            PieceKind::Cannon => 'c',
            PieceKind::Soldier => 'p',
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
}

impl Piece {
    pub fn new(kind: PieceKind, side: Side) -> Self {
        Piece { kind, side }
    }
    pub fn belong_to(&self, side: Side) -> bool {
        self.side == side
    }
    /// 棋子在棋盘上显示的字，红黑两方写法不同
    pub fn label(&self) -> &'static str {
        match (self.side, self.kind) {
            (Side::Red, PieceKind::General) => "帥",
            (Side::Red, PieceKind::Advisor) => "仕",
            (Side::Red, PieceKind::Elephant) => "相",
            (Side::Red, PieceKind::Cannon) => "砲",
            (Side::Red, PieceKind::Soldier) => "兵",
            (Side::Black, PieceKind::General) => "將",
            (Side::Black, PieceKind::Advisor) => "士",
            (Side::Black, PieceKind::Elephant) => "象",
            (Side::Black, PieceKind::Cannon) => "炮",
            (Side::Black, PieceKind::Soldier) => "卒",
            (_, PieceKind::Horse) => "馬",
            (_, PieceKind::Chariot) => "車",
        }
    }
    pub fn fen_char(&self) -> char {
        match self.side {
            Side::Red => self.kind.fen_char().to_ascii_uppercase(),
            Side::Black => self.kind.fen_char(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl From<(i32, i32)> for Position {
    fn from(value: (i32, i32)) -> Self {
        Position::new(value.0, value.1)
    }
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }
    // 上下镜像，列不变
    pub fn mirror(&self) -> Self {
        Position::new(BOARD_HEIGHT - 1 - self.row, self.col)
    }
    /// 棋盘上所有 90 个格子，按行优先
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_HEIGHT).flat_map(|row| (0..BOARD_WIDTH).map(move |col| Position::new(row, col)))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SquareError {
    #[error("square `{0}` is not in iccs notation")]
    Malformed(String),
    #[error("unknown side `{0}`")]
    UnknownSide(String),
}

/// ICCS 坐标：a-i 表示第 0-8 列，数字 0-9 从红方底线往上数
impl FromStr for Position {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mb = s.as_bytes();
        if mb.len() != 2 || !(b'a'..=b'i').contains(&mb[0]) || !mb[1].is_ascii_digit() {
            return Err(SquareError::Malformed(s.to_owned()));
        }
        Ok(Position::new(
            BOARD_HEIGHT - 1 - (mb[1] - b'0') as i32,
            (mb[0] - b'a') as i32,
        ))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !in_board(*self) {
            return write!(f, "({},{})", self.row, self.col);
        }
        write!(f, "{}{}", (self.col as u8 + b'a') as char, BOARD_HEIGHT - 1 - self.row)
    }
}

// 棋子是否在棋盘内
pub fn in_board(pos: Position) -> bool {
    pos.row >= 0 && pos.row < BOARD_HEIGHT && pos.col >= 0 && pos.col < BOARD_WIDTH
}

// 是否在己方楚河汉界以内（没过河）
pub fn in_country(row: i32, side: Side) -> bool {
    match side {
        Side::Red => row >= RIVER_RED_ROW && row < BOARD_HEIGHT,
        Side::Black => row >= 0 && row <= RIVER_BLACK_ROW,
    }
}

// 是否在己方九宫格内
pub fn in_palace(pos: Position, side: Side) -> bool {
    let rows = match side {
        Side::Black => 0..=2,
        Side::Red => 7..=9,
    };
    rows.contains(&pos.row) && (3..=5).contains(&pos.col)
}

#[derive(Debug, Error, PartialEq)]
pub enum FenError {
    #[error("fen has {0} rows, expected 10")]
    RowCount(usize),
    #[error("fen row {0} does not add up to 9 columns")]
    RowWidth(usize),
    #[error("unknown fen piece `{0}`")]
    UnknownPiece(char),
    #[error("unknown side to move `{0}`")]
    UnknownTurn(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    // 9×10的棋盘，红方在下，黑方在上
    pub cells: [[Option<Piece>; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
}

impl Default for Board {
    fn default() -> Self {
        Board::init()
    }
}

impl Board {
    // 标准开局局面
    pub fn init() -> Self {
        let mut board = Board::empty();
        let back_rank = [
            PieceKind::Chariot,
            PieceKind::Horse,
            PieceKind::Elephant,
            PieceKind::Advisor,
            PieceKind::General,
            PieceKind::Advisor,
            PieceKind::Elephant,
            PieceKind::Horse,
            PieceKind::Chariot,
        ];
        // 只摆黑方半边，红方按行镜像
        let mut half = vec![];
        for (col, kind) in back_rank.into_iter().enumerate() {
            half.push((kind, Position::new(0, col as i32)));
        }
        for col in [1, 7] {
            half.push((PieceKind::Cannon, Position::new(2, col)));
        }
        for col in [0, 2, 4, 6, 8] {
            half.push((PieceKind::Soldier, Position::new(3, col)));
        }
        for (kind, pos) in half {
            board.set(pos, Some(Piece::new(kind, Side::Black)));
            board.set(pos.mirror(), Some(Piece::new(kind, Side::Red)));
        }
        board
    }
    pub fn empty() -> Self {
        Board {
            cells: [[None; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
        }
    }

    /// 从 FEN 的局面字段读取棋盘，可以带上走棋方字段（w/r/b）
    /// 返回棋盘和走棋方，没有走棋方字段时为红方
    pub fn from_fen(fen: &str) -> Result<(Self, Side), FenError> {
        let mut board = Board::empty();
        let mut parts = fen.split_whitespace();
        let placement = parts.next().unwrap_or("");
        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != BOARD_HEIGHT as usize {
            return Err(FenError::RowCount(rows.len()));
        }
        for (i, row) in rows.iter().enumerate() {
            let mut j = 0;
            for c in row.chars() {
                if let Some(n) = c.to_digit(10) {
                    j += n as i32;
                } else {
                    let piece = FEN_MAP.get(&c).ok_or(FenError::UnknownPiece(c))?;
                    if j >= BOARD_WIDTH {
                        return Err(FenError::RowWidth(i));
                    }
                    board.set(Position::new(i as i32, j), Some(*piece));
                    j += 1;
                }
            }
            if j != BOARD_WIDTH {
                return Err(FenError::RowWidth(i));
            }
        }
        let turn = match parts.next() {
            None | Some("w") | Some("r") => Side::Red,
            Some("b") => Side::Black,
            Some(other) => return Err(FenError::UnknownTurn(other.to_owned())),
        };
        Ok((board, turn))
    }

    pub fn to_fen(&self) -> String {
        let mut rows = vec![];
        for row in self.cells.iter() {
            let mut s = String::new();
            let mut empty = 0;
            for cell in row.iter() {
                match cell {
                    Some(piece) => {
                        if empty > 0 {
                            s.push_str(&empty.to_string());
                            empty = 0;
                        }
                        s.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                s.push_str(&empty.to_string());
            }
            rows.push(s);
        }
        rows.join("/")
    }

    pub fn is_initial(&self) -> bool {
        self.to_fen() == INITIAL_FEN
    }

    // 越界坐标当作空格
    pub fn get(&self, pos: Position) -> Option<Piece> {
        if in_board(pos) {
            self.cells[pos.row as usize][pos.col as usize]
        } else {
            None
        }
    }
    pub fn has_piece(&self, pos: Position) -> bool {
        self.get(pos).is_some()
    }
    // 越界写入直接忽略
    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        if in_board(pos) {
            self.cells[pos.row as usize][pos.col as usize] = piece;
        }
    }
    /// 所有有子的格子，按行优先
    pub fn occupied(&self) -> Vec<(Position, Piece)> {
        Position::all()
            .filter_map(|pos| self.get(pos).map(|piece| (pos, piece)))
            .collect()
    }
    pub fn pieces(&self, side: Side) -> Vec<(Position, Piece)> {
        self.occupied()
            .into_iter()
            .filter(|(_, piece)| piece.belong_to(side))
            .collect()
    }

    // 在全盘找将/帅，不局限于九宫
    pub fn general_position(&self, side: Side) -> Option<Position> {
        Position::all().find(|pos| self.get(*pos) == Some(Piece::new(PieceKind::General, side)))
    }
    pub fn has_general(&self, side: Side) -> bool {
        self.general_position(side).is_some()
    }

    /// 同一行或同一列上两点之间（不含两端）的棋子数
    /// 不在同一直线上时返回 None
    pub fn count_between(&self, posa: Position, posb: Position) -> Option<usize> {
        if posa.row == posb.row {
            let count = (posa.col.min(posb.col) + 1..posa.col.max(posb.col))
                .filter(|col| self.has_piece(Position::new(posa.row, *col)))
                .count();
            Some(count)
        } else if posa.col == posb.col {
            let count = (posa.row.min(posb.row) + 1..posa.row.max(posb.row))
                .filter(|row| self.has_piece(Position::new(*row, posa.col)))
                .count();
            Some(count)
        } else {
            None
        }
    }
}
