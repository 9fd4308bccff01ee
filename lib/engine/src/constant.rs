use crate::board::{Piece, PieceKind, Side};
use std::{collections::HashMap, sync::LazyLock};

pub const BOARD_WIDTH: i32 = 9;
pub const BOARD_HEIGHT: i32 = 10;

// 楚河汉界：第 4 行属于黑方，第 5 行属于红方
pub const RIVER_BLACK_ROW: i32 = 4;
pub const RIVER_RED_ROW: i32 = 5;

pub const INITIAL_FEN: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR";

pub static FEN_MAP: LazyLock<HashMap<char, Piece>> = LazyLock::new(|| {
    HashMap::from([
        ('k', Piece::new(PieceKind::General, Side::Black)),
        ('a', Piece::new(PieceKind::Advisor, Side::Black)),
        ('b', Piece::new(PieceKind::Elephant, Side::Black)),
        ('n', Piece::new(PieceKind::Horse, Side::Black)),
        ('r', Piece::new(PieceKind::Chariot, Side::Black)),
        ('c', Piece::new(PieceKind::Cannon, Side::Black)),
        ('p', Piece::new(PieceKind::Soldier, Side::Black)),
        ('K', Piece::new(PieceKind::General, Side::Red)),
        ('A', Piece::new(PieceKind::Advisor, Side::Red)),
        ('B', Piece::new(PieceKind::Elephant, Side::Red)),
        ('N', Piece::new(PieceKind::Horse, Side::Red)),
        ('R', Piece::new(PieceKind::Chariot, Side::Red)),
        ('C', Piece::new(PieceKind::Cannon, Side::Red)),
        ('P', Piece::new(PieceKind::Soldier, Side::Red)),
    ])
});
