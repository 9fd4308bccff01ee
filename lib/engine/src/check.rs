// 将军检测：找到己方将/帅，看对方有没有棋子按基础走法能走到那里
use tracing::debug;

use crate::board::{Board, Position, Side};
use crate::rules::is_geometrically_legal;

/// 找不到将/帅时返回 false，没有将帅由胜负判定处理
pub fn is_in_check(board: &Board, side: Side) -> bool {
    attacker(board, side).is_some()
}

/// 第一个能吃到 side 方将/帅的对方棋子位置
pub fn attacker(board: &Board, side: Side) -> Option<Position> {
    let Some(king) = board.general_position(side) else {
        debug!("{} has no general on board", side);
        return None;
    };
    let found = board
        .pieces(side.next())
        .into_iter()
        .map(|(pos, _)| pos)
        .find(|pos| is_geometrically_legal(board, *pos, king));
    if let Some(pos) = found {
        debug!("{} general at {} attacked from {}", side, king, pos);
    }
    found
}
