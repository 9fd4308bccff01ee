/*
 * 走法规则（只看几何与挡子，不看将军）
 *
 * - 所有棋种共享的前置检查：起点有子、起终点不同、终点在棋盘内、不能吃己方棋子
 * - 每个棋种一个纯函数，按 PieceKind 分发
 * - 蹩马腿、塞象眼是“必须为空”的挡子点；炮吃子要求中间恰好一个炮架
 *
 * 这里不判断走完之后己方是否被将军，将军检测也直接复用这一层，所以不会递归
 */

use crate::board::{in_board, in_country, in_palace, Board, Piece, PieceKind, Position};

/// 判断 from -> to 在几何上是否合法（起点棋子按自己的规则走）
pub fn is_geometrically_legal(board: &Board, from: Position, to: Position) -> bool {
    let Some(piece) = board.get(from) else {
        return false;
    };
    if from == to || !in_board(to) {
        return false;
    }
    // 目标格子有同色棋子，不能吃
    if let Some(target) = board.get(to) {
        if target.side == piece.side {
            return false;
        }
    }
    match piece.kind {
        PieceKind::General => general(piece, from, to),
        PieceKind::Advisor => advisor(piece, from, to),
        PieceKind::Elephant => elephant(board, piece, from, to),
        PieceKind::Horse => horse(board, from, to),
        PieceKind::Chariot => chariot(board, from, to),
        PieceKind::Cannon => cannon(board, from, to),
        PieceKind::Soldier => soldier(piece, from, to),
    }
}

/// 起点棋子能走到的所有格子，给界面高亮用
pub fn destinations(board: &Board, from: Position) -> Vec<Position> {
    Position::all()
        .filter(|to| is_geometrically_legal(board, from, *to))
        .collect()
}

fn deltas(from: Position, to: Position) -> (i32, i32) {
    ((to.col - from.col).abs(), (to.row - from.row).abs())
}

// 帅：九宫内一步一格，横竖走
fn general(piece: Piece, from: Position, to: Position) -> bool {
    let (dx, dy) = deltas(from, to);
    in_palace(to, piece.side) && dx + dy == 1
}

// 士：九宫内斜走一格
fn advisor(piece: Piece, from: Position, to: Position) -> bool {
    let (dx, dy) = deltas(from, to);
    in_palace(to, piece.side) && dx == 1 && dy == 1
}

// 相：走田字，不能过河，象眼不能有子
fn elephant(board: &Board, piece: Piece, from: Position, to: Position) -> bool {
    let (dx, dy) = deltas(from, to);
    in_country(to.row, piece.side)
        && dx == 2
        && dy == 2
        && !board.has_piece(Position::new((from.row + to.row) / 2, (from.col + to.col) / 2))
}

// 马：走日字，别马脚
fn horse(board: &Board, from: Position, to: Position) -> bool {
    match deltas(from, to) {
        // 横向跳：马脚在同一行
        (2, 1) => !board.has_piece(Position::new(from.row, (from.col + to.col) / 2)),
        // 纵向跳：马脚在同一列
        (1, 2) => !board.has_piece(Position::new((from.row + to.row) / 2, from.col)),
        _ => false,
    }
}

// 车：直线移动，中间不能有子
fn chariot(board: &Board, from: Position, to: Position) -> bool {
    board.count_between(from, to) == Some(0)
}

// 炮：不吃子时同车；吃子时中间恰好隔一个子
fn cannon(board: &Board, from: Position, to: Position) -> bool {
    let Some(screens) = board.count_between(from, to) else {
        return false;
    };
    if board.has_piece(to) {
        screens == 1
    } else {
        screens == 0
    }
}

// 兵：没过河只能前进，过河后可以左右，永远不能后退
fn soldier(piece: Piece, from: Position, to: Position) -> bool {
    let forward = to.col == from.col && to.row == from.row + piece.side.forward();
    if in_country(from.row, piece.side) {
        forward
    } else {
        forward || (to.row == from.row && (to.col - from.col).abs() == 1)
    }
}
