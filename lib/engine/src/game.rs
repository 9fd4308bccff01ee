/*
 * 对局流程（选子、走子、将军提示、胜负、重新开始）
 *
 * 状态机：
 * - AwaitingSelection 等待选子
 * - PieceSelected(origin) 已选中一个己方棋子
 * - GameOver 某一方的将/帅被吃，只能重新开始
 *
 * 棋盘只由 Game 修改；走法是否合法只看 rules 的基础走法，
 * 不检查走完后己方是否被将军，也没有将死、困毙判断。
 */

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use crate::board::{in_board, Board, FenError, Piece, PieceKind, Position, Side};
use crate::check;
use crate::config::Settings;
use crate::rules;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameOverReason {
    GeneralCaptured,
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOverReason::GeneralCaptured => f.write_str("king captured"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GameOver {
    pub winner: Side,
    pub reason: GameOverReason,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    AwaitingSelection,
    PieceSelected(Position),
    GameOver(GameOver),
}

/// 被拒绝的操作，状态不会有任何改动（走子失败时只有选中状态可能变化）
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Rejection {
    #[error("game is over")]
    GameOver,
    #[error("no piece of the side to move at {0}")]
    InvalidSelection(Position),
    #[error("{0} is not the selected piece")]
    NotSelected(Position),
    #[error("{0} is off the board")]
    OutOfRange(Position),
    #[error("illegal move {from}{to}")]
    IllegalMove { from: Position, to: Position },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub selected: bool,
    pub origin: Position,
    /// 选中棋子能走到的格子，界面用来高亮
    pub destinations: Vec<Position>,
    pub rejection: Option<Rejection>,
}

impl Selection {
    fn rejected(origin: Position, rejection: Rejection) -> Self {
        Selection {
            selected: false,
            origin,
            destinations: vec![],
            rejection: Some(rejection),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MoveOutcome {
    pub applied: bool,
    pub from: Position,
    pub to: Position,
    pub captured: Option<Piece>,
    pub check_notice: Option<Side>,
    pub game_over: Option<GameOver>,
    /// 走子失败且终点是己方棋子时，改为选中该棋子
    pub reselected: Option<Position>,
    pub rejection: Option<Rejection>,
}

impl MoveOutcome {
    fn rejected(
        from: Position,
        to: Position,
        rejection: Rejection,
        reselected: Option<Position>,
    ) -> Self {
        MoveOutcome {
            applied: false,
            from,
            to,
            captured: None,
            check_notice: None,
            game_over: None,
            reselected,
            rejection: Some(rejection),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClickOutcome {
    Selected(Selection),
    Moved(MoveOutcome),
}

// 提示栏当前显示的内容
#[derive(Clone, Copy, PartialEq, Debug)]
enum Notice {
    Start,
    Turn(Side),
    Check(Side),
    Over(GameOver),
}

pub struct Game {
    board: Board,
    current_side: Side,
    phase: Phase,
    captured: HashMap<Side, Vec<Piece>>,
    // 走子时发现的将军，换手后才提示
    pending_check_notice: Option<Side>,
    notice: Notice,
    pub settings: Settings,
}

impl Default for Game {
    fn default() -> Self {
        Game::new(Settings::default())
    }
}

impl Game {
    pub fn new(settings: Settings) -> Self {
        Game::with_board(Board::init(), Side::Red, settings)
    }

    pub fn from_fen(fen: &str, settings: Settings) -> Result<Self, FenError> {
        let (board, turn) = Board::from_fen(fen)?;
        Ok(Game::with_board(board, turn, settings))
    }

    fn with_board(board: Board, current_side: Side, settings: Settings) -> Self {
        Game {
            board,
            current_side,
            phase: Phase::AwaitingSelection,
            captured: HashMap::new(),
            pending_check_notice: None,
            notice: Notice::Start,
            settings,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }
    pub fn current_side(&self) -> Side {
        self.current_side
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn selection(&self) -> Option<Position> {
        match self.phase {
            Phase::PieceSelected(pos) => Some(pos),
            _ => None,
        }
    }
    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver(_))
    }
    /// side 方被吃掉的棋子，按吃子顺序
    pub fn captured(&self, side: Side) -> &[Piece] {
        self.captured.get(&side).map(Vec::as_slice).unwrap_or(&[])
    }
    pub fn is_in_check(&self, side: Side) -> bool {
        check::is_in_check(&self.board, side)
    }
    pub fn destinations(&self, from: Position) -> Vec<Position> {
        rules::destinations(&self.board, from)
    }

    /// 选中当前走棋方的棋子，失败时状态不变
    pub fn select(&mut self, pos: Position) -> Selection {
        if self.is_game_over() {
            return Selection::rejected(pos, Rejection::GameOver);
        }
        if !in_board(pos) {
            return Selection::rejected(pos, Rejection::OutOfRange(pos));
        }
        match self.board.get(pos) {
            Some(piece) if piece.belong_to(self.current_side) => {
                self.phase = Phase::PieceSelected(pos);
                let destinations = self.destinations(pos);
                debug!(
                    "selected {} at {}, {} destinations",
                    piece.label(),
                    pos,
                    destinations.len()
                );
                Selection {
                    selected: true,
                    origin: pos,
                    destinations,
                    rejection: None,
                }
            }
            _ => Selection::rejected(pos, Rejection::InvalidSelection(pos)),
        }
    }

    pub fn deselect(&mut self) {
        if let Phase::PieceSelected(_) = self.phase {
            self.phase = Phase::AwaitingSelection;
        }
    }

    /// 把已选中的 from 走到 to
    pub fn attempt_move(&mut self, from: Position, to: Position) -> MoveOutcome {
        match self.phase {
            Phase::GameOver(_) => return MoveOutcome::rejected(from, to, Rejection::GameOver, None),
            Phase::PieceSelected(origin) if origin == from => {}
            _ => return MoveOutcome::rejected(from, to, Rejection::NotSelected(from), None),
        }

        if !in_board(to) || !rules::is_geometrically_legal(&self.board, from, to) {
            let rejection = if in_board(to) {
                Rejection::IllegalMove { from, to }
            } else {
                Rejection::OutOfRange(to)
            };
            // 点到己方棋子就改选它，否则取消选中
            let reselected = match self.board.get(to) {
                Some(piece) if piece.belong_to(self.current_side) => Some(to),
                _ => None,
            };
            self.phase = match reselected {
                Some(pos) => Phase::PieceSelected(pos),
                None => Phase::AwaitingSelection,
            };
            debug!("rejected {}{}: {}", from, to, rejection);
            return MoveOutcome::rejected(from, to, rejection, reselected);
        }

        let mover = self.current_side;
        let captured = self.move_piece(from, to);
        self.phase = Phase::AwaitingSelection;

        // 先判胜负，结束了就不再换手也不提示将军
        if let Some(over) = self.game_end() {
            info!("game over: {} wins, {}", over.winner, over.reason);
            self.phase = Phase::GameOver(over);
            self.pending_check_notice = None;
            self.notice = Notice::Over(over);
            return MoveOutcome {
                applied: true,
                from,
                to,
                captured,
                check_notice: None,
                game_over: Some(over),
                reselected: None,
                rejection: None,
            };
        }

        let opponent = mover.next();
        if self.settings.check_warning && self.is_in_check(opponent) {
            info!("{} gives check to {}", mover, opponent);
            self.pending_check_notice = Some(opponent);
        }
        let check_notice = self.switch_side();

        MoveOutcome {
            applied: true,
            from,
            to,
            captured,
            check_notice,
            game_over: None,
            reselected: None,
            rejection: None,
        }
    }

    /// 界面上点击一个格子：已选中棋子时尝试走子，否则选子
    pub fn click(&mut self, pos: Position) -> ClickOutcome {
        match self.phase {
            Phase::PieceSelected(origin) => ClickOutcome::Moved(self.attempt_move(origin, pos)),
            _ => ClickOutcome::Selected(self.select(pos)),
        }
    }

    /// 重新开始，设置保留
    pub fn restart(&mut self) {
        info!("restart");
        *self = Game::new(self.settings);
    }

    /// 提示栏文字
    pub fn status_message(&self) -> String {
        match self.notice {
            Notice::Start => format!("游戏开始，{}先行", self.current_side.name()),
            Notice::Turn(side) => format!("轮到{}下棋", side.name()),
            Notice::Check(side) => format!("⚠️ {}被将军了！", side.name()),
            Notice::Over(over) => {
                let loser = over.winner.next();
                let general = Piece::new(PieceKind::General, loser);
                format!(
                    "🎉 {}获胜！{}的{}被吃掉了！",
                    over.winner.name(),
                    loser.name(),
                    general.label()
                )
            }
        }
    }

    // 落子并记录吃掉的棋子
    fn move_piece(&mut self, from: Position, to: Position) -> Option<Piece> {
        let captured = self.board.get(to);
        if let Some(piece) = captured {
            info!("{} captured at {}", piece.label(), to);
            self.captured.entry(piece.side).or_default().push(piece);
        }
        let piece = self.board.get(from);
        self.board.set(to, piece);
        self.board.set(from, None);
        info!("{} moved {}{}", self.current_side, from, to);
        captured
    }

    // 红帅先查，两个都没了算黑方胜
    fn game_end(&self) -> Option<GameOver> {
        let reason = GameOverReason::GeneralCaptured;
        if !self.board.has_general(Side::Red) {
            Some(GameOver { winner: Side::Black, reason })
        } else if !self.board.has_general(Side::Black) {
            Some(GameOver { winner: Side::Red, reason })
        } else {
            None
        }
    }

    // 换手；有待提示的将军就用它，否则重新检查新走棋方
    fn switch_side(&mut self) -> Option<Side> {
        self.current_side = self.current_side.next();
        let notice = match self.pending_check_notice.take() {
            Some(side) => Some(side),
            None if self.settings.check_warning && self.is_in_check(self.current_side) => {
                Some(self.current_side)
            }
            None => None,
        };
        self.notice = match notice {
            Some(side) => Notice::Check(side),
            None => Notice::Turn(self.current_side),
        };
        notice
    }
}

#[cfg(test)]
mod tests {
    use crate::board::*;
    use crate::config::Settings;
    use crate::game::*;

    fn pos(row: i32, col: i32) -> Position {
        Position::new(row, col)
    }

    fn play(game: &mut Game, from: Position, to: Position) -> MoveOutcome {
        assert!(game.select(from).selected, "cannot select {}", from);
        game.attempt_move(from, to)
    }

    #[test]
    fn test_select() {
        let mut game = Game::default();
        let selection = game.select(pos(9, 1));
        assert!(selection.selected);
        assert_eq!(selection.destinations, vec![pos(7, 0), pos(7, 2)]);
        assert_eq!(game.phase(), Phase::PieceSelected(pos(9, 1)));

        assert_eq!(game.select(pos(7, 1)).destinations.len(), 12);

        // 选对方棋子、空格都不改变状态
        let selection = game.select(pos(0, 0));
        assert!(!selection.selected);
        assert_eq!(selection.rejection, Some(Rejection::InvalidSelection(pos(0, 0))));
        assert!(!game.select(pos(4, 4)).selected);
        assert!(!game.select(pos(10, 4)).selected);
        assert_eq!(game.selection(), Some(pos(7, 1)));
    }

    #[test]
    fn test_move_requires_selection() {
        let mut game = Game::default();
        let outcome = game.attempt_move(pos(6, 0), pos(5, 0));
        assert!(!outcome.applied);
        assert_eq!(outcome.rejection, Some(Rejection::NotSelected(pos(6, 0))));
        assert!(game.board().is_initial());

        game.select(pos(6, 2));
        let outcome = game.attempt_move(pos(6, 0), pos(5, 0));
        assert_eq!(outcome.rejection, Some(Rejection::NotSelected(pos(6, 0))));
        assert_eq!(game.selection(), Some(pos(6, 2)));
    }

    #[test]
    fn test_illegal_move_clears_or_reselects() {
        let mut game = Game::default();
        let before = game.board().clone();

        game.select(pos(9, 4));
        let outcome = game.attempt_move(pos(9, 4), pos(8, 3));
        assert!(!outcome.applied);
        assert_eq!(
            outcome.rejection,
            Some(Rejection::IllegalMove { from: pos(9, 4), to: pos(8, 3) })
        );
        assert_eq!(game.phase(), Phase::AwaitingSelection);
        assert_eq!(game.board(), &before);

        game.select(pos(9, 4));
        let outcome = game.attempt_move(pos(9, 4), pos(9, 3));
        assert_eq!(outcome.reselected, Some(pos(9, 3)));
        assert_eq!(game.phase(), Phase::PieceSelected(pos(9, 3)));

        let outcome = game.attempt_move(pos(9, 3), pos(12, 3));
        assert_eq!(outcome.rejection, Some(Rejection::OutOfRange(pos(12, 3))));
        assert_eq!(game.phase(), Phase::AwaitingSelection);
        assert_eq!(game.board(), &before);
        assert_eq!(game.current_side(), Side::Red);
    }

    #[test]
    fn test_legal_move_switches_side() {
        let mut game = Game::default();
        let outcome = play(&mut game, pos(7, 1), pos(7, 4));
        assert!(outcome.applied);
        assert_eq!(outcome.captured, None);
        assert_eq!(outcome.check_notice, None);
        assert_eq!(game.current_side(), Side::Black);
        assert_eq!(game.phase(), Phase::AwaitingSelection);
        assert_eq!(game.board().get(pos(7, 1)), None);
        assert_eq!(game.board().get(pos(7, 4)), Some(Piece::new(PieceKind::Cannon, Side::Red)));
        assert_eq!(game.status_message(), "轮到黑方下棋");

        // 红方不能再走
        assert!(!game.select(pos(7, 4)).selected);
    }

    #[test]
    fn test_capture_is_recorded() {
        let mut game = Game::default();
        let outcome = play(&mut game, pos(7, 1), pos(0, 1));
        assert_eq!(outcome.captured, Some(Piece::new(PieceKind::Horse, Side::Black)));
        assert_eq!(game.captured(Side::Black), &[Piece::new(PieceKind::Horse, Side::Black)]);
        assert!(game.captured(Side::Red).is_empty());

        let outcome = play(&mut game, pos(0, 0), pos(0, 1));
        assert_eq!(outcome.captured, Some(Piece::new(PieceKind::Cannon, Side::Red)));
        assert_eq!(game.captured(Side::Red), &[Piece::new(PieceKind::Cannon, Side::Red)]);
    }

    // 同一方被吃的棋子按吃子先后排列
    #[test]
    fn test_captured_keeps_order() {
        let mut game = Game::default();
        play(&mut game, pos(7, 1), pos(0, 1));
        play(&mut game, pos(3, 0), pos(4, 0));
        // 隔象打士
        let outcome = play(&mut game, pos(0, 1), pos(0, 3));
        assert_eq!(outcome.captured, Some(Piece::new(PieceKind::Advisor, Side::Black)));
        assert_eq!(
            game.captured(Side::Black),
            &[
                Piece::new(PieceKind::Horse, Side::Black),
                Piece::new(PieceKind::Advisor, Side::Black),
            ]
        );
        assert!(game.captured(Side::Red).is_empty());
    }

    #[test]
    fn test_check_notice() {
        let mut game = Game::from_fen("4k4/9/9/9/9/9/9/9/9/3K4R", Settings::default()).unwrap();
        let outcome = play(&mut game, pos(9, 8), pos(9, 4));
        assert!(outcome.applied);
        assert_eq!(outcome.check_notice, Some(Side::Black));
        assert_eq!(game.current_side(), Side::Black);
        assert_eq!(game.status_message(), "⚠️ 黑方被将军了！");
        assert!(game.is_in_check(Side::Black));

        // 提示只出现一次
        let outcome = play(&mut game, pos(0, 4), pos(0, 3));
        assert!(outcome.applied);
        assert_eq!(outcome.check_notice, None);
        assert_eq!(game.status_message(), "轮到红方下棋");
    }

    #[test]
    fn test_check_warning_disabled() {
        let settings = Settings { check_warning: false };
        let mut game = Game::from_fen("4k4/9/9/9/9/9/9/9/9/3K4R", settings).unwrap();
        let outcome = play(&mut game, pos(9, 8), pos(9, 4));
        assert!(outcome.applied);
        assert_eq!(outcome.check_notice, None);
        // 查询不受开关影响
        assert!(game.is_in_check(Side::Black));
    }

    #[test]
    fn test_capture_general_ends_game() {
        let mut game = Game::from_fen("4k4/9/9/9/9/4R4/9/9/9/3K5", Settings::default()).unwrap();
        let outcome = play(&mut game, pos(5, 4), pos(0, 4));
        assert!(outcome.applied);
        assert_eq!(outcome.captured, Some(Piece::new(PieceKind::General, Side::Black)));
        let over = GameOver { winner: Side::Red, reason: GameOverReason::GeneralCaptured };
        assert_eq!(outcome.game_over, Some(over));
        assert_eq!(outcome.check_notice, None);
        assert_eq!(game.phase(), Phase::GameOver(over));
        assert_eq!(game.current_side(), Side::Red);
        assert_eq!(over.reason.to_string(), "king captured");
        assert_eq!(game.status_message(), "🎉 红方获胜！黑方的將被吃掉了！");

        let selection = game.select(pos(0, 4));
        assert_eq!(selection.rejection, Some(Rejection::GameOver));
        let outcome = game.attempt_move(pos(0, 4), pos(1, 4));
        assert_eq!(outcome.rejection, Some(Rejection::GameOver));
    }

    #[test]
    fn test_missing_general_detected_on_next_move() {
        // 红帅已经不在棋盘上，任何一步之后都判黑方胜
        let mut game = Game::from_fen("4k4/9/9/9/4p4/4R4/9/9/9/9", Settings::default()).unwrap();
        let outcome = play(&mut game, pos(5, 4), pos(4, 4));
        assert_eq!(
            outcome.game_over,
            Some(GameOver { winner: Side::Black, reason: GameOverReason::GeneralCaptured })
        );

        let mut game = Game::from_fen("4k4/9/9/9/4p4/4R4/9/9/9/9 b", Settings::default()).unwrap();
        let outcome = play(&mut game, pos(4, 4), pos(5, 4));
        assert_eq!(outcome.captured, Some(Piece::new(PieceKind::Chariot, Side::Red)));
        assert_eq!(outcome.game_over.map(|over| over.winner), Some(Side::Black));
    }

    #[test]
    fn test_restart() {
        let mut game = Game::new(Settings { check_warning: false });
        play(&mut game, pos(7, 1), pos(0, 1));
        game.select(pos(0, 0));
        game.restart();
        assert!(game.board().is_initial());
        assert_eq!(game.phase(), Phase::AwaitingSelection);
        assert_eq!(game.current_side(), Side::Red);
        assert!(game.captured(Side::Black).is_empty());
        assert!(!game.settings.check_warning);
        assert_eq!(game.status_message(), "游戏开始，红方先行");

        let mut game = Game::from_fen("4k4/9/9/9/9/4R4/9/9/9/3K5", Settings::default()).unwrap();
        play(&mut game, pos(5, 4), pos(0, 4));
        assert!(game.is_game_over());
        game.restart();
        assert!(!game.is_game_over());
        assert!(game.board().is_initial());
    }

    #[test]
    fn test_click_flow() {
        let mut game = Game::default();
        // 点空格什么也不做
        assert!(matches!(
            game.click(pos(5, 5)),
            ClickOutcome::Selected(Selection { selected: false, .. })
        ));
        assert!(matches!(
            game.click(pos(6, 4)),
            ClickOutcome::Selected(Selection { selected: true, .. })
        ));
        // 点另一个己方棋子改选
        match game.click(pos(6, 6)) {
            ClickOutcome::Moved(outcome) => assert_eq!(outcome.reselected, Some(pos(6, 6))),
            other => panic!("unexpected {:?}", other),
        }
        match game.click(pos(5, 6)) {
            ClickOutcome::Moved(outcome) => assert!(outcome.applied),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(game.current_side(), Side::Black);

        game.click(pos(3, 0));
        // 点非法位置取消选中
        game.click(pos(5, 5));
        assert_eq!(game.phase(), Phase::AwaitingSelection);
        game.click(pos(3, 0));
        game.deselect();
        assert_eq!(game.selection(), None);
    }
}
