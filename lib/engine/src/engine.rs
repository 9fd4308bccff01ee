/* 文本协议：一行一条命令，驱动 Game，供外部界面或脚本使用 */
use std::io::{self, BufRead, Write};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::board::{FenError, Position, Side, SquareError};
use crate::config::{OptionError, Settings};
use crate::game::{ClickOutcome, Game, MoveOutcome, Selection};

static POSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:fen (?P<fen>[kabnrcpKABNRCP1-9/]+(?: [wrb])?)|(?P<startpos>startpos))$")
        .unwrap()
});
static MOVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<from>[a-i]\d)(?P<to>[a-i]\d)$").unwrap());
static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^name (?P<name>\w+) value (?P<value>\w+)$").unwrap());

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("bad arguments for `{0}`")]
    Syntax(&'static str),
    #[error(transparent)]
    Square(#[from] SquareError),
    #[error(transparent)]
    Fen(#[from] FenError),
    #[error(transparent)]
    Setting(#[from] OptionError),
}

pub struct ProtocolEngine {
    pub game: Game,
}

impl Default for ProtocolEngine {
    fn default() -> Self {
        ProtocolEngine::new(Settings::default())
    }
}

impl ProtocolEngine {
    pub fn new(settings: Settings) -> Self {
        ProtocolEngine {
            game: Game::new(settings),
        }
    }

    pub fn start(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run(stdin.lock(), stdout.lock())
    }

    /// 逐行读命令，直到 quit 或输入结束
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            let cmd = line.trim();
            if cmd.is_empty() {
                continue;
            }
            if cmd == "quit" {
                writeln!(output, "bye")?;
                break;
            }
            let response = match self.handle(cmd) {
                Ok(lines) => lines,
                Err(e) => {
                    warn!("bad command `{}`: {}", cmd, e);
                    vec![format!("error {}", e)]
                }
            };
            for l in response {
                writeln!(output, "{}", l)?;
            }
            output.flush()?;
        }
        Ok(())
    }

    /// 处理一条命令，返回要输出的若干行
    pub fn handle(&mut self, line: &str) -> Result<Vec<String>, CommandError> {
        let mut token = line.splitn(2, ' ');
        let cmd = token.next().unwrap_or("");
        let param = token.next().unwrap_or("").trim();
        match cmd {
            "xiangqi" => Ok(Self::info()),
            "isready" => Ok(vec!["readyok".to_owned()]),
            "position" => self.position(param),
            "select" => {
                let pos: Position = param.parse()?;
                Ok(Self::selection_lines(&self.game.select(pos)))
            }
            "click" => {
                let pos: Position = param.parse()?;
                Ok(match self.game.click(pos) {
                    ClickOutcome::Selected(selection) => Self::selection_lines(&selection),
                    ClickOutcome::Moved(outcome) => Self::move_lines(&outcome),
                })
            }
            "move" => self.play(param),
            "restart" => {
                self.game.restart();
                Ok(vec!["ok".to_owned()])
            }
            "check" => {
                let side: Side = param.parse()?;
                Ok(vec![format!("incheck {} {}", side, self.game.is_in_check(side))])
            }
            "captured" => Ok([Side::Red, Side::Black]
                .iter()
                .map(|side| {
                    let pieces: String =
                        self.game.captured(*side).iter().map(|p| p.fen_char()).collect();
                    format!("captured {} {}", side, pieces).trim_end().to_owned()
                })
                .collect()),
            "fen" => {
                let turn = if self.game.current_side() == Side::Red { "w" } else { "b" };
                Ok(vec![format!("fen {} {}", self.game.board().to_fen(), turn)])
            }
            "status" => Ok(vec![format!("status {}", self.game.status_message())]),
            "setoption" => {
                let captures = OPTION_RE.captures(param).ok_or(CommandError::Syntax("setoption"))?;
                self.game.settings.set_option(&captures["name"], &captures["value"])?;
                Ok(vec!["ok".to_owned()])
            }
            _ => Err(CommandError::Unknown(cmd.to_owned())),
        }
    }

    pub fn info() -> Vec<String> {
        vec![
            "id name chinese-chess rules engine".to_owned(),
            format!("id version {}", env!("CARGO_PKG_VERSION")),
            "option checkwarning type check default true".to_owned(),
            "xiangqiok".to_owned(),
        ]
    }

    fn position(&mut self, param: &str) -> Result<Vec<String>, CommandError> {
        let captures = POSITION_RE.captures(param).ok_or(CommandError::Syntax("position"))?;
        let settings = self.game.settings;
        if let Some(fen) = captures.name("fen") {
            self.game = Game::from_fen(fen.as_str(), settings)?;
        } else {
            self.game = Game::new(settings);
        }
        Ok(vec!["ok".to_owned()])
    }

    // move 命令自带起点，未选中时先选中
    fn play(&mut self, param: &str) -> Result<Vec<String>, CommandError> {
        let captures = MOVE_RE.captures(param).ok_or(CommandError::Syntax("move"))?;
        let from: Position = captures["from"].parse()?;
        let to: Position = captures["to"].parse()?;
        if self.game.selection() != Some(from) {
            let selection = self.game.select(from);
            if let Some(rejection) = selection.rejection {
                return Ok(vec![format!("illegal {}{} {}", from, to, rejection)]);
            }
        }
        Ok(Self::move_lines(&self.game.attempt_move(from, to)))
    }

    fn selection_lines(selection: &Selection) -> Vec<String> {
        match selection.rejection {
            Some(rejection) => vec![format!("noselect {}", rejection)],
            None => {
                let moves: Vec<String> =
                    selection.destinations.iter().map(|p| p.to_string()).collect();
                vec![format!("selected {} moves {}", selection.origin, moves.join(" "))
                    .trim_end()
                    .to_owned()]
            }
        }
    }

    fn move_lines(outcome: &MoveOutcome) -> Vec<String> {
        let mut lines = vec![];
        if let Some(rejection) = outcome.rejection {
            lines.push(format!("illegal {}{} {}", outcome.from, outcome.to, rejection));
            if let Some(pos) = outcome.reselected {
                lines.push(format!("reselected {}", pos));
            }
            return lines;
        }
        lines.push(format!("moved {}{}", outcome.from, outcome.to));
        if let Some(piece) = outcome.captured {
            lines.push(format!("capture {}", piece.fen_char()));
        }
        if let Some(side) = outcome.check_notice {
            lines.push(format!("check {}", side));
        }
        if let Some(over) = outcome.game_over {
            lines.push(format!("gameover {} {}", over.winner, over.reason));
        }
        lines
    }
}
