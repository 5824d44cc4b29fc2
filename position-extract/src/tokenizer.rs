use std::sync::LazyLock;

use regex::Regex;

/// Piece letter, optional disambiguation, optional capture, destination,
/// optional promotion; or a castling token.
static MOVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([NBRQK]?[a-h]?[1-8]?x?[a-h][1-8](?:=[NBRQ])?|O-O(?:-O)?)")
        .expect("move pattern compiles")
});

static RESULT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s(1-0|0-1|1/2-1/2)\s").expect("result pattern compiles"));

pub const CAPTURE_MARKER: char = 'x';

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GameOutcome {
    WhiteWin,
    BlackWin,
    Draw,
    #[default]
    Unknown,
}

impl GameOutcome {
    pub fn from_marker(marker: &str) -> Self {
        match marker {
            "1-0" => GameOutcome::WhiteWin,
            "0-1" => GameOutcome::BlackWin,
            "1/2-1/2" => GameOutcome::Draw,
            _ => GameOutcome::Unknown,
        }
    }

    /// Training label from White's point of view, regardless of who is to
    /// move in the sampled position.
    pub fn label(self) -> Option<f64> {
        match self {
            GameOutcome::WhiteWin => Some(1.0),
            GameOutcome::BlackWin => Some(0.0),
            GameOutcome::Draw => Some(0.5),
            GameOutcome::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedGame {
    pub moves: Vec<String>,
    pub outcome: GameOutcome,
}

/// Extracts move tokens and the result marker from raw game text.
///
/// Returns `None` when the text holds no move token or no result marker;
/// such a game yields no examples.
pub fn tokenize(text: &str) -> Option<TokenizedGame> {
    let moves: Vec<String> = MOVE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    let marker = RESULT_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))?
        .as_str();

    if moves.is_empty() {
        return None;
    }

    Some(TokenizedGame {
        moves,
        outcome: GameOutcome::from_marker(marker),
    })
}

pub fn is_capture(token: &str) -> bool {
    token.contains(CAPTURE_MARKER)
}
