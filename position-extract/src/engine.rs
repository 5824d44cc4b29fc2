//! Rules engine boundary.
//!
//! The extraction pipeline never interprets chess rules itself. It asks a
//! [`RulesEngine`] whether a move token is legal, for the resulting
//! position, for the side to move and for what stands on a square.

use shakmaty::san::San;
use shakmaty::{Chess, Position, Role};
use thiserror::Error;

use crate::board::{Color, PieceKind, Square};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("illegal move token '{token}'")]
pub struct IllegalMove {
    pub token: String,
}

impl IllegalMove {
    fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

pub trait RulesEngine {
    type State: Clone;

    fn initial(&self) -> Self::State;

    /// Applies `token` to `state`, leaving `state` untouched.
    fn apply(&self, state: &Self::State, token: &str) -> Result<Self::State, IllegalMove>;

    fn side_to_move(&self, state: &Self::State) -> Color;

    fn piece_at(&self, state: &Self::State, square: Square) -> Option<(Color, PieceKind)>;
}

/// Standard chess from the usual starting position, backed by `shakmaty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShakmatyEngine;

impl ShakmatyEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RulesEngine for ShakmatyEngine {
    type State = Chess;

    fn initial(&self) -> Chess {
        Chess::default()
    }

    fn apply(&self, state: &Chess, token: &str) -> Result<Chess, IllegalMove> {
        let san = San::from_ascii(token.as_bytes()).map_err(|_| IllegalMove::new(token))?;
        let mv = san.to_move(state).map_err(|_| IllegalMove::new(token))?;

        let mut next = state.clone();
        next.play_unchecked(&mv);
        Ok(next)
    }

    fn side_to_move(&self, state: &Chess) -> Color {
        from_shakmaty_color(state.turn())
    }

    fn piece_at(&self, state: &Chess, square: Square) -> Option<(Color, PieceKind)> {
        let sq = shakmaty::Square::new(square.index() as u32);
        state
            .board()
            .piece_at(sq)
            .map(|piece| (from_shakmaty_color(piece.color), from_role(piece.role)))
    }
}

fn from_shakmaty_color(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn from_role(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        let bytes = name.as_bytes();
        Square::new(bytes[1] - b'1', bytes[0] - b'a').expect("valid square")
    }

    #[test]
    fn test_initial_position() {
        let engine = ShakmatyEngine::new();
        let pos = engine.initial();

        assert_eq!(engine.side_to_move(&pos), Color::White);
        assert_eq!(
            engine.piece_at(&pos, sq("e1")),
            Some((Color::White, PieceKind::King))
        );
        assert_eq!(
            engine.piece_at(&pos, sq("d8")),
            Some((Color::Black, PieceKind::Queen))
        );
        assert_eq!(engine.piece_at(&pos, sq("e4")), None);
    }

    #[test]
    fn test_apply_legal_move() {
        let engine = ShakmatyEngine::new();
        let start = engine.initial();
        let pos = engine.apply(&start, "e4").expect("legal");

        assert_eq!(engine.side_to_move(&pos), Color::Black);
        assert_eq!(
            engine.piece_at(&pos, sq("e4")),
            Some((Color::White, PieceKind::Pawn))
        );
        assert_eq!(engine.piece_at(&pos, sq("e2")), None);
        // The input state is not mutated.
        assert_eq!(
            engine.piece_at(&start, sq("e2")),
            Some((Color::White, PieceKind::Pawn))
        );
    }

    #[test]
    fn test_apply_illegal_move() {
        let engine = ShakmatyEngine::new();
        let err = engine.apply(&engine.initial(), "e5").expect_err("illegal");
        assert_eq!(err.token, "e5");
    }

    #[test]
    fn test_apply_unparseable_token() {
        let engine = ShakmatyEngine::new();
        assert!(engine.apply(&engine.initial(), "zz9").is_err());
    }

    #[test]
    fn test_castling_applies() {
        let engine = ShakmatyEngine::new();
        let mut pos = engine.initial();
        for token in ["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "O-O"] {
            pos = engine.apply(&pos, token).expect("legal");
        }
        assert_eq!(
            engine.piece_at(&pos, sq("g1")),
            Some((Color::White, PieceKind::King))
        );
        assert_eq!(
            engine.piece_at(&pos, sq("f1")),
            Some((Color::White, PieceKind::Rook))
        );
    }
}
