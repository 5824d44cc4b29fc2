use crate::engine::{IllegalMove, RulesEngine};

/// The longest prefix of a game's move tokens that replays legally from
/// the initial position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidatedMoves {
    moves: Vec<String>,
}

impl ValidatedMoves {
    pub fn as_slice(&self) -> &[String] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn get(&self, ply: usize) -> Option<&str> {
        self.moves.get(ply).map(String::as_str)
    }
}

/// Replays `tokens` in order and keeps every token up to, but excluding,
/// the first one the engine rejects. Nothing after a rejected token is
/// looked at.
pub fn validate_prefix<E: RulesEngine>(engine: &E, tokens: &[String]) -> ValidatedMoves {
    let mut state = engine.initial();
    let mut moves = Vec::with_capacity(tokens.len());

    for token in tokens {
        match engine.apply(&state, token) {
            Ok(next) => {
                state = next;
                moves.push(token.clone());
            }
            Err(_) => break,
        }
    }

    ValidatedMoves { moves }
}

/// Rebuilds the position before ply `ply`, replaying the first `ply`
/// moves onto a fresh initial state.
pub fn reconstruct<E: RulesEngine>(
    engine: &E,
    moves: &ValidatedMoves,
    ply: usize,
) -> Result<E::State, IllegalMove> {
    let mut state = engine.initial();
    for token in moves.as_slice().iter().take(ply) {
        state = engine.apply(&state, token)?;
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, PieceKind, Square};
    use crate::engine::ShakmatyEngine;
    use std::cell::RefCell;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Wraps the real engine and records every token it is asked about.
    struct RecordingEngine {
        inner: ShakmatyEngine,
        seen: RefCell<Vec<String>>,
    }

    impl RulesEngine for RecordingEngine {
        type State = <ShakmatyEngine as RulesEngine>::State;

        fn initial(&self) -> Self::State {
            self.inner.initial()
        }

        fn apply(&self, state: &Self::State, token: &str) -> Result<Self::State, IllegalMove> {
            self.seen.borrow_mut().push(token.to_string());
            self.inner.apply(state, token)
        }

        fn side_to_move(&self, state: &Self::State) -> Color {
            self.inner.side_to_move(state)
        }

        fn piece_at(&self, state: &Self::State, square: Square) -> Option<(Color, PieceKind)> {
            self.inner.piece_at(state, square)
        }
    }

    #[test]
    fn test_all_legal() {
        let engine = ShakmatyEngine::new();
        let raw = tokens(&["e4", "e5", "Nf3", "Nc6"]);
        let validated = validate_prefix(&engine, &raw);
        assert_eq!(validated.as_slice(), raw.as_slice());
    }

    #[test]
    fn test_stops_at_fourth_token() {
        let engine = RecordingEngine {
            inner: ShakmatyEngine::new(),
            seen: RefCell::new(Vec::new()),
        };
        // Black has no knight that can reach e4.
        let raw = tokens(&["e4", "e5", "Nf3", "Ne4", "Nc3", "Nc6"]);
        let validated = validate_prefix(&engine, &raw);

        assert_eq!(validated.as_slice(), &raw[..3]);
        assert_eq!(*engine.seen.borrow(), tokens(&["e4", "e5", "Nf3", "Ne4"]));
    }

    #[test]
    fn test_illegal_first_token() {
        let engine = ShakmatyEngine::new();
        let validated = validate_prefix(&engine, &tokens(&["Ke2", "e4"]));
        assert!(validated.is_empty());
    }

    #[test]
    fn test_validated_is_prefix_of_raw() {
        let engine = ShakmatyEngine::new();
        let raw = tokens(&["d4", "d5", "c4", "dxc4", "e4", "b5", "a4", "c6", "axb5", "cxb5", "Qf3"]);
        let validated = validate_prefix(&engine, &raw);
        assert!(validated.len() <= raw.len());
        assert!(raw.starts_with(validated.as_slice()));
    }

    #[test]
    fn test_reconstruct_ply_zero_is_initial() {
        let engine = ShakmatyEngine::new();
        let validated = validate_prefix(&engine, &tokens(&["e4", "e5"]));
        let state = reconstruct(&engine, &validated, 0).expect("reconstruct");
        assert_eq!(engine.side_to_move(&state), Color::White);
        assert_eq!(
            engine.piece_at(&state, Square::new(1, 4).expect("e2")),
            Some((Color::White, PieceKind::Pawn))
        );
    }

    #[test]
    fn test_reconstruct_side_to_move_is_mover_of_ply() {
        let engine = ShakmatyEngine::new();
        let validated = validate_prefix(&engine, &tokens(&["e4", "e5", "Nf3"]));
        let state = reconstruct(&engine, &validated, 1).expect("reconstruct");
        assert_eq!(engine.side_to_move(&state), Color::Black);
        let state = reconstruct(&engine, &validated, 2).expect("reconstruct");
        assert_eq!(engine.side_to_move(&state), Color::White);
    }
}
