use crate::replay::ValidatedMoves;
use crate::tokenizer::is_capture;

/// Plies ahead of the sampled ply whose move is also inspected. Two plies
/// later is the same side's next move.
const FOLLOW_UP_PLY: usize = 2;

/// True when the move played from the sampled position, or the same
/// side's next move, captures. Such positions are not emitted.
pub fn is_near_capture(moves: &ValidatedMoves, ply: usize) -> bool {
    let captures_at = |i: usize| moves.get(i).is_some_and(is_capture);
    captures_at(ply) || captures_at(ply + FOLLOW_UP_PLY)
}
