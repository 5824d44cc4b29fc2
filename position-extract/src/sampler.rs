use rand::seq::index;
use rand::Rng;

use crate::board::Color;
use crate::encoder::{encode_position, FeatureRow};
use crate::engine::RulesEngine;
use crate::filters::is_near_capture;
use crate::replay::{reconstruct, ValidatedMoves};
use crate::tokenizer::GameOutcome;

/// One sampled ply is drawn per this many validated plies, plus one.
pub const PLIES_PER_SAMPLE: usize = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub features: FeatureRow,
    /// 1 when White is to move, 0 otherwise.
    pub to_move: u8,
    /// 1.0 white win, 0.0 black win, 0.5 draw.
    pub outcome: f64,
}

#[derive(Debug, Default)]
pub struct SampledGame {
    pub examples: Vec<TrainingExample>,
    pub drawn: usize,
    pub near_capture: usize,
}

pub fn sample_count(plies: usize) -> usize {
    if plies == 0 {
        0
    } else {
        1 + plies / PLIES_PER_SAMPLE
    }
}

/// Distinct plies in `0..plies`, drawn uniformly without replacement.
pub fn choose_indices<R: Rng + ?Sized>(rng: &mut R, plies: usize) -> Vec<usize> {
    let count = sample_count(plies);
    if count == 0 {
        return Vec::new();
    }
    index::sample(rng, plies, count).into_vec()
}

/// Samples positions from a validated game and turns the quiet ones into
/// labelled examples.
pub fn sample_positions<E, R>(
    engine: &E,
    moves: &ValidatedMoves,
    outcome: GameOutcome,
    rng: &mut R,
) -> SampledGame
where
    E: RulesEngine,
    R: Rng + ?Sized,
{
    let Some(label) = outcome.label() else {
        return SampledGame::default();
    };

    let plies = choose_indices(rng, moves.len());
    let mut sampled = SampledGame {
        examples: Vec::with_capacity(plies.len()),
        drawn: plies.len(),
        near_capture: 0,
    };

    for ply in plies {
        if is_near_capture(moves, ply) {
            sampled.near_capture += 1;
            continue;
        }

        let state = match reconstruct(engine, moves, ply) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Could not rebuild ply {ply} of a validated game: {e}");
                continue;
            }
        };

        let to_move = match engine.side_to_move(&state) {
            Color::White => 1,
            Color::Black => 0,
        };

        sampled.examples.push(TrainingExample {
            features: encode_position(engine, &state),
            to_move,
            outcome: label,
        });
    }

    sampled
}
