//! Sparse one-hot board features.
//!
//! Each occupied square sets exactly one of 768 columns:
//! `color * 384 + (kind - 1) * 64 + rank * 8 + file`, where White is colour 1.

use crate::board::{Color, PieceKind, Square};
use crate::engine::RulesEngine;

pub const SQUARES: usize = 64;
pub const PIECE_KINDS: usize = 6;
pub const FEATURE_DIM: usize = 2 * PIECE_KINDS * SQUARES;

pub fn feature_index(color: Color, kind: PieceKind, square: Square) -> usize {
    color.index() * PIECE_KINDS * SQUARES + (kind.ordinal() - 1) * SQUARES + square.index()
}

/// One encoded position: the set columns, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureRow {
    columns: Vec<u32>,
}

impl FeatureRow {
    pub fn columns(&self) -> &[u32] {
        &self.columns
    }

    pub fn nnz(&self) -> usize {
        self.columns.len()
    }

    pub const fn dim(&self) -> usize {
        FEATURE_DIM
    }

    /// Dense view, mostly useful for inspection.
    pub fn to_dense(&self) -> Vec<u8> {
        let mut dense = vec![0u8; FEATURE_DIM];
        for &col in &self.columns {
            dense[col as usize] = 1;
        }
        dense
    }
}

/// Encodes piece occupancy only. Castling rights, en passant and move
/// counters do not contribute.
pub fn encode_position<E: RulesEngine>(engine: &E, state: &E::State) -> FeatureRow {
    let mut columns: Vec<u32> = Square::all()
        .filter_map(|square| {
            engine
                .piece_at(state, square)
                .map(|(color, kind)| feature_index(color, kind, square) as u32)
        })
        .collect();
    columns.sort_unstable();
    FeatureRow { columns }
}

/// Append-only, row-major sparse matrix with `FEATURE_DIM` columns and all
/// stored values equal to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrBuilder {
    indices: Vec<u32>,
    indptr: Vec<u64>,
}

impl Default for CsrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrBuilder {
    pub fn new() -> Self {
        Self {
            indices: Vec::new(),
            indptr: vec![0],
        }
    }

    pub fn with_capacity(rows: usize) -> Self {
        let mut indptr = Vec::with_capacity(rows + 1);
        indptr.push(0);
        Self {
            indices: Vec::with_capacity(rows * 32),
            indptr,
        }
    }

    pub fn push_row(&mut self, row: &FeatureRow) {
        self.indices.extend_from_slice(row.columns());
        self.indptr.push(self.indices.len() as u64);
    }

    pub fn rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub const fn cols(&self) -> usize {
        FEATURE_DIM
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Row offsets into `indices`; always `rows() + 1` entries.
    pub fn indptr(&self) -> &[u64] {
        &self.indptr
    }

    pub fn row(&self, row: usize) -> Option<&[u32]> {
        let start = *self.indptr.get(row)? as usize;
        let end = *self.indptr.get(row + 1)? as usize;
        Some(&self.indices[start..end])
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.indptr.clear();
        self.indptr.push(0);
    }
}
