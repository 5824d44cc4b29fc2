use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Offset of this colour's block in the feature vector. White comes
    /// second, so black pieces occupy the low half.
    pub const fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Rook = 4,
    Queen = 5,
    King = 6,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// 1-based ordinal, Pawn = 1 through King = 6.
    pub const fn ordinal(self) -> usize {
        self as usize
    }
}

/// A board square. Both coordinates are always in `0..8`; rank 0 is
/// White's back rank and file 0 is the a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    rank: u8,
    file: u8,
}

impl Square {
    pub fn new(rank: u8, file: u8) -> Option<Self> {
        (rank < 8 && file < 8).then_some(Self { rank, file })
    }

    /// Square from its `rank * 8 + file` index.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < 64).then(|| Self {
            rank: (index / 8) as u8,
            file: (index % 8) as u8,
        })
    }

    pub const fn rank(self) -> u8 {
        self.rank
    }

    pub const fn file(self) -> u8 {
        self.file
    }

    pub const fn index(self) -> usize {
        self.rank as usize * 8 + self.file as usize
    }

    /// All 64 squares, a1 first, rank by rank.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64u8).map(|i| Square {
            rank: i / 8,
            file: i % 8,
        })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}
