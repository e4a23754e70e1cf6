//! A small chess model the sample suites test against

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChessError {
    #[error("invalid square '{0}'")]
    InvalidSquare(String),

    #[error("unknown piece '{0}'")]
    UnknownPiece(char),

    #[error("malformed book line {line}: {reason}")]
    MalformedBook { line: usize, reason: String },
}

/// A board square, file and rank both 0..8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn parse(s: &str) -> Result<Self, ChessError> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file >= 8 || rank >= 8 {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        Ok(Self { file, rank })
    }

    fn offset(self, df: i8, dr: i8) -> Option<Square> {
        let file = self.file as i8 + df;
        let rank = self.rank as i8 + dr;
        ((0..8).contains(&file) && (0..8).contains(&rank)).then(|| Square {
            file: file as u8,
            rank: rank as u8,
        })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// Knight destinations from `from` on an empty board, sorted.
pub fn knight_moves(from: &str) -> Result<Vec<String>, ChessError> {
    let square = Square::parse(from)?;
    let mut moves: Vec<Square> = KNIGHT_JUMPS
        .iter()
        .filter_map(|&(df, dr)| square.offset(df, dr))
        .collect();
    moves.sort();
    Ok(moves.iter().map(Square::to_string).collect())
}

/// Material balance in centipawns from a FEN-style piece list
/// (uppercase white, lowercase black, other characters ignored).
pub fn material(pieces: &str) -> Result<i32, ChessError> {
    pieces
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| {
            let value = match c.to_ascii_lowercase() {
                'p' => 100,
                'n' => 320,
                'b' => 330,
                'r' => 500,
                'q' => 900,
                'k' => 0,
                _ => return Err(ChessError::UnknownPiece(c)),
            };
            Ok(if c.is_ascii_uppercase() { value } else { -value })
        })
        .sum()
}

/// Opening book: position key to recommended move
#[derive(Debug, Default, Clone)]
pub struct OpeningBook {
    entries: HashMap<String, String>,
}

impl OpeningBook {
    /// Parse `key = move` lines; `#` starts a comment.
    pub fn parse(text: &str) -> Result<Self, ChessError> {
        let mut entries = HashMap::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let (key, mv) = line.split_once('=').ok_or_else(|| ChessError::MalformedBook {
                line: index + 1,
                reason: "expected 'position = move'".to_string(),
            })?;
            entries.insert(key.trim().to_string(), mv.trim().to_string());
        }
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text)?)
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Simulates a slow book backend.
    pub async fn lookup_async(&self, key: &str) -> Option<String> {
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.lookup(key).map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
