use std::collections::BTreeMap;

use crate::error::{PlanError, Result};
use crate::types::{Piece, PieceStatus};

/// Pool of candidate pieces, keyed by id.
///
/// This map is the single source of truth for piece state; sorted or
/// filtered views are derived on demand by callers.
#[derive(Debug, Clone)]
pub struct Inventory {
    pieces: BTreeMap<u32, Piece>,
    next_id: u32,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            pieces: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Add `quantity` pieces of `length`, all in play. Ids are assigned in
    /// increasing order and never reused.
    pub fn add(&mut self, length: f64, quantity: u32) -> Result<Vec<u32>> {
        if !length.is_finite() || length <= 0.0 {
            return Err(PlanError::InvalidArgument(format!(
                "piece length must be positive, got {length}"
            )));
        }
        if quantity == 0 {
            return Err(PlanError::InvalidArgument(
                "quantity must be non-zero".to_string(),
            ));
        }

        let mut ids = Vec::with_capacity(quantity as usize);
        for _ in 0..quantity {
            let id = self.next_id;
            self.next_id += 1;
            self.pieces.insert(
                id,
                Piece {
                    id,
                    length,
                    status: PieceStatus::InPlay,
                },
            );
            ids.push(id);
        }
        Ok(ids)
    }

    /// Exclude a piece from further planning. Only in-play pieces can be
    /// removed; a consumed piece cannot be retracted.
    pub fn remove(&mut self, piece_id: u32) -> Result<()> {
        let piece = self
            .pieces
            .get_mut(&piece_id)
            .ok_or(PlanError::NotFound(piece_id))?;
        if piece.status != PieceStatus::InPlay {
            return Err(PlanError::IllegalState(format!(
                "piece {piece_id} is {:?}, only in-play pieces can be removed",
                piece.status
            )));
        }
        piece.status = PieceStatus::Excluded;
        Ok(())
    }

    /// Transition a piece to `Used`. Irreversible.
    pub fn mark_used(&mut self, piece_id: u32) -> Result<f64> {
        let piece = self
            .pieces
            .get_mut(&piece_id)
            .ok_or(PlanError::NotFound(piece_id))?;
        if piece.status != PieceStatus::InPlay {
            return Err(PlanError::IllegalState(format!(
                "piece {piece_id} is {:?}, not in play",
                piece.status
            )));
        }
        piece.status = PieceStatus::Used;
        Ok(piece.length)
    }

    pub fn get(&self, piece_id: u32) -> Option<&Piece> {
        self.pieces.get(&piece_id)
    }

    /// All in-play pieces with `length <= limit`, in no guaranteed order.
    /// Callers that need ordering must sort the collected result.
    pub fn candidates_at_most(&self, limit: f64) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces
            .values()
            .filter(move |p| p.status == PieceStatus::InPlay && p.length <= limit)
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces.values()
    }

    /// (in_play, used, excluded) counts for the presentation layer.
    pub fn status_counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for p in self.pieces.values() {
            match p.status {
                PieceStatus::InPlay => counts.0 += 1,
                PieceStatus::Used => counts.1 += 1,
                PieceStatus::Excluded => counts.2 += 1,
            }
        }
        counts
    }

    /// Drop all pieces and restart the id sequence.
    pub fn clear(&mut self) {
        self.pieces.clear();
        self.next_id = 1;
    }
}
