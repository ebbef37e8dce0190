use crate::error::{PlanError, Result};
use crate::inventory::Inventory;
use crate::types::{PieceStatus, round6};

/// Overshoot tolerance when applying a cut. An "exact" pair match may sum
/// to fractionally more than the remaining length, and the 6-decimal
/// rounding of `remaining` can shave off up to half a quantum on top of
/// that. Overshoot within one rounding quantum clamps to zero; anything
/// past it is an overrun.
const OVERRUN_EPS: f64 = 1e-6;

/// One bar currently being cut.
///
/// Invariant: `remaining == original - sum(cuts)`, held at 6-decimal
/// rounding. A session with no cuts is "not started"; `start` makes it
/// active, save or reset clears it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    original: f64,
    remaining: f64,
    cuts: Vec<f64>,
}

impl Session {
    pub fn original(&self) -> f64 {
        self.original
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Applied cut lengths, in application order.
    pub fn cuts(&self) -> &[f64] {
        &self.cuts
    }

    pub fn is_active(&self) -> bool {
        self.original > 0.0
    }

    /// Open the session on a fresh bar and apply the first cut.
    ///
    /// No state changes on failure, neither here nor in the inventory.
    pub fn start(
        &mut self,
        stock_length: f64,
        first_piece: u32,
        inventory: &mut Inventory,
    ) -> Result<f64> {
        if self.is_active() {
            return Err(PlanError::IllegalState(
                "session already active, save or reset it first".to_string(),
            ));
        }
        if !stock_length.is_finite() || stock_length <= 0.0 {
            return Err(PlanError::InvalidArgument(format!(
                "stock length must be positive, got {stock_length}"
            )));
        }
        let piece = inventory
            .get(first_piece)
            .ok_or(PlanError::NotFound(first_piece))?;
        if piece.status != PieceStatus::InPlay {
            return Err(PlanError::IllegalState(format!(
                "piece {first_piece} is {:?}, not in play",
                piece.status
            )));
        }
        if piece.length > stock_length {
            return Err(PlanError::Oversize {
                piece: piece.length,
                stock: stock_length,
            });
        }

        self.original = stock_length;
        self.remaining = stock_length;
        self.apply_cut(first_piece, inventory)
    }

    /// Consume a piece: mark it used, subtract its length from the
    /// remaining bar (clamped at zero) and record it.
    pub fn apply_cut(&mut self, piece_id: u32, inventory: &mut Inventory) -> Result<f64> {
        let piece = inventory
            .get(piece_id)
            .ok_or(PlanError::NotFound(piece_id))?;
        if piece.status != PieceStatus::InPlay {
            return Err(PlanError::IllegalState(format!(
                "piece {piece_id} is {:?}, not in play",
                piece.status
            )));
        }
        if piece.length > self.remaining + OVERRUN_EPS {
            debug_assert!(
                false,
                "cut of {} exceeds remaining {}",
                piece.length, self.remaining
            );
            return Err(PlanError::Overrun {
                piece: piece.length,
                remaining: self.remaining,
            });
        }

        let length = inventory.mark_used(piece_id)?;
        self.remaining = round6((self.remaining - length).max(0.0));
        self.cuts.push(length);
        Ok(self.remaining)
    }

    /// True once no further productive cut exists: the bar is used up, the
    /// leftover is below the reusable scrap threshold, or no in-play piece
    /// fits.
    pub fn is_terminated(&self, min_residue: f64, inventory: &Inventory) -> bool {
        self.remaining <= 0.0
            || self.remaining < min_residue
            || inventory.candidates_at_most(self.remaining).next().is_none()
    }

    /// Back to "not started".
    pub fn reset(&mut self) {
        self.original = 0.0;
        self.remaining = 0.0;
        self.cuts.clear();
    }
}
