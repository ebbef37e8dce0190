use crate::error::{PlanError, Result};
use crate::inventory::Inventory;
use crate::session::Session;
use crate::types::{Decision, Piece, SavedLine, Step, Summary, Termination};

/// Default reusable scrap threshold (meters). Leftovers shorter than this
/// are discarded rather than reused.
pub const DEFAULT_MIN_RESIDUE: f64 = 0.40;

/// Absolute tolerance for treating a pair sum as an exact fill.
///
/// Known limitation: being absolute rather than relative, this can misjudge
/// near-equal sums for very large lengths.
const PAIR_EPSILON: f64 = 1e-9;

/// Greedy cut planner over one bar at a time.
///
/// Owns the piece pool, the active session and the archive of saved lines.
/// Each iteration picks the single piece or pair of pieces leaving the
/// smallest leftover; decisions are never undone, so the plan is locally
/// greedy rather than globally optimal.
#[derive(Debug)]
pub struct Planner {
    inventory: Inventory,
    session: Session,
    saved: Vec<SavedLine>,
    min_residue: f64,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RESIDUE)
    }
}

impl Planner {
    pub fn new(min_residue: f64) -> Self {
        Self {
            inventory: Inventory::new(),
            session: Session::default(),
            saved: Vec::new(),
            min_residue,
        }
    }

    pub fn min_residue(&self) -> f64 {
        self.min_residue
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn add_pieces(&mut self, length: f64, quantity: u32) -> Result<Vec<u32>> {
        self.inventory.add(length, quantity)
    }

    pub fn remove_piece(&mut self, piece_id: u32) -> Result<()> {
        self.inventory.remove(piece_id)
    }

    /// Open a session on a fresh bar, cutting `first_piece` from it.
    pub fn start(&mut self, stock_length: f64, first_piece: u32) -> Result<f64> {
        self.session
            .start(stock_length, first_piece, &mut self.inventory)
    }

    /// Run one planning iteration on the active session.
    pub fn step(&mut self) -> Result<Step> {
        if !self.session.is_active() {
            return Err(PlanError::IllegalState(
                "no active session, start a cut first".to_string(),
            ));
        }
        self.plan_one()
    }

    /// Run planning iterations until the bar terminates, returning the
    /// ordered decision log and the reason the loop stopped.
    pub fn auto_plan(&mut self) -> Result<(Vec<Decision>, Termination)> {
        if !self.session.is_active() {
            return Err(PlanError::IllegalState(
                "no active session, start a cut first".to_string(),
            ));
        }
        let mut decisions = Vec::new();
        loop {
            match self.plan_one()? {
                Step::Applied(decision) => decisions.push(decision),
                Step::Done(reason) => return Ok((decisions, reason)),
            }
        }
    }

    fn plan_one(&mut self) -> Result<Step> {
        let remaining = self.session.remaining();
        if remaining <= 0.0 {
            return Ok(Step::Done(Termination::Exhausted));
        }
        if remaining < self.min_residue {
            tracing::debug!(remaining, threshold = self.min_residue, "bar finished");
            return Ok(Step::Done(Termination::BelowThreshold));
        }

        let mut candidates: Vec<(u32, f64)> = self
            .inventory
            .candidates_at_most(remaining)
            .map(|p| (p.id, p.length))
            .collect();
        if candidates.is_empty() {
            return Ok(Step::Done(Termination::NoPieceFits));
        }
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        // Best single: longest candidate that fits.
        let Some(&(single_id, single_len)) = candidates.last() else {
            return Ok(Step::Done(Termination::NoPieceFits));
        };
        let single_residue = remaining - single_len;

        // Best pair: two-pointer scan over the ascending list for the
        // largest sum not exceeding the remaining length. An exact fill
        // ends the scan early.
        let mut best_pair: Option<(usize, usize, f64)> = None;
        let (mut i, mut j) = (0, candidates.len().saturating_sub(1));
        while i < j {
            let sum = candidates[i].1 + candidates[j].1;
            if (sum - remaining).abs() < PAIR_EPSILON {
                best_pair = Some((i, j, sum));
                break;
            } else if sum < remaining {
                if best_pair.is_none_or(|(_, _, s)| sum > s) {
                    best_pair = Some((i, j, sum));
                }
                i += 1;
            } else {
                j -= 1;
            }
        }
        let pair_residue = best_pair.map_or(f64::INFINITY, |(_, _, sum)| remaining - sum);

        // Pair wins only on a strictly smaller residue; ties keep the
        // single piece.
        if pair_residue < single_residue {
            let Some((i, j, _)) = best_pair else {
                return Ok(Step::Done(Termination::NoValidOption));
            };
            let (a_id, a_len) = candidates[i];
            let (b_id, b_len) = candidates[j];
            self.session.apply_cut(a_id, &mut self.inventory)?;
            self.session.apply_cut(b_id, &mut self.inventory)?;
            let residue = pair_residue.max(0.0);
            tracing::debug!(
                piece_a = a_id,
                piece_b = b_id,
                length_a = a_len,
                length_b = b_len,
                residue,
                "cut pair"
            );
            Ok(Step::Applied(Decision::Pair {
                pieces: [a_id, b_id],
                lengths: [a_len, b_len],
                residue,
            }))
        } else {
            self.session.apply_cut(single_id, &mut self.inventory)?;
            tracing::debug!(
                piece = single_id,
                length = single_len,
                residue = single_residue,
                "cut single"
            );
            Ok(Step::Applied(Decision::Single {
                piece: single_id,
                length: single_len,
                residue: single_residue,
            }))
        }
    }

    /// Current state of the active session.
    pub fn summary(&self) -> Summary {
        Summary {
            original: self.session.original(),
            remaining: self.session.remaining(),
            cuts: self.session.cuts().to_vec(),
            terminated: self.session.is_active()
                && self
                    .session
                    .is_terminated(self.min_residue, &self.inventory),
        }
    }

    /// Archive the active session as a saved line and clear it.
    pub fn save_line(&mut self) -> Result<SavedLine> {
        if !self.session.is_active() || self.session.cuts().is_empty() {
            return Err(PlanError::IllegalState(
                "no cuts to save, start a cut first".to_string(),
            ));
        }
        let original = self.session.original();
        let cuts = self.session.cuts().to_vec();
        let residue = (original - cuts.iter().sum::<f64>()).max(0.0);
        let line = SavedLine {
            original,
            cuts,
            residue,
        };
        self.saved.push(line.clone());
        self.session.reset();
        Ok(line)
    }

    pub fn saved_lines(&self) -> &[SavedLine] {
        &self.saved
    }

    /// Leftover across all saved lines, as a percentage of material used.
    pub fn total_waste_percent(&self) -> f64 {
        let total: f64 = self.saved.iter().map(|l| l.original).sum();
        if total == 0.0 {
            return 0.0;
        }
        let wasted: f64 = self.saved.iter().map(|l| l.residue).sum();
        wasted / total * 100.0
    }

    /// Whole-inventory restart: pieces, saved lines and session all gone.
    pub fn reset(&mut self) {
        self.inventory.clear();
        self.saved.clear();
        self.session.reset();
    }

    /// Longest in-play piece that fits `stock_length`, a convenient first
    /// cut when opening a bar.
    pub fn best_first_piece(&self, stock_length: f64) -> Option<&Piece> {
        self.inventory
            .candidates_at_most(stock_length)
            .max_by(|a, b| a.length.total_cmp(&b.length).then(b.id.cmp(&a.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PieceStatus;

    fn planner_with(lengths: &[f64]) -> (Planner, Vec<u32>) {
        let mut planner = Planner::new(DEFAULT_MIN_RESIDUE);
        let mut ids = Vec::new();
        for &l in lengths {
            ids.extend(planner.add_pieces(l, 1).unwrap());
        }
        (planner, ids)
    }

    #[test]
    fn test_pair_beats_single() {
        // After the first 1.0 cut, remaining is 5. The pair 3 + 2 fills it
        // exactly and must win over the single 3 (residue 2).
        let (mut planner, ids) = planner_with(&[1.0, 3.0, 2.0, 2.0, 1.5]);
        planner.start(6.0, ids[0]).unwrap();

        let step = planner.step().unwrap();
        match step {
            Step::Applied(Decision::Pair {
                lengths, residue, ..
            }) => {
                assert_eq!(lengths, [2.0, 3.0]);
                assert!(residue.abs() < 1e-9);
            }
            other => panic!("expected pair, got {other:?}"),
        }
        assert_eq!(planner.summary().remaining, 0.0);

        match planner.step().unwrap() {
            Step::Done(Termination::Exhausted) => {}
            other => panic!("expected exhausted, got {other:?}"),
        }
    }

    #[test]
    fn test_scrap_threshold_terminates() {
        // remaining 3.0, single candidate 2.9: cut it (residue 0.1), then
        // stop because 0.1 is under the 0.4 threshold.
        let (mut planner, ids) = planner_with(&[3.0, 2.9]);
        planner.start(6.0, ids[0]).unwrap();

        let (decisions, reason) = planner.auto_plan().unwrap();
        assert_eq!(decisions.len(), 1);
        match &decisions[0] {
            Decision::Single {
                length, residue, ..
            } => {
                assert_eq!(*length, 2.9);
                assert!((residue - 0.1).abs() < 1e-9);
            }
            other => panic!("expected single, got {other:?}"),
        }
        assert_eq!(reason, Termination::BelowThreshold);
    }

    #[test]
    fn test_no_piece_fits() {
        let (mut planner, ids) = planner_with(&[4.0, 5.0]);
        planner.start(6.0, ids[0]).unwrap();

        // remaining 2.0, only a 5.0 left in play
        let (decisions, reason) = planner.auto_plan().unwrap();
        assert!(decisions.is_empty());
        assert_eq!(reason, Termination::NoPieceFits);
        assert_eq!(
            planner.inventory().get(ids[1]).unwrap().status,
            PieceStatus::InPlay
        );
    }

    #[test]
    fn test_tie_prefers_single() {
        // remaining 4: single 4.0 and pair 1 + 3 both leave residue 0.
        let (mut planner, ids) = planner_with(&[2.0, 4.0, 1.0, 3.0]);
        planner.start(6.0, ids[0]).unwrap();

        match planner.step().unwrap() {
            Step::Applied(Decision::Single { length, .. }) => assert_eq!(length, 4.0),
            other => panic!("expected single on tie, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_pair_with_seven_decimal_lengths() {
        // The pair fills the bar exactly, but rounding the intermediate
        // remaining to 6 decimals leaves it fractionally short of the
        // second piece. That overshoot must clamp, not fail mid-pair.
        let (mut planner, ids) = planner_with(&[1.0, 2.00000051, 2.99999949]);
        planner.start(6.0, ids[0]).unwrap();

        match planner.step().unwrap() {
            Step::Applied(Decision::Pair { lengths, .. }) => {
                assert_eq!(lengths, [2.00000051, 2.99999949]);
            }
            other => panic!("expected pair, got {other:?}"),
        }
        let s = planner.summary();
        assert_eq!(s.remaining, 0.0);
        assert_eq!(s.cuts.len(), 3);
    }

    #[test]
    fn test_used_pieces_never_reselected() {
        let (mut planner, ids) = planner_with(&[2.0, 2.0, 1.0, 1.0, 0.5]);
        planner.start(6.0, ids[0]).unwrap();
        let (decisions, _) = planner.auto_plan().unwrap();

        let mut seen = vec![ids[0]];
        for d in &decisions {
            match d {
                Decision::Single { piece, .. } => seen.push(*piece),
                Decision::Pair { pieces, .. } => seen.extend(pieces),
            }
        }
        let mut unique = seen.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), seen.len(), "a piece was cut twice: {seen:?}");
    }

    #[test]
    fn test_remaining_invariant_holds_throughout() {
        let (mut planner, ids) = planner_with(&[1.7, 2.3, 0.9, 1.1, 0.6, 0.4]);
        planner.start(5.5, ids[0]).unwrap();

        loop {
            let s = planner.summary();
            let total: f64 = s.cuts.iter().sum();
            assert!((s.remaining - (s.original - total)).abs() < 1e-6);
            assert!(s.remaining >= 0.0);
            match planner.step().unwrap() {
                Step::Applied(_) => {}
                Step::Done(_) => break,
            }
        }
    }

    #[test]
    fn test_step_without_session() {
        let (mut planner, _) = planner_with(&[2.0]);
        assert!(matches!(
            planner.step(),
            Err(PlanError::IllegalState(_))
        ));
        assert!(matches!(
            planner.auto_plan(),
            Err(PlanError::IllegalState(_))
        ));
    }

    #[test]
    fn test_save_line() {
        let (mut planner, ids) = planner_with(&[3.0, 2.0]);
        planner.start(6.0, ids[0]).unwrap();
        planner.auto_plan().unwrap();

        let line = planner.save_line().unwrap();
        assert_eq!(line.original, 6.0);
        assert_eq!(line.cuts, vec![3.0, 2.0]);
        assert_eq!(
            line.residue,
            (line.original - line.cuts.iter().sum::<f64>()).max(0.0)
        );

        // Session is cleared; a second save has nothing to archive.
        let s = planner.summary();
        assert_eq!(s.original, 0.0);
        assert!(s.cuts.is_empty());
        assert!(matches!(
            planner.save_line(),
            Err(PlanError::IllegalState(_))
        ));
        assert_eq!(planner.saved_lines().len(), 1);
    }

    #[test]
    fn test_save_empty_session_fails() {
        let (mut planner, _) = planner_with(&[2.0]);
        assert!(matches!(
            planner.save_line(),
            Err(PlanError::IllegalState(_))
        ));
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut planner, ids) = planner_with(&[3.0, 2.0]);
        planner.start(6.0, ids[0]).unwrap();
        planner.auto_plan().unwrap();
        planner.save_line().unwrap();

        planner.reset();
        assert!(planner.saved_lines().is_empty());
        assert_eq!(planner.inventory().pieces().count(), 0);
        assert_eq!(planner.summary().original, 0.0);
        // id sequence restarts
        assert_eq!(planner.add_pieces(1.0, 1).unwrap(), vec![1]);
    }

    #[test]
    fn test_waste_percent() {
        let (mut planner, ids) = planner_with(&[5.0, 5.7]);
        planner.start(6.0, ids[0]).unwrap();
        planner.auto_plan().unwrap();
        planner.save_line().unwrap();
        planner.start(6.0, ids[1]).unwrap();
        planner.auto_plan().unwrap();
        planner.save_line().unwrap();

        // residues 1.0 and 0.3 over 12.0 of stock
        assert!((planner.total_waste_percent() - (1.3 / 12.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_best_first_piece() {
        let (planner, ids) = planner_with(&[2.0, 7.0, 4.5]);
        let best = planner.best_first_piece(6.0).unwrap();
        assert_eq!(best.id, ids[2]);
        assert_eq!(best.length, 4.5);
        assert!(planner.best_first_piece(1.0).is_none());
    }
}
