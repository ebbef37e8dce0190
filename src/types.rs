use serde::Serialize;

/// Lifecycle of a candidate piece.
///
/// `InPlay -> Used` happens only when the planner cuts the piece and is
/// irreversible. `InPlay -> Excluded` happens on external removal; a piece
/// in any other state cannot be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PieceStatus {
    InPlay,
    Used,
    Excluded,
}

/// One candidate piece length (meters).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Piece {
    pub id: u32,
    pub length: f64,
    pub status: PieceStatus,
}

/// One applied planning decision.
#[derive(Debug, Clone, Serialize)]
pub enum Decision {
    Single {
        piece: u32,
        length: f64,
        residue: f64,
    },
    /// Two pieces cut in one step, shorter first.
    Pair {
        pieces: [u32; 2],
        lengths: [f64; 2],
        residue: f64,
    },
}

/// Why a planning loop stopped. An expected end state, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// No remaining length.
    Exhausted,
    /// Remaining length is below the reusable scrap threshold.
    BelowThreshold,
    /// No in-play piece fits the remaining length.
    NoPieceFits,
    /// Neither a single piece nor a pair could be selected.
    NoValidOption,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Termination::Exhausted => "no remaining length",
            Termination::BelowThreshold => "scrap below reuse threshold",
            Termination::NoPieceFits => "no piece fits",
            Termination::NoValidOption => "no valid option",
        };
        f.write_str(reason)
    }
}

/// Outcome of one planning iteration.
#[derive(Debug, Clone, Serialize)]
pub enum Step {
    Applied(Decision),
    Done(Termination),
}

/// Immutable record of one fully processed bar.
#[derive(Debug, Clone, Serialize)]
pub struct SavedLine {
    pub original: f64,
    pub cuts: Vec<f64>,
    pub residue: f64,
}

/// Snapshot of the active session for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub original: f64,
    pub remaining: f64,
    pub cuts: Vec<f64>,
    pub terminated: bool,
}

/// Round to 6 decimals. Session arithmetic uses this to absorb
/// floating-point drift from repeated subtraction.
pub fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}
