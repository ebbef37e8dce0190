use thiserror::Error;

/// Failures surfaced by the planning core.
///
/// Running out of cuttable pieces is not an error; the planner reports that
/// as a [`crate::types::Termination`] value instead.
#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("piece {0} not found")]
    NotFound(u32),

    #[error("illegal state: {0}")]
    IllegalState(String),

    /// First piece of a session is longer than the stock bar.
    #[error("piece length {piece} m exceeds stock length {stock} m")]
    Oversize { piece: f64, stock: f64 },

    /// A cut longer than the remaining bar length. The planner only selects
    /// fitting pieces, so hitting this means a caller bypassed it.
    #[error("cut of {piece} m exceeds remaining {remaining} m")]
    Overrun { piece: f64, remaining: f64 },
}

pub type Result<T> = std::result::Result<T, PlanError>;
