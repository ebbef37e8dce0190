//! 1D bar cutting planner.
//!
//! Given a stock bar length and a pool of requested piece lengths, the
//! planner greedily decides which piece (or pair of pieces) to cut next so
//! that the leftover at each step is as small as possible. Leftovers below a
//! configurable scrap threshold end the bar even if material remains.
//!
//! The planning core is synchronous and does no I/O; parsing, rendering and
//! the HTTP surface live in the binaries.

pub mod error;
pub mod inventory;
pub mod planner;
pub mod render;
pub mod session;
pub mod types;

pub use error::{PlanError, Result};
pub use planner::{DEFAULT_MIN_RESIDUE, Planner};
pub use types::{Decision, Piece, PieceStatus, SavedLine, Step, Termination};
